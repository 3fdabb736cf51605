use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::model::leave::{LeaveRequest, LeaveStatus, LeaveType};

/// Insert payload. Deliberately has no status field: every new request
/// is written as PENDING, whatever the caller wanted.
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_count: f64,
}

/// Persistence seam for leave requests. The state machine only ever
/// needs these four operations; `set_status_if_pending` is the
/// compare-and-set that serializes concurrent decisions on one record.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// All requests, or one employee's, ordered by id ascending.
    async fn list(&self, employee_id: Option<i64>) -> Result<Vec<LeaveRequest>>;

    async fn get(&self, id: i64) -> Result<Option<LeaveRequest>>;

    async fn insert(&self, new: NewLeave) -> Result<LeaveRequest>;

    /// Returns false when the row no longer holds PENDING, i.e. a
    /// concurrent decision already landed.
    async fn set_status_if_pending(&self, id: i64, status: LeaveStatus) -> Result<bool>;
}

const SELECT_LEAVE: &str = r#"
SELECT l.id, l.employee_id, u.username AS employee_name,
       l.leave_type, l.start_date, l.end_date,
       l.status, l.days_count, l.created_at
FROM leaves l
JOIN users u ON u.id = l.employee_id
"#;

pub struct SqliteLeaveStore {
    pool: SqlitePool,
}

impl SqliteLeaveStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for SqliteLeaveStore {
    async fn list(&self, employee_id: Option<i64>) -> Result<Vec<LeaveRequest>> {
        let rows = match employee_id {
            Some(id) => {
                let sql = format!("{SELECT_LEAVE} WHERE l.employee_id = ? ORDER BY l.id");
                sqlx::query_as::<_, LeaveRequest>(&sql)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{SELECT_LEAVE} ORDER BY l.id");
                sqlx::query_as::<_, LeaveRequest>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Option<LeaveRequest>> {
        let sql = format!("{SELECT_LEAVE} WHERE l.id = ?");
        let row = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, new: NewLeave) -> Result<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leaves (employee_id, leave_type, start_date, end_date, status, days_count)
            VALUES (?, ?, ?, ?, 'PENDING', ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.days_count)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("leave {id} vanished after insert"))
    }

    async fn set_status_if_pending(&self, id: i64, status: LeaveStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leaves
            SET status = ?
            WHERE id = ?
            AND status = 'PENDING'
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory store with the same compare-and-set semantics, used by the
/// planning tests.
pub struct MemoryLeaveStore {
    rows: Mutex<Vec<LeaveRequest>>,
    names: Mutex<HashMap<i64, String>>,
    next_id: AtomicI64,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            names: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Registers a display name for an employee id; unknown employees
    /// fall back to a synthetic label.
    pub fn put_employee(&self, id: i64, name: &str) {
        self.names.lock().unwrap().insert(id, name.to_string());
    }

    fn label(&self, employee_id: i64) -> String {
        self.names
            .lock()
            .unwrap()
            .get(&employee_id)
            .cloned()
            .unwrap_or_else(|| format!("employee-{employee_id}"))
    }
}

impl Default for MemoryLeaveStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn list(&self, employee_id: Option<i64>) -> Result<Vec<LeaveRequest>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|l| employee_id.is_none_or(|id| l.employee_id == id))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<LeaveRequest>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|l| l.id == id).cloned())
    }

    async fn insert(&self, new: NewLeave) -> Result<LeaveRequest> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = LeaveRequest {
            id,
            employee_id: new.employee_id,
            employee_name: self.label(new.employee_id),
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            status: LeaveStatus::Pending,
            days_count: new.days_count,
            created_at: Some(chrono::Utc::now().naive_utc()),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn set_status_if_pending(&self, id: i64, status: LeaveStatus) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|l| l.id == id && l.status == LeaveStatus::Pending)
        {
            Some(row) => {
                row.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
