use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum LeaveType {
    Vacation,
    Sickness,
    Other,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// APPROVED and REJECTED admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaveRequest {
    pub id: i64,
    pub employee_id: i64,
    /// Joined from the users table for display in the planning views.
    pub employee_name: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    /// Informational inclusive day count, computed at submission.
    /// Rows written by older tooling may hold anything; nothing here
    /// derives behavior from it.
    pub days_count: f64,
    pub created_at: Option<NaiveDateTime>,
}
