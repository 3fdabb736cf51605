use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{error, warn};

use crate::auth::auth::AuthUser;
use crate::model::leave::{LeaveStatus, LeaveType};
use crate::planning::interval::spans_overlap;
use crate::planning::{LeaveDecision, LeaveStore, SqliteLeaveStore, state};

use super::planning_error_response;

#[derive(Deserialize)]
pub struct CreateLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct LeaveFilter {
    pub employee_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct DecideLeave {
    pub status: LeaveDecision,
}

/* =========================
Create leave request
========================= */
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<SqliteLeaveStore>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    // Requests are always filed for the caller themself.
    let record = match state::submit(
        store.get_ref(),
        auth.user_id,
        payload.leave_type,
        payload.start_date,
        payload.end_date,
    )
    .await
    {
        Ok(r) => r,
        Err(e) => return Ok(planning_error_response(&e)),
    };

    // Advisory only: overlapping leave is allowed, the planner decides.
    let overlap_warnings = match store.get_ref().list(None).await {
        Ok(all) => all
            .iter()
            .filter(|l| l.id != record.id && l.status != LeaveStatus::Rejected)
            .filter(|l| {
                spans_overlap(
                    record.start_date,
                    record.end_date,
                    l.start_date,
                    l.end_date,
                )
            })
            .map(|l| l.id)
            .collect::<Vec<_>>(),
        Err(e) => {
            warn!(error = %e, "Overlap check skipped");
            Vec::new()
        }
    };

    Ok(HttpResponse::Created().json(json!({
        "leave": record,
        "overlap_warnings": overlap_warnings,
    })))
}

/* =========================
List leave requests
========================= */
pub async fn list_leaves(
    auth: AuthUser,
    store: web::Data<SqliteLeaveStore>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // Workers only ever see their own requests, whatever the query says.
    let filter = if auth.is_admin() {
        query.employee_id
    } else {
        Some(auth.user_id)
    };

    match store.get_ref().list(filter).await {
        Ok(leaves) => Ok(HttpResponse::Ok().json(leaves)),
        Err(e) => {
            error!(error = %e, "Failed to fetch leave list");
            Ok(HttpResponse::InternalServerError().finish())
        }
    }
}

/* =========================
Leave request detail
========================= */
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<SqliteLeaveStore>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = match store.get_ref().get(leave_id).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, leave_id, "Failed to fetch leave request");
            return Ok(HttpResponse::InternalServerError().finish());
        }
    };

    match leave {
        Some(record) if auth.is_admin() || record.employee_id == auth.user_id => {
            Ok(HttpResponse::Ok().json(record))
        }
        Some(_) => Ok(HttpResponse::Forbidden().json(json!({"error": "Not your request"}))),
        None => Ok(HttpResponse::NotFound().json(json!({"error": "Leave request not found"}))),
    }
}

/* =========================
Approve / reject (admin)
========================= */
pub async fn decide_leave(
    auth: AuthUser,
    store: web::Data<SqliteLeaveStore>,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<DecideLeave>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let record =
        match state::decide(store.get_ref(), leave_id, payload.status, auth.role).await {
            Ok(r) => r,
            Err(e) => return Ok(planning_error_response(&e)),
        };

    // An approved vacation consumes balance. Deliberately non-fatal:
    // the decision already landed.
    if record.status == LeaveStatus::Approved && record.leave_type == LeaveType::Vacation {
        if let Err(e) = sqlx::query(
            r#"
            UPDATE users
            SET vacation_balance = vacation_balance - ?
            WHERE id = ?
            "#,
        )
        .bind(record.days_count)
        .bind(record.employee_id)
        .execute(pool.get_ref())
        .await
        {
            error!(error = %e, leave_id, "Failed to deduct vacation balance");
        }
    }

    Ok(HttpResponse::Ok().json(record))
}
