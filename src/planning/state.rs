use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::model::leave::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::role::Role;

use super::store::{LeaveStore, NewLeave};

/// Failure kinds a caller can tell apart, so the HTTP layer can answer
/// 400 / 403 / 409 / 404 without this module knowing about HTTP. All
/// are recoverable; nothing here logs, retries, or suppresses.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("admin role required")]
    Forbidden,

    #[error("leave request {id} was already decided ({status:?})")]
    AlreadyDecided { id: i64, status: LeaveStatus },

    #[error("leave request {0} not found")]
    NotFound(i64),

    #[error("leave store failure")]
    Store(#[from] anyhow::Error),
}

/// The two admissible decisions. PENDING is not a decision, so writing
/// it back through this path is unrepresentable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
pub enum LeaveDecision {
    #[serde(rename = "APPROVED")]
    Approve,
    #[serde(rename = "REJECTED")]
    Reject,
}

impl LeaveDecision {
    pub fn target_status(self) -> LeaveStatus {
        match self {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Reject => LeaveStatus::Rejected,
        }
    }
}

/// Creates a new leave request. Whatever the caller's role, the stored
/// record starts PENDING. `days_count` is derived as the inclusive day
/// span; historical rows may hold other values and nothing reads them
/// back for behavior.
pub async fn submit(
    store: &dyn LeaveStore,
    employee_id: i64,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LeaveRequest, PlanningError> {
    if start_date > end_date {
        return Err(PlanningError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }

    let days_count = (end_date - start_date).num_days() as f64 + 1.0;

    let record = store
        .insert(NewLeave {
            employee_id,
            leave_type,
            start_date,
            end_date,
            days_count,
        })
        .await?;

    Ok(record)
}

/// Applies an admin decision to a PENDING request. APPROVED and
/// REJECTED are terminal: once either lands, every later attempt fails
/// with `AlreadyDecided`, including the loser of a concurrent race
/// (the store's compare-and-set decides the winner).
///
/// Overlapping leave is deliberately not rejected here: conflicts are
/// surfaced on the calendar and resolved by human judgment.
pub async fn decide(
    store: &dyn LeaveStore,
    leave_id: i64,
    decision: LeaveDecision,
    actor_role: Role,
) -> Result<LeaveRequest, PlanningError> {
    if actor_role != Role::Admin {
        return Err(PlanningError::Forbidden);
    }

    let current = store
        .get(leave_id)
        .await?
        .ok_or(PlanningError::NotFound(leave_id))?;

    if current.status.is_terminal() {
        return Err(PlanningError::AlreadyDecided {
            id: leave_id,
            status: current.status,
        });
    }

    let won = store
        .set_status_if_pending(leave_id, decision.target_status())
        .await?;
    if !won {
        // a concurrent decision got there first; report what it chose
        let status = store
            .get(leave_id)
            .await?
            .map(|l| l.status)
            .unwrap_or(current.status);
        return Err(PlanningError::AlreadyDecided {
            id: leave_id,
            status,
        });
    }

    store
        .get(leave_id)
        .await?
        .ok_or(PlanningError::NotFound(leave_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::store::MemoryLeaveStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[actix_web::test]
    async fn submit_always_starts_pending() {
        let store = MemoryLeaveStore::new();
        let record = submit(
            &store,
            1,
            LeaveType::Vacation,
            d(2024, 7, 1),
            d(2024, 7, 5),
        )
        .await
        .unwrap();

        assert_eq!(record.status, LeaveStatus::Pending);
        assert_eq!(record.employee_id, 1);
    }

    #[actix_web::test]
    async fn submit_computes_inclusive_day_count() {
        let store = MemoryLeaveStore::new();
        let record = submit(
            &store,
            1,
            LeaveType::Vacation,
            d(2024, 7, 1),
            d(2024, 7, 5),
        )
        .await
        .unwrap();
        assert_eq!(record.days_count, 5.0);

        let single = submit(&store, 1, LeaveType::Other, d(2024, 8, 1), d(2024, 8, 1))
            .await
            .unwrap();
        assert_eq!(single.days_count, 1.0);
    }

    #[actix_web::test]
    async fn submit_rejects_reversed_dates() {
        let store = MemoryLeaveStore::new();
        let err = submit(
            &store,
            1,
            LeaveType::Sickness,
            d(2024, 7, 5),
            d(2024, 7, 1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PlanningError::Validation(_)));
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn decide_requires_admin() {
        let store = MemoryLeaveStore::new();
        let record = submit(
            &store,
            1,
            LeaveType::Vacation,
            d(2024, 7, 1),
            d(2024, 7, 2),
        )
        .await
        .unwrap();

        let err = decide(&store, record.id, LeaveDecision::Approve, Role::Worker)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::Forbidden));

        // the record is untouched
        let unchanged = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn decide_unknown_id_is_not_found() {
        let store = MemoryLeaveStore::new();
        let err = decide(&store, 42, LeaveDecision::Reject, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::NotFound(42)));
    }

    #[actix_web::test]
    async fn approve_then_reject_fails_with_state_error() {
        let store = MemoryLeaveStore::new();
        let record = submit(
            &store,
            1,
            LeaveType::Vacation,
            d(2024, 7, 1),
            d(2024, 7, 2),
        )
        .await
        .unwrap();

        let approved = decide(&store, record.id, LeaveDecision::Approve, Role::Admin)
            .await
            .unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);

        let err = decide(&store, record.id, LeaveDecision::Reject, Role::Admin)
            .await
            .unwrap_err();
        match err {
            PlanningError::AlreadyDecided { id, status } => {
                assert_eq!(id, record.id);
                assert_eq!(status, LeaveStatus::Approved);
            }
            other => panic!("expected AlreadyDecided, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn second_decision_of_same_kind_also_fails() {
        let store = MemoryLeaveStore::new();
        let record = submit(
            &store,
            2,
            LeaveType::Sickness,
            d(2024, 9, 2),
            d(2024, 9, 4),
        )
        .await
        .unwrap();

        decide(&store, record.id, LeaveDecision::Reject, Role::Admin)
            .await
            .unwrap();
        let err = decide(&store, record.id, LeaveDecision::Reject, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::AlreadyDecided { .. }));
    }

    #[actix_web::test]
    async fn lost_cas_race_maps_to_already_decided() {
        let store = MemoryLeaveStore::new();
        let record = submit(
            &store,
            1,
            LeaveType::Vacation,
            d(2024, 7, 1),
            d(2024, 7, 2),
        )
        .await
        .unwrap();

        // another actor wins between our read and our write
        assert!(
            store
                .set_status_if_pending(record.id, LeaveStatus::Rejected)
                .await
                .unwrap()
        );

        let err = decide(&store, record.id, LeaveDecision::Approve, Role::Admin)
            .await
            .unwrap_err();
        match err {
            PlanningError::AlreadyDecided { status, .. } => {
                assert_eq!(status, LeaveStatus::Rejected)
            }
            other => panic!("expected AlreadyDecided, got {other:?}"),
        }
    }
}
