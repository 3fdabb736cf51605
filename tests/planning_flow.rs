//! End-to-end exercise of the leave planning core against the
//! in-memory store: submission, admin decisions, and the resulting
//! calendar month.

use chrono::NaiveDate;

use chantier_ops::model::leave::{LeaveStatus, LeaveType};
use chantier_ops::model::role::Role;
use chantier_ops::planning::calendar::build_month;
use chantier_ops::planning::state::{decide, submit};
use chantier_ops::planning::{LeaveDecision, LeaveStore, MemoryLeaveStore, PlanningError};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[actix_web::test]
async fn submit_decide_and_render_a_month() {
    let store = MemoryLeaveStore::new();
    store.put_employee(1, "Marc");
    store.put_employee(2, "Paul");

    let marc = submit(&store, 1, LeaveType::Vacation, d(2024, 6, 8), d(2024, 6, 12))
        .await
        .unwrap();
    let paul = submit(&store, 2, LeaveType::Sickness, d(2024, 6, 10), d(2024, 6, 10))
        .await
        .unwrap();
    let rejected = submit(&store, 2, LeaveType::Other, d(2024, 6, 11), d(2024, 6, 20))
        .await
        .unwrap();

    assert_eq!(marc.status, LeaveStatus::Pending);
    assert_eq!(marc.days_count, 5.0);

    decide(&store, marc.id, LeaveDecision::Approve, Role::Admin)
        .await
        .unwrap();
    decide(&store, rejected.id, LeaveDecision::Reject, Role::Admin)
        .await
        .unwrap();
    // paul's request stays pending; pending leave still shows up

    let leaves = store.list(None).await.unwrap();
    let june = build_month(2024, 6, &leaves);
    assert_eq!(june.days.len(), 30);

    // June 10: both Marc (approved, mid-span) and Paul (pending, single day)
    let june10 = &june.days[9];
    assert_eq!(june10.segments.len(), 2);
    assert_eq!(june10.segments[0].leave_id, marc.id);
    assert_eq!(june10.segments[0].employee_label, "Marc");
    assert!(!june10.segments[0].is_start && !june10.segments[0].is_end);
    assert_eq!(june10.segments[1].leave_id, paul.id);
    assert!(june10.segments[1].is_start && june10.segments[1].is_end);

    // caps on Marc's own boundaries
    assert!(june.days[7].segments[0].is_start);
    assert!(june.days[11].segments[0].is_end);

    // the rejected request never shows, even inside its range
    assert!(
        june.days
            .iter()
            .all(|c| c.segments.iter().all(|s| s.leave_id != rejected.id))
    );
}

#[actix_web::test]
async fn decisions_are_single_shot() {
    let store = MemoryLeaveStore::new();
    let record = submit(&store, 1, LeaveType::Vacation, d(2024, 7, 1), d(2024, 7, 3))
        .await
        .unwrap();

    // workers cannot decide
    let err = decide(&store, record.id, LeaveDecision::Approve, Role::Worker)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanningError::Forbidden));

    decide(&store, record.id, LeaveDecision::Approve, Role::Admin)
        .await
        .unwrap();

    // any second decision fails, whatever it asks for
    for decision in [LeaveDecision::Approve, LeaveDecision::Reject] {
        let err = decide(&store, record.id, decision, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::AlreadyDecided { .. }));
    }
}

#[actix_web::test]
async fn listing_filters_by_employee() {
    let store = MemoryLeaveStore::new();
    submit(&store, 1, LeaveType::Vacation, d(2024, 7, 1), d(2024, 7, 3))
        .await
        .unwrap();
    submit(&store, 2, LeaveType::Vacation, d(2024, 7, 1), d(2024, 7, 3))
        .await
        .unwrap();
    submit(&store, 1, LeaveType::Other, d(2024, 8, 1), d(2024, 8, 1))
        .await
        .unwrap();

    assert_eq!(store.list(None).await.unwrap().len(), 3);
    assert_eq!(store.list(Some(1)).await.unwrap().len(), 2);
    assert_eq!(store.list(Some(2)).await.unwrap().len(), 1);
    assert!(store.list(Some(99)).await.unwrap().is_empty());
}
