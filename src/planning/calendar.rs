use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::model::leave::{LeaveRequest, LeaveStatus};

use super::interval::overlaps;

/// One leave request's presence on one calendar day. `is_start` and
/// `is_end` are computed against the leave's own boundary dates, so a
/// renderer can draw a multi-day leave as a single unbroken bar: a
/// segment with `is_start == false` is flush against the previous day,
/// one with `is_end == false` flush against the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySegment {
    pub leave_id: i64,
    pub employee_label: String,
    pub status: LeaveStatus,
    pub is_start: bool,
    pub is_end: bool,
}

#[derive(Debug, Serialize)]
pub struct CalendarDayCell {
    pub date: NaiveDate,
    /// Sorted by leave id ascending, which keeps a spanning leave on
    /// the same row in every cell it touches.
    pub segments: Vec<DaySegment>,
}

#[derive(Debug, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Weekday of day 1, Monday = 0. The caller uses it for a
    /// Monday-first 7-column layout; padding cells are its concern.
    pub first_weekday: u32,
    pub days: Vec<CalendarDayCell>,
}

/// Builds the per-day rendering model for one month. Emits exactly one
/// cell per calendar day, ascending. REJECTED requests and malformed
/// ranges (`start > end`) contribute nothing; this never fails, an
/// out-of-range month just yields an empty `days` vector.
pub fn build_month(year: i32, month: u32, leaves: &[LeaveRequest]) -> CalendarMonth {
    let first_weekday = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.weekday().num_days_from_monday())
        .unwrap_or(0);

    let mut days = Vec::new();
    for day in 1..=days_in_month(year, month) {
        let date = match NaiveDate::from_ymd_opt(year, month, day) {
            Some(d) => d,
            None => continue,
        };

        let mut segments: Vec<DaySegment> = leaves
            .iter()
            .filter(|l| l.status != LeaveStatus::Rejected)
            .filter(|l| overlaps(date, l.start_date, l.end_date))
            .map(|l| DaySegment {
                leave_id: l.id,
                employee_label: l.employee_name.clone(),
                status: l.status,
                is_start: date == l.start_date,
                is_end: date == l.end_date,
            })
            .collect();
        segments.sort_by_key(|s| s.leave_id);

        days.push(CalendarDayCell { date, segments });
    }

    CalendarMonth {
        year,
        month,
        first_weekday,
        days,
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        _ => 0,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave::LeaveType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn leave(id: i64, employee: &str, start: NaiveDate, end: NaiveDate, status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: id * 10,
            employee_name: employee.to_string(),
            leave_type: LeaveType::Vacation,
            start_date: start,
            end_date: end,
            status,
            days_count: 1.0,
            created_at: None,
        }
    }

    #[test]
    fn leap_february_has_29_empty_cells() {
        let month = build_month(2024, 2, &[]);
        assert_eq!(month.days.len(), 29);
        assert!(month.days.iter().all(|c| c.segments.is_empty()));
        assert_eq!(month.days[0].date, d(2024, 2, 1));
        assert_eq!(month.days[28].date, d(2024, 2, 29));
    }

    #[test]
    fn plain_february_has_28_cells() {
        assert_eq!(build_month(2023, 2, &[]).days.len(), 28);
        // centuries are not leap years unless divisible by 400
        assert_eq!(build_month(1900, 2, &[]).days.len(), 28);
        assert_eq!(build_month(2000, 2, &[]).days.len(), 29);
    }

    #[test]
    fn invalid_month_yields_no_cells() {
        let month = build_month(2024, 13, &[]);
        assert!(month.days.is_empty());
        assert_eq!(month.first_weekday, 0);
    }

    #[test]
    fn first_weekday_is_monday_based() {
        // 2024-06-01 is a Saturday
        assert_eq!(build_month(2024, 6, &[]).first_weekday, 5);
        // 2024-04-01 is a Monday
        assert_eq!(build_month(2024, 4, &[]).first_weekday, 0);
    }

    #[test]
    fn cross_month_leave_caps_at_its_own_boundaries() {
        let leaves = vec![leave(
            1,
            "Marc",
            d(2024, 3, 30),
            d(2024, 4, 2),
            LeaveStatus::Approved,
        )];

        let march = build_month(2024, 3, &leaves);
        let mar30 = &march.days[29].segments[0];
        assert!(mar30.is_start && !mar30.is_end);
        let mar31 = &march.days[30].segments[0];
        assert!(!mar31.is_start && !mar31.is_end);
        // no segment before the leave starts
        assert!(march.days[28].segments.is_empty());

        let april = build_month(2024, 4, &leaves);
        let apr1 = &april.days[0].segments[0];
        assert!(!apr1.is_start && !apr1.is_end);
        let apr2 = &april.days[1].segments[0];
        assert!(!apr2.is_start && apr2.is_end);
        assert!(april.days[2].segments.is_empty());
    }

    #[test]
    fn leave_outside_the_month_contributes_nothing() {
        let leaves = vec![leave(
            1,
            "Marc",
            d(2024, 5, 2),
            d(2024, 5, 4),
            LeaveStatus::Approved,
        )];
        let june = build_month(2024, 6, &leaves);
        assert!(june.days.iter().all(|c| c.segments.is_empty()));
    }

    #[test]
    fn shared_day_segments_sorted_by_leave_id() {
        let leaves = vec![
            leave(7, "Paul", d(2024, 6, 8), d(2024, 6, 12), LeaveStatus::Pending),
            leave(3, "Marc", d(2024, 6, 10), d(2024, 6, 10), LeaveStatus::Approved),
        ];
        let june = build_month(2024, 6, &leaves);
        let june10 = &june.days[9];
        assert_eq!(june10.date, d(2024, 6, 10));
        assert_eq!(june10.segments.len(), 2);
        assert_eq!(june10.segments[0].leave_id, 3);
        assert_eq!(june10.segments[0].employee_label, "Marc");
        assert_eq!(june10.segments[1].leave_id, 7);
    }

    #[test]
    fn rejected_leave_never_appears() {
        let leaves = vec![leave(
            1,
            "Marc",
            d(2024, 6, 10),
            d(2024, 6, 15),
            LeaveStatus::Rejected,
        )];
        let june = build_month(2024, 6, &leaves);
        assert!(june.days.iter().all(|c| c.segments.is_empty()));
    }

    #[test]
    fn pending_leave_appears_like_approved() {
        let leaves = vec![leave(
            1,
            "Marc",
            d(2024, 6, 10),
            d(2024, 6, 11),
            LeaveStatus::Pending,
        )];
        let june = build_month(2024, 6, &leaves);
        assert_eq!(june.days[9].segments.len(), 1);
        assert_eq!(june.days[9].segments[0].status, LeaveStatus::Pending);
    }

    #[test]
    fn malformed_range_is_silently_excluded() {
        let leaves = vec![leave(
            1,
            "Marc",
            d(2024, 6, 15),
            d(2024, 6, 10),
            LeaveStatus::Approved,
        )];
        let june = build_month(2024, 6, &leaves);
        assert!(june.days.iter().all(|c| c.segments.is_empty()));
    }

    #[test]
    fn single_day_leave_is_both_start_and_end() {
        let leaves = vec![leave(
            1,
            "Marc",
            d(2024, 6, 10),
            d(2024, 6, 10),
            LeaveStatus::Approved,
        )];
        let june = build_month(2024, 6, &leaves);
        let seg = &june.days[9].segments[0];
        assert!(seg.is_start && seg.is_end);
    }
}
