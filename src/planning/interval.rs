use chrono::NaiveDate;

/// True iff `day` falls within `[start, end]`, inclusive on both ends.
/// A reversed range (`start > end`) matches no day. `NaiveDate` carries
/// no time-of-day, so there is no partial-day artifact to normalize.
pub fn overlaps(day: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= day && day <= end
}

/// True iff the two inclusive ranges share at least one day.
/// Reversed ranges never intersect anything.
pub fn spans_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    if a_start > a_end || b_start > b_end {
        return false;
    }
    a_start <= b_end && b_start <= a_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn inclusive_on_both_ends() {
        let start = d(2024, 3, 10);
        let end = d(2024, 3, 12);
        assert!(overlaps(start, start, end));
        assert!(overlaps(d(2024, 3, 11), start, end));
        assert!(overlaps(end, start, end));
    }

    #[test]
    fn outside_the_range() {
        let start = d(2024, 3, 10);
        let end = d(2024, 3, 12);
        assert!(!overlaps(d(2024, 3, 9), start, end));
        assert!(!overlaps(d(2024, 3, 13), start, end));
    }

    #[test]
    fn single_day_range() {
        let day = d(2024, 6, 1);
        assert!(overlaps(day, day, day));
        assert!(!overlaps(d(2024, 6, 2), day, day));
    }

    #[test]
    fn reversed_range_matches_nothing() {
        let start = d(2024, 3, 12);
        let end = d(2024, 3, 10);
        for offset in 0..5 {
            let day = d(2024, 3, 9 + offset);
            assert!(!overlaps(day, start, end));
        }
    }

    #[test]
    fn spans_overlap_shared_day() {
        assert!(spans_overlap(
            d(2024, 6, 1),
            d(2024, 6, 10),
            d(2024, 6, 10),
            d(2024, 6, 20)
        ));
        assert!(!spans_overlap(
            d(2024, 6, 1),
            d(2024, 6, 9),
            d(2024, 6, 10),
            d(2024, 6, 20)
        ));
    }

    #[test]
    fn spans_overlap_reversed_input() {
        assert!(!spans_overlap(
            d(2024, 6, 10),
            d(2024, 6, 1),
            d(2024, 6, 1),
            d(2024, 6, 30)
        ));
    }
}
