//! Calendar-day helpers. All "today" values come from the local clock.

use chrono::{Local, NaiveDate};

use crate::models::format_day_key;

#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `None` for the first representable date.
#[must_use]
pub fn yesterday(day: NaiveDate) -> Option<NaiveDate> {
    day.pred_opt()
}

/// The `n` calendar days ending today, newest first (today at index 0).
#[must_use]
pub fn date_range(n: usize) -> Vec<String> {
    date_range_ending(today(), n)
}

/// The `n` calendar days ending at `end`, newest first.
#[must_use]
pub fn date_range_ending(end: NaiveDate, n: usize) -> Vec<String> {
    std::iter::successors(Some(end), |d| d.pred_opt())
        .take(n)
        .map(format_day_key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::models::parse_day_key;

    #[test]
    fn test_range_newest_first() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(
            date_range_ending(end, 4),
            vec!["2024-03-02", "2024-03-01", "2024-02-29", "2024-02-28"]
        );
    }

    #[test]
    fn test_range_crosses_year_boundary() {
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(date_range_ending(end, 2), vec!["2025-01-01", "2024-12-31"]);
    }

    #[test]
    fn test_range_zero_is_empty() {
        assert!(date_range(0).is_empty());
    }

    #[test]
    fn test_range_contains_today_and_is_consecutive() {
        for n in [1, 7, 30] {
            let range = date_range(n);
            assert_eq!(range.len(), n);
            assert_eq!(range[0], format_day_key(today()));
            let days: Vec<NaiveDate> = range.iter().map(|d| parse_day_key(d).unwrap()).collect();
            for pair in days.windows(2) {
                assert_eq!(pair[0] - pair[1], Duration::days(1));
            }
        }
    }

    #[test]
    fn test_yesterday() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(yesterday(d), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(yesterday(NaiveDate::MIN), None);
    }
}
