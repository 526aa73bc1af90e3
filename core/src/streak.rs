use chrono::NaiveDate;

use crate::dates::yesterday;
use crate::models::{StreakData, format_day_key};

impl StreakData {
    /// Apply one daily check-in. Returns `true` if the streak changed.
    ///
    /// Re-checking on a day that was already counted is a no-op, so callers
    /// may invoke this on every dashboard load.
    pub fn check_in(&mut self, today: NaiveDate, has_logged_today: bool) -> bool {
        if !has_logged_today {
            return false;
        }
        let today_key = format_day_key(today);
        if self.last_log_date.as_deref() == Some(today_key.as_str()) {
            return false;
        }

        let continues = yesterday(today)
            .is_some_and(|y| self.last_log_date.as_deref() == Some(format_day_key(y).as_str()));
        if continues {
            self.current_streak += 1;
        } else {
            self.current_streak = 1;
        }
        self.last_log_date = Some(today_key);
        self.total_days_logged += 1;
        self.longest_streak = self.longest_streak.max(self.current_streak);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_initial_state() {
        let s = StreakData::default();
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.longest_streak, 0);
        assert!(s.last_log_date.is_none());
        assert_eq!(s.total_days_logged, 0);
    }

    #[test]
    fn test_not_logged_is_noop() {
        let mut s = StreakData::default();
        assert!(!s.check_in(d("2024-03-01"), false));
        assert_eq!(s, StreakData::default());
    }

    #[test]
    fn test_consecutive_days_increment() {
        let mut s = StreakData::default();
        let start = d("2024-02-27");
        for i in 0..5 {
            assert!(s.check_in(start + Duration::days(i), true));
            assert_eq!(s.current_streak, i + 1);
        }
        assert_eq!(s.longest_streak, 5);
        assert_eq!(s.total_days_logged, 5);
        assert_eq!(s.last_log_date.as_deref(), Some("2024-03-02"));
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let mut s = StreakData::default();
        assert!(s.check_in(d("2024-03-01"), true));
        let after_first = s.clone();
        assert!(!s.check_in(d("2024-03-01"), true));
        assert!(!s.check_in(d("2024-03-01"), true));
        assert_eq!(s, after_first);
    }

    #[test]
    fn test_gap_resets_current_not_longest() {
        let mut s = StreakData::default();
        s.check_in(d("2024-03-01"), true);
        s.check_in(d("2024-03-02"), true);
        s.check_in(d("2024-03-03"), true);
        assert_eq!(s.current_streak, 3);

        // two-day gap
        assert!(s.check_in(d("2024-03-06"), true));
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.longest_streak, 3);
        assert_eq!(s.total_days_logged, 4);
    }

    #[test]
    fn test_current_never_exceeds_longest() {
        let mut s = StreakData::default();
        let days = [
            "2024-01-01", "2024-01-02", "2024-01-04", "2024-01-05", "2024-01-06", "2024-01-07",
            "2024-01-20",
        ];
        let mut last_longest = 0;
        for day in days {
            s.check_in(d(day), true);
            assert!(s.current_streak <= s.longest_streak);
            assert!(s.longest_streak >= last_longest);
            last_longest = s.longest_streak;
        }
        assert_eq!(s.longest_streak, 4);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let mut s = StreakData::default();
        s.check_in(d("2024-02-29"), true);
        s.check_in(d("2024-03-01"), true);
        assert_eq!(s.current_streak, 2);
    }

    #[test]
    fn test_first_representable_day_starts_fresh() {
        let mut s = StreakData::default();
        assert!(s.check_in(NaiveDate::MIN, true));
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.total_days_logged, 1);
    }
}
