//! Built-in achievements and their progress rules.

use crate::models::Achievement;

pub const FIRST_MEAL: &str = "first_meal";
pub const WATER_WARRIOR: &str = "water_warrior";
pub const WEEK_STREAK: &str = "week_streak";
pub const PROTEIN_POWER: &str = "protein_power";

/// Facts about the log that achievement progress is computed from.
#[derive(Debug, Clone, Copy, Default)]
pub struct AchievementStats {
    pub entries_logged: i64,
    pub max_water_glasses: i64,
    pub longest_streak: i64,
    pub protein_goal_days: i64,
}

fn achievement(id: &str, title: &str, description: &str, icon: &str, target: f64) -> Achievement {
    Achievement {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        progress: 0.0,
        target,
        unlocked_at: None,
    }
}

#[must_use]
pub fn default_achievements() -> Vec<Achievement> {
    vec![
        achievement(FIRST_MEAL, "First Bite!", "Log your first meal", "🍽️", 1.0),
        achievement(
            WATER_WARRIOR,
            "Water Warrior",
            "Drink 8 glasses of water in a day",
            "💧",
            8.0,
        ),
        achievement(
            WEEK_STREAK,
            "Week Warrior",
            "Log meals for 7 days straight",
            "🔥",
            7.0,
        ),
        achievement(
            PROTEIN_POWER,
            "Protein Power",
            "Hit your protein goal 5 times",
            "💪",
            5.0,
        ),
    ]
}

#[allow(clippy::cast_precision_loss)]
fn raw_progress(id: &str, stats: &AchievementStats) -> Option<f64> {
    let value = match id {
        FIRST_MEAL => stats.entries_logged,
        WATER_WARRIOR => stats.max_water_glasses,
        WEEK_STREAK => stats.longest_streak,
        PROTEIN_POWER => stats.protein_goal_days,
        _ => return None,
    };
    Some(value as f64)
}

/// Update progress for every known achievement, unlocking those that reach
/// their target. Unknown ids keep their stored progress. Unlocks are sticky.
pub fn evaluate(achievements: &mut [Achievement], stats: &AchievementStats, now: &str) {
    for a in achievements.iter_mut() {
        let Some(raw) = raw_progress(&a.id, stats) else {
            continue;
        };
        if a.is_unlocked() {
            a.progress = a.target;
            continue;
        }
        a.progress = raw.min(a.target);
        if a.progress >= a.target {
            a.unlocked_at = Some(now.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = default_achievements();
        let ids: Vec<&str> = defaults.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![FIRST_MEAL, WATER_WARRIOR, WEEK_STREAK, PROTEIN_POWER]);
        assert!(defaults.iter().all(|a| a.progress == 0.0 && !a.is_unlocked()));
    }

    #[test]
    fn test_progress_is_capped_and_unlocks() {
        let mut list = default_achievements();
        let stats = AchievementStats {
            entries_logged: 12,
            max_water_glasses: 5,
            longest_streak: 7,
            protein_goal_days: 2,
        };
        evaluate(&mut list, &stats, "2024-03-07T12:00:00+00:00");

        let first = &list[0];
        assert!((first.progress - 1.0).abs() < f64::EPSILON);
        assert_eq!(first.unlocked_at.as_deref(), Some("2024-03-07T12:00:00+00:00"));

        let water = &list[1];
        assert!((water.progress - 5.0).abs() < f64::EPSILON);
        assert!(!water.is_unlocked());

        assert!(list[2].is_unlocked());
        assert!(!list[3].is_unlocked());
    }

    #[test]
    fn test_unlock_is_sticky() {
        let mut list = default_achievements();
        let stats = AchievementStats {
            longest_streak: 7,
            ..AchievementStats::default()
        };
        evaluate(&mut list, &stats, "first");
        evaluate(&mut list, &AchievementStats::default(), "second");
        let week = list.iter().find(|a| a.id == WEEK_STREAK).unwrap();
        assert_eq!(week.unlocked_at.as_deref(), Some("first"));
        assert!((week.progress - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_ids_untouched() {
        let mut list = vec![Achievement {
            id: "custom".to_string(),
            title: "Custom".to_string(),
            description: String::new(),
            icon: String::new(),
            progress: 0.6,
            target: 1.0,
            unlocked_at: None,
        }];
        evaluate(&mut list, &AchievementStats::default(), "now");
        assert!((list[0].progress - 0.6).abs() < f64::EPSILON);
    }
}
