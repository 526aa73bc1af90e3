//! Calorie and macro targets derived from body metrics.
//!
//! Basal metabolic rate uses the simplified Mifflin-St Jeor form
//! `10*weight + 6.25*height - 5*age + 5`, which does not branch on gender.
//! Weight is in pounds, as collected during onboarding.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{ActivityLevel, DEFAULT_WATER_TARGET, Goal, ProfileInput, UserProfile};

const PROTEIN_G_PER_LB: f64 = 0.8;
const CARBS_SHARE: f64 = 0.45;
const FAT_SHARE: f64 = 0.25;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Targets {
    pub daily_calorie_target: i64,
    pub protein_target: i64,
    pub carbs_target: i64,
    pub fat_target: i64,
    pub water_target: i64,
}

fn positive(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::validation(format!("{field} must be a number")));
    }
    if value <= 0.0 {
        return Err(Error::validation(format!("{field} must be greater than 0")));
    }
    Ok(value)
}

#[must_use]
pub fn basal_metabolic_rate(age: f64, weight: f64, height: f64) -> f64 {
    10.0 * weight + 6.25 * height - 5.0 * age + 5.0
}

pub fn calculate_targets(
    age: f64,
    weight: f64,
    height: f64,
    activity_level: ActivityLevel,
    goal: Goal,
) -> Result<Targets> {
    let age = positive("age", age)?;
    let weight = positive("weight", weight)?;
    let height = positive("height", height)?;

    let tdee = basal_metabolic_rate(age, weight, height) * activity_level.multiplier();
    let calories = tdee + goal.calorie_adjustment();
    if calories.round() <= 0.0 {
        return Err(Error::validation("Body metrics give no positive calorie target"));
    }

    Ok(Targets {
        daily_calorie_target: calories.round() as i64,
        protein_target: (weight * PROTEIN_G_PER_LB).round() as i64,
        carbs_target: (calories * CARBS_SHARE / KCAL_PER_G_CARBS).round() as i64,
        fat_target: (calories * FAT_SHARE / KCAL_PER_G_FAT).round() as i64,
        water_target: DEFAULT_WATER_TARGET,
    })
}

/// Build a complete profile from onboarding answers.
pub fn build_profile(input: &ProfileInput) -> Result<UserProfile> {
    let targets = calculate_targets(
        input.age,
        input.weight,
        input.height,
        input.activity_level,
        input.goal,
    )?;
    if input.age.fract() != 0.0 {
        return Err(Error::validation("age must be a whole number"));
    }
    Ok(UserProfile {
        name: input.name.trim().to_string(),
        age: input.age as i64,
        gender: input.gender.clone(),
        height: input.height,
        weight: input.weight,
        activity_level: input.activity_level,
        goal: input.goal,
        daily_calorie_target: targets.daily_calorie_target,
        protein_target: targets.protein_target,
        carbs_target: targets.carbs_target,
        fat_target: targets.fat_target,
        water_target: targets.water_target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moderate_lose_weight() {
        // bmr = 1500 + 1062.5 - 125 + 5 = 2442.5; tdee = 3785.875; -500 = 3285.875
        let t = calculate_targets(25.0, 150.0, 170.0, ActivityLevel::Moderate, Goal::LoseWeight)
            .unwrap();
        assert_eq!(t.daily_calorie_target, 3286);
        assert_eq!(t.protein_target, 120);
        // 3285.875 * 0.45 / 4 = 369.66
        assert_eq!(t.carbs_target, 370);
        // 3285.875 * 0.25 / 9 = 91.27
        assert_eq!(t.fat_target, 91);
        assert_eq!(t.water_target, 8);
    }

    #[test]
    fn test_bmr() {
        assert!((basal_metabolic_rate(25.0, 150.0, 170.0) - 2442.5).abs() < 1e-9);
    }

    #[test]
    fn test_goal_adjustments() {
        let maintain =
            calculate_targets(40.0, 180.0, 180.0, ActivityLevel::Sedentary, Goal::Maintain).unwrap();
        let gain =
            calculate_targets(40.0, 180.0, 180.0, ActivityLevel::Sedentary, Goal::GainMuscle)
                .unwrap();
        // bmr = 1800 + 1125 - 200 + 5 = 2730; * 1.2 = 3276
        assert_eq!(maintain.daily_calorie_target, 3276);
        assert_eq!(gain.daily_calorie_target, 3576);
        assert_eq!(maintain.protein_target, gain.protein_target);
    }

    #[test]
    fn test_multipliers_increase_with_activity() {
        let levels = [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ];
        let calories: Vec<i64> = levels
            .iter()
            .map(|&l| {
                calculate_targets(30.0, 160.0, 175.0, l, Goal::Maintain)
                    .unwrap()
                    .daily_calorie_target
            })
            .collect();
        assert!(calories.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rejects_non_numeric_input() {
        for (age, weight, height) in [
            (f64::NAN, 150.0, 170.0),
            (25.0, f64::INFINITY, 170.0),
            (25.0, 150.0, 0.0),
            (-1.0, 150.0, 170.0),
        ] {
            let err = calculate_targets(age, weight, height, ActivityLevel::Light, Goal::Maintain)
                .unwrap_err();
            assert!(err.is_validation());
        }
    }

    #[test]
    fn test_rejects_non_positive_calorie_target() {
        // bmr = 10 + 6.25 - 1000 + 5 < 0
        let err = calculate_targets(200.0, 1.0, 1.0, ActivityLevel::Active, Goal::Maintain)
            .unwrap_err();
        assert!(err.is_validation());
        // bmr = 400 + 62.5 - 100 + 5 = 367.5; * 1.2 = 441; - 500 < 0
        let err = calculate_targets(20.0, 40.0, 10.0, ActivityLevel::Sedentary, Goal::LoseWeight)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_build_profile() {
        let input = ProfileInput {
            name: "  Alex ".to_string(),
            age: 25.0,
            gender: "male".to_string(),
            height: 170.0,
            weight: 150.0,
            activity_level: ActivityLevel::Moderate,
            goal: Goal::LoseWeight,
        };
        let profile = build_profile(&input).unwrap();
        assert_eq!(profile.name, "Alex");
        assert_eq!(profile.age, 25);
        assert_eq!(profile.daily_calorie_target, 3286);
        assert_eq!(profile.water_target, 8);

        let fractional = ProfileInput { age: 25.5, ..input };
        assert!(build_profile(&fractional).is_err());
    }
}
