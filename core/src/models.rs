use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Water target used when no profile exists or a stored profile predates it.
pub const DEFAULT_WATER_TARGET: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

pub const MEAL_TYPES: &[MealType] = &[
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snack,
];

impl MealType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(Error::validation(format!(
                "Invalid meal type '{s}'. Must be one of: breakfast, lunch, dinner, snack"
            ))),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    /// TDEE multiplier applied to the basal metabolic rate.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            _ => Err(Error::validation(format!(
                "Invalid activity level '{s}'. Must be one of: sedentary, light, moderate, active, very_active"
            ))),
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    Maintain,
    GainMuscle,
}

impl Goal {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Goal::LoseWeight => "lose_weight",
            Goal::Maintain => "maintain",
            Goal::GainMuscle => "gain_muscle",
        }
    }

    /// Daily calorie adjustment applied on top of TDEE.
    #[must_use]
    pub fn calorie_adjustment(self) -> f64 {
        match self {
            Goal::LoseWeight => -500.0,
            Goal::Maintain => 0.0,
            Goal::GainMuscle => 300.0,
        }
    }
}

impl FromStr for Goal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "lose_weight" => Ok(Goal::LoseWeight),
            "maintain" => Ok(Goal::Maintain),
            "gain_muscle" => Ok(Goal::GainMuscle),
            _ => Err(Error::validation(format!(
                "Invalid goal '{s}'. Must be one of: lose_weight, maintain, gain_muscle"
            ))),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    /// Body weight in pounds.
    pub weight: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub daily_calorie_target: i64,
    pub protein_target: i64,
    pub carbs_target: i64,
    pub fat_target: i64,
    #[serde(default = "default_water_target")]
    pub water_target: i64,
}

fn default_water_target() -> i64 {
    DEFAULT_WATER_TARGET
}

/// Onboarding answers; targets are derived by [`crate::goals::calculate_targets`].
#[derive(Debug, Clone)]
pub struct ProfileInput {
    pub name: String,
    pub age: f64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: i64,
    pub date: String,
    pub name: String,
    #[serde(default)]
    pub calories: i64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default = "default_serving_size")]
    pub serving_size: f64,
    #[serde(default = "default_serving_unit")]
    pub serving_unit: String,
    pub meal_type: MealType,
    pub created_at: String,
}

fn default_serving_size() -> f64 {
    1.0
}

fn default_serving_unit() -> String {
    "serving".to_string()
}

/// A food entry as submitted by a caller. `id: None` appends a new entry,
/// `Some(id)` replaces the stored entry with that id.
#[derive(Debug, Clone)]
pub struct NewFoodEntry {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub name: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub serving_size: f64,
    pub serving_unit: String,
    pub meal_type: MealType,
}

impl NewFoodEntry {
    #[must_use]
    pub fn quick(date: NaiveDate, name: &str, calories: i64, meal_type: MealType) -> Self {
        Self {
            id: None,
            date,
            name: name.to_string(),
            calories,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            serving_size: default_serving_size(),
            serving_unit: default_serving_unit(),
            meal_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyData {
    pub date: String,
    #[serde(default)]
    pub water_glasses: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DailyData {
    #[must_use]
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            water_glasses: 0,
            weight: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakData {
    pub current_streak: i64,
    pub longest_streak: i64,
    #[serde(default)]
    pub last_log_date: Option<String>,
    pub total_days_logged: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub progress: f64,
    pub target: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<String>,
}

impl Achievement {
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Everything the dashboard and calendar need for one day.
#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub date: String,
    pub entries: Vec<FoodEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<DailyData>,
    pub totals: NutrientTotals,
    pub has_data: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub water_glasses: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

// --- Export / Import types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub entries: Vec<FoodEntry>,
    #[serde(default)]
    pub daily: Vec<DailyData>,
    #[serde(default)]
    pub streak: Option<StreakData>,
    #[serde(default)]
    pub achievements: Option<Vec<Achievement>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub profile_imported: bool,
    pub profile_skipped: bool,
    pub entries_imported: i64,
    pub entries_skipped: i64,
    pub daily_imported: i64,
    pub daily_skipped: i64,
    pub streak_imported: bool,
    pub streak_skipped: bool,
    pub achievements_imported: i64,
    pub achievements_skipped: i64,
}

// --- Validation ---

/// Parse a calendar-day key, rejecting anything that is not `YYYY-MM-DD`.
pub fn parse_day_key(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DAY_KEY_FORMAT)
        .map_err(|_| Error::validation(format!("Invalid date '{s}'. Must be YYYY-MM-DD")))
}

#[must_use]
pub fn format_day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

fn check_grams(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(format!("{field} must be a number")));
    }
    if value < 0.0 {
        return Err(Error::validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Validate a food entry before it is written: non-empty name, non-negative
/// nutrients, positive serving size.
pub fn validate_new_entry(entry: &NewFoodEntry) -> Result<()> {
    if entry.name.trim().is_empty() {
        return Err(Error::validation("Food name must not be empty"));
    }
    if entry.calories < 0 {
        return Err(Error::validation("calories must not be negative"));
    }
    check_grams("protein", entry.protein)?;
    check_grams("carbs", entry.carbs)?;
    check_grams("fat", entry.fat)?;
    if !entry.serving_size.is_finite() || entry.serving_size <= 0.0 {
        return Err(Error::validation("serving_size must be greater than 0"));
    }
    Ok(())
}

/// Validate a stored or imported entry (same rules, plus a valid date key).
pub fn validate_food_entry(entry: &FoodEntry) -> Result<()> {
    let date = parse_day_key(&entry.date)?;
    validate_new_entry(&NewFoodEntry {
        id: Some(entry.id),
        date,
        name: entry.name.clone(),
        calories: entry.calories,
        protein: entry.protein,
        carbs: entry.carbs,
        fat: entry.fat,
        serving_size: entry.serving_size,
        serving_unit: entry.serving_unit.clone(),
        meal_type: entry.meal_type,
    })
}

pub fn validate_daily(data: &DailyData) -> Result<()> {
    parse_day_key(&data.date)?;
    if data.water_glasses < 0 {
        return Err(Error::validation("water_glasses must not be negative"));
    }
    if let Some(w) = data.weight {
        validate_weight(w)?;
    }
    Ok(())
}

pub fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(Error::validation("weight must be greater than 0"));
    }
    Ok(())
}

pub fn validate_profile(profile: &UserProfile) -> Result<()> {
    if profile.age <= 0 {
        return Err(Error::validation("age must be greater than 0"));
    }
    for (field, value) in [("height", profile.height), ("weight", profile.weight)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::validation(format!("{field} must be greater than 0")));
        }
    }
    for (field, value) in [
        ("daily_calorie_target", profile.daily_calorie_target),
        ("protein_target", profile.protein_target),
        ("carbs_target", profile.carbs_target),
        ("fat_target", profile.fat_target),
    ] {
        if value < 0 {
            return Err(Error::validation(format!("{field} must not be negative")));
        }
    }
    if profile.water_target <= 0 {
        return Err(Error::validation("water_target must be greater than 0"));
    }
    Ok(())
}

pub fn validate_streak(streak: &StreakData) -> Result<()> {
    for (field, value) in [
        ("current_streak", streak.current_streak),
        ("longest_streak", streak.longest_streak),
        ("total_days_logged", streak.total_days_logged),
    ] {
        if value < 0 {
            return Err(Error::validation(format!("{field} must not be negative")));
        }
    }
    if streak.current_streak > streak.longest_streak {
        return Err(Error::validation(
            "current_streak must not exceed longest_streak",
        ));
    }
    if let Some(date) = &streak.last_log_date {
        parse_day_key(date)?;
    }
    Ok(())
}

pub fn validate_achievement(achievement: &Achievement) -> Result<()> {
    let id = achievement.id.trim();
    if id.is_empty() {
        return Err(Error::validation("Achievement id must not be empty"));
    }
    if !achievement.target.is_finite() || achievement.target <= 0.0 {
        return Err(Error::validation(format!(
            "Achievement {id}: target must be greater than 0"
        )));
    }
    if !achievement.progress.is_finite() || achievement.progress < 0.0 {
        return Err(Error::validation(format!(
            "Achievement {id}: progress must be a non-negative number"
        )));
    }
    Ok(())
}

/// Each achievement must be valid and ids must be unique.
pub fn validate_achievements(list: &[Achievement]) -> Result<()> {
    let mut seen = HashSet::new();
    for a in list {
        validate_achievement(a)?;
        if !seen.insert(a.id.as_str()) {
            return Err(Error::validation(format!("Duplicate achievement id {}", a.id)));
        }
    }
    Ok(())
}

/// Every record of an export, checked with the same rules as single writes.
pub fn validate_export(data: &ExportData) -> Result<()> {
    if let Some(profile) = &data.profile {
        validate_profile(profile)?;
    }
    for entry in &data.entries {
        validate_food_entry(entry)?;
    }
    for day in &data.daily {
        validate_daily(day)?;
    }
    if let Some(streak) = &data.streak {
        validate_streak(streak)?;
    }
    if let Some(list) = &data.achievements {
        validate_achievements(list)?;
    }
    Ok(())
}
