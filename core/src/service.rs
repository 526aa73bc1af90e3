use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::achievements::{self, AchievementStats};
use crate::aggregate::sum_nutrients;
use crate::dates;
use crate::error::{Error, Result};
use crate::export::{self, EXPORT_VERSION};
use crate::goals;
use crate::models::{
    Achievement, DEFAULT_WATER_TARGET, DailyData, DayView, ExportData, FoodEntry, ImportSummary,
    NewFoodEntry, ProfileInput, StreakData, TrendPoint, UserProfile, format_day_key,
    parse_day_key, validate_achievement, validate_daily, validate_food_entry, validate_profile,
    validate_streak, validate_weight,
};
use crate::store::{Backend, Store, open_in_memory, open_store};

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Split an export into the records that pass validation and a summary of
/// what was kept and skipped.
fn screen_import(data: &ExportData) -> (ExportData, ImportSummary) {
    let mut summary = ImportSummary::default();

    let profile = data.profile.clone().filter(|p| match validate_profile(p) {
        Ok(()) => true,
        Err(e) => {
            warn!("Skipping profile: {e}");
            summary.profile_skipped = true;
            false
        }
    });
    summary.profile_imported = profile.is_some();

    let entries: Vec<FoodEntry> = data
        .entries
        .iter()
        .filter(|entry| match validate_food_entry(entry) {
            Ok(()) => true,
            Err(e) => {
                warn!("Skipping food entry {}: {e}", entry.id);
                summary.entries_skipped += 1;
                false
            }
        })
        .cloned()
        .collect();
    summary.entries_imported = count(entries.len());

    let daily: Vec<DailyData> = data
        .daily
        .iter()
        .filter(|day| match validate_daily(day) {
            Ok(()) => true,
            Err(e) => {
                warn!("Skipping daily record {}: {e}", day.date);
                summary.daily_skipped += 1;
                false
            }
        })
        .cloned()
        .collect();
    summary.daily_imported = count(daily.len());

    let streak = data.streak.clone().filter(|s| match validate_streak(s) {
        Ok(()) => true,
        Err(e) => {
            warn!("Skipping streak: {e}");
            summary.streak_skipped = true;
            false
        }
    });
    summary.streak_imported = streak.is_some();

    let achievements = data.achievements.as_ref().map(|list| {
        let mut seen = HashSet::new();
        let kept: Vec<Achievement> = list
            .iter()
            .filter(|a| match validate_achievement(a) {
                Ok(()) if seen.insert(a.id.clone()) => true,
                Ok(()) => {
                    warn!("Skipping duplicate achievement {}", a.id);
                    summary.achievements_skipped += 1;
                    false
                }
                Err(e) => {
                    warn!("Skipping achievement: {e}");
                    summary.achievements_skipped += 1;
                    false
                }
            })
            .cloned()
            .collect();
        summary.achievements_imported = count(kept.len());
        kept
    });

    let accepted = ExportData {
        version: data.version,
        exported_at: data.exported_at.clone(),
        profile,
        entries,
        daily,
        streak,
        achievements,
    };
    (accepted, summary)
}

/// Read/write operations for the UI layer. Every call goes to the store;
/// nothing is cached here.
pub struct Tracker {
    store: Box<dyn Store>,
    // Serializes multi-record sequences (streak check-in, achievement
    // refresh, import) that span more than one store call.
    sequence: Mutex<()>,
}

impl Tracker {
    #[must_use]
    pub fn new(store: Box<dyn Store>) -> Self {
        Self {
            store,
            sequence: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn open(backend: Backend, path: &Path) -> Self {
        Self::new(open_store(backend, path))
    }

    #[must_use]
    pub fn in_memory(backend: Backend) -> Self {
        Self::new(open_in_memory(backend))
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    // --- Day view ---

    pub fn get_day_view(&self, date: &str) -> Result<DayView> {
        let day = parse_day_key(date)?;
        let entries = self.store.list_entries_for_date(day)?;
        let daily = self.store.get_daily(day)?;
        let totals = sum_nutrients(&entries);
        let has_data = !entries.is_empty() || daily.is_some();
        Ok(DayView {
            date: format_day_key(day),
            entries,
            daily,
            totals,
            has_data,
        })
    }

    // --- Food entries ---

    pub fn add_food(&self, entry: &NewFoodEntry) -> Result<FoodEntry> {
        self.store.put_entry(entry)
    }

    pub fn get_food(&self, id: i64) -> Result<Option<FoodEntry>> {
        self.store.get_entry(id)
    }

    /// Returns `false` if no entry had that id.
    pub fn remove_food(&self, id: i64) -> Result<bool> {
        self.store.delete_entry(id)
    }

    // --- Daily data ---

    /// Set the day's water count. Overwrites; does not add.
    pub fn update_water(&self, date: &str, glasses: i64) -> Result<DailyData> {
        let day = parse_day_key(date)?;
        if glasses < 0 {
            return Err(Error::validation("water_glasses must not be negative"));
        }
        self.store
            .update_daily(day, &mut |d| d.water_glasses = glasses)
    }

    pub fn log_weight(&self, date: &str, weight: f64) -> Result<DailyData> {
        let day = parse_day_key(date)?;
        validate_weight(weight)?;
        self.store.update_daily(day, &mut |d| d.weight = Some(weight))
    }

    pub fn clear_weight(&self, date: &str) -> Result<DailyData> {
        let day = parse_day_key(date)?;
        self.store.update_daily(day, &mut |d| d.weight = None)
    }

    /// Blank notes clear the field.
    pub fn set_notes(&self, date: &str, notes: Option<&str>) -> Result<DailyData> {
        let day = parse_day_key(date)?;
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.store
            .update_daily(day, &mut |d| d.notes.clone_from(&notes))
    }

    // --- Trend ---

    /// The last `days` days ending today, newest first.
    pub fn load_trend(&self, days: usize) -> Result<Vec<TrendPoint>> {
        self.load_trend_ending(dates::today(), days)
    }

    pub fn load_trend_ending(&self, end: NaiveDate, days: usize) -> Result<Vec<TrendPoint>> {
        dates::date_range_ending(end, days)
            .into_iter()
            .map(|date| {
                let day = parse_day_key(&date)?;
                let totals = sum_nutrients(&self.store.list_entries_for_date(day)?);
                let daily = self.store.get_daily(day)?;
                Ok(TrendPoint {
                    date,
                    calories: totals.calories,
                    protein: totals.protein,
                    carbs: totals.carbs,
                    fat: totals.fat,
                    water_glasses: daily.as_ref().map_or(0, |d| d.water_glasses),
                    weight: daily.and_then(|d| d.weight),
                })
            })
            .collect()
    }

    // --- Streak ---

    pub fn streak(&self) -> Result<StreakData> {
        Ok(self.store.get_streak()?.unwrap_or_default())
    }

    /// Count `today` toward the streak if it has at least one entry.
    pub fn check_in(&self, today: NaiveDate) -> Result<StreakData> {
        let _sequence = self.sequence.lock()?;
        let has_logged_today = !self.store.list_entries_for_date(today)?.is_empty();
        let mut streak = self.streak()?;
        if streak.check_in(today, has_logged_today) {
            self.store.put_streak(&streak)?;
            debug!(
                "Streak now {} (longest {})",
                streak.current_streak, streak.longest_streak
            );
        }
        Ok(streak)
    }

    // --- Profile ---

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.store.put_profile(profile)
    }

    pub fn profile(&self) -> Result<Option<UserProfile>> {
        self.store.get_profile()
    }

    /// Compute targets from onboarding answers and save the resulting profile.
    pub fn onboard(&self, input: &ProfileInput) -> Result<UserProfile> {
        let profile = goals::build_profile(input)?;
        self.store.put_profile(&profile)?;
        info!(
            "Saved profile for {} ({} kcal/day)",
            profile.name, profile.daily_calorie_target
        );
        Ok(profile)
    }

    pub fn water_target(&self) -> Result<i64> {
        Ok(self
            .store
            .get_profile()?
            .map_or(DEFAULT_WATER_TARGET, |p| p.water_target))
    }

    // --- Achievements ---

    /// The persisted collection, or the built-in defaults if none was saved.
    pub fn achievements(&self) -> Result<Vec<Achievement>> {
        Ok(self
            .store
            .get_achievements()?
            .unwrap_or_else(achievements::default_achievements))
    }

    fn achievement_stats(&self) -> Result<AchievementStats> {
        let entries = self.store.list_entries()?;
        let max_water_glasses = self
            .store
            .list_daily()?
            .iter()
            .map(|d| d.water_glasses)
            .max()
            .unwrap_or(0);
        let longest_streak = self.streak()?.longest_streak;

        let protein_goal_days = match self.store.get_profile()? {
            Some(profile) => {
                let mut protein_by_day: BTreeMap<&str, f64> = BTreeMap::new();
                for e in &entries {
                    *protein_by_day.entry(e.date.as_str()).or_default() += e.protein;
                }
                #[allow(clippy::cast_precision_loss)]
                let target = profile.protein_target as f64;
                count(protein_by_day.values().filter(|&&p| p >= target).count())
            }
            None => 0,
        };

        Ok(AchievementStats {
            entries_logged: count(entries.len()),
            max_water_glasses,
            longest_streak,
            protein_goal_days,
        })
    }

    /// Re-evaluate progress from the stored log and persist the result.
    pub fn refresh_achievements(&self, now: &str) -> Result<Vec<Achievement>> {
        let _sequence = self.sequence.lock()?;
        let stats = self.achievement_stats()?;
        let mut list = self.achievements()?;
        let before: Vec<bool> = list.iter().map(Achievement::is_unlocked).collect();
        achievements::evaluate(&mut list, &stats, now);
        for (a, was_unlocked) in list.iter().zip(before) {
            if a.is_unlocked() && !was_unlocked {
                info!("Achievement unlocked: {}", a.title);
            }
        }
        self.store.put_achievements(&list)?;
        Ok(list)
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            profile: self.store.get_profile()?,
            entries: self.store.list_entries()?,
            daily: self.store.list_daily()?,
            streak: self.store.get_streak()?,
            achievements: self.store.get_achievements()?,
        })
    }

    /// Replace all stored data with `data`. Records that fail validation are
    /// skipped and counted; the rest are written in a single store write, so
    /// a storage error leaves the previous data in place.
    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        if data.version > EXPORT_VERSION {
            return Err(Error::validation(format!(
                "Unsupported export version {} (newest supported is {EXPORT_VERSION})",
                data.version
            )));
        }
        let (accepted, summary) = screen_import(data);

        let _sequence = self.sequence.lock()?;
        self.store.replace_all(&accepted)?;

        info!(
            "Imported {} entries and {} daily records ({} skipped)",
            summary.entries_imported,
            summary.daily_imported,
            summary.entries_skipped + summary.daily_skipped
        );
        Ok(summary)
    }

    pub fn write_entries_csv<W: Write>(&self, writer: W) -> Result<()> {
        export::write_entries_csv(&self.store.list_entries()?, writer)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.store.clear_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{FIRST_MEAL, PROTEIN_POWER, WATER_WARRIOR, WEEK_STREAK};
    use crate::models::{ActivityLevel, Goal, MealType};

    const BACKENDS: [Backend; 2] = [Backend::Sqlite, Backend::KeyValue];

    fn day(s: &str) -> NaiveDate {
        parse_day_key(s).unwrap()
    }

    fn food(date: &str, name: &str, calories: i64, protein: f64) -> NewFoodEntry {
        NewFoodEntry {
            protein,
            ..NewFoodEntry::quick(day(date), name, calories, MealType::Lunch)
        }
    }

    fn onboarding() -> ProfileInput {
        ProfileInput {
            name: "Alex".to_string(),
            age: 25.0,
            gender: "male".to_string(),
            height: 170.0,
            weight: 150.0,
            activity_level: ActivityLevel::Moderate,
            goal: Goal::LoseWeight,
        }
    }

    #[test]
    fn test_day_view_totals() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            for (name, cal) in [("Eggs", 300), ("Salad", 450), ("Apple", 150)] {
                t.add_food(&food("2024-03-01", name, cal, 0.0)).unwrap();
            }
            let view = t.get_day_view("2024-03-01").unwrap();
            assert!(view.has_data);
            assert_eq!(view.entries.len(), 3);
            assert_eq!(view.totals.calories, 900);
            assert!(view.daily.is_none());
        }
    }

    #[test]
    fn test_empty_day_view() {
        let t = Tracker::in_memory(Backend::Sqlite);
        let view = t.get_day_view("2024-03-09").unwrap();
        assert!(!view.has_data);
        assert!(view.entries.is_empty());
        assert_eq!(view.totals.calories, 0);

        t.update_water("2024-03-09", 1).unwrap();
        assert!(t.get_day_view("2024-03-09").unwrap().has_data);
    }

    #[test]
    fn test_bad_date_rejected() {
        let t = Tracker::in_memory(Backend::KeyValue);
        assert!(t.get_day_view("2024/03/01").unwrap_err().is_validation());
        assert!(t.update_water("yesterday", 2).unwrap_err().is_validation());
    }

    #[test]
    fn test_water_overwrites() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            t.update_water("2024-03-01", 5).unwrap();
            let data = t.update_water("2024-03-01", 3).unwrap();
            assert_eq!(data.water_glasses, 3);
            let stored = t.get_day_view("2024-03-01").unwrap().daily.unwrap();
            assert_eq!(stored.water_glasses, 3);
            assert!(t.update_water("2024-03-01", -1).unwrap_err().is_validation());
        }
    }

    #[test]
    fn test_weight_and_notes_keep_water() {
        let t = Tracker::in_memory(Backend::Sqlite);
        t.update_water("2024-03-01", 4).unwrap();
        t.log_weight("2024-03-01", 151.5).unwrap();
        let data = t.set_notes("2024-03-01", Some("  long run  ")).unwrap();
        assert_eq!(data.water_glasses, 4);
        assert_eq!(data.weight, Some(151.5));
        assert_eq!(data.notes.as_deref(), Some("long run"));

        let cleared = t.set_notes("2024-03-01", Some("   ")).unwrap();
        assert!(cleared.notes.is_none());
        assert!(t.clear_weight("2024-03-01").unwrap().weight.is_none());
        assert!(t.log_weight("2024-03-01", 0.0).unwrap_err().is_validation());
    }

    #[test]
    fn test_concurrent_water_and_weight_keep_both() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            for _ in 0..20 {
                std::thread::scope(|s| {
                    s.spawn(|| t.update_water("2024-03-01", 6).unwrap());
                    s.spawn(|| t.log_weight("2024-03-01", 149.0).unwrap());
                });
                let data = t.get_day_view("2024-03-01").unwrap().daily.unwrap();
                assert_eq!(data.water_glasses, 6);
                assert_eq!(data.weight, Some(149.0));
                t.clear_all().unwrap();
            }
        }
    }

    #[test]
    fn test_remove_food() {
        let t = Tracker::in_memory(Backend::Sqlite);
        let a = t.add_food(&food("2024-03-01", "A", 100, 0.0)).unwrap();
        t.add_food(&food("2024-03-01", "B", 200, 0.0)).unwrap();
        assert!(t.remove_food(a.id).unwrap());
        assert!(!t.remove_food(a.id).unwrap());
        assert!(!t.remove_food(12_345).unwrap());
        let view = t.get_day_view("2024-03-01").unwrap();
        assert_eq!(view.totals.calories, 200);
        assert!(t.get_food(a.id).unwrap().is_none());
    }

    #[test]
    fn test_trend_newest_first() {
        let t = Tracker::in_memory(Backend::KeyValue);
        t.add_food(&food("2024-03-07", "Dinner", 700, 30.0)).unwrap();
        t.add_food(&food("2024-03-05", "Lunch", 500, 20.0)).unwrap();
        t.log_weight("2024-03-05", 150.0).unwrap();

        let trend = t.load_trend_ending(day("2024-03-07"), 7).unwrap();
        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].date, "2024-03-07");
        assert_eq!(trend[0].calories, 700);
        assert_eq!(trend[2].date, "2024-03-05");
        assert_eq!(trend[2].calories, 500);
        assert_eq!(trend[2].weight, Some(150.0));
        assert_eq!(trend[6].date, "2024-03-01");
        assert_eq!(trend[6].calories, 0);
        assert!(trend[1].weight.is_none());

        assert!(t.load_trend(0).unwrap().is_empty());
        assert_eq!(t.load_trend(30).unwrap().len(), 30);
    }

    #[test]
    fn test_check_in_requires_entry_and_is_idempotent() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            assert_eq!(t.check_in(day("2024-03-01")).unwrap(), StreakData::default());

            t.add_food(&food("2024-03-01", "A", 100, 0.0)).unwrap();
            let first = t.check_in(day("2024-03-01")).unwrap();
            assert_eq!(first.current_streak, 1);
            assert_eq!(t.check_in(day("2024-03-01")).unwrap(), first);

            t.add_food(&food("2024-03-02", "B", 100, 0.0)).unwrap();
            let second = t.check_in(day("2024-03-02")).unwrap();
            assert_eq!(second.current_streak, 2);
            assert_eq!(second.total_days_logged, 2);
            assert_eq!(t.streak().unwrap(), second);

            t.add_food(&food("2024-03-05", "C", 100, 0.0)).unwrap();
            let reset = t.check_in(day("2024-03-05")).unwrap();
            assert_eq!(reset.current_streak, 1);
            assert_eq!(reset.longest_streak, 2);
        }
    }

    #[test]
    fn test_onboard_and_water_target() {
        let t = Tracker::in_memory(Backend::Sqlite);
        assert_eq!(t.water_target().unwrap(), DEFAULT_WATER_TARGET);
        assert!(t.profile().unwrap().is_none());

        let profile = t.onboard(&onboarding()).unwrap();
        assert_eq!(profile.daily_calorie_target, 3286);
        assert_eq!(t.profile().unwrap(), Some(profile.clone()));

        t.save_profile(&UserProfile {
            water_target: 10,
            ..profile
        })
        .unwrap();
        assert_eq!(t.water_target().unwrap(), 10);

        let bad = ProfileInput {
            weight: f64::NAN,
            ..onboarding()
        };
        assert!(t.onboard(&bad).unwrap_err().is_validation());
    }

    #[test]
    fn test_achievements_default_then_refresh() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            assert_eq!(t.achievements().unwrap().len(), 4);
            assert!(t.store().get_achievements().unwrap().is_none());

            t.onboard(&onboarding()).unwrap();
            // protein target is 120 g
            t.add_food(&food("2024-03-01", "Chicken", 400, 80.0)).unwrap();
            t.add_food(&food("2024-03-01", "Shake", 200, 45.0)).unwrap();
            t.add_food(&food("2024-03-02", "Tofu", 300, 60.0)).unwrap();
            t.update_water("2024-03-02", 9).unwrap();

            let list = t.refresh_achievements("2024-03-02T20:00:00+00:00").unwrap();
            let get = |id: &str| list.iter().find(|a| a.id == id).unwrap().clone();
            assert!(get(FIRST_MEAL).is_unlocked());
            assert!(get(WATER_WARRIOR).is_unlocked());
            assert!(!get(WEEK_STREAK).is_unlocked());
            let protein = get(PROTEIN_POWER);
            assert!((protein.progress - 1.0).abs() < f64::EPSILON);

            assert_eq!(t.achievements().unwrap(), list);

            let again = t.refresh_achievements("later").unwrap();
            let first = again.iter().find(|a| a.id == FIRST_MEAL).unwrap();
            assert_eq!(first.unlocked_at.as_deref(), Some("2024-03-02T20:00:00+00:00"));
        }
    }

    #[test]
    fn test_protein_power_without_profile_is_zero() {
        let t = Tracker::in_memory(Backend::Sqlite);
        t.add_food(&food("2024-03-01", "Steak", 600, 200.0)).unwrap();
        let list = t.refresh_achievements("now").unwrap();
        let protein = list.iter().find(|a| a.id == PROTEIN_POWER).unwrap();
        assert!(protein.progress.abs() < f64::EPSILON);
    }

    #[test]
    fn test_export_clear_import_round_trip() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            t.onboard(&onboarding()).unwrap();
            t.add_food(&food("2024-03-01", "A", 100, 10.0)).unwrap();
            t.add_food(&food("2024-03-02", "B", 200, 20.0)).unwrap();
            t.update_water("2024-03-01", 7).unwrap();
            t.log_weight("2024-03-02", 148.0).unwrap();
            t.check_in(day("2024-03-01")).unwrap();
            t.refresh_achievements("2024-03-02T00:00:00+00:00").unwrap();

            let exported = t.export_all().unwrap();
            let json = serde_json::to_string_pretty(&exported).unwrap();

            t.clear_all().unwrap();
            assert!(!t.get_day_view("2024-03-01").unwrap().has_data);

            let parsed = export::parse_export(&json).unwrap();
            let summary = t.import_all(&parsed).unwrap();
            assert!(summary.profile_imported);
            assert_eq!(summary.entries_imported, 2);
            assert_eq!(summary.daily_imported, 2);
            assert!(summary.streak_imported);
            assert_eq!(summary.achievements_imported, 4);

            let again = t.export_all().unwrap();
            assert_eq!(again.profile, exported.profile);
            assert_eq!(again.entries, exported.entries);
            assert_eq!(again.daily, exported.daily);
            assert_eq!(again.streak, exported.streak);
            assert_eq!(again.achievements, exported.achievements);

            // ids keep advancing after an import
            let next = t.add_food(&food("2024-03-03", "C", 50, 0.0)).unwrap();
            assert!(exported.entries.iter().all(|e| e.id < next.id));
        }
    }

    #[test]
    fn test_import_skips_invalid_rows() {
        let t = Tracker::in_memory(Backend::Sqlite);
        t.add_food(&food("2024-03-01", "Stale", 100, 0.0)).unwrap();

        let good = t.add_food(&food("2024-03-02", "Good", 100, 0.0)).unwrap();
        let mut bad = good.clone();
        bad.id = good.id + 1;
        bad.date = "not a date".to_string();
        let data = ExportData {
            version: EXPORT_VERSION,
            exported_at: "2024-03-02T00:00:00+00:00".to_string(),
            profile: None,
            entries: vec![good.clone(), bad],
            daily: vec![DailyData {
                water_glasses: -2,
                ..DailyData::empty("2024-03-02")
            }],
            streak: None,
            achievements: None,
        };
        let summary = t.import_all(&data).unwrap();
        assert_eq!(summary.entries_imported, 1);
        assert_eq!(summary.entries_skipped, 1);
        assert_eq!(summary.daily_skipped, 1);
        assert_eq!(t.export_all().unwrap().entries, vec![good]);
    }

    #[test]
    fn test_import_rejects_newer_version() {
        let t = Tracker::in_memory(Backend::KeyValue);
        t.add_food(&food("2024-03-01", "Keep", 100, 0.0)).unwrap();
        let mut data = t.export_all().unwrap();
        data.version = EXPORT_VERSION + 1;
        assert!(t.import_all(&data).unwrap_err().is_validation());
        assert_eq!(t.export_all().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_save_profile_rejects_invalid_values() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            let profile = goals::build_profile(&onboarding()).unwrap();
            let nan_height = UserProfile {
                height: f64::NAN,
                ..profile.clone()
            };
            assert!(t.save_profile(&nan_height).unwrap_err().is_validation());
            let negative = UserProfile {
                weight: -5.0,
                water_target: -3,
                ..profile.clone()
            };
            assert!(t.save_profile(&negative).unwrap_err().is_validation());
            assert!(t.profile().unwrap().is_none());
            assert_eq!(t.water_target().unwrap(), DEFAULT_WATER_TARGET);

            t.save_profile(&profile).unwrap();
            assert_eq!(t.profile().unwrap(), Some(profile));
        }
    }

    #[test]
    fn test_import_skips_invalid_streak_and_achievements() {
        for backend in BACKENDS {
            let t = Tracker::in_memory(backend);
            let mut list = achievements::default_achievements();
            list[0].progress = f64::NAN;
            let duplicate = list[1].clone();
            list.push(duplicate);
            let profile = UserProfile {
                height: f64::NAN,
                ..goals::build_profile(&onboarding()).unwrap()
            };
            let data = ExportData {
                version: EXPORT_VERSION,
                exported_at: "2024-03-02T00:00:00+00:00".to_string(),
                profile: Some(profile),
                entries: Vec::new(),
                daily: Vec::new(),
                streak: Some(StreakData {
                    current_streak: 9,
                    longest_streak: 2,
                    last_log_date: Some("garbage".to_string()),
                    total_days_logged: -4,
                }),
                achievements: Some(list),
            };

            let summary = t.import_all(&data).unwrap();
            assert!(!summary.profile_imported);
            assert!(summary.profile_skipped);
            assert!(!summary.streak_imported);
            assert!(summary.streak_skipped);
            assert_eq!(summary.achievements_imported, 3);
            assert_eq!(summary.achievements_skipped, 2);

            assert!(t.profile().unwrap().is_none());
            assert_eq!(t.streak().unwrap(), StreakData::default());
            let ids: Vec<String> = t.achievements().unwrap().into_iter().map(|a| a.id).collect();
            assert_eq!(ids, vec![WATER_WARRIOR, WEEK_STREAK, PROTEIN_POWER]);
        }
    }

    #[test]
    fn test_failed_import_keeps_previous_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutrilog.json");
        let t = Tracker::open(Backend::KeyValue, &path);
        t.onboard(&onboarding()).unwrap();
        t.add_food(&food("2024-03-01", "Kept", 100, 10.0)).unwrap();
        let before = t.export_all().unwrap();

        let mut incoming = before.clone();
        incoming.profile = None;
        incoming.entries.clear();
        incoming.daily = vec![DailyData::empty("2024-03-05")];

        // the temp file cannot be written, so the document write fails
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let err = t.import_all(&incoming).unwrap_err();
        assert!(!err.is_validation());

        let after = t.export_all().unwrap();
        assert_eq!(after.profile, before.profile);
        assert_eq!(after.entries, before.entries);
        assert!(after.daily.is_empty());
    }

    #[test]
    fn test_entries_csv() {
        let t = Tracker::in_memory(Backend::Sqlite);
        t.add_food(&food("2024-03-01", "Rice", 200, 4.0)).unwrap();
        let mut out = Vec::new();
        t.write_entries_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id,date,meal_type,name"));
        assert!(text.contains(",2024-03-01,lunch,Rice,200,4.0,"));
    }

    #[test]
    fn test_file_tracker_persists() {
        for backend in BACKENDS {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(backend.file_name());
            {
                let t = Tracker::open(backend, &path);
                t.onboard(&onboarding()).unwrap();
                t.add_food(&food("2024-03-01", "Oats", 300, 10.0)).unwrap();
            }
            let t = Tracker::open(backend, &path);
            assert!(t.profile().unwrap().is_some());
            assert_eq!(t.get_day_view("2024-03-01").unwrap().totals.calories, 300);
        }
    }
}
