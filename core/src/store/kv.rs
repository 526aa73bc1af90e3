use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::{SINGLETON_KEY, Store};
use crate::error::{Error, Result};
use crate::models::{
    Achievement, DailyData, ExportData, FoodEntry, NewFoodEntry, StreakData, UserProfile,
    format_day_key, validate_achievements, validate_daily, validate_export, validate_food_entry,
    validate_new_entry, validate_profile, validate_streak,
};

const PROFILE_NS: &str = "profile";
const ENTRY_NS: &str = "entry";
const DAILY_NS: &str = "daily";
const STREAK_NS: &str = "streak";
const ACHIEVEMENTS_NS: &str = "achievements";
const NEXT_ENTRY_ID_KEY: &str = "meta/next_entry_id";
const SCHEMA_VERSION_KEY: &str = "meta/schema_version";
const SCHEMA_VERSION: i64 = 1;

fn key(namespace: &str, id: impl std::fmt::Display) -> String {
    format!("{namespace}/{id}")
}

/// Flat map of namespaced keys to JSON values.
#[derive(Debug, Clone, Default)]
struct Document {
    values: BTreeMap<String, Value>,
}

impl Document {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    fn set<T: Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        self.values.insert(key, serde_json::to_value(value)?);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    fn namespace<T: DeserializeOwned>(&self, namespace: &str) -> Result<Vec<T>> {
        let prefix = format!("{namespace}/");
        self.values
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| Ok(T::deserialize(v)?))
            .collect()
    }

    fn entries(&self) -> Result<Vec<FoodEntry>> {
        let mut entries: Vec<FoodEntry> = self.namespace(ENTRY_NS)?;
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    fn next_entry_id(&mut self) -> Result<i64> {
        let id = self.get::<i64>(NEXT_ENTRY_ID_KEY)?.unwrap_or(1);
        self.set(NEXT_ENTRY_ID_KEY.to_string(), &(id + 1))?;
        Ok(id)
    }

    /// Keep the id counter ahead of explicitly written ids.
    fn reserve_entry_id(&mut self, id: i64) -> Result<()> {
        let next = self.get::<i64>(NEXT_ENTRY_ID_KEY)?.unwrap_or(1);
        if id >= next {
            self.set(NEXT_ENTRY_ID_KEY.to_string(), &(id + 1))?;
        }
        Ok(())
    }

    /// Drop every record namespace; `meta/` keys survive.
    fn clear_records(&mut self) {
        for namespace in [PROFILE_NS, ENTRY_NS, DAILY_NS, STREAK_NS, ACHIEVEMENTS_NS] {
            let prefix = format!("{namespace}/");
            self.values.retain(|k, _| !k.starts_with(&prefix));
        }
    }

    fn daily_or_empty(&self, date: &str) -> Result<DailyData> {
        Ok(self
            .get(&key(DAILY_NS, date))?
            .unwrap_or_else(|| DailyData::empty(date)))
    }
}

/// Key-value store of JSON records, persisted as a single document file.
///
/// The file is read on the first operation. Each write replaces it
/// atomically via a temporary file and rename; a failed write leaves both
/// the file and the in-memory document unchanged.
pub struct KvStore {
    path: Option<PathBuf>,
    doc: Mutex<Option<Document>>,
}

impl KvStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            doc: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load(&self) -> Result<Document> {
        let Some(path) = &self.path else {
            debug!("Opening in-memory key-value store");
            return Ok(Document::default());
        };
        if path.exists() {
            debug!("Loading key-value store from {}", path.display());
            let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            let values: BTreeMap<String, Value> = serde_json::from_str(&raw)?;
            return Ok(Document { values });
        }

        info!("Creating key-value store at {}", path.display());
        let mut doc = Document::default();
        doc.set(SCHEMA_VERSION_KEY.to_string(), &SCHEMA_VERSION)?;
        self.persist(&doc)?;
        Ok(doc)
    }

    fn persist(&self, doc: &Document) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&doc.values)?;
        fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> Result<T>) -> Result<T> {
        let mut guard = self.doc.lock()?;
        let doc = match guard.take() {
            Some(doc) => doc,
            None => self.load()?,
        };
        let result = f(&doc);
        *guard = Some(doc);
        result
    }

    /// Apply `f` to a copy of the document and commit it only if both `f`
    /// and the file write succeed.
    fn write<T>(&self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let mut guard = self.doc.lock()?;
        let doc = match guard.take() {
            Some(doc) => doc,
            None => self.load()?,
        };
        let mut next = doc.clone();
        let outcome = f(&mut next).and_then(|value| {
            self.persist(&next)?;
            Ok(value)
        });
        *guard = Some(if outcome.is_ok() { next } else { doc });
        outcome
    }
}

impl Store for KvStore {
    fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        validate_profile(profile)?;
        self.write(|doc| doc.set(key(PROFILE_NS, SINGLETON_KEY), profile))
    }

    fn get_profile(&self) -> Result<Option<UserProfile>> {
        self.read(|doc| doc.get(&key(PROFILE_NS, SINGLETON_KEY)))
    }

    fn put_entry(&self, entry: &NewFoodEntry) -> Result<FoodEntry> {
        validate_new_entry(entry)?;
        self.write(|doc| {
            let (id, created_at) = match entry.id {
                Some(id) => {
                    let existing: Option<FoodEntry> = doc.get(&key(ENTRY_NS, id))?;
                    doc.reserve_entry_id(id)?;
                    let created_at = existing
                        .map_or_else(|| Local::now().to_rfc3339(), |e| e.created_at);
                    (id, created_at)
                }
                None => (doc.next_entry_id()?, Local::now().to_rfc3339()),
            };
            let stored = FoodEntry {
                id,
                date: format_day_key(entry.date),
                name: entry.name.trim().to_string(),
                calories: entry.calories,
                protein: entry.protein,
                carbs: entry.carbs,
                fat: entry.fat,
                serving_size: entry.serving_size,
                serving_unit: entry.serving_unit.clone(),
                meal_type: entry.meal_type,
                created_at,
            };
            doc.set(key(ENTRY_NS, id), &stored)?;
            debug!("Saved food entry {id} for {}", stored.date);
            Ok(stored)
        })
    }

    fn restore_entry(&self, entry: &FoodEntry) -> Result<()> {
        validate_food_entry(entry)?;
        self.write(|doc| {
            doc.reserve_entry_id(entry.id)?;
            doc.set(key(ENTRY_NS, entry.id), entry)
        })
    }

    fn get_entry(&self, id: i64) -> Result<Option<FoodEntry>> {
        self.read(|doc| doc.get(&key(ENTRY_NS, id)))
    }

    fn list_entries_for_date(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        let date = format_day_key(date);
        self.read(|doc| {
            let mut entries = doc.entries()?;
            entries.retain(|e| e.date == date);
            Ok(entries)
        })
    }

    fn list_entries(&self) -> Result<Vec<FoodEntry>> {
        self.read(|doc| {
            let mut entries = doc.entries()?;
            entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
            Ok(entries)
        })
    }

    fn delete_entry(&self, id: i64) -> Result<bool> {
        let entry_key = key(ENTRY_NS, id);
        if !self.read(|doc| Ok(doc.values.contains_key(&entry_key)))? {
            return Ok(false);
        }
        self.write(|doc| {
            let removed = doc.remove(&entry_key);
            debug!("Deleted food entry {id}");
            Ok(removed)
        })
    }

    fn logged_dates(&self) -> Result<Vec<String>> {
        self.read(|doc| {
            let dates: BTreeSet<String> = doc.entries()?.into_iter().map(|e| e.date).collect();
            Ok(dates.into_iter().rev().collect())
        })
    }

    fn put_daily(&self, data: &DailyData) -> Result<()> {
        validate_daily(data)?;
        self.write(|doc| doc.set(key(DAILY_NS, &data.date), data))
    }

    fn get_daily(&self, date: NaiveDate) -> Result<Option<DailyData>> {
        self.read(|doc| doc.get(&key(DAILY_NS, format_day_key(date))))
    }

    fn update_daily(
        &self,
        date: NaiveDate,
        mutate: &mut dyn FnMut(&mut DailyData),
    ) -> Result<DailyData> {
        let date = format_day_key(date);
        self.write(|doc| {
            let mut data = doc.daily_or_empty(&date)?;
            mutate(&mut data);
            data.date.clone_from(&date);
            validate_daily(&data)?;
            doc.set(key(DAILY_NS, &date), &data)?;
            Ok(data)
        })
    }

    fn list_daily(&self) -> Result<Vec<DailyData>> {
        self.read(|doc| {
            let mut days: Vec<DailyData> = doc.namespace(DAILY_NS)?;
            days.reverse();
            Ok(days)
        })
    }

    fn get_streak(&self) -> Result<Option<StreakData>> {
        self.read(|doc| doc.get(&key(STREAK_NS, SINGLETON_KEY)))
    }

    fn put_streak(&self, data: &StreakData) -> Result<()> {
        validate_streak(data)?;
        self.write(|doc| doc.set(key(STREAK_NS, SINGLETON_KEY), data))
    }

    fn get_achievements(&self) -> Result<Option<Vec<Achievement>>> {
        self.read(|doc| doc.get(&key(ACHIEVEMENTS_NS, SINGLETON_KEY)))
    }

    fn put_achievements(&self, achievements: &[Achievement]) -> Result<()> {
        validate_achievements(achievements)?;
        self.write(|doc| doc.set(key(ACHIEVEMENTS_NS, SINGLETON_KEY), &achievements))
    }

    fn clear_all(&self) -> Result<()> {
        self.write(|doc| {
            doc.clear_records();
            info!("Cleared all stored data");
            Ok(())
        })
    }

    fn replace_all(&self, data: &ExportData) -> Result<()> {
        validate_export(data)?;
        self.write(|doc| {
            doc.clear_records();
            if let Some(profile) = &data.profile {
                doc.set(key(PROFILE_NS, SINGLETON_KEY), profile)?;
            }
            for entry in &data.entries {
                doc.reserve_entry_id(entry.id)?;
                doc.set(key(ENTRY_NS, entry.id), entry)?;
            }
            for day in &data.daily {
                doc.set(key(DAILY_NS, &day.date), day)?;
            }
            if let Some(streak) = &data.streak {
                doc.set(key(STREAK_NS, SINGLETON_KEY), streak)?;
            }
            if let Some(list) = &data.achievements {
                doc.set(key(ACHIEVEMENTS_NS, SINGLETON_KEY), list)?;
            }
            info!(
                "Replaced stored data with {} entries and {} daily records",
                data.entries.len(),
                data.daily.len()
            );
            Ok(())
        })
    }
}
