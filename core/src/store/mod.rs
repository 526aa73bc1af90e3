//! Record stores: durable CRUD for profile, food entries, daily data,
//! streak and achievements behind one trait.
//!
//! Both backends create their schema lazily on first use. Every operation
//! runs under the store's lock, so concurrent first-use callers share a
//! single initialization and [`Store::update_daily`] is an atomic
//! read-modify-write.

mod kv;
mod sqlite;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{
    Achievement, DailyData, ExportData, FoodEntry, NewFoodEntry, StreakData, UserProfile,
};

pub use kv::KvStore;
pub use sqlite::SqliteStore;

/// Key used for collections that hold exactly one record.
pub const SINGLETON_KEY: &str = "singleton";

pub trait Store: Send + Sync {
    fn put_profile(&self, profile: &UserProfile) -> Result<()>;
    fn get_profile(&self) -> Result<Option<UserProfile>>;

    /// Append a new entry (`id: None`) or replace the entry with the given id.
    /// Replacing keeps the original `created_at`.
    fn put_entry(&self, entry: &NewFoodEntry) -> Result<FoodEntry>;
    /// Write an entry exactly as given, id and timestamp included.
    fn restore_entry(&self, entry: &FoodEntry) -> Result<()>;
    fn get_entry(&self, id: i64) -> Result<Option<FoodEntry>>;
    /// Entries for one day in insertion order.
    fn list_entries_for_date(&self, date: NaiveDate) -> Result<Vec<FoodEntry>>;
    fn list_entries(&self) -> Result<Vec<FoodEntry>>;
    /// Returns `false` when no entry had that id.
    fn delete_entry(&self, id: i64) -> Result<bool>;
    /// Distinct dates with at least one entry, newest first.
    fn logged_dates(&self) -> Result<Vec<String>>;

    fn put_daily(&self, data: &DailyData) -> Result<()>;
    fn get_daily(&self, date: NaiveDate) -> Result<Option<DailyData>>;
    /// Read the day's record (or an empty one), apply `mutate`, validate and
    /// write it back without releasing the store lock.
    fn update_daily(
        &self,
        date: NaiveDate,
        mutate: &mut dyn FnMut(&mut DailyData),
    ) -> Result<DailyData>;
    /// All daily records, newest first.
    fn list_daily(&self) -> Result<Vec<DailyData>>;

    fn get_streak(&self) -> Result<Option<StreakData>>;
    fn put_streak(&self, data: &StreakData) -> Result<()>;

    /// `None` until a collection has been saved.
    fn get_achievements(&self) -> Result<Option<Vec<Achievement>>>;
    fn put_achievements(&self, achievements: &[Achievement]) -> Result<()>;

    fn clear_all(&self) -> Result<()>;
    /// Swap every collection for the contents of `data` in one write. The
    /// whole export is validated first; on any error the stored data is
    /// left as it was.
    fn replace_all(&self, data: &ExportData) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Sqlite,
    KeyValue,
}

impl Backend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::KeyValue => "json",
        }
    }

    /// File name used for this backend inside a data directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Backend::Sqlite => "nutrilog.db",
            Backend::KeyValue => "nutrilog.json",
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "json" | "kv" => Ok(Backend::KeyValue),
            _ => Err(Error::validation(format!(
                "Invalid backend '{s}'. Must be one of: sqlite, json"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construct a file-backed store. No I/O happens until the first operation.
#[must_use]
pub fn open_store(backend: Backend, path: &Path) -> Box<dyn Store> {
    match backend {
        Backend::Sqlite => Box::new(SqliteStore::open(path)),
        Backend::KeyValue => Box::new(KvStore::open(path)),
    }
}

#[must_use]
pub fn open_in_memory(backend: Backend) -> Box<dyn Store> {
    match backend {
        Backend::Sqlite => Box::new(SqliteStore::in_memory()),
        Backend::KeyValue => Box::new(KvStore::in_memory()),
    }
}
