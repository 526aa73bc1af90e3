use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::{SINGLETON_KEY, Store};
use crate::error::{Error, Result};
use crate::models::{
    Achievement, ActivityLevel, DEFAULT_WATER_TARGET, DailyData, ExportData, FoodEntry, Goal,
    MealType, NewFoodEntry, StreakData, UserProfile, format_day_key, validate_achievements,
    validate_daily, validate_export, validate_food_entry, validate_new_entry, validate_profile,
    validate_streak,
};

const ENTRY_COLUMNS: &str = "id, date, name, calories, protein, carbs, fat, serving_size, \
                             serving_unit, meal_type, created_at";

/// SQLite-backed store. The connection is opened and the schema created on
/// the first operation, not at construction.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            conn: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            conn: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn connect(&self) -> Result<Connection> {
        let conn = if let Some(path) = &self.path {
            debug!("Opening database at {}", path.display());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            Connection::open(path)?
        } else {
            debug!("Opening in-memory database");
            Connection::open_in_memory()?
        };
        conn.busy_timeout(Duration::from_secs(5))?;
        migrate(&conn)?;
        Ok(conn)
    }

    /// Run `f` with the connection, opening it first if needed. The lock is
    /// held for the whole call.
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock()?;
        let mut conn = match guard.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        let result = f(&mut conn);
        *guard = Some(conn);
        result
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        info!("Creating nutrilog schema");
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS user_profile (
                key TEXT PRIMARY KEY CHECK (key = 'singleton'),
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                height REAL NOT NULL,
                weight REAL NOT NULL,
                activity_level TEXT NOT NULL,
                goal TEXT NOT NULL,
                daily_calorie_target INTEGER NOT NULL,
                protein_target INTEGER NOT NULL,
                carbs_target INTEGER NOT NULL,
                fat_target INTEGER NOT NULL,
                water_target INTEGER,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS food_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                name TEXT NOT NULL,
                calories INTEGER NOT NULL DEFAULT 0,
                protein REAL NOT NULL DEFAULT 0,
                carbs REAL NOT NULL DEFAULT 0,
                fat REAL NOT NULL DEFAULT 0,
                serving_size REAL NOT NULL DEFAULT 1,
                serving_unit TEXT NOT NULL DEFAULT 'serving',
                meal_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_food_entries_date ON food_entries(date);

            CREATE TABLE IF NOT EXISTS daily_data (
                date TEXT PRIMARY KEY,
                water_glasses INTEGER NOT NULL DEFAULT 0,
                weight REAL,
                notes TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS streak_data (
                key TEXT PRIMARY KEY CHECK (key = 'singleton'),
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                last_log_date TEXT,
                total_days_logged INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS achievements (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                icon TEXT NOT NULL,
                progress REAL NOT NULL DEFAULT 0,
                target REAL NOT NULL,
                unlocked_at TEXT
            );

            PRAGMA user_version = 1;",
        )?;
    }

    Ok(())
}

// --- Column conversions ---

macro_rules! text_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_column!(MealType);
text_column!(ActivityLevel);
text_column!(Goal);

// --- Row mapping helpers ---

fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        name: row.get(0)?,
        age: row.get(1)?,
        gender: row.get(2)?,
        height: row.get(3)?,
        weight: row.get(4)?,
        activity_level: row.get(5)?,
        goal: row.get(6)?,
        daily_calorie_target: row.get(7)?,
        protein_target: row.get(8)?,
        carbs_target: row.get(9)?,
        fat_target: row.get(10)?,
        water_target: row
            .get::<_, Option<i64>>(11)?
            .unwrap_or(DEFAULT_WATER_TARGET),
    })
}

// Expects ENTRY_COLUMNS order.
fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodEntry> {
    Ok(FoodEntry {
        id: row.get(0)?,
        date: row.get(1)?,
        name: row.get(2)?,
        calories: row.get(3)?,
        protein: row.get(4)?,
        carbs: row.get(5)?,
        fat: row.get(6)?,
        serving_size: row.get(7)?,
        serving_unit: row.get(8)?,
        meal_type: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn daily_from_row(row: &rusqlite::Row) -> rusqlite::Result<DailyData> {
    Ok(DailyData {
        date: row.get(0)?,
        water_glasses: row.get(1)?,
        weight: row.get(2)?,
        notes: row.get(3)?,
    })
}

fn achievement_from_row(row: &rusqlite::Row) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        progress: row.get(4)?,
        target: row.get(5)?,
        unlocked_at: row.get(6)?,
    })
}

fn read_entry(conn: &Connection, id: i64) -> Result<Option<FoodEntry>> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM food_entries WHERE id = ?1"),
            params![id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

fn read_daily(conn: &Connection, date: &str) -> Result<Option<DailyData>> {
    let mut stmt = conn.prepare(
        "SELECT date, water_glasses, weight, notes FROM daily_data WHERE date = ?1",
    )?;
    let mut rows = stmt.query(params![date])?;
    if let Some(row) = rows.next()? {
        Ok(Some(daily_from_row(row)?))
    } else {
        Ok(None)
    }
}

fn write_daily(conn: &Connection, data: &DailyData) -> Result<()> {
    let now = Local::now().to_rfc3339();
    conn.execute(
        "INSERT INTO daily_data (date, water_glasses, weight, notes, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(date) DO UPDATE SET
            water_glasses = excluded.water_glasses,
            weight = excluded.weight,
            notes = excluded.notes,
            updated_at = excluded.updated_at",
        params![data.date, data.water_glasses, data.weight, data.notes, now],
    )?;
    Ok(())
}

fn write_profile(conn: &Connection, profile: &UserProfile) -> Result<()> {
    let now = Local::now().to_rfc3339();
    conn.execute(
        "INSERT INTO user_profile (key, name, age, gender, height, weight, activity_level, goal,
            daily_calorie_target, protein_target, carbs_target, fat_target, water_target, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(key) DO UPDATE SET
            name = excluded.name,
            age = excluded.age,
            gender = excluded.gender,
            height = excluded.height,
            weight = excluded.weight,
            activity_level = excluded.activity_level,
            goal = excluded.goal,
            daily_calorie_target = excluded.daily_calorie_target,
            protein_target = excluded.protein_target,
            carbs_target = excluded.carbs_target,
            fat_target = excluded.fat_target,
            water_target = excluded.water_target,
            updated_at = excluded.updated_at",
        params![
            SINGLETON_KEY,
            profile.name,
            profile.age,
            profile.gender,
            profile.height,
            profile.weight,
            profile.activity_level,
            profile.goal,
            profile.daily_calorie_target,
            profile.protein_target,
            profile.carbs_target,
            profile.fat_target,
            profile.water_target,
            now,
        ],
    )?;
    Ok(())
}

/// Write an entry as given, id and `created_at` included.
fn write_entry(conn: &Connection, entry: &FoodEntry) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO food_entries (id, date, name, calories, protein, carbs, fat,
            serving_size, serving_unit, meal_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            entry.id,
            entry.date,
            entry.name,
            entry.calories,
            entry.protein,
            entry.carbs,
            entry.fat,
            entry.serving_size,
            entry.serving_unit,
            entry.meal_type,
            entry.created_at,
        ],
    )?;
    Ok(())
}

fn write_streak(conn: &Connection, data: &StreakData) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO streak_data (key, current_streak, longest_streak, last_log_date, total_days_logged)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            SINGLETON_KEY,
            data.current_streak,
            data.longest_streak,
            data.last_log_date,
            data.total_days_logged,
        ],
    )?;
    Ok(())
}

// Callers wrap this in a transaction.
fn write_achievements(conn: &Connection, achievements: &[Achievement]) -> Result<()> {
    conn.execute("DELETE FROM achievements", [])?;
    for (position, a) in achievements.iter().enumerate() {
        conn.execute(
            "INSERT INTO achievements (id, position, title, description, icon, progress, target, unlocked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                a.id,
                position,
                a.title,
                a.description,
                a.icon,
                a.progress,
                a.target,
                a.unlocked_at,
            ],
        )?;
    }
    Ok(())
}

fn clear_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM user_profile;
         DELETE FROM food_entries;
         DELETE FROM daily_data;
         DELETE FROM streak_data;
         DELETE FROM achievements;",
    )?;
    Ok(())
}

impl Store for SqliteStore {
    // --- Profile ---

    fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        validate_profile(profile)?;
        self.with_conn(|conn| {
            write_profile(conn, profile)?;
            debug!("Saved profile for {}", profile.name);
            Ok(())
        })
    }

    fn get_profile(&self) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| {
            let profile = conn
                .query_row(
                    "SELECT name, age, gender, height, weight, activity_level, goal,
                            daily_calorie_target, protein_target, carbs_target, fat_target, water_target
                     FROM user_profile WHERE key = ?1",
                    params![SINGLETON_KEY],
                    profile_from_row,
                )
                .optional()?;
            Ok(profile)
        })
    }

    // --- Food entries ---

    fn put_entry(&self, entry: &NewFoodEntry) -> Result<FoodEntry> {
        validate_new_entry(entry)?;
        let date = format_day_key(entry.date);
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let existing: Option<String> = match entry.id {
                Some(id) => tx
                    .query_row(
                        "SELECT created_at FROM food_entries WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?,
                None => None,
            };
            let created_at = existing.unwrap_or_else(|| Local::now().to_rfc3339());
            tx.execute(
                "INSERT INTO food_entries (id, date, name, calories, protein, carbs, fat,
                    serving_size, serving_unit, meal_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    date = excluded.date,
                    name = excluded.name,
                    calories = excluded.calories,
                    protein = excluded.protein,
                    carbs = excluded.carbs,
                    fat = excluded.fat,
                    serving_size = excluded.serving_size,
                    serving_unit = excluded.serving_unit,
                    meal_type = excluded.meal_type",
                params![
                    entry.id,
                    date,
                    entry.name.trim(),
                    entry.calories,
                    entry.protein,
                    entry.carbs,
                    entry.fat,
                    entry.serving_size,
                    entry.serving_unit,
                    entry.meal_type,
                    created_at,
                ],
            )?;
            let id = entry.id.unwrap_or_else(|| tx.last_insert_rowid());
            let stored = tx.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM food_entries WHERE id = ?1"),
                params![id],
                entry_from_row,
            )?;
            tx.commit()?;
            debug!("Saved food entry {id} for {date}");
            Ok(stored)
        })
    }

    fn restore_entry(&self, entry: &FoodEntry) -> Result<()> {
        validate_food_entry(entry)?;
        self.with_conn(|conn| write_entry(conn, entry))
    }

    fn get_entry(&self, id: i64) -> Result<Option<FoodEntry>> {
        self.with_conn(|conn| read_entry(conn, id))
    }

    fn list_entries_for_date(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        let date_str = format_day_key(date);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM food_entries WHERE date = ?1 ORDER BY id"
            ))?;
            let entries = stmt
                .query_map(params![date_str], entry_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }

    fn list_entries(&self) -> Result<Vec<FoodEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM food_entries ORDER BY date, id"
            ))?;
            let entries = stmt
                .query_map([], entry_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }

    fn delete_entry(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM food_entries WHERE id = ?1", params![id])?;
            if rows > 0 {
                debug!("Deleted food entry {id}");
            }
            Ok(rows > 0)
        })
    }

    fn logged_dates(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT date FROM food_entries ORDER BY date DESC")?;
            let dates = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(dates)
        })
    }

    // --- Daily data ---

    fn put_daily(&self, data: &DailyData) -> Result<()> {
        validate_daily(data)?;
        self.with_conn(|conn| write_daily(conn, data))
    }

    fn get_daily(&self, date: NaiveDate) -> Result<Option<DailyData>> {
        let key = format_day_key(date);
        self.with_conn(|conn| read_daily(conn, &key))
    }

    fn update_daily(
        &self,
        date: NaiveDate,
        mutate: &mut dyn FnMut(&mut DailyData),
    ) -> Result<DailyData> {
        let key = format_day_key(date);
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut data = read_daily(&tx, &key)?.unwrap_or_else(|| DailyData::empty(&key));
            mutate(&mut data);
            data.date.clone_from(&key);
            validate_daily(&data)?;
            write_daily(&tx, &data)?;
            tx.commit()?;
            Ok(data)
        })
    }

    fn list_daily(&self) -> Result<Vec<DailyData>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT date, water_glasses, weight, notes FROM daily_data ORDER BY date DESC",
            )?;
            let days = stmt
                .query_map([], daily_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(days)
        })
    }

    // --- Streak ---

    fn get_streak(&self) -> Result<Option<StreakData>> {
        self.with_conn(|conn| {
            let streak = conn
                .query_row(
                    "SELECT current_streak, longest_streak, last_log_date, total_days_logged
                     FROM streak_data WHERE key = ?1",
                    params![SINGLETON_KEY],
                    |row| {
                        Ok(StreakData {
                            current_streak: row.get(0)?,
                            longest_streak: row.get(1)?,
                            last_log_date: row.get(2)?,
                            total_days_logged: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(streak)
        })
    }

    fn put_streak(&self, data: &StreakData) -> Result<()> {
        validate_streak(data)?;
        self.with_conn(|conn| write_streak(conn, data))
    }

    // --- Achievements ---

    fn get_achievements(&self) -> Result<Option<Vec<Achievement>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, icon, progress, target, unlocked_at
                 FROM achievements ORDER BY position",
            )?;
            let list = stmt
                .query_map([], achievement_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(if list.is_empty() { None } else { Some(list) })
        })
    }

    fn put_achievements(&self, achievements: &[Achievement]) -> Result<()> {
        validate_achievements(achievements)?;
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            write_achievements(&tx, achievements)?;
            tx.commit()?;
            Ok(())
        })
    }

    fn clear_all(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            clear_tables(&tx)?;
            tx.commit()?;
            info!("Cleared all stored data");
            Ok(())
        })
    }

    fn replace_all(&self, data: &ExportData) -> Result<()> {
        validate_export(data)?;
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            clear_tables(&tx)?;
            if let Some(profile) = &data.profile {
                write_profile(&tx, profile)?;
            }
            for entry in &data.entries {
                write_entry(&tx, entry)?;
            }
            for day in &data.daily {
                write_daily(&tx, day)?;
            }
            if let Some(streak) = &data.streak {
                write_streak(&tx, streak)?;
            }
            if let Some(list) = &data.achievements {
                write_achievements(&tx, list)?;
            }
            tx.commit()?;
            info!(
                "Replaced stored data with {} entries and {} daily records",
                data.entries.len(),
                data.daily.len()
            );
            Ok(())
        })
    }
}
