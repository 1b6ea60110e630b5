//! SQLite-backed habit and completion record storage.
//!
//! Provides persistent storage for:
//! - Habits and their running statistics
//! - The append-only completion record log
//! - Coping-plan uses (queryable history behind `last_coping`)
//! - Key-value store for application state
//!
//! Multi-field updates that must land together (record append + streak
//! counters) go through explicit transactions, so a crash cannot commit
//! one side without the other.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

use crate::clock::day_bounds;
use crate::error::{CoreError, DatabaseError};
use crate::habit::{CompletionRecord, Habit, HabitKind, ScheduleKind};

use super::data_dir;

/// SQLite database holding habits, records and coping uses.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/habitloom/habitloom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("habitloom.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS habits (
                    id               TEXT PRIMARY KEY,
                    name             TEXT NOT NULL,
                    icon             TEXT NOT NULL DEFAULT '',
                    color_hex        TEXT NOT NULL DEFAULT '',
                    kind             TEXT NOT NULL,
                    schedule         TEXT NOT NULL,
                    schedule_mask    INTEGER NOT NULL DEFAULT 0,
                    metric_value     REAL NOT NULL,
                    metric_unit      TEXT NOT NULL DEFAULT '',
                    goal_value       REAL NOT NULL,
                    target_frequency INTEGER NOT NULL DEFAULT 0,
                    routine_steps    TEXT NOT NULL DEFAULT '[]',
                    coping_plan      TEXT,
                    current_streak   INTEGER NOT NULL DEFAULT 0,
                    longest_streak   INTEGER NOT NULL DEFAULT 0,
                    total_completions INTEGER NOT NULL DEFAULT 0,
                    last_completed   TEXT,
                    last_coping      TEXT,
                    created_at       TEXT NOT NULL,
                    is_active        INTEGER NOT NULL DEFAULT 1
                );

                CREATE TABLE IF NOT EXISTS completion_records (
                    id              TEXT PRIMARY KEY,
                    habit_id        TEXT NOT NULL,
                    completed_at    TEXT NOT NULL,
                    metric_amount   REAL NOT NULL DEFAULT 0,
                    timer_minutes   REAL NOT NULL DEFAULT 0,
                    completed_steps TEXT NOT NULL DEFAULT '',
                    is_journal_only INTEGER NOT NULL DEFAULT 0,
                    mood_score      INTEGER,
                    notes           TEXT
                );

                CREATE TABLE IF NOT EXISTS coping_uses (
                    habit_id TEXT NOT NULL,
                    used_on  TEXT NOT NULL,
                    used_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_records_habit_completed
                    ON completion_records(habit_id, completed_at);
                CREATE INDEX IF NOT EXISTS idx_coping_habit_used
                    ON coping_uses(habit_id, used_on);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Habits ───────────────────────────────────────────────────────

    pub fn insert_habit(&self, habit: &Habit) -> Result<(), DatabaseError> {
        let steps = serde_json::to_string(&habit.routine_steps)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO habits (
                id, name, icon, color_hex, kind, schedule, schedule_mask,
                metric_value, metric_unit, goal_value, target_frequency,
                routine_steps, coping_plan, current_streak, longest_streak,
                total_completions, last_completed, last_coping, created_at, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                habit.id.to_string(),
                habit.name,
                habit.icon,
                habit.color_hex,
                habit.kind.as_str(),
                habit.schedule.as_str(),
                habit.schedule_mask,
                habit.metric_value,
                habit.metric_unit,
                habit.goal_value,
                habit.target_frequency,
                steps,
                habit.coping_plan,
                habit.current_streak,
                habit.longest_streak,
                habit.total_completions as i64,
                habit.last_completed.map(|t| t.to_rfc3339()),
                habit.last_coping.map(|t| t.to_rfc3339()),
                habit.created_at.to_rfc3339(),
                habit.is_active,
            ],
        )?;
        Ok(())
    }

    pub fn update_habit(&self, habit: &Habit) -> Result<(), DatabaseError> {
        update_habit_tx(&self.conn, habit)
    }

    pub fn get_habit(&self, id: Uuid) -> Result<Option<Habit>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, icon, color_hex, kind, schedule, schedule_mask,
                    metric_value, metric_unit, goal_value, target_frequency,
                    routine_steps, coping_plan, current_streak, longest_streak,
                    total_completions, last_completed, last_coping, created_at, is_active
             FROM habits WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id.to_string()], habit_from_row);
        match result {
            Ok(habit) => Ok(Some(habit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>, DatabaseError> {
        let sql = if active_only {
            "SELECT id, name, icon, color_hex, kind, schedule, schedule_mask,
                    metric_value, metric_unit, goal_value, target_frequency,
                    routine_steps, coping_plan, current_streak, longest_streak,
                    total_completions, last_completed, last_coping, created_at, is_active
             FROM habits WHERE is_active = 1 ORDER BY created_at"
        } else {
            "SELECT id, name, icon, color_hex, kind, schedule, schedule_mask,
                    metric_value, metric_unit, goal_value, target_frequency,
                    routine_steps, coping_plan, current_streak, longest_streak,
                    total_completions, last_completed, last_coping, created_at, is_active
             FROM habits ORDER BY created_at"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], habit_from_row)?;
        let mut habits = Vec::new();
        for row in rows {
            habits.push(row?);
        }
        Ok(habits)
    }

    // ── Completion records ───────────────────────────────────────────

    /// Append a record without touching habit statistics (journal
    /// entries and other non-crossing writes).
    pub fn append_record(&self, record: &CompletionRecord) -> Result<(), DatabaseError> {
        insert_record(&self.conn, record)?;
        Ok(())
    }

    /// All records for `habit_id` within `day`'s half-open window,
    /// oldest first. Journal-only rows are included; callers filter by
    /// `counts_toward_progress` where it matters.
    pub fn records_for_day(
        &self,
        habit_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, DatabaseError> {
        let (start, end) = day_bounds(day);
        self.query_records(
            "SELECT id, habit_id, completed_at, metric_amount, timer_minutes,
                    completed_steps, is_journal_only, mood_score, notes
             FROM completion_records
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at < ?3
             ORDER BY completed_at",
            params![habit_id.to_string(), start.to_rfc3339(), end.to_rfc3339()],
        )
    }

    /// Records within `[from, until)` by calendar day.
    pub fn records_between(
        &self,
        habit_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, DatabaseError> {
        let (start, _) = day_bounds(from);
        let (end, _) = day_bounds(until);
        self.query_records(
            "SELECT id, habit_id, completed_at, metric_amount, timer_minutes,
                    completed_steps, is_journal_only, mood_score, notes
             FROM completion_records
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at < ?3
             ORDER BY completed_at",
            params![habit_id.to_string(), start.to_rfc3339(), end.to_rfc3339()],
        )
    }

    /// Persisted timer minutes for one day (journal rows excluded).
    pub fn minutes_for_day(&self, habit_id: Uuid, day: NaiveDate) -> Result<f64, DatabaseError> {
        let (start, end) = day_bounds(day);
        let minutes = self.conn.query_row(
            "SELECT COALESCE(SUM(timer_minutes), 0)
             FROM completion_records
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at < ?3
               AND is_journal_only = 0",
            params![habit_id.to_string(), start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get::<_, f64>(0),
        )?;
        Ok(minutes)
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<CompletionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, record_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    // ── Transactions ─────────────────────────────────────────────────

    /// Append a completion record and persist the habit's statistics
    /// fields in one atomic commit.
    pub fn commit_completion(
        &mut self,
        habit: &Habit,
        record: &CompletionRecord,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        insert_record(&tx, record)?;
        update_habit_tx(&tx, habit)?;
        tx.commit()?;
        Ok(())
    }

    /// Record a coping-plan use: habit's `last_coping` plus a row in the
    /// queryable history, atomically.
    pub fn commit_coping_use(
        &mut self,
        habit: &Habit,
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO coping_uses (habit_id, used_on, used_at) VALUES (?1, ?2, ?3)",
            params![habit.id.to_string(), day.to_string(), at.to_rfc3339()],
        )?;
        update_habit_tx(&tx, habit)?;
        tx.commit()?;
        Ok(())
    }

    /// Days on which the coping plan was used, on or after `since`.
    pub fn coping_days(
        &self,
        habit_id: Uuid,
        since: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT used_on FROM coping_uses WHERE habit_id = ?1 AND used_on >= ?2",
        )?;
        let rows = stmt.query_map(
            params![habit_id.to_string(), since.to_string()],
            |row| row.get::<_, String>(0),
        )?;
        let mut days = HashSet::new();
        for row in rows {
            let raw = row?;
            let day = NaiveDate::from_str(&raw)
                .map_err(|e| DatabaseError::QueryFailed(format!("bad date '{raw}': {e}")))?;
            days.insert(day);
        }
        Ok(days)
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ── Row mapping ──────────────────────────────────────────────────────

fn update_habit_tx(conn: &Connection, habit: &Habit) -> Result<(), DatabaseError> {
    let steps = serde_json::to_string(&habit.routine_steps)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let changed = conn.execute(
        "UPDATE habits SET
            name = ?2, icon = ?3, color_hex = ?4, kind = ?5, schedule = ?6,
            schedule_mask = ?7, metric_value = ?8, metric_unit = ?9,
            goal_value = ?10, target_frequency = ?11, routine_steps = ?12,
            coping_plan = ?13, current_streak = ?14, longest_streak = ?15,
            total_completions = ?16, last_completed = ?17, last_coping = ?18,
            created_at = ?19, is_active = ?20
         WHERE id = ?1",
        params![
            habit.id.to_string(),
            habit.name,
            habit.icon,
            habit.color_hex,
            habit.kind.as_str(),
            habit.schedule.as_str(),
            habit.schedule_mask,
            habit.metric_value,
            habit.metric_unit,
            habit.goal_value,
            habit.target_frequency,
            steps,
            habit.coping_plan,
            habit.current_streak,
            habit.longest_streak,
            habit.total_completions as i64,
            habit.last_completed.map(|t| t.to_rfc3339()),
            habit.last_coping.map(|t| t.to_rfc3339()),
            habit.created_at.to_rfc3339(),
            habit.is_active,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity: "habit",
            id: habit.id.to_string(),
        });
    }
    Ok(())
}

fn insert_record(conn: &Connection, record: &CompletionRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO completion_records (
            id, habit_id, completed_at, metric_amount, timer_minutes,
            completed_steps, is_journal_only, mood_score, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id.to_string(),
            record.habit_id.to_string(),
            record.completed_at.to_rfc3339(),
            record.metric_amount,
            record.timer_minutes,
            record.completed_steps,
            record.is_journal_only,
            record.mood_score.map(|m| m as i64),
            record.notes,
        ],
    )?;
    Ok(())
}

fn parse_err(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn parse_uuid(raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| parse_err(format!("bad uuid '{raw}': {e}")))
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| parse_err(format!("bad timestamp '{raw}': {e}")))
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let id: String = row.get(0)?;
    let kind: String = row.get(4)?;
    let schedule: String = row.get(5)?;
    let steps: String = row.get(11)?;
    let last_completed: Option<String> = row.get(16)?;
    let last_coping: Option<String> = row.get(17)?;
    let created_at: String = row.get(18)?;

    Ok(Habit {
        id: parse_uuid(&id)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        color_hex: row.get(3)?,
        kind: HabitKind::parse(&kind)
            .ok_or_else(|| parse_err(format!("unknown habit kind '{kind}'")))?,
        schedule: ScheduleKind::parse(&schedule)
            .ok_or_else(|| parse_err(format!("unknown schedule '{schedule}'")))?,
        schedule_mask: row.get(6)?,
        metric_value: row.get(7)?,
        metric_unit: row.get(8)?,
        goal_value: row.get(9)?,
        target_frequency: row.get(10)?,
        routine_steps: serde_json::from_str(&steps)
            .map_err(|e| parse_err(format!("bad routine steps: {e}")))?,
        coping_plan: row.get(12)?,
        current_streak: row.get(13)?,
        longest_streak: row.get(14)?,
        total_completions: row.get::<_, i64>(15)? as u64,
        last_completed: last_completed.as_deref().map(parse_timestamp).transpose()?,
        last_coping: last_coping.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created_at)?,
        is_active: row.get(19)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CompletionRecord> {
    let id: String = row.get(0)?;
    let habit_id: String = row.get(1)?;
    let completed_at: String = row.get(2)?;
    Ok(CompletionRecord {
        id: parse_uuid(&id)?,
        habit_id: parse_uuid(&habit_id)?,
        completed_at: parse_timestamp(&completed_at)?,
        metric_amount: row.get(3)?,
        timer_minutes: row.get(4)?,
        completed_steps: row.get(5)?,
        is_journal_only: row.get(6)?,
        mood_score: row.get::<_, Option<i64>>(7)?.map(|m| m as u8),
        notes: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn habit() -> Habit {
        Habit::new(
            "Read",
            HabitKind::Frequency,
            ScheduleKind::Daily,
            30.0,
            10.0,
            "pages",
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn habit_round_trip() {
        let db = Database::open_memory().unwrap();
        let mut h = habit();
        h.set_weekly_days(&[2, 4, 6]);
        h.routine_steps = vec!["warm up".into(), "run".into()];
        h.coping_plan = Some("walk around the block".into());
        h.last_completed = Some(Utc.with_ymd_and_hms(2024, 3, 3, 21, 0, 0).unwrap());
        db.insert_habit(&h).unwrap();

        let loaded = db.get_habit(h.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Read");
        assert_eq!(loaded.weekly_days(), vec![2, 4, 6]);
        assert_eq!(loaded.routine_steps, h.routine_steps);
        assert_eq!(loaded.last_completed, h.last_completed);
        assert_eq!(loaded.target_frequency, 3);
    }

    #[test]
    fn missing_habit_is_none() {
        let db = Database::open_memory().unwrap();
        assert!(db.get_habit(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn update_unknown_habit_fails() {
        let db = Database::open_memory().unwrap();
        let err = db.update_habit(&habit()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn list_habits_filters_inactive() {
        let db = Database::open_memory().unwrap();
        let mut active = habit();
        active.name = "Active".into();
        let mut retired = habit();
        retired.name = "Retired".into();
        retired.is_active = false;
        db.insert_habit(&active).unwrap();
        db.insert_habit(&retired).unwrap();

        assert_eq!(db.list_habits(true).unwrap().len(), 1);
        assert_eq!(db.list_habits(false).unwrap().len(), 2);
    }

    #[test]
    fn day_window_is_half_open() {
        let db = Database::open_memory().unwrap();
        let h = habit();
        db.insert_habit(&h).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        let inside_start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let inside_end = Utc.with_ymd_and_hms(2024, 3, 4, 23, 59, 59).unwrap();
        let next_midnight = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        db.append_record(&CompletionRecord::with_amount(h.id, inside_start, 1.0))
            .unwrap();
        db.append_record(&CompletionRecord::with_amount(h.id, inside_end, 2.0))
            .unwrap();
        db.append_record(&CompletionRecord::with_amount(h.id, next_midnight, 4.0))
            .unwrap();

        let records = db.records_for_day(h.id, day).unwrap();
        assert_eq!(records.len(), 2);
        let amounts: Vec<f64> = records.iter().map(|r| r.metric_amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0]);
    }

    #[test]
    fn minutes_for_day_skips_journal_rows() {
        let db = Database::open_memory().unwrap();
        let h = habit();
        db.insert_habit(&h).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        db.append_record(&CompletionRecord::timer_segment(h.id, at, 1.5))
            .unwrap();
        let mut journal = CompletionRecord::journal(h.id, at, Some(4), None);
        journal.timer_minutes = 99.0; // must not count
        db.append_record(&journal).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(db.minutes_for_day(h.id, day).unwrap(), 1.5);
    }

    #[test]
    fn commit_completion_is_atomic_per_call() {
        let mut db = Database::open_memory().unwrap();
        let mut h = habit();
        db.insert_habit(&h).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        h.current_streak = 1;
        h.total_completions = 1;
        h.last_completed = Some(at);
        db.commit_completion(&h, &CompletionRecord::with_amount(h.id, at, 30.0))
            .unwrap();

        let loaded = db.get_habit(h.id).unwrap().unwrap();
        assert_eq!(loaded.current_streak, 1);
        assert_eq!(loaded.total_completions, 1);
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(db.records_for_day(h.id, day).unwrap().len(), 1);
    }

    #[test]
    fn commit_completion_rolls_back_when_habit_is_missing() {
        let mut db = Database::open_memory().unwrap();
        let h = habit(); // never inserted
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let record = CompletionRecord::with_amount(h.id, at, 30.0);
        assert!(db.commit_completion(&h, &record).is_err());

        // The record append must have rolled back with the failed update.
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert!(db.records_for_day(h.id, day).unwrap().is_empty());
    }

    #[test]
    fn coping_days_come_back_as_dates() {
        let mut db = Database::open_memory().unwrap();
        let mut h = habit();
        h.coping_plan = Some("stretch".into());
        db.insert_habit(&h).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
        h.last_coping = Some(at);
        db.commit_coping_use(&h, day, at).unwrap();

        let since = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = db.coping_days(h.id, since).unwrap();
        assert!(days.contains(&day));
        assert_eq!(db.get_habit(h.id).unwrap().unwrap().last_coping, Some(at));
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }
}
