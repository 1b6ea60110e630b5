//! Habit and completion record types.
//!
//! A habit is governed by exactly one [`HabitKind`] branch; the kind
//! decides which progress computation applies and which record fields
//! are meaningful. Running statistics (`current_streak`, `longest_streak`,
//! `total_completions`, `last_completed`) are mutated only by the streak
//! policy and the completion-recording operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::bitmask;

/// Behavior type of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    /// Counted by number/amount of discrete completions against a daily goal.
    Frequency,
    /// Ordered checklist; done when all steps are marked for the day.
    Routine,
    /// Accumulates duration toward a daily minutes goal across sessions.
    Timer,
    /// One-shot task that self-deactivates on first completion.
    Ethereal,
}

impl HabitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitKind::Frequency => "frequency",
            HabitKind::Routine => "routine",
            HabitKind::Timer => "timer",
            HabitKind::Ethereal => "ethereal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "frequency" => Some(HabitKind::Frequency),
            "routine" => Some(HabitKind::Routine),
            "timer" => Some(HabitKind::Timer),
            "ethereal" => Some(HabitKind::Ethereal),
            _ => None,
        }
    }
}

/// Recurrence rule of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Daily,
    /// Specific weekdays, encoded in `schedule_mask` (bit 0 = Sunday).
    Weekly,
    /// Specific days of month, encoded in `schedule_mask` (bit 0 = day 1).
    Monthly,
    WeekdaysOnly,
    WeekendsOnly,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::Daily => "daily",
            ScheduleKind::Weekly => "weekly",
            ScheduleKind::Monthly => "monthly",
            ScheduleKind::WeekdaysOnly => "weekdays_only",
            ScheduleKind::WeekendsOnly => "weekends_only",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(ScheduleKind::Daily),
            "weekly" => Some(ScheduleKind::Weekly),
            "monthly" => Some(ScheduleKind::Monthly),
            "weekdays_only" => Some(ScheduleKind::WeekdaysOnly),
            "weekends_only" => Some(ScheduleKind::WeekendsOnly),
            _ => None,
        }
    }
}

/// A tracked habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    /// Icon name forwarded to the broadcast surface.
    #[serde(default)]
    pub icon: String,
    /// Accent color forwarded to the broadcast surface.
    #[serde(default)]
    pub color_hex: String,
    pub kind: HabitKind,
    pub schedule: ScheduleKind,
    /// Day mask for weekly/monthly schedules; unused otherwise.
    #[serde(default)]
    pub schedule_mask: u32,
    /// Amount added per discrete completion.
    pub metric_value: f64,
    /// Display unit for the metric.
    pub metric_unit: String,
    /// Daily target. For timer habits this is minutes.
    pub goal_value: f64,
    /// Completions/day needed to hit the goal. Derived at write time
    /// (`ceil(goal / metric)`) and treated as a display value only;
    /// goal-met is always computed from summed amounts.
    pub target_frequency: u32,
    /// Ordered step descriptions (routine habits only).
    #[serde(default)]
    pub routine_steps: Vec<String>,
    /// Optional fallback action; presence enables the coping-plan grace.
    #[serde(default)]
    pub coping_plan: Option<String>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub total_completions: u64,
    #[serde(default)]
    pub last_completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_coping: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Habit {
    pub fn new(
        name: impl Into<String>,
        kind: HabitKind,
        schedule: ScheduleKind,
        goal_value: f64,
        metric_value: f64,
        metric_unit: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut habit = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: String::new(),
            color_hex: String::new(),
            kind,
            schedule,
            schedule_mask: 0,
            metric_value,
            metric_unit: metric_unit.into(),
            goal_value,
            target_frequency: 0,
            routine_steps: Vec::new(),
            coping_plan: None,
            current_streak: 0,
            longest_streak: 0,
            total_completions: 0,
            last_completed: None,
            last_coping: None,
            created_at,
            is_active: true,
        };
        habit.recompute_target_frequency();
        habit
    }

    /// Re-derive `target_frequency` from the goal and metric. Called by
    /// the writer whenever either field changes.
    pub fn recompute_target_frequency(&mut self) {
        self.target_frequency = if self.metric_value > 0.0 {
            (self.goal_value / self.metric_value).ceil() as u32
        } else {
            0
        };
    }

    // ── Schedule mask helpers ────────────────────────────────────────

    /// Set a weekly schedule from weekday numbers (1 = Sunday .. 7 = Saturday).
    pub fn set_weekly_days(&mut self, days: &[u8]) {
        self.schedule = ScheduleKind::Weekly;
        self.schedule_mask = bitmask::from_days(days);
    }

    /// Weekday numbers of a weekly schedule, ascending.
    pub fn weekly_days(&self) -> Vec<u8> {
        bitmask::to_days(self.schedule_mask)
            .into_iter()
            .filter(|d| *d <= 7)
            .collect()
    }

    /// Set a monthly schedule from days of month (1..=31).
    pub fn set_monthly_days(&mut self, days: &[u8]) {
        self.schedule = ScheduleKind::Monthly;
        self.schedule_mask = bitmask::from_days(days);
    }

    /// Days of month of a monthly schedule, ascending.
    pub fn monthly_days(&self) -> Vec<u8> {
        bitmask::to_days(self.schedule_mask)
    }

    /// Daily goal expressed in seconds (timer habits).
    pub fn goal_secs(&self) -> u64 {
        (self.goal_value * 60.0).round().max(0.0) as u64
    }

    pub fn has_coping_plan(&self) -> bool {
        self.coping_plan
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }
}

/// One immutable completion/progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub completed_at: DateTime<Utc>,
    /// Amount contributed (frequency habits). Zero means "use the
    /// habit's metric_value".
    #[serde(default)]
    pub metric_amount: f64,
    /// Minutes contributed (timer habits); may be a partial segment.
    #[serde(default)]
    pub timer_minutes: f64,
    /// Comma-separated step indices completed in this event (routine).
    #[serde(default)]
    pub completed_steps: String,
    /// Journal-only records carry reflection and never count toward
    /// progress.
    #[serde(default)]
    pub is_journal_only: bool,
    #[serde(default)]
    pub mood_score: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CompletionRecord {
    fn base(habit_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id,
            completed_at: at,
            metric_amount: 0.0,
            timer_minutes: 0.0,
            completed_steps: String::new(),
            is_journal_only: false,
            mood_score: None,
            notes: None,
        }
    }

    /// Plain completion carrying an explicit amount.
    pub fn with_amount(habit_id: Uuid, at: DateTime<Utc>, amount: f64) -> Self {
        let mut r = Self::base(habit_id, at);
        r.metric_amount = amount;
        r
    }

    /// One persisted timer segment.
    pub fn timer_segment(habit_id: Uuid, at: DateTime<Utc>, minutes: f64) -> Self {
        let mut r = Self::base(habit_id, at);
        r.timer_minutes = minutes;
        r
    }

    /// Routine steps completed in this event.
    pub fn routine(habit_id: Uuid, at: DateTime<Utc>, steps: &[usize]) -> Self {
        let mut r = Self::base(habit_id, at);
        r.completed_steps = steps
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");
        r
    }

    /// Reflection-only entry; excluded from all progress math.
    pub fn journal(
        habit_id: Uuid,
        at: DateTime<Utc>,
        mood_score: Option<u8>,
        notes: Option<String>,
    ) -> Self {
        let mut r = Self::base(habit_id, at);
        r.is_journal_only = true;
        r.mood_score = mood_score;
        r.notes = notes;
        r
    }

    pub fn counts_toward_progress(&self) -> bool {
        !self.is_journal_only
    }

    /// Parsed step indices. Malformed fragments are skipped.
    pub fn step_indices(&self) -> BTreeSet<usize> {
        self.completed_steps
            .split(',')
            .filter_map(|s| s.trim().parse::<usize>().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn habit(kind: HabitKind) -> Habit {
        Habit::new("Read", kind, ScheduleKind::Daily, 30.0, 10.0, "pages", Utc::now())
    }

    #[test]
    fn target_frequency_is_ceiling() {
        let h = habit(HabitKind::Frequency);
        assert_eq!(h.target_frequency, 3);

        let mut h = habit(HabitKind::Frequency);
        h.goal_value = 25.0;
        h.recompute_target_frequency();
        assert_eq!(h.target_frequency, 3); // ceil(25 / 10)
    }

    #[test]
    fn weekly_days_round_trip() {
        let mut h = habit(HabitKind::Frequency);
        h.set_weekly_days(&[2, 4]); // Mon, Wed
        assert_eq!(h.weekly_days(), vec![2, 4]);
    }

    proptest! {
        #[test]
        fn weekly_days_round_trip_any_subset(days in proptest::collection::btree_set(1u8..=7, 1..=7)) {
            let days: Vec<u8> = days.into_iter().collect();
            let mut h = habit(HabitKind::Frequency);
            h.set_weekly_days(&days);
            prop_assert_eq!(h.weekly_days(), days);
        }
    }

    #[test]
    fn monthly_days_round_trip() {
        let mut h = habit(HabitKind::Frequency);
        h.set_monthly_days(&[1, 15, 31]);
        assert_eq!(h.monthly_days(), vec![1, 15, 31]);
    }

    #[test]
    fn step_indices_dedup_and_skip_garbage() {
        let mut r = CompletionRecord::routine(Uuid::new_v4(), Utc::now(), &[2, 0, 2]);
        r.completed_steps.push_str(",x,");
        let parsed = r.step_indices();
        assert_eq!(parsed.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn journal_records_do_not_count() {
        let r = CompletionRecord::journal(Uuid::new_v4(), Utc::now(), Some(4), None);
        assert!(!r.counts_toward_progress());
        assert_eq!(r.mood_score, Some(4));
    }

    #[test]
    fn habit_serialization() {
        let mut h = habit(HabitKind::Routine);
        h.routine_steps = vec!["stretch".into(), "meditate".into()];
        h.coping_plan = Some("one deep breath".into());
        let json = serde_json::to_string(&h).unwrap();
        let decoded: Habit = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.routine_steps.len(), 2);
        assert!(decoded.has_coping_plan());
    }
}
