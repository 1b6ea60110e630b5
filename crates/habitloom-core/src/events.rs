use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::habit::HabitKind;

/// Every state change in the engine produces an Event.
/// The CLI prints them as JSON; they are the observable log surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CompletionLogged {
        habit_id: Uuid,
        kind: HabitKind,
        goal_met: bool,
        at: DateTime<Utc>,
    },
    /// Daily goal transitioned from not-met to met; counters updated.
    GoalCrossed {
        habit_id: Uuid,
        current_streak: u32,
        longest_streak: u32,
        total_completions: u64,
        at: DateTime<Utc>,
    },
    /// Ethereal habit completed and deactivated.
    HabitRetired {
        habit_id: Uuid,
        at: DateTime<Utc>,
    },
    CopingPlanUsed {
        habit_id: Uuid,
        plan: String,
        at: DateTime<Utc>,
    },
    JournalLogged {
        habit_id: Uuid,
        mood_score: Option<u8>,
        at: DateTime<Utc>,
    },
    SessionStarted {
        habit_id: Uuid,
        base_elapsed_secs: u64,
        allows_overrun: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        habit_id: Uuid,
        /// Minutes persisted by this pause; None when progress was
        /// discarded or nothing had elapsed.
        saved_minutes: Option<f64>,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Goal crossed while ticking with overrun disallowed; the segment
    /// was persisted and the session stopped. Raised once per crossing.
    SessionAutoStopped {
        habit_id: Uuid,
        saved_minutes: f64,
        minutes_today: f64,
        at: DateTime<Utc>,
    },
    StreakRepaired {
        habit_id: Uuid,
        previous: u32,
        recomputed: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        habit_id: Uuid,
        elapsed_secs: u64,
        is_running: bool,
        is_finished: bool,
        at: DateTime<Utc>,
    },
}
