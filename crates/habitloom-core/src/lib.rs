//! # Habitloom Core Library
//!
//! This library provides the core business logic for the Habitloom habit
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI being a thin layer
//! over the same core library.
//!
//! ## Architecture
//!
//! - **Schedule Evaluator**: pure date predicates deciding when a habit
//!   is due
//! - **Progress Aggregator**: one dispatch point turning a day's records
//!   into progress per habit kind
//! - **Streak Policy**: goal-crossing counter updates plus the
//!   coping-plan grace and a from-scratch recovery walk
//! - **Timer Sessions**: wall-clock stopwatch state machines owned by a
//!   [`SessionManager`]; the caller drives `tick()` periodically
//! - **Storage**: SQLite habit/record store and TOML configuration
//!
//! ## Key Components
//!
//! - [`Habit`] / [`CompletionRecord`]: the tracked entities
//! - [`SessionManager`]: timer session registry and persistence
//! - [`Database`]: habit, record and statistics persistence
//! - [`Clock`]: injectable time source so tests can fix "today"

pub mod bitmask;
pub mod broadcast;
pub mod clock;
pub mod error;
pub mod events;
pub mod habit;
pub mod progress;
pub mod schedule;
pub mod storage;
pub mod streak;
pub mod timer;
pub mod tracker;

pub use broadcast::{ActivityAttributes, ActivityState, BroadcastSink, JsonLinesSink, NullSink};
pub use clock::{Clock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use habit::{CompletionRecord, Habit, HabitKind, ScheduleKind};
pub use progress::{compute_progress, Progress, ProgressDetail};
pub use storage::{Config, Database};
pub use timer::{SessionManager, TickOutcome, TimerSession};
pub use tracker::{CompletionEntry, DueHabit};
