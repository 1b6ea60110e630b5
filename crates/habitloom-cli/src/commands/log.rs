use clap::Subcommand;
use habitloom_core::storage::Database;
use habitloom_core::tracker::{self, CompletionEntry};
use habitloom_core::{HabitKind, SystemClock};

use crate::common::{find_habit, parse_step_indices};

#[derive(Subcommand)]
pub enum LogAction {
    /// Log a completion (frequency and ethereal habits)
    Done {
        habit: String,
        /// Override the amount (defaults to the habit's metric value)
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Mark routine steps complete, zero-based (e.g. "0,2")
    Steps { habit: String, steps: String },
    /// Log timer minutes without a live session
    Minutes { habit: String, minutes: f64 },
    /// Journal-only entry; never counts toward progress
    Journal {
        habit: String,
        /// Mood score 1-5
        #[arg(long)]
        mood: Option<u8>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Use the coping plan for yesterday's missed day
    Cope { habit: String },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    let clock = SystemClock;

    match action {
        LogAction::Done { habit, amount } => {
            let mut habit = find_habit(&db, &habit)?;
            let entry = match habit.kind {
                HabitKind::Frequency => CompletionEntry::Amount(amount),
                HabitKind::Ethereal => CompletionEntry::Done,
                HabitKind::Routine => {
                    return Err("routine habits are logged with `log steps`".into())
                }
                HabitKind::Timer => {
                    return Err("timer habits are logged with `log minutes` or a session".into())
                }
            };
            let events = tracker::log_completion(&mut db, &mut habit, &clock, entry)?;
            for event in events {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        LogAction::Steps { habit, steps } => {
            let mut habit = find_habit(&db, &habit)?;
            if habit.kind != HabitKind::Routine {
                return Err("`log steps` only applies to routine habits".into());
            }
            let steps = parse_step_indices(&steps)?;
            if let Some(bad) = steps.iter().find(|s| **s >= habit.routine_steps.len()) {
                return Err(format!(
                    "step index {bad} out of range (habit has {} steps)",
                    habit.routine_steps.len()
                )
                .into());
            }
            let events = tracker::log_completion(
                &mut db,
                &mut habit,
                &clock,
                CompletionEntry::Steps(steps),
            )?;
            for event in events {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        LogAction::Minutes { habit, minutes } => {
            let mut habit = find_habit(&db, &habit)?;
            if habit.kind != HabitKind::Timer {
                return Err("`log minutes` only applies to timer habits".into());
            }
            if minutes <= 0.0 {
                return Err("minutes must be positive".into());
            }
            let events = tracker::log_completion(
                &mut db,
                &mut habit,
                &clock,
                CompletionEntry::Minutes(minutes),
            )?;
            for event in events {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        LogAction::Journal { habit, mood, notes } => {
            let habit = find_habit(&db, &habit)?;
            let event = tracker::log_journal(&mut db, &habit, &clock, mood, notes)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        LogAction::Cope { habit } => {
            let mut habit = find_habit(&db, &habit)?;
            let event = tracker::apply_coping_plan(&mut db, &mut habit, &clock)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }
    Ok(())
}
