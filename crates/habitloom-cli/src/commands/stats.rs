use clap::Subcommand;
use habitloom_core::storage::Database;
use habitloom_core::tracker;
use habitloom_core::{ProgressDetail, SystemClock};

use crate::common::find_habit;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Habits due today with their progress
    Today {
        #[arg(long)]
        json: bool,
    },
    /// Streak summary for one habit
    Streak { habit: String },
    /// Recompute a streak from the record log and fix the counter
    Repair { habit: String },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    let clock = SystemClock;

    match action {
        StatsAction::Today { json } => {
            let due = tracker::due_today(&db, &clock)?;
            if json {
                let rows: Vec<serde_json::Value> = due
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "id": d.habit.id,
                            "name": d.habit.name,
                            "kind": d.habit.kind,
                            "completed": d.completed,
                            "progress": d.progress,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if due.is_empty() {
                println!("Nothing due today.");
            } else {
                for d in due {
                    let mark = if d.completed { "x" } else { " " };
                    let detail = match &d.progress.detail {
                        ProgressDetail::Frequency { amount, .. } => {
                            format!("{amount:.0}/{:.0} {}", d.habit.goal_value, d.habit.metric_unit)
                        }
                        ProgressDetail::Routine { steps_done, steps_total } => {
                            format!("{}/{} steps", steps_done.len(), steps_total)
                        }
                        ProgressDetail::Timer { minutes } => {
                            format!("{minutes:.1}/{:.0} min", d.habit.goal_value)
                        }
                        ProgressDetail::Ethereal { .. } => "one-shot".to_string(),
                    };
                    println!("[{mark}] {:<24} {detail}", d.habit.name);
                }
            }
        }
        StatsAction::Streak { habit } => {
            let habit = find_habit(&db, &habit)?;
            println!(
                "{}: current {} / longest {} / lifetime completions {}",
                habit.name, habit.current_streak, habit.longest_streak, habit.total_completions
            );
            if let Some(last) = habit.last_completed {
                println!("last completed: {last}");
            }
            if let Some(coped) = habit.last_coping {
                println!("last coping use: {coped}");
            }
        }
        StatsAction::Repair { habit } => {
            let mut habit = find_habit(&db, &habit)?;
            let previous = habit.current_streak;
            let recomputed = tracker::repair_streak(&mut db, &mut habit, &clock)?;
            if previous == recomputed {
                println!("Streak already consistent ({recomputed}).");
            } else {
                println!("Streak repaired: {previous} -> {recomputed}.");
            }
        }
    }
    Ok(())
}
