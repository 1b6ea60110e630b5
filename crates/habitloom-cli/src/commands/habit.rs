use clap::Subcommand;
use habitloom_core::schedule::next_scheduled_date;
use habitloom_core::storage::{Config, Database};
use habitloom_core::{Clock, Habit, HabitKind, ScheduleKind, SystemClock, ValidationError};

use crate::common::{find_habit, parse_days};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        name: String,
        /// frequency | routine | timer | ethereal
        #[arg(long, default_value = "frequency")]
        kind: String,
        /// daily | weekly | monthly | weekdays_only | weekends_only
        #[arg(long, default_value = "daily")]
        schedule: String,
        /// Comma-separated weekday (1=Sun..7=Sat) or day-of-month numbers
        #[arg(long)]
        days: Option<String>,
        /// Daily target (minutes for timer habits)
        #[arg(long)]
        goal: Option<f64>,
        /// Amount added per completion
        #[arg(long)]
        metric: Option<f64>,
        /// Display unit for the metric
        #[arg(long)]
        unit: Option<String>,
        /// Comma-separated routine step descriptions
        #[arg(long)]
        steps: Option<String>,
        /// Coping plan fallback action
        #[arg(long)]
        coping: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// List habits
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show one habit as JSON
    Show { habit: String },
    /// Change the daily goal (and optionally the metric value)
    SetGoal {
        habit: String,
        goal: f64,
        #[arg(long)]
        metric: Option<f64>,
    },
    /// Archive a habit (soft delete; history is retained)
    Archive { habit: String },
    /// Print the next scheduled date after today
    Next { habit: String },
}

/// Form-boundary validation: the engine assumes these already passed.
fn validate(habit: &Habit) -> Result<(), ValidationError> {
    if habit.goal_value <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: "goal".into(),
            value: habit.goal_value,
        });
    }
    if habit.metric_value <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: "metric".into(),
            value: habit.metric_value,
        });
    }
    if habit.kind == HabitKind::Routine && habit.routine_steps.is_empty() {
        return Err(ValidationError::EmptyCollection("routine steps".into()));
    }
    Ok(())
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let clock = SystemClock;

    match action {
        HabitAction::Add {
            name,
            kind,
            schedule,
            days,
            goal,
            metric,
            unit,
            steps,
            coping,
            icon,
            color,
        } => {
            let kind = HabitKind::parse(&kind).ok_or(format!("unknown kind '{kind}'"))?;
            let schedule_kind =
                ScheduleKind::parse(&schedule).ok_or(format!("unknown schedule '{schedule}'"))?;
            let config = Config::load()?;

            let goal = goal.unwrap_or(match kind {
                HabitKind::Timer => config.defaults.timer_goal_minutes,
                _ => config.defaults.goal_value,
            });
            let metric = metric.unwrap_or(config.defaults.metric_value);
            let unit = unit.unwrap_or_else(|| match kind {
                HabitKind::Timer => "minutes".to_string(),
                _ => config.defaults.metric_unit.clone(),
            });

            let mut habit = Habit::new(name, kind, schedule_kind, goal, metric, unit, clock.now());
            if let Some(days) = days {
                let days = parse_days(&days)?;
                match schedule_kind {
                    ScheduleKind::Weekly => habit.set_weekly_days(&days),
                    ScheduleKind::Monthly => habit.set_monthly_days(&days),
                    _ => return Err("--days only applies to weekly/monthly schedules".into()),
                }
            } else if matches!(schedule_kind, ScheduleKind::Weekly | ScheduleKind::Monthly) {
                return Err("weekly/monthly schedules require --days".into());
            }
            if let Some(steps) = steps {
                habit.routine_steps = steps
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            habit.coping_plan = coping;
            habit.icon = icon.unwrap_or_default();
            habit.color_hex = color.unwrap_or_default();

            validate(&habit)?;
            db.insert_habit(&habit)?;
            println!("Habit created: {}", habit.id);
        }
        HabitAction::List { all, json } => {
            let habits = db.list_habits(!all)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else {
                for h in habits {
                    let streak = if h.current_streak > 0 {
                        format!("  streak {}", h.current_streak)
                    } else {
                        String::new()
                    };
                    println!(
                        "{}  {:<24} {:<9} {}{}",
                        h.id,
                        h.name,
                        h.kind.as_str(),
                        h.schedule.as_str(),
                        streak
                    );
                }
            }
        }
        HabitAction::Show { habit } => {
            let habit = find_habit(&db, &habit)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::SetGoal { habit, goal, metric } => {
            let mut habit = find_habit(&db, &habit)?;
            habit.goal_value = goal;
            if let Some(metric) = metric {
                habit.metric_value = metric;
            }
            habit.recompute_target_frequency();
            validate(&habit)?;
            db.update_habit(&habit)?;
            println!(
                "Goal updated: {} per day (target frequency {})",
                habit.goal_value, habit.target_frequency
            );
        }
        HabitAction::Archive { habit } => {
            let mut habit = find_habit(&db, &habit)?;
            habit.is_active = false;
            db.update_habit(&habit)?;
            println!("Archived: {}", habit.name);
        }
        HabitAction::Next { habit } => {
            let habit = find_habit(&db, &habit)?;
            match next_scheduled_date(&habit, clock.today()) {
                Some(date) => println!("{date}"),
                // A miss inside the scan window is a valid terminal
                // answer, not an error.
                None => println!("never (no match within 60 days)"),
            }
        }
    }
    Ok(())
}
