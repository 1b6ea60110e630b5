use clap::Subcommand;
use habitloom_core::storage::{data_dir, Config, Database};
use habitloom_core::{
    compute_progress, BroadcastSink, Clock, Habit, HabitKind, JsonLinesSink, NullSink,
    SessionManager, SystemClock, TickOutcome, TimerSession,
};
use uuid::Uuid;

use crate::common::find_habit;

const SESSION_KEY_PREFIX: &str = "timer_session:";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a timer session for a habit
    Start {
        habit: String,
        /// Keep running past the goal instead of auto-stopping
        #[arg(long)]
        overrun: bool,
    },
    /// Pause the session, persisting the elapsed segment
    Pause {
        habit: String,
        /// Discard the elapsed time instead of saving it
        #[arg(long)]
        discard: bool,
    },
    /// Print the current session state (may auto-stop a finished one)
    Status { habit: String },
    /// Drive the session tick loop until auto-stop or Ctrl-C
    Watch { habit: String },
}

fn session_key(habit_id: Uuid) -> String {
    format!("{SESSION_KEY_PREFIX}{habit_id}")
}

fn load_session(db: &Database, habit_id: Uuid) -> Option<TimerSession> {
    let json = db.kv_get(&session_key(habit_id)).ok()??;
    serde_json::from_str(&json).ok()
}

fn save_session(db: &Database, session: &TimerSession) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(session)?;
    db.kv_set(&session_key(session.habit_id()), &json)?;
    Ok(())
}

fn clear_session(db: &Database, habit_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
    db.kv_delete(&session_key(habit_id))?;
    Ok(())
}

fn make_sink(config: &Config) -> Result<Box<dyn BroadcastSink>, Box<dyn std::error::Error>> {
    if !config.timer.broadcast_enabled {
        return Ok(Box::new(NullSink));
    }
    let path = match &config.timer.activity_file {
        Some(path) => path.into(),
        None => data_dir()?.join("activity.jsonl"),
    };
    Ok(Box::new(JsonLinesSink::new(path)))
}

fn make_manager(db: &Database, habit_id: Uuid) -> Result<SessionManager, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut manager = SessionManager::new(make_sink(&config)?, Box::new(SystemClock));
    if let Some(session) = load_session(db, habit_id) {
        manager.restore(session);
    }
    Ok(manager)
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    let clock = SystemClock;

    match action {
        TimerAction::Start { habit, overrun } => {
            let habit = find_habit(&db, &habit)?;
            require_timer(&habit)?;
            let mut manager = make_manager(&db, habit.id)?;

            // Overrun is the caller's call: forced by flag, or implied
            // when the goal was already met before this session.
            let records = db.records_for_day(habit.id, clock.today())?;
            let allow_overrun = overrun || compute_progress(&habit, &records).goal_met;

            match manager.start(&db, &habit, allow_overrun)? {
                Some(event) => {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                None => println!("Session already running for '{}'", habit.name),
            }
            if let Some(session) = manager.session(habit.id) {
                save_session(&db, session)?;
            }
        }
        TimerAction::Pause { habit, discard } => {
            let mut habit = find_habit(&db, &habit)?;
            require_timer(&habit)?;
            let mut manager = make_manager(&db, habit.id)?;
            match manager.pause(&mut db, &mut habit, !discard)? {
                Some(event) => {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                    clear_session(&db, habit.id)?;
                }
                None => println!("No running session for '{}'", habit.name),
            }
        }
        TimerAction::Status { habit } => {
            let mut habit = find_habit(&db, &habit)?;
            require_timer(&habit)?;
            let mut manager = make_manager(&db, habit.id)?;
            // Ticking from status lets a finished session auto-stop
            // even when no watch loop is attached.
            match manager.tick(&mut db, &mut habit)? {
                TickOutcome::AutoStopped { saved_minutes, minutes_today, .. } => {
                    clear_session(&db, habit.id)?;
                    println!(
                        "Auto-stopped: saved {saved_minutes:.1} min ({minutes_today:.1} today)"
                    );
                }
                _ => {
                    if let Some(session) = manager.session(habit.id) {
                        save_session(&db, session)?;
                    }
                }
            }
            let snapshot = manager.snapshot(&habit);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        TimerAction::Watch { habit } => {
            let mut habit = find_habit(&db, &habit)?;
            require_timer(&habit)?;
            let config = Config::load()?;
            let mut manager = make_manager(&db, habit.id)?;
            if !manager.is_running(habit.id) {
                return Err("no running session; `timer start` first".into());
            }
            watch_loop(&mut db, &mut habit, &mut manager, config.timer.tick_interval_ms)?;
        }
    }
    Ok(())
}

fn require_timer(habit: &Habit) -> Result<(), Box<dyn std::error::Error>> {
    if habit.kind != HabitKind::Timer {
        return Err(format!("'{}' is not a timer habit", habit.name).into());
    }
    Ok(())
}

/// Repeating tick on a fixed cadence, cancelled on auto-stop or Ctrl-C.
/// Ctrl-C pauses with save, so a watched session never silently loses
/// its elapsed time.
fn watch_loop(
    db: &mut Database,
    habit: &mut Habit,
    manager: &mut SessionManager,
    tick_interval_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_millis(tick_interval_ms.max(50)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match manager.tick(db, habit)? {
                        TickOutcome::Idle => {
                            clear_session(db, habit.id)?;
                            return Ok(());
                        }
                        TickOutcome::Running(_) => {}
                        TickOutcome::AutoStopped { saved_minutes, minutes_today, .. } => {
                            clear_session(db, habit.id)?;
                            println!(
                                "Auto-stopped: saved {saved_minutes:.1} min ({minutes_today:.1} today)"
                            );
                            return Ok(());
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    if let Some(event) = manager.pause(db, habit, true)? {
                        println!("{}", serde_json::to_string_pretty(&event)?);
                    }
                    clear_session(db, habit.id)?;
                    return Ok(());
                }
            }
        }
    })
}
