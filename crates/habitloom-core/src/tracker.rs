//! Completion recording and habit-level orchestration.
//!
//! These operations tie the store, the progress aggregator and the
//! streak policy together: build the record, detect the not-met -> met
//! transition, and commit record plus statistics in one transaction so a
//! crash can never increment a counter without its record (or vice
//! versa). Habit mutations happen on a scratch copy that is only written
//! back after the commit succeeds.

use chrono::Duration;
use std::collections::{HashMap, HashSet};

use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::habit::{CompletionRecord, Habit, HabitKind};
use crate::progress::{completed_for_display, compute_progress, Progress};
use crate::schedule::is_due_on;
use crate::storage::Database;
use crate::streak::{
    calculate_scheduled_streak, can_use_coping_plan, record_goal_crossing, use_coping_plan,
};

/// What a discrete completion contributes.
#[derive(Debug, Clone)]
pub enum CompletionEntry {
    /// Frequency habit; `None` means one nominal completion at the
    /// habit's metric value.
    Amount(Option<f64>),
    /// Routine habit: step indices completed in this event.
    Steps(Vec<usize>),
    /// Timer habit: manually logged minutes.
    Minutes(f64),
    /// Plain "done" (ethereal habits).
    Done,
}

/// Append a completion and update statistics on goal-crossing.
///
/// Ethereal habits deactivate on their first completion. Returns every
/// event the operation produced, in order.
pub fn log_completion(
    db: &mut Database,
    habit: &mut Habit,
    clock: &dyn Clock,
    entry: CompletionEntry,
) -> Result<Vec<Event>> {
    let now = clock.now();
    let today = clock.today();

    let mut records = db.records_for_day(habit.id, today)?;
    let before = compute_progress(habit, &records);

    let record = match entry {
        CompletionEntry::Amount(amount) => {
            CompletionRecord::with_amount(habit.id, now, amount.unwrap_or(0.0))
        }
        CompletionEntry::Steps(steps) => CompletionRecord::routine(habit.id, now, &steps),
        CompletionEntry::Minutes(minutes) => {
            CompletionRecord::timer_segment(habit.id, now, minutes)
        }
        CompletionEntry::Done => CompletionRecord::with_amount(habit.id, now, 0.0),
    };

    let mut updated = habit.clone();
    records.push(record.clone());
    let after = compute_progress(&updated, &records);

    let mut events = vec![Event::CompletionLogged {
        habit_id: updated.id,
        kind: updated.kind,
        goal_met: after.goal_met,
        at: now,
    }];

    if !before.goal_met && after.goal_met {
        record_goal_crossing(&mut updated, now);
        events.push(Event::GoalCrossed {
            habit_id: updated.id,
            current_streak: updated.current_streak,
            longest_streak: updated.longest_streak,
            total_completions: updated.total_completions,
            at: now,
        });
        if updated.kind == HabitKind::Ethereal {
            // Terminal: a completed one-shot leaves the active set.
            updated.is_active = false;
            events.push(Event::HabitRetired {
                habit_id: updated.id,
                at: now,
            });
        }
    }

    db.commit_completion(&updated, &record)?;
    *habit = updated;
    Ok(events)
}

/// Append a reflection-only record. Never touches progress or counters.
pub fn log_journal(
    db: &mut Database,
    habit: &Habit,
    clock: &dyn Clock,
    mood_score: Option<u8>,
    notes: Option<String>,
) -> Result<Event> {
    if let Some(mood) = mood_score {
        if !(1..=5).contains(&mood) {
            return Err(CoreError::Validation(ValidationError::OutOfRange {
                field: "mood_score".into(),
                message: format!("expected 1..=5, got {mood}"),
            }));
        }
    }
    let now = clock.now();
    let record = CompletionRecord::journal(habit.id, now, mood_score, notes);
    db.append_record(&record)?;
    Ok(Event::JournalLogged {
        habit_id: habit.id,
        mood_score,
        at: now,
    })
}

/// Use the coping plan for yesterday's miss. Fails with a validation
/// error when not eligible (no plan, yesterday not missed, or already
/// used today).
pub fn apply_coping_plan(
    db: &mut Database,
    habit: &mut Habit,
    clock: &dyn Clock,
) -> Result<Event> {
    let now = clock.now();
    let today = clock.today();
    let yesterday = today - Duration::days(1);

    let yesterday_records = db.records_for_day(habit.id, yesterday)?;
    if !can_use_coping_plan(habit, today, &yesterday_records) {
        return Err(CoreError::Validation(ValidationError::InvalidValue {
            field: "coping_plan".into(),
            message: "not eligible today".into(),
        }));
    }

    let mut updated = habit.clone();
    use_coping_plan(&mut updated, now);
    db.commit_coping_use(&updated, today, now)?;
    *habit = updated;

    Ok(Event::CopingPlanUsed {
        habit_id: habit.id,
        plan: habit.coping_plan.clone().unwrap_or_default(),
        at: now,
    })
}

/// Persist one timer segment (delta only, never a cumulative total) and
/// run the goal-crossing update when this segment is the one that
/// crosses. Used by the session manager on pause and auto-stop.
pub fn persist_timer_segment(
    db: &mut Database,
    habit: &mut Habit,
    clock: &dyn Clock,
    delta_secs: u64,
) -> Result<f64> {
    let now = clock.now();
    let today = clock.today();
    let minutes = delta_secs as f64 / 60.0;

    let mut records = db.records_for_day(habit.id, today)?;
    let before = compute_progress(habit, &records);

    let record = CompletionRecord::timer_segment(habit.id, now, minutes);
    let mut updated = habit.clone();
    records.push(record.clone());
    let after = compute_progress(&updated, &records);

    if !before.goal_met && after.goal_met {
        record_goal_crossing(&mut updated, now);
    }

    db.commit_completion(&updated, &record)?;
    *habit = updated;
    Ok(minutes)
}

/// A due habit with its progress for today.
#[derive(Debug, Clone)]
pub struct DueHabit {
    pub habit: Habit,
    pub progress: Progress,
    pub completed: bool,
}

/// Active habits due today, each with aggregated progress.
pub fn due_today(db: &Database, clock: &dyn Clock) -> Result<Vec<DueHabit>> {
    let today = clock.today();
    let mut due = Vec::new();
    for habit in db.list_habits(true)? {
        if !is_due_on(&habit, today) {
            continue;
        }
        let records = db.records_for_day(habit.id, today)?;
        let progress = compute_progress(&habit, &records);
        let completed = completed_for_display(&habit, today, &records);
        due.push(DueHabit {
            habit,
            progress,
            completed,
        });
    }
    Ok(due)
}

/// Recompute the streak from the record log and rewrite the habit row
/// when the incremental counter has diverged. Returns the recomputed
/// value. Preferred over trusting `current_streak` in any data repair.
pub fn repair_streak(db: &mut Database, habit: &mut Habit, clock: &dyn Clock) -> Result<u32> {
    let today = clock.today();
    let from = today - Duration::days(366);

    let records = db.records_between(habit.id, from, today + Duration::days(1))?;
    let mut by_day: HashMap<chrono::NaiveDate, Vec<CompletionRecord>> = HashMap::new();
    for record in records {
        by_day
            .entry(record.completed_at.date_naive())
            .or_default()
            .push(record);
    }
    let completed_days: HashSet<chrono::NaiveDate> = by_day
        .iter()
        .filter(|(_, day_records)| compute_progress(habit, day_records).goal_met)
        .map(|(day, _)| *day)
        .collect();
    let coping_days = db.coping_days(habit.id, from)?;

    let recomputed = calculate_scheduled_streak(habit, &completed_days, &coping_days, today);
    if recomputed != habit.current_streak {
        let mut updated = habit.clone();
        updated.current_streak = recomputed;
        updated.longest_streak = updated.longest_streak.max(recomputed);
        db.update_habit(&updated)?;
        *habit = updated;
    }
    Ok(recomputed)
}
