//! Streak and coping-plan policy.
//!
//! The incremental update runs only at the instant a habit's daily goal
//! transitions from not-met to met. The coping plan is a retroactive
//! grace: used the day after a miss it keeps the next streak computation
//! from ever seeing a 2-day gap, without counting as a completion.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashSet;

use crate::habit::{CompletionRecord, Habit};
use crate::schedule::is_scheduled_on;

/// How far the recovery walk looks back.
const LOOKBACK_DAYS: i64 = 365;

/// Monotonic counter update for a goal-crossing event. Callers gate this
/// on the not-met -> met transition, so it fires at most once per day.
///
/// A gap of exactly one missed day counts as bridged when the coping
/// plan was used today for that miss; the missed day itself still does
/// not increment the counter.
pub fn record_goal_crossing(habit: &mut Habit, now: DateTime<Utc>) {
    match habit.last_completed {
        None => habit.current_streak = 1,
        Some(last) => {
            let today = now.date_naive();
            let gap = (today - last.date_naive()).num_days();
            let bridged = gap == 2
                && habit
                    .last_coping
                    .is_some_and(|coped| coped.date_naive() == today);
            match gap {
                0 => return, // already counted today
                1 => habit.current_streak += 1,
                2 if bridged => habit.current_streak += 1,
                _ => habit.current_streak = 1,
            }
        }
    }
    habit.longest_streak = habit.longest_streak.max(habit.current_streak);
    habit.last_completed = Some(now);
    habit.total_completions += 1;
}

/// Coping-plan eligibility: plan text present, yesterday was a scheduled
/// day with zero qualifying completions, and the plan has not already
/// been used today.
pub fn can_use_coping_plan(
    habit: &Habit,
    today: NaiveDate,
    yesterday_records: &[CompletionRecord],
) -> bool {
    if !habit.has_coping_plan() {
        return false;
    }
    let yesterday = today - Duration::days(1);
    if !is_scheduled_on(habit, yesterday) {
        return false;
    }
    if yesterday_records.iter().any(|r| r.counts_toward_progress()) {
        return false;
    }
    match habit.last_coping {
        Some(at) => at.date_naive() != today,
        None => true,
    }
}

/// Mark the coping plan used. Deliberately leaves `current_streak` and
/// `last_completed` untouched.
pub fn use_coping_plan(habit: &mut Habit, now: DateTime<Utc>) {
    habit.last_coping = Some(now);
}

/// Recompute the streak from scratch by walking backward from `today`.
///
/// A day counts as held when it was scheduled and either completed or
/// saved by a coping-plan use recorded on the following day. The walk
/// stops at the first unheld scheduled day; unscheduled days neither
/// count nor stop it, and a still-in-progress `today` is skipped rather
/// than treated as a miss. This is the authoritative recovery path when
/// the incremental counter diverges from the record log.
pub fn calculate_scheduled_streak(
    habit: &Habit,
    completed_days: &HashSet<NaiveDate>,
    coping_days: &HashSet<NaiveDate>,
    today: NaiveDate,
) -> u32 {
    let mut streak = 0;
    for offset in 0..=LOOKBACK_DAYS {
        let day = today - Duration::days(offset);
        if !is_scheduled_on(habit, day) {
            continue;
        }
        let held = completed_days.contains(&day)
            || coping_days.contains(&(day + Duration::days(1)));
        if held {
            streak += 1;
        } else if offset == 0 {
            continue; // today can still be completed
        } else {
            break;
        }
    }
    streak
}
