//! Progress aggregator.
//!
//! One dispatch point turns a habit plus its records for the current day
//! into a [`Progress`] value. The union of non-journal records inside the
//! day window is the sole source of same-day progress; habit-level
//! counters are lifetime statistics only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::habit::{CompletionRecord, Habit, HabitKind};
use crate::schedule::is_scheduled_on;

/// Aggregated progress for one habit on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub goal_met: bool,
    /// 0.0 .. 1.0 toward the daily goal.
    pub fraction: f64,
    pub detail: ProgressDetail,
}

/// Kind-specific progress payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProgressDetail {
    Frequency {
        amount: f64,
        /// Count of qualifying records, independent of summed amount.
        completions: u32,
    },
    Routine {
        steps_done: Vec<usize>,
        steps_total: usize,
    },
    Timer {
        minutes: f64,
    },
    Ethereal {
        completed: bool,
    },
}

/// Compute today's progress for `habit` from its records inside the
/// current day window. Journal-only records are ignored.
pub fn compute_progress(habit: &Habit, records_today: &[CompletionRecord]) -> Progress {
    let qualifying: Vec<&CompletionRecord> = records_today
        .iter()
        .filter(|r| r.counts_toward_progress())
        .collect();

    match habit.kind {
        HabitKind::Frequency => {
            // A zero amount on a record means "one nominal completion".
            let amount: f64 = qualifying
                .iter()
                .map(|r| {
                    if r.metric_amount > 0.0 {
                        r.metric_amount
                    } else {
                        habit.metric_value
                    }
                })
                .sum();
            let goal_met = amount >= habit.goal_value;
            Progress {
                goal_met,
                fraction: fraction_of(amount, habit.goal_value),
                detail: ProgressDetail::Frequency {
                    amount,
                    completions: qualifying.len() as u32,
                },
            }
        }
        HabitKind::Routine => {
            let steps_total = habit.routine_steps.len();
            let steps_done: BTreeSet<usize> = qualifying
                .iter()
                .flat_map(|r| r.step_indices())
                .filter(|i| *i < steps_total)
                .collect();
            let goal_met = steps_total > 0 && steps_done.len() >= steps_total;
            Progress {
                goal_met,
                fraction: fraction_of(steps_done.len() as f64, steps_total as f64),
                detail: ProgressDetail::Routine {
                    steps_done: steps_done.into_iter().collect(),
                    steps_total,
                },
            }
        }
        HabitKind::Timer => {
            let minutes: f64 = qualifying.iter().map(|r| r.timer_minutes).sum();
            Progress {
                goal_met: minutes >= habit.goal_value,
                fraction: fraction_of(minutes, habit.goal_value),
                detail: ProgressDetail::Timer { minutes },
            }
        }
        HabitKind::Ethereal => {
            let completed = !qualifying.is_empty();
            Progress {
                goal_met: completed,
                fraction: if completed { 1.0 } else { 0.0 },
                detail: ProgressDetail::Ethereal { completed },
            }
        }
    }
}

/// Display-completion rule. On a scheduled day the goal decides; on an
/// off-schedule day any qualifying record shows the habit as done
/// (schedule never blocks logging).
pub fn completed_for_display(
    habit: &Habit,
    date: NaiveDate,
    records_today: &[CompletionRecord],
) -> bool {
    if is_scheduled_on(habit, date) {
        compute_progress(habit, records_today).goal_met
    } else {
        records_today.iter().any(|r| r.counts_toward_progress())
    }
}

fn fraction_of(progress: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        0.0
    } else {
        (progress / goal).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::ScheduleKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn habit(kind: HabitKind, goal: f64, metric: f64) -> Habit {
        Habit::new("Read", kind, ScheduleKind::Daily, goal, metric, "pages", Utc::now())
    }

    #[test]
    fn frequency_sums_amounts_with_metric_fallback() {
        let h = habit(HabitKind::Frequency, 30.0, 10.0);
        let records = vec![
            CompletionRecord::with_amount(h.id, Utc::now(), 12.0),
            // Zero amount falls back to the habit's metric_value.
            CompletionRecord::with_amount(h.id, Utc::now(), 0.0),
        ];
        let p = compute_progress(&h, &records);
        assert!(!p.goal_met);
        match p.detail {
            ProgressDetail::Frequency { amount, completions } => {
                assert_eq!(amount, 22.0);
                assert_eq!(completions, 2);
            }
            _ => panic!("expected frequency detail"),
        }
    }

    #[test]
    fn frequency_completion_count_is_independent_of_amount() {
        let h = habit(HabitKind::Frequency, 30.0, 10.0);
        let records = vec![CompletionRecord::with_amount(h.id, Utc::now(), 30.0)];
        let p = compute_progress(&h, &records);
        assert!(p.goal_met);
        match p.detail {
            ProgressDetail::Frequency { completions, .. } => assert_eq!(completions, 1),
            _ => panic!("expected frequency detail"),
        }
    }

    #[test]
    fn journal_only_records_are_excluded() {
        let h = habit(HabitKind::Frequency, 10.0, 10.0);
        let records = vec![CompletionRecord::journal(
            h.id,
            Utc::now(),
            Some(5),
            Some("rough day".into()),
        )];
        let p = compute_progress(&h, &records);
        assert!(!p.goal_met);
        assert_eq!(p.fraction, 0.0);
    }

    #[test]
    fn routine_needs_every_step_once() {
        let mut h = habit(HabitKind::Routine, 1.0, 1.0);
        h.routine_steps = vec!["a".into(), "b".into(), "c".into()];
        let r1 = CompletionRecord::routine(h.id, Utc::now(), &[1]);
        let r2 = CompletionRecord::routine(h.id, Utc::now(), &[0, 1]);
        assert!(!compute_progress(&h, &[r1.clone(), r2.clone()]).goal_met);

        // Remaining step, in a separate record and out of order.
        let r3 = CompletionRecord::routine(h.id, Utc::now(), &[2, 1]);
        let p = compute_progress(&h, &[r1, r2, r3]);
        assert!(p.goal_met);
        match p.detail {
            ProgressDetail::Routine { steps_done, steps_total } => {
                assert_eq!(steps_done, vec![0, 1, 2]);
                assert_eq!(steps_total, 3);
            }
            _ => panic!("expected routine detail"),
        }
    }

    #[test]
    fn routine_ignores_duplicate_and_out_of_range_steps() {
        let mut h = habit(HabitKind::Routine, 1.0, 1.0);
        h.routine_steps = vec!["a".into(), "b".into(), "c".into()];
        let records = vec![
            CompletionRecord::routine(h.id, Utc::now(), &[0, 0, 7]),
            CompletionRecord::routine(h.id, Utc::now(), &[0]),
        ];
        let p = compute_progress(&h, &records);
        assert!(!p.goal_met);
        match p.detail {
            ProgressDetail::Routine { steps_done, .. } => assert_eq!(steps_done, vec![0]),
            _ => panic!("expected routine detail"),
        }
    }

    #[test]
    fn empty_routine_never_meets_goal() {
        let h = habit(HabitKind::Routine, 1.0, 1.0);
        assert!(!compute_progress(&h, &[]).goal_met);
    }

    #[test]
    fn timer_sums_segments() {
        let h = habit(HabitKind::Timer, 2.0, 1.0);
        let records = vec![
            CompletionRecord::timer_segment(h.id, Utc::now(), 1.5),
            CompletionRecord::timer_segment(h.id, Utc::now(), 0.5),
        ];
        let p = compute_progress(&h, &records);
        assert!(p.goal_met);
        match p.detail {
            ProgressDetail::Timer { minutes } => assert_eq!(minutes, 2.0),
            _ => panic!("expected timer detail"),
        }
    }

    #[test]
    fn ethereal_completes_on_any_record() {
        let h = habit(HabitKind::Ethereal, 1.0, 1.0);
        assert!(!compute_progress(&h, &[]).goal_met);
        let records = vec![CompletionRecord::with_amount(h.id, Utc::now(), 0.0)];
        assert!(compute_progress(&h, &records).goal_met);
    }

    #[test]
    fn off_schedule_day_shows_completed_once_logged() {
        let mut h = habit(HabitKind::Frequency, 20.0, 10.0);
        h.set_weekly_days(&[1]); // Sunday only
        let monday = chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        assert!(!completed_for_display(&h, monday, &[]));
        // One record is enough on an unscheduled day, goal or not.
        let records = vec![CompletionRecord::with_amount(h.id, Utc::now(), 10.0)];
        assert!(completed_for_display(&h, monday, &records));

        // On a scheduled day the goal decides.
        let sunday = chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(!completed_for_display(&h, sunday, &records));
    }

    #[test]
    fn records_for_other_habits_are_callers_problem() {
        // The aggregator trusts its input slice; day filtering happens
        // at the store. A record with another habit's id still counts.
        let h = habit(HabitKind::Frequency, 10.0, 10.0);
        let records = vec![CompletionRecord::with_amount(Uuid::new_v4(), Utc::now(), 10.0)];
        assert!(compute_progress(&h, &records).goal_met);
    }
}
