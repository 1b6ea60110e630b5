//! Schedule evaluator.
//!
//! Pure date predicates deciding whether a habit is scheduled/due on a
//! given calendar day. No storage access; schedule never blocks logging,
//! only the upstream "due" decision.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::bitmask;
use crate::habit::{Habit, ScheduleKind};

/// How far `next_scheduled_date` scans before giving up. A `None`
/// result means "effectively unscheduled", not an error.
const SCAN_LIMIT_DAYS: i64 = 60;

/// Weekday number with a 1 = Sunday .. 7 = Saturday convention.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8 + 1
}

/// Whether the habit's recurrence rule matches `date`.
///
/// A monthly mask referencing day 31 is simply never true in shorter
/// months; there is no rollover or clamping.
pub fn is_scheduled_on(habit: &Habit, date: NaiveDate) -> bool {
    match habit.schedule {
        ScheduleKind::Daily => true,
        ScheduleKind::Weekly => bitmask::is_bit_set(habit.schedule_mask, weekday_number(date) - 1),
        ScheduleKind::Monthly => {
            let day = date.day();
            day <= 31 && bitmask::is_bit_set(habit.schedule_mask, day as u8 - 1)
        }
        ScheduleKind::WeekendsOnly => {
            matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
        }
        ScheduleKind::WeekdaysOnly => {
            !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
        }
    }
}

/// Whether the habit shows up in "due today" evaluation. Inactive
/// habits are never due, whatever their schedule says.
pub fn is_due_on(habit: &Habit, date: NaiveDate) -> bool {
    habit.is_active && is_scheduled_on(habit, date)
}

/// First scheduled date strictly after `after`, scanning day by day.
pub fn next_scheduled_date(habit: &Habit, after: NaiveDate) -> Option<NaiveDate> {
    (1..=SCAN_LIMIT_DAYS)
        .map(|offset| after + Duration::days(offset))
        .find(|date| is_scheduled_on(habit, *date))
}
