//! Shared helpers for CLI commands.

use habitloom_core::storage::Database;
use habitloom_core::Habit;
use uuid::Uuid;

/// Resolve a habit from a UUID or an exact (case-insensitive) name.
pub fn find_habit(db: &Database, ident: &str) -> Result<Habit, Box<dyn std::error::Error>> {
    if let Ok(id) = Uuid::parse_str(ident) {
        if let Some(habit) = db.get_habit(id)? {
            return Ok(habit);
        }
    }
    let mut matches: Vec<Habit> = db
        .list_habits(false)?
        .into_iter()
        .filter(|h| h.name.eq_ignore_ascii_case(ident))
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(format!("no habit matching '{ident}'").into()),
        _ => Err(format!("'{ident}' is ambiguous; use the habit id").into()),
    }
}

/// Parse a comma-separated list of day numbers (weekday 1-7 or
/// day-of-month 1-31).
pub fn parse_days(raw: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut days = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let day: u8 = part.parse().map_err(|_| format!("bad day number '{part}'"))?;
        if !(1..=31).contains(&day) {
            return Err(format!("day {day} out of range 1..=31").into());
        }
        days.push(day);
    }
    if days.is_empty() {
        return Err("expected at least one day number".into());
    }
    Ok(days)
}

/// Parse a comma-separated list of zero-based step indices.
pub fn parse_step_indices(raw: &str) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
    let mut steps = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        steps.push(part.parse::<usize>().map_err(|_| format!("bad step index '{part}'"))?);
    }
    if steps.is_empty() {
        return Err("expected at least one step index".into());
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_days_accepts_ranges_and_whitespace() {
        assert_eq!(parse_days("2, 4,7").unwrap(), vec![2, 4, 7]);
        assert!(parse_days("0").is_err());
        assert!(parse_days("32").is_err());
        assert!(parse_days("mon").is_err());
        assert!(parse_days("").is_err());
    }

    #[test]
    fn parse_step_indices_is_zero_based() {
        assert_eq!(parse_step_indices("0,2").unwrap(), vec![0, 2]);
        assert!(parse_step_indices("a").is_err());
    }
}
