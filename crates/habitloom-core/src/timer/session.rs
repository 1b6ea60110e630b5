//! Per-habit timer session state machine.
//!
//! A session is a wall-clock stopwatch with no internal thread; the
//! owning manager calls in periodically. States are Idle -> Running ->
//! Idle. "Paused" is Idle with a nonzero baseline: the baseline is
//! re-seeded from the habit's persisted minutes at every start, so the
//! session itself never needs to be durable.
//!
//! Segments are only written on pause/auto-stop. Seconds elapsed since
//! the last start are lost if the process dies first; that is an
//! accepted trade-off, not something to patch with per-tick writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Live state of one timer habit's stopwatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSession {
    habit_id: Uuid,
    /// Set while running; `None` is Idle.
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    /// Seconds already persisted today, captured at session start.
    #[serde(default)]
    base_elapsed_secs: u64,
    /// Whether this session may run past the goal without auto-stopping.
    /// Fixed for the lifetime of the run.
    #[serde(default)]
    allows_overrun: bool,
}

impl TimerSession {
    pub fn new(habit_id: Uuid) -> Self {
        Self {
            habit_id,
            started_at: None,
            base_elapsed_secs: 0,
            allows_overrun: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn habit_id(&self) -> Uuid {
        self.habit_id
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn allows_overrun(&self) -> bool {
        self.allows_overrun
    }

    pub fn base_elapsed_secs(&self) -> u64 {
        self.base_elapsed_secs
    }

    /// Seconds elapsed since the last start; zero while idle. This is
    /// the only portion not yet persisted.
    pub fn unsaved_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.started_at {
            Some(started) => (now - started).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    /// Combined elapsed seconds: persisted baseline plus the live run.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        self.base_elapsed_secs + self.unsaved_secs(now)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a run. Returns false (and changes nothing) if the session
    /// is already running, so duplicate UI triggers are harmless.
    pub fn start(
        &mut self,
        base_elapsed_secs: u64,
        allow_overrun: bool,
        now: DateTime<Utc>,
    ) -> bool {
        if self.is_running() {
            return false;
        }
        self.base_elapsed_secs = base_elapsed_secs;
        self.allows_overrun = allow_overrun;
        self.started_at = Some(now);
        true
    }

    /// End the run and return the unsaved delta in seconds. The delta is
    /// folded into the baseline so post-stop snapshots stay continuous;
    /// the next start re-seeds the baseline from the store anyway.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<u64> {
        let delta = match self.started_at {
            Some(_) => self.unsaved_secs(now),
            None => return None,
        };
        self.started_at = None;
        self.base_elapsed_secs += delta;
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn duplicate_start_is_a_no_op() {
        let mut s = TimerSession::new(Uuid::new_v4());
        assert!(s.start(0, false, t0()));
        assert!(!s.start(600, true, t0() + Duration::seconds(5)));
        // The second start must not have replaced the baseline or flag.
        assert_eq!(s.base_elapsed_secs(), 0);
        assert!(!s.allows_overrun());
    }

    #[test]
    fn elapsed_combines_baseline_and_live_run() {
        let mut s = TimerSession::new(Uuid::new_v4());
        s.start(120, false, t0());
        let now = t0() + Duration::seconds(30);
        assert_eq!(s.unsaved_secs(now), 30);
        assert_eq!(s.elapsed_secs(now), 150);
    }

    #[test]
    fn stop_returns_only_the_delta() {
        let mut s = TimerSession::new(Uuid::new_v4());
        s.start(300, false, t0());
        let delta = s.stop(t0() + Duration::seconds(90));
        assert_eq!(delta, Some(90));
        assert!(!s.is_running());
        assert_eq!(s.elapsed_secs(t0() + Duration::seconds(300)), 390);
    }

    #[test]
    fn stop_while_idle_is_none() {
        let mut s = TimerSession::new(Uuid::new_v4());
        assert_eq!(s.stop(t0()), None);
    }

    #[test]
    fn clock_skew_never_goes_negative() {
        let mut s = TimerSession::new(Uuid::new_v4());
        s.start(0, false, t0());
        assert_eq!(s.unsaved_secs(t0() - Duration::seconds(10)), 0);
    }
}
