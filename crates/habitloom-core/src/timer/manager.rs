//! Session registry and persistence orchestration.
//!
//! The manager is owned by the application's composition root and holds
//! at most one live [`TimerSession`] per habit id, so reentrant callers
//! attach to the same session instead of creating a duplicate. It is the
//! only layer that both ticks sessions and touches the store: segments
//! are persisted synchronously relative to the state transition, and the
//! transition only happens after the save succeeds. On a save failure
//! the session keeps running with its unsaved elapsed intact, so the
//! caller can retry instead of silently losing time.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::broadcast::{ActivityAttributes, ActivityState, BroadcastSink};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::habit::Habit;
use crate::storage::Database;
use crate::tracker::persist_timer_segment;

use super::session::TimerSession;

/// Result of one tick.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// No running session for this habit (or it was paused while the
    /// tick was in flight). Nothing happened.
    Idle,
    /// Still running; a snapshot went to the sink.
    Running(ActivityState),
    /// The goal was crossed with overrun disallowed: the segment was
    /// persisted and the session stopped. Raised once per crossing; the
    /// next tick reports `Idle`.
    AutoStopped {
        saved_minutes: f64,
        minutes_today: f64,
        state: ActivityState,
    },
}

/// Registry of live timer sessions, one per habit id.
pub struct SessionManager {
    sessions: HashMap<Uuid, TimerSession>,
    sink: Box<dyn BroadcastSink>,
    clock: Box<dyn Clock>,
}

impl SessionManager {
    pub fn new(sink: Box<dyn BroadcastSink>, clock: Box<dyn Clock>) -> Self {
        Self {
            sessions: HashMap::new(),
            sink,
            clock,
        }
    }

    // ── Registry ─────────────────────────────────────────────────────

    pub fn get_or_create(&mut self, habit_id: Uuid) -> &mut TimerSession {
        self.sessions
            .entry(habit_id)
            .or_insert_with(|| TimerSession::new(habit_id))
    }

    pub fn session(&self, habit_id: Uuid) -> Option<&TimerSession> {
        self.sessions.get(&habit_id)
    }

    /// Re-attach a session restored from elsewhere (e.g. the kv store).
    pub fn restore(&mut self, session: TimerSession) {
        self.sessions.insert(session.habit_id(), session);
    }

    /// Drop a session. Idempotent; releasing an unknown id does nothing.
    pub fn release(&mut self, habit_id: Uuid) {
        self.sessions.remove(&habit_id);
    }

    pub fn is_running(&self, habit_id: Uuid) -> bool {
        self.sessions
            .get(&habit_id)
            .is_some_and(|s| s.is_running())
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Start a session seeded with the minutes already persisted today.
    /// Starting while one is already running is a no-op returning
    /// `None`, which protects against duplicate UI triggers.
    pub fn start(
        &mut self,
        db: &Database,
        habit: &Habit,
        allow_overrun: bool,
    ) -> Result<Option<Event>> {
        let now = self.clock.now();
        let today = self.clock.today();
        let base_secs = (db.minutes_for_day(habit.id, today)? * 60.0).round() as u64;

        let session = self.get_or_create(habit.id);
        if !session.start(base_secs, allow_overrun, now) {
            return Ok(None);
        }
        let state = ActivityState {
            elapsed_secs: session.elapsed_secs(now),
            is_running: true,
            is_finished: false,
        };
        let attributes = ActivityAttributes::for_habit(habit);
        let _ = self.sink.start(&attributes, &state); // best-effort
        Ok(Some(Event::SessionStarted {
            habit_id: habit.id,
            base_elapsed_secs: base_secs,
            allows_overrun: allow_overrun,
            at: now,
        }))
    }

    /// Periodic callback while a session runs. Checks `is_running`
    /// first so a pause that raced in always wins over the tick.
    pub fn tick(&mut self, db: &mut Database, habit: &mut Habit) -> Result<TickOutcome> {
        let now = self.clock.now();
        let today = self.clock.today();

        let (delta_secs, allows_overrun) = match self.sessions.get(&habit.id) {
            Some(s) if s.is_running() => (s.unsaved_secs(now), s.allows_overrun()),
            _ => return Ok(TickOutcome::Idle),
        };

        let persisted_minutes = db.minutes_for_day(habit.id, today)?;
        let live_minutes = persisted_minutes + delta_secs as f64 / 60.0;

        if !allows_overrun && live_minutes >= habit.goal_value {
            // Persist before transitioning; a failed save leaves the
            // session running for retry.
            let saved_minutes =
                persist_timer_segment(db, habit, self.clock.as_ref(), delta_secs)?;
            let state = self.finish_session(habit.id, now, true);
            let _ = self.sink.stop(habit.id, &state);
            return Ok(TickOutcome::AutoStopped {
                saved_minutes,
                minutes_today: persisted_minutes + saved_minutes,
                state,
            });
        }

        let state = ActivityState {
            elapsed_secs: (persisted_minutes * 60.0).round() as u64 + delta_secs,
            is_running: true,
            is_finished: false,
        };
        let _ = self.sink.update(habit.id, &state);
        Ok(TickOutcome::Running(state))
    }

    /// Pause the session, persisting the delta since start when asked.
    /// Only the delta is ever written, never the cumulative total, so a
    /// pause/resume cycle cannot double-count. Pausing while idle is a
    /// no-op.
    pub fn pause(
        &mut self,
        db: &mut Database,
        habit: &mut Habit,
        save_progress: bool,
    ) -> Result<Option<Event>> {
        let now = self.clock.now();
        let delta_secs = match self.sessions.get(&habit.id) {
            Some(s) if s.is_running() => s.unsaved_secs(now),
            _ => return Ok(None),
        };

        let saved_minutes = if save_progress && delta_secs > 0 {
            Some(persist_timer_segment(
                db,
                habit,
                self.clock.as_ref(),
                delta_secs,
            )?)
        } else {
            None
        };

        let finished = db.minutes_for_day(habit.id, self.clock.today())? >= habit.goal_value;
        let state = self.finish_session(habit.id, now, finished);
        let _ = self.sink.pause(habit.id, &state);
        Ok(Some(Event::SessionPaused {
            habit_id: habit.id,
            saved_minutes,
            elapsed_secs: state.elapsed_secs,
            at: now,
        }))
    }

    /// Current snapshot without side effects on the store.
    pub fn snapshot(&self, habit: &Habit) -> Event {
        let now = self.clock.now();
        let (elapsed_secs, is_running) = match self.sessions.get(&habit.id) {
            Some(s) => (s.elapsed_secs(now), s.is_running()),
            None => (0, false),
        };
        Event::StateSnapshot {
            habit_id: habit.id,
            elapsed_secs,
            is_running,
            is_finished: !is_running && elapsed_secs >= habit.goal_secs() && habit.goal_secs() > 0,
            at: now,
        }
    }

    fn finish_session(&mut self, habit_id: Uuid, now: DateTime<Utc>, finished: bool) -> ActivityState {
        let elapsed_secs = match self.sessions.get_mut(&habit_id) {
            Some(s) => {
                s.stop(now);
                s.elapsed_secs(now)
            }
            None => 0,
        };
        ActivityState {
            elapsed_secs,
            is_running: false,
            is_finished: finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::NullSink;
    use crate::clock::FixedClock;
    use crate::habit::{HabitKind, ScheduleKind};
    use crate::progress::compute_progress;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Mutex};

    fn setup(goal_minutes: f64) -> (Database, Habit, FixedClock, SessionManager) {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());
        let mut db = Database::open_memory().unwrap();
        let habit = Habit::new(
            "Focus",
            HabitKind::Timer,
            ScheduleKind::Daily,
            goal_minutes,
            1.0,
            "minutes",
            clock.now(),
        );
        db.insert_habit(&habit).unwrap();
        let manager = SessionManager::new(Box::new(NullSink), Box::new(clock.clone()));
        (db, habit, clock, manager)
    }

    #[test]
    fn segments_accumulate_without_rewriting() {
        let (mut db, mut habit, clock, mut mgr) = setup(25.0);

        mgr.start(&db, &habit, false).unwrap().unwrap();
        clock.advance(Duration::seconds(90));
        let ev = mgr.pause(&mut db, &mut habit, true).unwrap().unwrap();
        match ev {
            Event::SessionPaused { saved_minutes, .. } => {
                assert_eq!(saved_minutes, Some(1.5));
            }
            _ => panic!("expected SessionPaused"),
        }

        // Second run persists a second record, never a combined rewrite.
        mgr.start(&db, &habit, false).unwrap().unwrap();
        clock.advance(Duration::seconds(30));
        mgr.pause(&mut db, &mut habit, true).unwrap().unwrap();

        let records = db.records_for_day(habit.id, clock.today()).unwrap();
        assert_eq!(records.len(), 2);
        let minutes: Vec<f64> = records.iter().map(|r| r.timer_minutes).collect();
        assert!(minutes.contains(&1.5));
        assert!(minutes.contains(&0.5));
        assert_eq!(db.minutes_for_day(habit.id, clock.today()).unwrap(), 2.0);
    }

    #[test]
    fn second_session_seeds_baseline_from_persisted_minutes() {
        let (mut db, mut habit, clock, mut mgr) = setup(25.0);
        mgr.start(&db, &habit, false).unwrap();
        clock.advance(Duration::seconds(120));
        mgr.pause(&mut db, &mut habit, true).unwrap();

        let ev = mgr.start(&db, &habit, false).unwrap().unwrap();
        match ev {
            Event::SessionStarted { base_elapsed_secs, .. } => {
                assert_eq!(base_elapsed_secs, 120);
            }
            _ => panic!("expected SessionStarted"),
        }
    }

    #[test]
    fn duplicate_start_attaches_instead_of_restarting() {
        let (db, habit, clock, mut mgr) = setup(25.0);
        assert!(mgr.start(&db, &habit, false).unwrap().is_some());
        clock.advance(Duration::seconds(40));
        assert!(mgr.start(&db, &habit, true).unwrap().is_none());
        // The original run keeps counting.
        let session = mgr.session(habit.id).unwrap();
        assert_eq!(session.unsaved_secs(clock.now()), 40);
    }

    #[test]
    fn auto_stop_fires_exactly_once() {
        let (mut db, mut habit, clock, mut mgr) = setup(1.0);
        mgr.start(&db, &habit, false).unwrap();

        clock.advance(Duration::seconds(30));
        assert!(matches!(
            mgr.tick(&mut db, &mut habit).unwrap(),
            TickOutcome::Running(_)
        ));

        clock.advance(Duration::seconds(31));
        match mgr.tick(&mut db, &mut habit).unwrap() {
            TickOutcome::AutoStopped { minutes_today, state, .. } => {
                assert!(minutes_today >= 1.0);
                assert!(state.is_finished);
            }
            other => panic!("expected AutoStopped, got {other:?}"),
        }

        // Goal crossing ran with the persisted segment.
        assert_eq!(habit.current_streak, 1);
        let records = db.records_for_day(habit.id, clock.today()).unwrap();
        assert!(compute_progress(&habit, &records).goal_met);

        // A tick while already idle does nothing.
        clock.advance(Duration::seconds(10));
        assert!(matches!(
            mgr.tick(&mut db, &mut habit).unwrap(),
            TickOutcome::Idle
        ));
        assert_eq!(db.records_for_day(habit.id, clock.today()).unwrap().len(), 1);
    }

    #[test]
    fn overrun_session_keeps_running_past_goal() {
        let (mut db, mut habit, clock, mut mgr) = setup(1.0);
        mgr.start(&db, &habit, true).unwrap();
        clock.advance(Duration::seconds(120));
        assert!(matches!(
            mgr.tick(&mut db, &mut habit).unwrap(),
            TickOutcome::Running(_)
        ));
    }

    #[test]
    fn pause_without_save_discards_the_delta() {
        let (mut db, mut habit, clock, mut mgr) = setup(25.0);
        mgr.start(&db, &habit, false).unwrap();
        clock.advance(Duration::seconds(90));
        let ev = mgr.pause(&mut db, &mut habit, false).unwrap().unwrap();
        match ev {
            Event::SessionPaused { saved_minutes, .. } => assert_eq!(saved_minutes, None),
            _ => panic!("expected SessionPaused"),
        }
        assert!(db.records_for_day(habit.id, clock.today()).unwrap().is_empty());
    }

    #[test]
    fn pause_while_idle_is_a_no_op() {
        let (mut db, mut habit, _clock, mut mgr) = setup(25.0);
        assert!(mgr.pause(&mut db, &mut habit, true).unwrap().is_none());
    }

    #[test]
    fn pause_crossing_goal_updates_streak_once() {
        let (mut db, mut habit, clock, mut mgr) = setup(1.0);
        mgr.start(&db, &habit, true).unwrap();
        clock.advance(Duration::seconds(90));
        mgr.pause(&mut db, &mut habit, true).unwrap();
        assert_eq!(habit.current_streak, 1);
        assert_eq!(habit.total_completions, 1);

        // More overrun minutes the same day cross nothing new.
        mgr.start(&db, &habit, true).unwrap();
        clock.advance(Duration::seconds(60));
        mgr.pause(&mut db, &mut habit, true).unwrap();
        assert_eq!(habit.total_completions, 1);
    }

    #[test]
    fn release_is_idempotent() {
        let (_db, habit, _clock, mut mgr) = setup(25.0);
        mgr.get_or_create(habit.id);
        mgr.release(habit.id);
        mgr.release(habit.id);
        assert!(mgr.session(habit.id).is_none());
    }

    /// Sink that records every call, for asserting the snapshot contract.
    #[derive(Default, Clone)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<(String, ActivityState)>>>,
    }

    impl BroadcastSink for RecordingSink {
        fn start(
            &self,
            _attributes: &ActivityAttributes,
            state: &ActivityState,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(("start".into(), *state));
            Ok(())
        }
        fn update(&self, _id: Uuid, state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(("update".into(), *state));
            Ok(())
        }
        fn pause(&self, _id: Uuid, state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(("pause".into(), *state));
            Ok(())
        }
        fn stop(&self, _id: Uuid, state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(("stop".into(), *state));
            Ok(())
        }
    }

    #[test]
    fn every_transition_broadcasts_a_snapshot() {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());
        let mut db = Database::open_memory().unwrap();
        let mut habit = Habit::new(
            "Focus",
            HabitKind::Timer,
            ScheduleKind::Daily,
            25.0,
            1.0,
            "minutes",
            clock.now(),
        );
        db.insert_habit(&habit).unwrap();
        let sink = RecordingSink::default();
        let mut mgr = SessionManager::new(Box::new(sink.clone()), Box::new(clock.clone()));

        mgr.start(&db, &habit, false).unwrap();
        clock.advance(Duration::seconds(10));
        mgr.tick(&mut db, &mut habit).unwrap();
        clock.advance(Duration::seconds(10));
        mgr.pause(&mut db, &mut habit, true).unwrap();

        let calls = sink.calls.lock().unwrap();
        let names: Vec<&str> = calls.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["start", "update", "pause"]);
        assert!(calls[0].1.is_running);
        assert_eq!(calls[1].1.elapsed_secs, 10);
        assert!(!calls[2].1.is_running);
        assert_eq!(calls[2].1.elapsed_secs, 20);
    }

    /// Sink whose failures must never corrupt timer state.
    struct FailingSink;

    impl BroadcastSink for FailingSink {
        fn start(
            &self,
            _attributes: &ActivityAttributes,
            _state: &ActivityState,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Err("surface unavailable".into())
        }
        fn update(&self, _id: Uuid, _state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
            Err("surface unavailable".into())
        }
        fn pause(&self, _id: Uuid, _state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
            Err("surface unavailable".into())
        }
        fn stop(&self, _id: Uuid, _state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
            Err("surface unavailable".into())
        }
    }

    #[test]
    fn sink_failures_never_block_the_session() {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());
        let mut db = Database::open_memory().unwrap();
        let mut habit = Habit::new(
            "Focus",
            HabitKind::Timer,
            ScheduleKind::Daily,
            25.0,
            1.0,
            "minutes",
            clock.now(),
        );
        db.insert_habit(&habit).unwrap();
        let mut mgr = SessionManager::new(Box::new(FailingSink), Box::new(clock.clone()));

        assert!(mgr.start(&db, &habit, false).unwrap().is_some());
        clock.advance(Duration::seconds(60));
        assert!(matches!(
            mgr.tick(&mut db, &mut habit).unwrap(),
            TickOutcome::Running(_)
        ));
        let ev = mgr.pause(&mut db, &mut habit, true).unwrap().unwrap();
        match ev {
            Event::SessionPaused { saved_minutes, .. } => assert_eq!(saved_minutes, Some(1.0)),
            _ => panic!("expected SessionPaused"),
        }
    }
}
