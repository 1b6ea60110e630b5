//! External broadcast surface for live timer sessions.
//!
//! A sink receives periodic state snapshots for a running session (a
//! lock-screen/live-activity style surface). Sinks are best-effort: the
//! session manager swallows their errors, and the engine behaves
//! identically with the sink entirely absent.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::habit::Habit;

/// Snapshot state pushed on every start/tick/pause.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActivityState {
    pub elapsed_secs: u64,
    pub is_running: bool,
    pub is_finished: bool,
}

/// Static attributes describing the session's habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityAttributes {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub color_hex: String,
    pub target_goal_secs: u64,
}

impl ActivityAttributes {
    pub fn for_habit(habit: &Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name.clone(),
            icon: habit.icon.clone(),
            color_hex: habit.color_hex.clone(),
            target_goal_secs: habit.goal_secs(),
        }
    }
}

/// Every broadcast surface implements this trait. All methods default to
/// no-ops so a surface can subscribe to the calls it cares about.
pub trait BroadcastSink: Send + Sync {
    fn start(
        &self,
        _attributes: &ActivityAttributes,
        _state: &ActivityState,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn update(&self, _id: Uuid, _state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn pause(&self, _id: Uuid, _state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn stop(&self, _id: Uuid, _state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

/// The absent surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl BroadcastSink for NullSink {}

/// Appends one JSON line per call to a file, for external processes to
/// tail. Stands in for a platform live-activity surface.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

#[derive(Serialize)]
struct SinkLine<'a> {
    call: &'static str,
    id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a ActivityAttributes>,
    state: &'a ActivityState,
}

impl JsonLinesSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, line: &SinkLine) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        serde_json::to_writer(&mut file, line)?;
        writeln!(file)?;
        Ok(())
    }
}

impl BroadcastSink for JsonLinesSink {
    fn start(
        &self,
        attributes: &ActivityAttributes,
        state: &ActivityState,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.append(&SinkLine {
            call: "start",
            id: attributes.id,
            attributes: Some(attributes),
            state,
        })
    }

    fn update(&self, id: Uuid, state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
        self.append(&SinkLine { call: "update", id, attributes: None, state })
    }

    fn pause(&self, id: Uuid, state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
        self.append(&SinkLine { call: "pause", id, attributes: None, state })
    }

    fn stop(&self, id: Uuid, state: &ActivityState) -> Result<(), Box<dyn std::error::Error>> {
        self.append(&SinkLine { call: "stop", id, attributes: None, state })
    }
}
