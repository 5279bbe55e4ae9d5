use std::fs;
use std::io;
use std::path::Path;

use retail_engine::Vec2;
use serde::Serialize;
use thiserror::Error;

use super::customer::{CustomerState, Difficulty};
use super::scoring::score_of;
use super::session::{GameSession, SessionStatus};
use super::sprites::{draw_order, indicator_for, DrawItem, Indicator};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialize session snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("write session snapshot {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub id: u32,
    pub state: CustomerState,
    pub position: Vec2,
    pub patience: f64,
    pub needs_help: bool,
    pub approach_attempts: u32,
    /// Angry or leaving: walking to the door.
    pub heading_out: bool,
    pub indicator: Option<Indicator>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub browsing: u32,
    pub waiting: u32,
    pub helped: u32,
    pub satisfied: u32,
    pub leaving: u32,
    pub angry: u32,
}

impl StateCounts {
    fn record(&mut self, state: CustomerState) {
        let slot = match state {
            CustomerState::Browsing => &mut self.browsing,
            CustomerState::Waiting => &mut self.waiting,
            CustomerState::Helped => &mut self.helped,
            CustomerState::Satisfied => &mut self.satisfied,
            CustomerState::Leaving => &mut self.leaving,
            CustomerState::Angry => &mut self.angry,
        };
        *slot += 1;
    }
}

/// Serializable picture of a session at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub score: i32,
    /// What the crowd is worth as it stands, ignoring points already banked.
    pub standing_score: i32,
    pub clock_ms: u64,
    pub time_left_seconds: u32,
    pub avatar: Vec2,
    pub state_counts: StateCounts,
    pub customers: Vec<CustomerSummary>,
    pub draw_list: Vec<DrawItem>,
}

impl SessionSnapshot {
    pub fn capture(session: &GameSession) -> Self {
        let behavior = &session.tuning().behavior;
        let mut state_counts = StateCounts::default();
        let customers = session
            .customers()
            .iter()
            .map(|customer| {
                state_counts.record(customer.state);
                CustomerSummary {
                    id: customer.id,
                    state: customer.state,
                    position: customer.position,
                    patience: customer.patience,
                    needs_help: customer.needs_help,
                    approach_attempts: customer.approach_attempts,
                    heading_out: customer.state.is_exiting(),
                    indicator: indicator_for(customer, behavior),
                }
            })
            .collect();

        Self {
            difficulty: session.difficulty(),
            status: session.status(),
            score: session.score(),
            standing_score: score_of(session.customers(), &session.tuning().scoring),
            clock_ms: session.clock_ms(),
            time_left_seconds: session.time_left_seconds(),
            avatar: session.avatar().position,
            state_counts,
            customers,
            draw_list: draw_order(session),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|source| SnapshotError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}
