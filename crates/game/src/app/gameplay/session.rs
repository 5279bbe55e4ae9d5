use std::fmt;
use std::sync::Arc;

use retail_engine::{
    move_toward, Facing, IsometricProjection, ProjectionError, RandomSource, ScreenPoint, Vec2,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::behavior::{update_customer, BehaviorContext};
use super::config::{SessionTuning, TuningError};
use super::customer::{Customer, Difficulty};
use super::layout::{build_layout, LayoutError, StoreLayout};
use super::scoring::score_delta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Tutorial,
    Playing,
    Paused,
    GameOver,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Tutorial => "tutorial",
            SessionStatus::Playing => "playing",
            SessionStatus::Paused => "paused",
            SessionStatus::GameOver => "game_over",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Avatar {
    pub position: Vec2,
    pub target: Vec2,
    pub speed: f64,
    pub interaction_radius: f64,
    pub facing: Facing,
    pub moving: bool,
}

/// Host input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Pointer in screen pixels; `None` keeps the last known pointer.
    pub pointer: Option<ScreenPoint>,
    /// Elapsed simulation time; `None` uses the tuned tick length.
    pub dt_ms: Option<u64>,
}

impl TickInput {
    pub fn at(pointer: ScreenPoint) -> Self {
        Self {
            pointer: Some(pointer),
            dt_ms: None,
        }
    }

    pub fn with_dt_ms(mut self, dt_ms: u64) -> Self {
        self.dt_ms = Some(dt_ms);
        self
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("canvas size must be non-zero, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("avatar spawn ({x}, {y}) is not on a walkable tile")]
    BlockedSpawn { x: f64, y: f64 },
    #[error("customer {id} starts at ({x}, {y}), which is not on a walkable tile")]
    BlockedCustomer { id: u32, x: f64, y: f64 },
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// One play-through. Every transition returns a new session; nothing is
/// mutated in place, so any `&GameSession` is a stable render snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    difficulty: Difficulty,
    status: SessionStatus,
    avatar: Avatar,
    customers: Vec<Customer>,
    score: i32,
    clock_ms: u64,
    time_left_seconds: u32,
    pointer: ScreenPoint,
    canvas: (u32, u32),
    layout: Arc<StoreLayout>,
    projection: IsometricProjection,
    tuning: Arc<SessionTuning>,
}

impl GameSession {
    pub fn initialize(
        width: u32,
        height: u32,
        difficulty: Difficulty,
        tuning: SessionTuning,
    ) -> Result<Self, SessionError> {
        if width == 0 || height == 0 {
            return Err(SessionError::InvalidCanvas { width, height });
        }
        tuning.validate()?;
        let layout = build_layout(tuning.rows, tuning.cols)?;
        let projection = IsometricProjection::new(
            tuning.tile_width,
            tuning.tile_height,
            width as f64 / 2.0,
            height as f64 / 4.0,
        )?;

        let spawn = Vec2::new(tuning.avatar.spawn_x, tuning.avatar.spawn_y);
        if !layout.is_walkable(spawn) {
            return Err(SessionError::BlockedSpawn {
                x: spawn.x,
                y: spawn.y,
            });
        }
        let avatar = Avatar {
            position: spawn,
            target: spawn,
            speed: tuning.avatar.speed,
            interaction_radius: tuning.avatar.interaction_radius,
            facing: Facing::Down,
            moving: false,
        };
        let customers = difficulty.roster();
        if let Some(blocked) = customers
            .iter()
            .find(|customer| !layout.is_walkable(customer.position))
        {
            return Err(SessionError::BlockedCustomer {
                id: blocked.id,
                x: blocked.position.x,
                y: blocked.position.y,
            });
        }

        info!(
            %difficulty,
            width,
            height,
            customer_count = customers.len(),
            countdown_seconds = difficulty.countdown_seconds(),
            pathing = ?tuning.pathing,
            "session_initialized"
        );

        Ok(Self {
            difficulty,
            status: SessionStatus::Loading,
            avatar,
            customers,
            score: 0,
            clock_ms: 0,
            time_left_seconds: difficulty.countdown_seconds(),
            pointer: ScreenPoint::new(width as f64 / 2.0, height as f64 / 2.0),
            canvas: (width, height),
            layout: Arc::new(layout),
            projection,
            tuning: Arc::new(tuning),
        })
    }

    /// Swaps in a custom floor. Customers and avatar keep their positions.
    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = Arc::new(layout);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_customers(mut self, customers: Vec<Customer>) -> Self {
        self.customers = customers;
        self
    }

    /// Fresh session with the same difficulty, canvas and tuning, already playing.
    pub fn restarted(&self) -> Result<Self, SessionError> {
        let (width, height) = self.canvas;
        let fresh = Self::initialize(width, height, self.difficulty, (*self.tuning).clone())?;
        Ok(fresh.with_status(SessionStatus::Playing))
    }

    pub fn tick(&self, input: &TickInput, rng: &mut dyn RandomSource) -> GameSession {
        if self.status != SessionStatus::Playing {
            return self.clone();
        }
        let dt_ms = input.dt_ms.unwrap_or(self.tuning.tick_ms);
        let pointer = input.pointer.unwrap_or(self.pointer);

        let mut avatar = self.avatar.clone();
        let pointer_grid = self.projection.screen_to_grid(pointer);
        if self.layout.is_walkable(pointer_grid) {
            avatar.target = pointer_grid;
        }
        let step = move_toward(avatar.position, avatar.target, avatar.speed, &*self.layout);
        avatar.position = step.position;
        avatar.facing = step.facing;
        avatar.moving = step.moving;

        let ctx = BehaviorContext {
            avatar_position: avatar.position,
            interaction_radius: avatar.interaction_radius,
            clock_ms: self.clock_ms,
            layout: &*self.layout,
            tuning: &self.tuning.behavior,
            pathing: self.tuning.pathing.strategy(),
        };
        let mut customers = Vec::with_capacity(self.customers.len());
        for customer in &self.customers {
            customers.push(update_customer(customer, &ctx, rng));
        }

        let delta = score_delta(&self.customers, &customers, &self.tuning.scoring);
        let score = self.score.saturating_add(delta);
        if delta != 0 {
            debug!(delta, score, clock_ms = self.clock_ms, "score_changed");
        }

        GameSession {
            avatar,
            customers,
            score,
            clock_ms: self.clock_ms.saturating_add(dt_ms),
            pointer,
            ..self.clone()
        }
    }

    /// One whole second of the session countdown. Reaching zero ends the game.
    pub fn countdown_second(&self) -> GameSession {
        if self.status != SessionStatus::Playing {
            return self.clone();
        }
        let time_left_seconds = self.time_left_seconds.saturating_sub(1);
        let mut next = GameSession {
            time_left_seconds,
            ..self.clone()
        };
        if time_left_seconds == 0 {
            next = next.with_status(SessionStatus::GameOver);
            info!(score = next.score, clock_ms = next.clock_ms, "session_complete");
        }
        next
    }

    pub fn assets_ready(&self) -> GameSession {
        match self.status {
            SessionStatus::Loading => self.clone().with_status(SessionStatus::Tutorial),
            _ => self.clone(),
        }
    }

    pub fn start(&self) -> GameSession {
        match self.status {
            SessionStatus::Loading | SessionStatus::Tutorial => {
                self.clone().with_status(SessionStatus::Playing)
            }
            _ => self.clone(),
        }
    }

    pub fn pause(&self) -> GameSession {
        match self.status {
            SessionStatus::Playing => self.clone().with_status(SessionStatus::Paused),
            _ => self.clone(),
        }
    }

    pub fn resume(&self) -> GameSession {
        match self.status {
            SessionStatus::Paused => self.clone().with_status(SessionStatus::Playing),
            _ => self.clone(),
        }
    }

    pub fn toggle_pause(&self) -> GameSession {
        match self.status {
            SessionStatus::Playing => self.pause(),
            SessionStatus::Paused => self.resume(),
            _ => self.clone(),
        }
    }

    fn with_status(mut self, status: SessionStatus) -> Self {
        if self.status != status {
            info!(from = %self.status, to = %status, "session_status_changed");
            self.status = status;
        }
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status == SessionStatus::GameOver
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn time_left_seconds(&self) -> u32 {
        self.time_left_seconds
    }

    pub fn pointer(&self) -> ScreenPoint {
        self.pointer
    }

    pub fn canvas(&self) -> (u32, u32) {
        self.canvas
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn projection(&self) -> &IsometricProjection {
        &self.projection
    }

    pub fn tuning(&self) -> &SessionTuning {
        &self.tuning
    }
}
