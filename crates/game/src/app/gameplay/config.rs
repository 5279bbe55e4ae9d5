use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_path_to_error::Segment;
use thiserror::Error;

use super::layout::{DEFAULT_COLS, DEFAULT_ROWS};
use super::pathing::PathingMode;

pub const TUNING_ENV_VAR: &str = "RETAIL_FLOOR_TUNING";
/// Upper bound of customer patience.
pub const PATIENCE_CEILING: f64 = 100.0;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("read tuning '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse tuning json: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("parse tuning json at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {path}: {message}")]
    Invalid { path: String, message: String },
}

/// Every balance constant of a session. Missing JSON fields keep their
/// defaults, unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionTuning {
    pub tick_ms: u64,
    pub rows: u32,
    pub cols: u32,
    pub tile_width: f64,
    pub tile_height: f64,
    pub pathing: PathingMode,
    pub avatar: AvatarTuning,
    pub behavior: BehaviorTuning,
    pub scoring: ScoringTuning,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            tile_width: 64.0,
            tile_height: 32.0,
            pathing: PathingMode::default(),
            avatar: AvatarTuning::default(),
            behavior: BehaviorTuning::default(),
            scoring: ScoringTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvatarTuning {
    pub speed: f64,
    pub interaction_radius: f64,
    pub spawn_x: f64,
    pub spawn_y: f64,
}

impl Default for AvatarTuning {
    fn default() -> Self {
        Self {
            speed: 0.05,
            interaction_radius: 1.5,
            spawn_x: 10.0,
            spawn_y: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorTuning {
    /// Fraction of the interaction radius that counts as crowding.
    pub too_close_factor: f64,
    pub wander_chance: f64,
    pub notice_chance: f64,
    pub notice_cooldown_ms: u64,
    pub waiting_timeout_ms: u64,
    pub help_ticks_required: u32,
    pub approach_limit: u32,
    pub approach_patience_penalty: f64,
    pub browsing_patience_decay: f64,
    pub waiting_patience_decay: f64,
    pub abandoned_help_penalty: f64,
    pub reengage_chance: f64,
    pub reengage_needs_help_chance: f64,
    /// Scale of the customer-minus-avatar offset added when backing away.
    pub repulsion_factor: f64,
    pub max_patience: f64,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            too_close_factor: 0.5,
            wander_chance: 0.01,
            notice_chance: 0.1,
            notice_cooldown_ms: 3_000,
            waiting_timeout_ms: 5_000,
            help_ticks_required: 100,
            approach_limit: 3,
            approach_patience_penalty: 10.0,
            browsing_patience_decay: 0.05,
            waiting_patience_decay: 0.2,
            abandoned_help_penalty: 1.0,
            reengage_chance: 0.001,
            reengage_needs_help_chance: 0.3,
            repulsion_factor: 0.5,
            max_patience: PATIENCE_CEILING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringTuning {
    pub satisfied_points: i32,
    pub angry_points: i32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            satisfied_points: 10,
            angry_points: -5,
        }
    }
}

impl SessionTuning {
    pub fn load_from_path(path: &Path) -> Result<Self, TuningError> {
        let raw = fs::read_to_string(path).map_err(|source| TuningError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TuningError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let tuning = match serde_path_to_error::deserialize::<_, SessionTuning>(&mut deserializer)
        {
            Ok(tuning) => tuning,
            Err(error) => {
                // Syntax errors before any field is reached leave only unknown segments.
                let located = error
                    .path()
                    .iter()
                    .any(|segment| !matches!(segment, Segment::Unknown));
                let path = error.path().to_string();
                let source = error.into_inner();
                return if !located || path == "." {
                    Err(TuningError::Parse { source })
                } else {
                    Err(TuningError::ParseAt { path, source })
                };
            }
        };
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.tick_ms == 0 {
            return Err(expected_actual("tick_ms", "> 0", self.tick_ms));
        }
        if self.rows < 3 {
            return Err(expected_actual("rows", ">= 3", self.rows));
        }
        if self.cols < 5 {
            return Err(expected_actual("cols", ">= 5", self.cols));
        }
        require_positive("tile_width", self.tile_width)?;
        require_positive("tile_height", self.tile_height)?;

        require_positive("avatar.speed", self.avatar.speed)?;
        require_positive("avatar.interaction_radius", self.avatar.interaction_radius)?;
        require_finite("avatar.spawn_x", self.avatar.spawn_x)?;
        require_finite("avatar.spawn_y", self.avatar.spawn_y)?;

        let behavior = &self.behavior;
        require_probability("behavior.too_close_factor", behavior.too_close_factor)?;
        require_probability("behavior.wander_chance", behavior.wander_chance)?;
        require_probability("behavior.notice_chance", behavior.notice_chance)?;
        require_probability("behavior.reengage_chance", behavior.reengage_chance)?;
        require_probability(
            "behavior.reengage_needs_help_chance",
            behavior.reengage_needs_help_chance,
        )?;
        if behavior.help_ticks_required == 0 {
            return Err(expected_actual(
                "behavior.help_ticks_required",
                "> 0",
                behavior.help_ticks_required,
            ));
        }
        if behavior.approach_limit == 0 {
            return Err(expected_actual(
                "behavior.approach_limit",
                "> 0",
                behavior.approach_limit,
            ));
        }
        require_non_negative(
            "behavior.approach_patience_penalty",
            behavior.approach_patience_penalty,
        )?;
        require_non_negative(
            "behavior.browsing_patience_decay",
            behavior.browsing_patience_decay,
        )?;
        require_non_negative(
            "behavior.waiting_patience_decay",
            behavior.waiting_patience_decay,
        )?;
        require_non_negative(
            "behavior.abandoned_help_penalty",
            behavior.abandoned_help_penalty,
        )?;
        require_non_negative("behavior.repulsion_factor", behavior.repulsion_factor)?;
        if !(behavior.max_patience > 0.0 && behavior.max_patience <= PATIENCE_CEILING) {
            return Err(expected_actual(
                "behavior.max_patience",
                "a value in (0, 100]",
                behavior.max_patience,
            ));
        }
        Ok(())
    }
}

fn validation_err(path: &str, message: impl Into<String>) -> TuningError {
    TuningError::Invalid {
        path: path.to_string(),
        message: message.into(),
    }
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> TuningError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

fn require_finite(path: &str, value: f64) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(expected_actual(path, "a finite number", value))
    }
}

fn require_positive(path: &str, value: f64) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(expected_actual(path, "> 0", value))
    }
}

fn require_non_negative(path: &str, value: f64) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(expected_actual(path, ">= 0", value))
    }
}

fn require_probability(path: &str, value: f64) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(expected_actual(path, "a value in [0, 1]", value))
    }
}
