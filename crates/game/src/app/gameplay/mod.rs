mod behavior;
mod config;
mod customer;
mod layout;
mod pathing;
mod scoring;
mod session;
mod simulation;
mod snapshot;
mod sprites;

pub use behavior::{nearest_exit, update_customer, BehaviorContext};
pub use config::{
    AvatarTuning, BehaviorTuning, ScoringTuning, SessionTuning, TuningError, PATIENCE_CEILING,
    TUNING_ENV_VAR,
};
pub use customer::{Customer, CustomerState, Difficulty, ParseDifficultyError};
pub use layout::{build_layout, LayoutError, StoreLayout, Tile, TileKind, TileRect};
pub use pathing::{GridAStar, NearestWalkableOrDirect, PathStrategy, PathingMode};
pub use scoring::{points_for, score_delta, score_of};
pub use session::{Avatar, GameSession, SessionError, SessionStatus, TickInput};
pub use simulation::Simulation;
pub use snapshot::{CustomerSummary, SessionSnapshot, SnapshotError, StateCounts};
pub use sprites::{
    draw_order, indicator_for, DrawEntity, DrawItem, Indicator, SceneRenderer, SpriteKind,
    SpriteProvider, SpriteRegistry, SpriteRegistryError,
};
