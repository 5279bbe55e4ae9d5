pub mod app;
mod rng;
mod sprite_keys;

pub use app::{
    animation_frame, clamp_frame_delta, facing_for, move_toward, plan_sim_steps, run_headless,
    AppError, CountdownTimer, Facing, InputSnapshot, InputSource, IsometricProjection, LoopConfig,
    LoopSummary, MoveStep, Passability, ProjectionError, Scene, SceneCommand, ScreenPoint,
    StepPlan, StopReason, Tilemap, TilemapError, Vec2, Walkable, FRAME_MS_ENV_VAR,
    MOVE_ARRIVAL_THRESHOLD, WALK_CYCLE_FRAMES, WALK_FRAME_MS,
};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom, DEFAULT_SEED};
pub use sprite_keys::{validate_sprite_key, SpriteKey, SpriteKeyError};
