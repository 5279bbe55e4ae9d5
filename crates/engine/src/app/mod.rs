mod grid;
mod input;
mod loop_runner;
mod movement;
mod rendering;

pub use grid::{Facing, Passability, Tilemap, TilemapError, Vec2, Walkable};
pub use input::InputSnapshot;
pub use loop_runner::{
    clamp_frame_delta, plan_sim_steps, run_headless, AppError, CountdownTimer, InputSource,
    LoopConfig, LoopSummary, Scene, SceneCommand, StepPlan, StopReason, FRAME_MS_ENV_VAR,
};
pub use movement::{facing_for, move_toward, MoveStep, MOVE_ARRIVAL_THRESHOLD};
pub use rendering::{
    animation_frame, IsometricProjection, ProjectionError, ScreenPoint, WALK_CYCLE_FRAMES,
    WALK_FRAME_MS,
};
