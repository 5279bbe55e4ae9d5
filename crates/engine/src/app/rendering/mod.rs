mod transform;

pub use transform::{IsometricProjection, ProjectionError, ScreenPoint};

/// Frames in one walk cycle.
pub const WALK_CYCLE_FRAMES: u64 = 4;
/// Milliseconds each walk-cycle frame stays on screen.
pub const WALK_FRAME_MS: u64 = 150;

/// Walk-cycle frame index for a simulation clock reading.
pub fn animation_frame(clock_ms: u64) -> u64 {
    (clock_ms / WALK_FRAME_MS) % WALK_CYCLE_FRAMES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_frame_cycles_every_six_hundred_ms() {
        assert_eq!(animation_frame(0), 0);
        assert_eq!(animation_frame(149), 0);
        assert_eq!(animation_frame(150), 1);
        assert_eq!(animation_frame(450), 3);
        assert_eq!(animation_frame(600), 0);
    }
}
