use super::grid::{Facing, Passability, Vec2};

/// Distance under which a mover counts as arrived.
pub const MOVE_ARRIVAL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStep {
    pub position: Vec2,
    pub facing: Facing,
    pub moving: bool,
}

impl MoveStep {
    fn stationary(position: Vec2, facing: Facing) -> Self {
        Self {
            position,
            facing,
            moving: false,
        }
    }
}

/// Advances `current` toward `target` by at most `speed` grid units.
///
/// A blocked full step slides along the horizontal axis first, then the
/// vertical one. The returned position is always `current` or a walkable cell.
pub fn move_toward(
    current: Vec2,
    target: Vec2,
    speed: f64,
    grid: &impl Passability,
) -> MoveStep {
    let delta = target - current;
    let distance = delta.length();
    if !distance.is_finite() || distance < MOVE_ARRIVAL_THRESHOLD {
        return MoveStep::stationary(current, Facing::Down);
    }
    if !speed.is_finite() || speed <= 0.0 {
        return MoveStep::stationary(current, facing_for(delta));
    }

    let step = delta * (speed.min(distance) / distance);
    let facing = facing_for(step);

    let full = current + step;
    if grid.is_walkable_at(full) {
        return MoveStep {
            position: full,
            facing,
            moving: true,
        };
    }

    if step.x != 0.0 {
        let horizontal = Vec2::new(current.x + step.x, current.y);
        if grid.is_walkable_at(horizontal) {
            return MoveStep {
                position: horizontal,
                facing: horizontal_facing(step.x),
                moving: true,
            };
        }
    }

    if step.y != 0.0 {
        let vertical = Vec2::new(current.x, current.y + step.y);
        if grid.is_walkable_at(vertical) {
            return MoveStep {
                position: vertical,
                facing: vertical_facing(step.y),
                moving: true,
            };
        }
    }

    MoveStep::stationary(current, facing)
}

/// Dominant axis of `step`; an exact tie resolves horizontally.
pub fn facing_for(step: Vec2) -> Facing {
    if step.x.abs() >= step.y.abs() {
        horizontal_facing(step.x)
    } else {
        vertical_facing(step.y)
    }
}

fn horizontal_facing(dx: f64) -> Facing {
    if dx > 0.0 {
        Facing::Right
    } else {
        Facing::Left
    }
}

fn vertical_facing(dy: f64) -> Facing {
    if dy > 0.0 {
        Facing::Down
    } else {
        Facing::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::grid::{Tilemap, Walkable};

    #[derive(Debug, Clone, Copy)]
    struct Cell(bool);

    impl Walkable for Cell {
        fn is_walkable(&self) -> bool {
            self.0
        }
    }

    fn open_grid(width: u32, height: u32) -> Tilemap<Cell> {
        Tilemap::new(width, height, vec![Cell(true); (width * height) as usize])
            .expect("valid tilemap")
    }

    /// Grid with the listed tiles blocked.
    fn grid_with_blocked(width: u32, height: u32, blocked: &[(u32, u32)]) -> Tilemap<Cell> {
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Cell(!blocked.contains(&(x, y))));
            }
        }
        Tilemap::new(width, height, tiles).expect("valid tilemap")
    }

    #[test]
    fn arrived_mover_stays_put_facing_down() {
        let grid = open_grid(5, 5);
        let step = move_toward(Vec2::new(2.0, 2.0), Vec2::new(2.05, 2.0), 0.5, &grid);
        assert_eq!(step.position, Vec2::new(2.0, 2.0));
        assert_eq!(step.facing, Facing::Down);
        assert!(!step.moving);
    }

    #[test]
    fn step_never_exceeds_speed_or_overshoots() {
        let grid = open_grid(10, 10);
        let current = Vec2::new(1.0, 1.0);
        let step = move_toward(current, Vec2::new(8.0, 5.0), 0.05, &grid);
        assert!(step.moving);
        assert!(current.distance(step.position) <= 0.05 + 1e-12);

        let near_target = Vec2::new(1.3, 1.0);
        let step = move_toward(current, near_target, 5.0, &grid);
        assert!((step.position.x - near_target.x).abs() < 1e-12);
        assert_eq!(step.facing, Facing::Right);
    }

    #[test]
    fn facing_tracks_dominant_axis_and_ties_go_horizontal() {
        assert_eq!(facing_for(Vec2::new(-0.3, 0.1)), Facing::Left);
        assert_eq!(facing_for(Vec2::new(0.1, -0.3)), Facing::Up);
        assert_eq!(facing_for(Vec2::new(0.1, 0.3)), Facing::Down);
        assert_eq!(facing_for(Vec2::new(0.2, 0.2)), Facing::Right);
    }

    #[test]
    fn blocked_diagonal_slides_horizontally() {
        // (2, 2) blocked; moving from (1.95, 1.95) down-right lands there on a full step.
        let grid = grid_with_blocked(5, 5, &[(2, 2)]);
        let step = move_toward(Vec2::new(1.95, 1.95), Vec2::new(4.0, 4.0), 0.1, &grid);
        assert!(step.moving);
        assert!(step.position.y == 1.95);
        assert!(step.position.x > 1.95);
        assert_eq!(step.facing, Facing::Right);
    }

    #[test]
    fn blocked_diagonal_slides_vertically_when_horizontal_is_blocked() {
        let grid = grid_with_blocked(5, 5, &[(2, 2), (2, 1)]);
        let step = move_toward(Vec2::new(1.95, 1.95), Vec2::new(4.0, 4.0), 0.1, &grid);
        assert!(step.moving);
        assert!(step.position.x == 1.95);
        assert!(step.position.y > 1.95);
        assert_eq!(step.facing, Facing::Down);
    }

    #[test]
    fn fully_blocked_mover_stays_put() {
        let grid = grid_with_blocked(5, 5, &[(2, 1)]);
        let current = Vec2::new(1.95, 1.5);
        let step = move_toward(current, Vec2::new(4.0, 1.5), 0.1, &grid);
        assert_eq!(step.position, current);
        assert!(!step.moving);
        assert_eq!(step.facing, Facing::Right);
    }

    #[test]
    fn movement_never_lands_on_unwalkable_cells() {
        let grid = grid_with_blocked(6, 6, &[(3, 3), (2, 3), (3, 2), (0, 0)]);
        let targets = [
            Vec2::new(5.5, 5.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(3.5, 0.5),
            Vec2::new(0.5, 5.5),
        ];
        let mut position = Vec2::new(1.5, 1.5);
        for target in targets {
            for _ in 0..200 {
                let step = move_toward(position, target, 0.17, &grid);
                assert!(grid.is_walkable_at(step.position), "step={step:?}");
                position = step.position;
            }
        }
    }
}
