use std::cmp::Reverse;
use std::collections::BinaryHeap;

use retail_engine::{Tilemap, Vec2};
use serde::{Deserialize, Serialize};

use super::layout::{StoreLayout, Tile};

/// Search order for the nearest-walkable fallback: up, right, down, left.
const FALLBACK_DIRECTIONS: [(f64, f64); 4] = [(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)];
const FALLBACK_MAX_RADIUS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathingMode {
    #[default]
    #[serde(rename = "nearest_walkable_or_direct")]
    NearestWalkableOrDirect,
    #[serde(rename = "grid_astar")]
    GridAStar,
}

impl PathingMode {
    pub fn strategy(self) -> &'static dyn PathStrategy {
        static DIRECT: NearestWalkableOrDirect = NearestWalkableOrDirect;
        static ASTAR: GridAStar = GridAStar;
        match self {
            PathingMode::NearestWalkableOrDirect => &DIRECT,
            PathingMode::GridAStar => &ASTAR,
        }
    }
}

/// Produces the waypoints a mover should visit on its way to `goal`.
/// Never returns an empty list.
pub trait PathStrategy {
    fn plan(&self, start: Vec2, goal: Vec2, layout: &StoreLayout) -> Vec<Vec2>;
}

/// Heads straight for the goal. An unwalkable goal is replaced by the first
/// walkable cell found searching outward up to three tiles; failing that the
/// mover stays where it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestWalkableOrDirect;

impl PathStrategy for NearestWalkableOrDirect {
    fn plan(&self, start: Vec2, goal: Vec2, layout: &StoreLayout) -> Vec<Vec2> {
        if layout.is_walkable(goal) {
            return vec![goal];
        }
        for radius in 1..=FALLBACK_MAX_RADIUS {
            for (dx, dy) in FALLBACK_DIRECTIONS {
                let candidate =
                    Vec2::new(goal.x + dx * radius as f64, goal.y + dy * radius as f64);
                if layout.is_walkable(candidate) {
                    return vec![candidate];
                }
            }
        }
        vec![start]
    }
}

/// 4-neighbour A* over tile walkability with deterministic tie-breaking.
///
/// Waypoints are tile coordinates after the start tile; the final one is the
/// exact goal. Unreachable goals yield `[start]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridAStar;

impl PathStrategy for GridAStar {
    fn plan(&self, start: Vec2, goal: Vec2, layout: &StoreLayout) -> Vec<Vec2> {
        let tiles = layout.tiles();
        let (Some(from), Some(to)) = (tiles.tile_coord_of(start), tiles.tile_coord_of(goal)) else {
            return vec![start];
        };
        let Some(route) = shortest_route(tiles, from, to) else {
            return vec![start];
        };

        let mut waypoints: Vec<Vec2> = route
            .into_iter()
            .skip(1)
            .map(|(x, y)| Vec2::new(x as f64, y as f64))
            .collect();
        match waypoints.last_mut() {
            Some(last) => *last = goal,
            None => waypoints.push(goal),
        }
        waypoints
    }
}

/// Open entries order by estimated total, then remaining distance, then
/// row-major tile index, so equal-cost routes always resolve the same way.
type Frontier = BinaryHeap<Reverse<(u32, u32, usize)>>;

fn shortest_route(
    tiles: &Tilemap<Tile>,
    from: (u32, u32),
    to: (u32, u32),
) -> Option<Vec<(u32, u32)>> {
    let width = tiles.width() as usize;
    let walkable_index = |(x, y): (u32, u32)| {
        tiles
            .index_of(x, y)
            .filter(|index| tiles.tiles().get(*index).is_some_and(|tile| tile.walkable))
    };
    let coord = |index: usize| ((index % width) as u32, (index / width) as u32);
    let remaining = |index: usize| {
        let (x, y) = coord(index);
        x.abs_diff(to.0) + y.abs_diff(to.1)
    };

    let start = walkable_index(from)?;
    let goal = walkable_index(to)?;
    let count = tiles.tiles().len();
    let mut cost = vec![u32::MAX; count];
    let mut came_from: Vec<Option<usize>> = vec![None; count];
    let mut settled = vec![false; count];
    let mut frontier = Frontier::new();
    cost[start] = 0;
    frontier.push(Reverse((remaining(start), remaining(start), start)));

    while let Some(Reverse((_, _, current))) = frontier.pop() {
        if settled[current] {
            continue;
        }
        settled[current] = true;
        if current == goal {
            let mut route = vec![coord(goal)];
            let mut cursor = goal;
            while let Some(previous) = came_from[cursor] {
                route.push(coord(previous));
                cursor = previous;
            }
            route.reverse();
            return Some(route);
        }

        let (x, y) = coord(current);
        let step_cost = cost[current].saturating_add(1);
        let neighbours = [
            (Some(x), y.checked_sub(1)),
            (x.checked_add(1), Some(y)),
            (Some(x), y.checked_add(1)),
            (x.checked_sub(1), Some(y)),
        ];
        for next in neighbours
            .into_iter()
            .filter_map(|(nx, ny)| Some((nx?, ny?)))
            .filter_map(walkable_index)
        {
            if settled[next] || step_cost >= cost[next] {
                continue;
            }
            cost[next] = step_cost;
            came_from[next] = Some(current);
            let h = remaining(next);
            frontier.push(Reverse((step_cost.saturating_add(h), h, next)));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gameplay::layout::{build_layout, TileKind};

    fn default_layout() -> StoreLayout {
        build_layout(15, 20).expect("default layout")
    }

    #[test]
    fn direct_returns_walkable_goal_unchanged() {
        let layout = default_layout();
        let goal = Vec2::new(7.5, 6.25);
        assert_eq!(
            NearestWalkableOrDirect.plan(Vec2::new(2.0, 2.0), goal, &layout),
            vec![goal]
        );
    }

    #[test]
    fn direct_searches_up_right_down_left_for_blocked_goal() {
        let layout = default_layout();
        let start = Vec2::new(2.0, 2.0);
        // Top-left shelf tile: the tile above is open floor.
        assert_eq!(
            NearestWalkableOrDirect.plan(start, Vec2::new(3.0, 3.0), &layout),
            vec![Vec2::new(3.0, 2.0)]
        );
        // Bottom row of the shelf: up and right are shelf, down is floor.
        assert_eq!(
            NearestWalkableOrDirect.plan(start, Vec2::new(4.0, 4.0), &layout),
            vec![Vec2::new(4.0, 5.0)]
        );
    }

    #[test]
    fn direct_falls_back_to_start_when_nothing_nearby_is_walkable() {
        let layout = default_layout();
        let start = Vec2::new(2.0, 2.0);
        assert_eq!(
            NearestWalkableOrDirect.plan(start, Vec2::new(-10.0, -10.0), &layout),
            vec![start]
        );
    }

    #[test]
    fn astar_routes_around_shelves_on_walkable_tiles() {
        let layout = default_layout();
        let goal = Vec2::new(5.0, 6.0);
        let path = GridAStar.plan(Vec2::new(5.0, 2.0), goal, &layout);

        assert_eq!(path.last().copied(), Some(goal));
        assert!(path.len() > 4, "must detour around the shelf: {path:?}");
        let mut previous = Vec2::new(5.0, 2.0);
        for waypoint in &path {
            assert!(layout.is_walkable(*waypoint), "waypoint={waypoint:?}");
            assert!((previous.distance(*waypoint) - 1.0).abs() < 1e-9);
            previous = *waypoint;
        }
    }

    #[test]
    fn astar_is_deterministic() {
        let layout = default_layout();
        let first = GridAStar.plan(Vec2::new(2.0, 7.0), Vec2::new(17.0, 12.0), &layout);
        let second = GridAStar.plan(Vec2::new(2.0, 7.0), Vec2::new(17.0, 12.0), &layout);
        assert_eq!(first, second);
    }

    #[test]
    fn astar_breaks_ties_in_row_major_order() {
        let layout = StoreLayout::from_kinds(vec![vec![TileKind::Floor; 5]; 5]).expect("layout");
        let goal = Vec2::new(2.0, 2.0);
        assert_eq!(
            GridAStar.plan(Vec2::new(0.0, 0.0), goal, &layout),
            vec![
                Vec2::new(1.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 1.0),
                goal,
            ]
        );
    }

    #[test]
    fn astar_blocked_goal_stays_at_start() {
        let layout = default_layout();
        let start = Vec2::new(2.0, 2.0);
        assert_eq!(
            GridAStar.plan(start, Vec2::new(4.0, 3.0), &layout),
            vec![start]
        );
    }

    #[test]
    fn astar_same_tile_goes_straight_to_goal() {
        let layout = default_layout();
        let goal = Vec2::new(7.75, 7.25);
        assert_eq!(GridAStar.plan(Vec2::new(7.1, 7.9), goal, &layout), vec![goal]);
    }

    #[test]
    fn astar_unreachable_goal_stays_at_start() {
        let mut rows = vec![vec![TileKind::Floor; 5]; 5];
        rows[2] = vec![TileKind::Wall; 5];
        let layout = StoreLayout::from_kinds(rows).expect("layout");
        let start = Vec2::new(1.0, 0.0);
        assert_eq!(
            GridAStar.plan(start, Vec2::new(1.0, 4.0), &layout),
            vec![start]
        );
    }

    #[test]
    fn pathing_mode_parses_from_snake_case_names() {
        let mode: PathingMode = serde_json::from_str("\"grid_astar\"").expect("parse mode");
        assert_eq!(mode, PathingMode::GridAStar);
        let mode: PathingMode =
            serde_json::from_str("\"nearest_walkable_or_direct\"").expect("parse mode");
        assert_eq!(mode, PathingMode::NearestWalkableOrDirect);
    }
}
