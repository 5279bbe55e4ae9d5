use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Continuous grid-space position. One unit is one tile edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

/// Implemented by tile payloads that know whether an agent may stand on them.
pub trait Walkable {
    fn is_walkable(&self) -> bool;
}

/// Point queries against a walkability field.
///
/// Implementations fail closed: anything outside the field is not walkable.
pub trait Passability {
    fn is_walkable_at(&self, position: Vec2) -> bool;
}

/// Row-major rectangular grid.
///
/// Tile `(x, y)` covers the half-open square `[x, x + 1) x [y, y + 1)` in grid
/// space, so a continuous position maps to its tile by flooring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tilemap<T> {
    width: u32,
    height: u32,
    tiles: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tilemap must not be empty: {width}x{height}")]
    Empty { width: u32, height: u32 },
}

impl<T> Tilemap<T> {
    pub fn new(width: u32, height: u32, tiles: Vec<T>) -> Result<Self, TilemapError> {
        if width == 0 || height == 0 {
            return Err(TilemapError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&T> {
        self.index_of(x, y).and_then(|index| self.tiles.get(index))
    }

    /// Tile under a continuous position, or `None` when the position lies
    /// outside the grid or is not finite.
    pub fn tile_at_position(&self, position: Vec2) -> Option<&T> {
        let (x, y) = self.tile_coord_of(position)?;
        self.tile_at(x, y)
    }

    pub fn tile_coord_of(&self, position: Vec2) -> Option<(u32, u32)> {
        if !position.is_finite() || position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        if position.x >= self.width as f64 || position.y >= self.height as f64 {
            return None;
        }
        Some((position.x.floor() as u32, position.y.floor() as u32))
    }

    /// Row-major iteration yielding `(x, y, tile)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = index as u32;
            (index % width, index / width, tile)
        })
    }

    pub fn tiles(&self) -> &[T] {
        &self.tiles
    }
}

impl<T: Walkable> Passability for Tilemap<T> {
    fn is_walkable_at(&self, position: Vec2) -> bool {
        self.tile_at_position(position)
            .map(Walkable::is_walkable)
            .unwrap_or(false)
    }
}
