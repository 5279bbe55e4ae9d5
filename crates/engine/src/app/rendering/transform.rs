use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::Vec2;

/// Pixel position on the render surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    #[error("tile size must be positive and finite, got {tile_width}x{tile_height}")]
    DegenerateTileSize { tile_width: f64, tile_height: f64 },
    #[error("projection origin must be finite, got ({origin_x}, {origin_y})")]
    NonFiniteOrigin { origin_x: f64, origin_y: f64 },
}

/// 2:1 diamond projection between grid space and screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IsometricProjection {
    tile_width: f64,
    tile_height: f64,
    origin_x: f64,
    origin_y: f64,
}

impl IsometricProjection {
    pub fn new(
        tile_width: f64,
        tile_height: f64,
        origin_x: f64,
        origin_y: f64,
    ) -> Result<Self, ProjectionError> {
        let valid_size = |value: f64| value.is_finite() && value > 0.0;
        if !valid_size(tile_width) || !valid_size(tile_height) {
            return Err(ProjectionError::DegenerateTileSize {
                tile_width,
                tile_height,
            });
        }
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(ProjectionError::NonFiniteOrigin { origin_x, origin_y });
        }
        Ok(Self {
            tile_width,
            tile_height,
            origin_x,
            origin_y,
        })
    }

    pub fn tile_width(&self) -> f64 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f64 {
        self.tile_height
    }

    pub fn origin(&self) -> ScreenPoint {
        ScreenPoint::new(self.origin_x, self.origin_y)
    }

    pub fn grid_to_screen(&self, grid: Vec2) -> ScreenPoint {
        ScreenPoint {
            x: self.origin_x + (grid.x - grid.y) * self.tile_width / 2.0,
            y: self.origin_y + (grid.x + grid.y) * self.tile_height / 2.0,
        }
    }

    pub fn screen_to_grid(&self, screen: ScreenPoint) -> Vec2 {
        let a = (screen.x - self.origin_x) / (self.tile_width / 2.0);
        let b = (screen.y - self.origin_y) / (self.tile_height / 2.0);
        Vec2 {
            x: (a + b) / 2.0,
            y: (b - a) / 2.0,
        }
    }
}
