use retail_engine::{Passability, Tilemap, TilemapError, Vec2, Walkable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const DEFAULT_ROWS: u32 = 15;
pub(crate) const DEFAULT_COLS: u32 = 20;
const MIN_ROWS: u32 = 3;
const MIN_COLS: u32 = 5;

const SHELF_BLOCKS: [TileRect; 4] = [
    TileRect::new(3, 3, 4, 2),
    TileRect::new(13, 3, 4, 2),
    TileRect::new(3, 9, 4, 2),
    TileRect::new(13, 9, 4, 2),
];
const COUNTER_BLOCK: TileRect = TileRect::new(8, 1, 5, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Floor,
    Shelf,
    Counter,
    Wall,
    Entrance,
}

impl TileKind {
    pub fn is_walkable(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::Entrance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub kind: TileKind,
    pub walkable: bool,
}

impl Tile {
    fn new(x: u32, y: u32, kind: TileKind) -> Self {
        Self {
            x,
            y,
            kind,
            walkable: kind.is_walkable(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }
}

impl Walkable for Tile {
    fn is_walkable(&self) -> bool {
        self.walkable
    }
}

/// Axis-aligned block of tiles; display metadata for fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Intersection with the grid interior (everything but the border ring).
    fn clip_to_interior(self, rows: u32, cols: u32) -> Option<TileRect> {
        let min_x = self.x.max(1);
        let min_y = self.y.max(1);
        let max_x = (self.x + self.width).min(cols - 1);
        let max_y = (self.y + self.height).min(rows - 1);
        if min_x >= max_x || min_y >= max_y {
            return None;
        }
        Some(TileRect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("store layout needs at least 5x3 tiles, got {cols}x{rows}")]
    TooSmall { rows: u32, cols: u32 },
    #[error("store layout must have at least one row and one column")]
    Empty,
    #[error("store layout row {row} has {actual} tiles, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Tilemap(#[from] TilemapError),
}

/// The store floor: tile grid plus fixture rectangles for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreLayout {
    tiles: Tilemap<Tile>,
    shelves: Vec<TileRect>,
    counters: Vec<TileRect>,
}

impl StoreLayout {
    pub fn rows(&self) -> u32 {
        self.tiles.height()
    }

    pub fn cols(&self) -> u32 {
        self.tiles.width()
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        self.tiles.tile_at(x, y)
    }

    pub fn tiles(&self) -> &Tilemap<Tile> {
        &self.tiles
    }

    pub fn shelves(&self) -> &[TileRect] {
        &self.shelves
    }

    pub fn counters(&self) -> &[TileRect] {
        &self.counters
    }

    pub fn is_walkable(&self, position: Vec2) -> bool {
        self.tiles.is_walkable_at(position)
    }

    /// Entrance tiles in row-major order.
    pub fn entrances(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles
            .iter()
            .map(|(_, _, tile)| tile)
            .filter(|tile| tile.kind == TileKind::Entrance)
    }

    /// Builds a custom floor from rows of tile kinds. No fixture rectangles
    /// are derived; walkability comes from the kinds alone.
    pub fn from_kinds(rows: Vec<Vec<TileKind>>) -> Result<Self, LayoutError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(LayoutError::Empty);
        }
        let mut tiles = Vec::with_capacity(expected * rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(LayoutError::Ragged {
                    row: y,
                    expected,
                    actual: row.len(),
                });
            }
            for (x, kind) in row.iter().enumerate() {
                tiles.push(Tile::new(x as u32, y as u32, *kind));
            }
        }
        Ok(Self {
            tiles: Tilemap::new(expected as u32, rows.len() as u32, tiles)?,
            shelves: Vec::new(),
            counters: Vec::new(),
        })
    }
}

impl Passability for StoreLayout {
    fn is_walkable_at(&self, position: Vec2) -> bool {
        self.tiles.is_walkable_at(position)
    }
}

/// Generates the standard store: walled border, two entrance tiles at the
/// bottom centre, four shelf blocks and a counter. Fixtures are clipped to the
/// interior on non-default sizes.
pub fn build_layout(rows: u32, cols: u32) -> Result<StoreLayout, LayoutError> {
    if rows < MIN_ROWS || cols < MIN_COLS {
        return Err(LayoutError::TooSmall { rows, cols });
    }

    let shelves: Vec<TileRect> = SHELF_BLOCKS
        .iter()
        .filter_map(|rect| rect.clip_to_interior(rows, cols))
        .collect();
    let counters: Vec<TileRect> = COUNTER_BLOCK
        .clip_to_interior(rows, cols)
        .into_iter()
        .collect();
    let entrance_columns = [cols / 2, cols / 2 + 1];

    let mut tiles = Vec::with_capacity(rows as usize * cols as usize);
    for y in 0..rows {
        for x in 0..cols {
            let on_border = x == 0 || y == 0 || x == cols - 1 || y == rows - 1;
            let kind = if y == rows - 1 && entrance_columns.contains(&x) {
                TileKind::Entrance
            } else if on_border {
                TileKind::Wall
            } else if shelves.iter().any(|rect| rect.contains(x, y)) {
                TileKind::Shelf
            } else if counters.iter().any(|rect| rect.contains(x, y)) {
                TileKind::Counter
            } else {
                TileKind::Floor
            };
            tiles.push(Tile::new(x, y, kind));
        }
    }

    Ok(StoreLayout {
        tiles: Tilemap::new(cols, rows, tiles)?,
        shelves,
        counters,
    })
}
