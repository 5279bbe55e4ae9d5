//! Render-facing view of a session.
//!
//! Simulation state only carries semantic [`SpriteKind`] ids. Whatever draws
//! the floor resolves them to its own resources through a [`SpriteProvider`]
//! and reads a [`GameSession`] without ever writing back into it.

use std::collections::HashMap;

use retail_engine::{animation_frame, Facing, ScreenPoint, SpriteKey, SpriteKeyError, Vec2};
use serde::{Serialize, Serializer};
use thiserror::Error;

use super::config::BehaviorTuning;
use super::customer::{Customer, CustomerState};
use super::layout::TileKind;
use super::session::GameSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteKind {
    Associate,
    Customer1,
    Customer2,
    Customer3,
    Customer4,
    Customer5,
    Customer6,
    FloorTile,
    ShelfTile,
    CounterTile,
    WallTile,
    EntranceTile,
    QuestionIcon,
    ClockIcon,
    SpeechIcon,
    SatisfiedIcon,
    AngryIcon,
}

impl SpriteKind {
    pub const ALL: [SpriteKind; 17] = [
        SpriteKind::Associate,
        SpriteKind::Customer1,
        SpriteKind::Customer2,
        SpriteKind::Customer3,
        SpriteKind::Customer4,
        SpriteKind::Customer5,
        SpriteKind::Customer6,
        SpriteKind::FloorTile,
        SpriteKind::ShelfTile,
        SpriteKind::CounterTile,
        SpriteKind::WallTile,
        SpriteKind::EntranceTile,
        SpriteKind::QuestionIcon,
        SpriteKind::ClockIcon,
        SpriteKind::SpeechIcon,
        SpriteKind::SatisfiedIcon,
        SpriteKind::AngryIcon,
    ];

    pub fn asset_key(self) -> &'static str {
        match self {
            SpriteKind::Associate => "associate",
            SpriteKind::Customer1 => "customer-1",
            SpriteKind::Customer2 => "customer-2",
            SpriteKind::Customer3 => "customer-3",
            SpriteKind::Customer4 => "customer-4",
            SpriteKind::Customer5 => "customer-5",
            SpriteKind::Customer6 => "customer-6",
            SpriteKind::FloorTile => "tiles/floor",
            SpriteKind::ShelfTile => "tiles/shelf",
            SpriteKind::CounterTile => "tiles/counter",
            SpriteKind::WallTile => "tiles/wall",
            SpriteKind::EntranceTile => "tiles/entrance",
            SpriteKind::QuestionIcon => "icons/question",
            SpriteKind::ClockIcon => "icons/clock",
            SpriteKind::SpeechIcon => "icons/speech",
            SpriteKind::SatisfiedIcon => "icons/satisfied",
            SpriteKind::AngryIcon => "icons/angry",
        }
    }

    pub fn from_asset_key(key: &str) -> Option<SpriteKind> {
        SpriteKind::ALL
            .into_iter()
            .find(|kind| kind.asset_key() == key)
    }

    pub fn for_tile(kind: TileKind) -> SpriteKind {
        match kind {
            TileKind::Floor => SpriteKind::FloorTile,
            TileKind::Shelf => SpriteKind::ShelfTile,
            TileKind::Counter => SpriteKind::CounterTile,
            TileKind::Wall => SpriteKind::WallTile,
            TileKind::Entrance => SpriteKind::EntranceTile,
        }
    }
}

impl Serialize for SpriteKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.asset_key())
    }
}

/// Resolves semantic sprite ids to renderer-owned resources.
pub trait SpriteProvider {
    type Handle;

    fn sprite(&self, kind: SpriteKind) -> Option<&Self::Handle>;
}

#[derive(Debug, Error)]
pub enum SpriteRegistryError {
    #[error("invalid sprite key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: SpriteKeyError,
    },
    #[error("sprite key '{key}' does not name a known sprite")]
    UnknownKey { key: String },
}

/// In-memory [`SpriteProvider`] keyed by asset key.
#[derive(Debug, Clone)]
pub struct SpriteRegistry<H> {
    entries: HashMap<SpriteKind, H>,
}

impl<H> Default for SpriteRegistry<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H> SpriteRegistry<H> {
    pub fn register(&mut self, kind: SpriteKind, handle: H) -> Option<H> {
        self.entries.insert(kind, handle)
    }

    pub fn register_key(
        &mut self,
        key: &str,
        handle: H,
    ) -> Result<SpriteKind, SpriteRegistryError> {
        let key = SpriteKey::parse(key).map_err(|source| SpriteRegistryError::InvalidKey {
            key: key.to_string(),
            source,
        })?;
        let kind = SpriteKind::from_asset_key(key.as_str()).ok_or_else(|| {
            SpriteRegistryError::UnknownKey {
                key: key.to_string(),
            }
        })?;
        self.entries.insert(kind, handle);
        Ok(kind)
    }

    /// Sprites still lacking a handle, in [`SpriteKind::ALL`] order.
    pub fn missing(&self) -> Vec<SpriteKind> {
        SpriteKind::ALL
            .into_iter()
            .filter(|kind| !self.entries.contains_key(kind))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

impl<H> SpriteProvider for SpriteRegistry<H> {
    type Handle = H;

    fn sprite(&self, kind: SpriteKind) -> Option<&H> {
        self.entries.get(&kind)
    }
}

/// Overlay drawn above a customer's head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indicator {
    NeedsHelp { patience_fraction: f64 },
    Waiting,
    Helped { progress: f64 },
    Satisfied,
    Angry,
}

impl Indicator {
    pub fn icon(self) -> SpriteKind {
        match self {
            Indicator::NeedsHelp { .. } => SpriteKind::QuestionIcon,
            Indicator::Waiting => SpriteKind::ClockIcon,
            Indicator::Helped { .. } => SpriteKind::SpeechIcon,
            Indicator::Satisfied => SpriteKind::SatisfiedIcon,
            Indicator::Angry => SpriteKind::AngryIcon,
        }
    }
}

pub fn indicator_for(customer: &Customer, tuning: &BehaviorTuning) -> Option<Indicator> {
    match customer.state {
        CustomerState::Browsing if customer.needs_help => Some(Indicator::NeedsHelp {
            patience_fraction: (customer.patience / tuning.max_patience).clamp(0.0, 1.0),
        }),
        CustomerState::Browsing | CustomerState::Leaving => None,
        CustomerState::Waiting => Some(Indicator::Waiting),
        CustomerState::Helped => Some(Indicator::Helped {
            progress: (customer.interaction_time as f64 / tuning.help_ticks_required as f64)
                .min(1.0),
        }),
        CustomerState::Satisfied => Some(Indicator::Satisfied),
        CustomerState::Angry => Some(Indicator::Angry),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DrawEntity {
    Avatar,
    Customer(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawItem {
    pub entity: DrawEntity,
    pub sprite: SpriteKind,
    pub grid: Vec2,
    pub screen: ScreenPoint,
    pub facing: Facing,
    /// Walk-cycle frame; always 0 while standing still.
    pub frame: u64,
    pub indicator: Option<Indicator>,
}

/// Avatar and customers back to front (ascending grid y). Equal rows keep
/// the avatar first, then roster order.
pub fn draw_order(session: &GameSession) -> Vec<DrawItem> {
    let projection = session.projection();
    let walk_frame = animation_frame(session.clock_ms());
    let frame_for = |moving: bool| if moving { walk_frame } else { 0 };

    let avatar = session.avatar();
    let mut items = Vec::with_capacity(session.customers().len() + 1);
    items.push(DrawItem {
        entity: DrawEntity::Avatar,
        sprite: SpriteKind::Associate,
        grid: avatar.position,
        screen: projection.grid_to_screen(avatar.position),
        facing: avatar.facing,
        frame: frame_for(avatar.moving),
        indicator: None,
    });
    for customer in session.customers() {
        items.push(DrawItem {
            entity: DrawEntity::Customer(customer.id),
            sprite: customer.sprite,
            grid: customer.position,
            screen: projection.grid_to_screen(customer.position),
            facing: customer.facing,
            frame: frame_for(customer.moving),
            indicator: indicator_for(customer, &session.tuning().behavior),
        });
    }
    items.sort_by(|a, b| a.grid.y.total_cmp(&b.grid.y));
    items
}

/// Consumer of finished ticks.
pub trait SceneRenderer {
    fn render(&mut self, session: &GameSession);
}
