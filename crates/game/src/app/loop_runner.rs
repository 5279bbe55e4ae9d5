use std::process::ExitCode;
use std::time::Duration;

use retail_engine::{
    run_headless, InputSnapshot, InputSource, IsometricProjection, Scene, SceneCommand,
    ScreenPoint, SeededRandom, Vec2,
};
use tracing::{debug, error, info};

use super::bootstrap::AppWiring;
use super::gameplay::{
    draw_order, GameSession, Indicator, SceneRenderer, SessionSnapshot, Simulation, SpriteKind,
    SpriteProvider, SpriteRegistry, StoreLayout, TickInput,
};

const PATROL_TICKS_PER_LEG: u64 = 240;
/// Patrol stops along the middle aisle, as fractions of the store width.
const PATROL_STOPS: [f64; 3] = [0.25, 0.5, 0.75];
const TRACE_EVERY_RENDERS: u64 = 60;

pub fn run(mut app: AppWiring) -> ExitCode {
    let summary = match run_headless(app.config.clone(), &mut app.scene, &mut app.input) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let session = app.scene.session();
    info!(
        score = session.score(),
        status = %session.status(),
        frames = summary.frames,
        ticks = summary.ticks,
        "session_finished"
    );
    if app.final_score.get().is_none() {
        println!(
            "stopped with {}s left, score: {}",
            session.time_left_seconds(),
            session.score()
        );
    }

    if let Some(path) = app.snapshot_out.as_deref() {
        if let Err(err) = SessionSnapshot::capture(session).write_to_path(path) {
            error!(error = %err, "snapshot_write_failed");
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), "snapshot_written");
    }

    ExitCode::SUCCESS
}

/// Adapts a [`Simulation`] to the engine's fixed-step loop.
pub struct FloorScene {
    simulation: Simulation<SeededRandom>,
    renderer: Box<dyn SceneRenderer>,
    last_score: i32,
}

impl FloorScene {
    pub fn new(simulation: Simulation<SeededRandom>, renderer: Box<dyn SceneRenderer>) -> Self {
        let last_score = simulation.session().score();
        Self {
            simulation,
            renderer,
            last_score,
        }
    }

    pub fn session(&self) -> &GameSession {
        self.simulation.session()
    }
}

impl Scene for FloorScene {
    fn load(&mut self) {
        self.simulation.assets_ready();
        self.simulation.start();
        info!(
            status = %self.simulation.session().status(),
            time_left_seconds = self.simulation.session().time_left_seconds(),
            "floor_opened"
        );
    }

    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> SceneCommand {
        let tick_input = TickInput {
            pointer: input.pointer_px(),
            dt_ms: Some((fixed_dt.as_millis() as u64).max(1)),
        };
        let session = self.simulation.advance_tick(&tick_input);
        let score = session.score();
        if score != self.last_score {
            info!(
                score,
                delta = score - self.last_score,
                time_left_seconds = session.time_left_seconds(),
                "score_updated"
            );
            self.last_score = score;
        }
        SceneCommand::None
    }

    fn second_elapsed(&mut self) -> SceneCommand {
        if self.simulation.advance_second().is_over() {
            SceneCommand::Quit
        } else {
            SceneCommand::None
        }
    }

    fn render(&mut self) {
        self.renderer.render(self.simulation.session());
    }
}

/// Stands in for a mouse: dwells on each stop for a fixed number of ticks.
#[derive(Debug, Clone)]
pub struct AutopilotPointer {
    stops: Vec<ScreenPoint>,
    ticks_per_leg: u64,
    tick: u64,
}

impl AutopilotPointer {
    pub fn new(stops: Vec<ScreenPoint>, ticks_per_leg: u64) -> Self {
        Self {
            stops,
            ticks_per_leg: ticks_per_leg.max(1),
            tick: 0,
        }
    }

    /// Walkable stops along the middle aisle of `layout`.
    pub fn patrol(layout: &StoreLayout, projection: &IsometricProjection) -> Self {
        let aisle_y = (layout.rows() / 2) as f64 + 0.5;
        let stops = PATROL_STOPS
            .iter()
            .map(|fraction| Vec2::new((layout.cols() as f64 * fraction).floor() + 1.0, aisle_y))
            .filter(|stop| layout.is_walkable(*stop))
            .map(|stop| projection.grid_to_screen(stop))
            .collect();
        Self::new(stops, PATROL_TICKS_PER_LEG)
    }

    pub fn stops(&self) -> &[ScreenPoint] {
        &self.stops
    }
}

impl InputSource for AutopilotPointer {
    fn snapshot_for_tick(&mut self, window_size: (u32, u32)) -> InputSnapshot {
        let pointer = if self.stops.is_empty() {
            None
        } else {
            let leg = (self.tick / self.ticks_per_leg) as usize % self.stops.len();
            Some(self.stops[leg])
        };
        self.tick = self.tick.saturating_add(1);
        InputSnapshot::empty()
            .with_pointer_px(pointer)
            .with_window_size(window_size)
    }
}

/// Renderer for headless runs: resolves the draw list against a registry of
/// asset keys and traces a summary every so often.
pub struct TraceRenderer {
    sprites: SpriteRegistry<&'static str>,
    renders: u64,
}

impl TraceRenderer {
    pub fn new() -> Self {
        let mut sprites = SpriteRegistry::default();
        for kind in SpriteKind::ALL {
            sprites.register(kind, kind.asset_key());
        }
        Self::with_sprites(sprites)
    }

    pub fn with_sprites(sprites: SpriteRegistry<&'static str>) -> Self {
        Self {
            sprites,
            renders: 0,
        }
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Floor tiles, entities and indicator icons with no registered sprite.
    pub fn missing_sprites(&self, session: &GameSession) -> usize {
        let tiles = session
            .layout()
            .tiles()
            .tiles()
            .iter()
            .map(|tile| SpriteKind::for_tile(tile.kind));
        let items = draw_order(session);
        let entities = items.iter().map(|item| item.sprite);
        let icons = items
            .iter()
            .filter_map(|item| item.indicator.map(Indicator::icon));
        tiles
            .chain(entities)
            .chain(icons)
            .filter(|kind| self.sprites.sprite(*kind).is_none())
            .count()
    }
}

impl Default for TraceRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer for TraceRenderer {
    fn render(&mut self, session: &GameSession) {
        self.renders = self.renders.saturating_add(1);
        if self.renders % TRACE_EVERY_RENDERS != 0 {
            return;
        }

        let items = draw_order(session);
        let indicators = items.iter().filter(|item| item.indicator.is_some()).count();
        let unresolved = self.missing_sprites(session);
        let front = items
            .last()
            .and_then(|item| self.sprites.sprite(item.sprite))
            .copied()
            .unwrap_or("none");

        debug!(
            renders = self.renders,
            clock_ms = session.clock_ms(),
            score = session.score(),
            time_left_seconds = session.time_left_seconds(),
            status = %session.status(),
            draw_items = items.len(),
            indicators,
            unresolved,
            front,
            "frame_traced"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::bootstrap::{wire_app, CliOptions};
    use crate::app::gameplay::{build_layout, Difficulty, SessionStatus, SessionTuning, TileKind};
    use retail_engine::StopReason;

    fn point(x: f64) -> ScreenPoint {
        ScreenPoint::new(x, 0.0)
    }

    #[test]
    fn autopilot_dwells_on_each_stop_then_wraps() {
        let mut pointer = AutopilotPointer::new(vec![point(1.0), point(2.0)], 2);
        let seen: Vec<Option<ScreenPoint>> = (0..5)
            .map(|_| pointer.snapshot_for_tick((800, 600)).pointer_px())
            .collect();
        assert_eq!(
            seen,
            vec![
                Some(point(1.0)),
                Some(point(1.0)),
                Some(point(2.0)),
                Some(point(2.0)),
                Some(point(1.0)),
            ]
        );
    }

    #[test]
    fn autopilot_without_stops_reports_no_pointer() {
        let mut pointer = AutopilotPointer::new(Vec::new(), 10);
        let snapshot = pointer.snapshot_for_tick((320, 240));
        assert_eq!(snapshot.pointer_px(), None);
        assert_eq!(snapshot.window_size(), (320, 240));
    }

    #[test]
    fn patrol_stops_sit_on_walkable_aisle_tiles() {
        let layout = build_layout(15, 20).expect("layout");
        let projection = IsometricProjection::new(64.0, 32.0, 400.0, 150.0).expect("projection");
        let pointer = AutopilotPointer::patrol(&layout, &projection);
        assert_eq!(pointer.stops().len(), 3);
        for stop in pointer.stops() {
            assert!(layout.is_walkable(projection.screen_to_grid(*stop)));
        }
    }

    #[test]
    fn trace_renderer_counts_every_frame() {
        let session =
            GameSession::initialize(800, 600, Difficulty::Easy, SessionTuning::default())
                .expect("session");
        let mut renderer = TraceRenderer::new();
        for _ in 0..TRACE_EVERY_RENDERS + 1 {
            renderer.render(&session);
        }
        assert_eq!(renderer.renders(), TRACE_EVERY_RENDERS + 1);
    }

    #[test]
    fn missing_floor_sprites_are_counted_per_tile() {
        let session =
            GameSession::initialize(800, 600, Difficulty::Easy, SessionTuning::default())
                .expect("session");
        assert_eq!(TraceRenderer::new().missing_sprites(&session), 0);

        let mut sprites = SpriteRegistry::default();
        for kind in SpriteKind::ALL {
            if kind != SpriteKind::WallTile {
                sprites.register(kind, kind.asset_key());
            }
        }
        let walls = session
            .layout()
            .tiles()
            .tiles()
            .iter()
            .filter(|tile| tile.kind == TileKind::Wall)
            .count();
        assert_eq!(walls, 2 * 20 + 2 * 13 - 2);
        assert_eq!(
            TraceRenderer::with_sprites(sprites).missing_sprites(&session),
            walls
        );
    }

    #[test]
    fn headless_run_plays_easy_session_to_completion() {
        let mut app = wire_app(CliOptions::default(), None).expect("app");
        let summary =
            run_headless(app.config.clone(), &mut app.scene, &mut app.input).expect("loop");

        assert_eq!(summary.stop_reason, StopReason::SceneQuit);
        assert_eq!(summary.seconds, 60);
        let session = app.scene.session();
        assert_eq!(session.status(), SessionStatus::GameOver);
        assert_eq!(app.final_score.get(), Some(session.score()));
    }

    #[test]
    fn frame_limit_stops_before_countdown_and_writes_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("floor.json");
        let options = CliOptions {
            max_frames: Some(30),
            snapshot_out: Some(path.clone()),
            ..CliOptions::default()
        };
        let app = wire_app(options, None).expect("app");

        let _ = run(app);

        let raw = std::fs::read_to_string(&path).expect("snapshot written");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["status"], "playing");
        assert_eq!(value["time_left_seconds"], 60);
    }
}
