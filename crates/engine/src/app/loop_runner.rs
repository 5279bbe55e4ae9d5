use std::env;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::InputSnapshot;

pub const FRAME_MS_ENV_VAR: &str = "RETAIL_FLOOR_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    /// Frame length fed to the simulation when not running in real time.
    pub frame_interval: Duration,
    pub max_frames: Option<u64>,
    /// Sleep for `frame_interval` between frames and measure wall-clock deltas.
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 600,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            frame_interval: Duration::from_millis(16),
            max_frames: None,
            realtime: false,
        }
    }
}

impl LoopConfig {
    /// Applies `RETAIL_FLOOR_FRAME_MS` on top of the configured frame interval.
    pub fn with_env_overrides(mut self) -> Self {
        self.frame_interval =
            resolve_frame_interval(self.frame_interval, env::var(FRAME_MS_ENV_VAR));
        self
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window size must be non-zero, got {width}x{height}")]
    InvalidWindowSize { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// Something the loop advances in fixed ticks and whole seconds.
pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> SceneCommand;
    fn second_elapsed(&mut self) -> SceneCommand;
    fn render(&mut self);
}

/// Supplies the pointer state for each tick.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, window_size: (u32, u32)) -> InputSnapshot;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SceneQuit,
    FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub ticks: u64,
    pub seconds: u64,
    pub dropped_backlog: Duration,
    pub stop_reason: StopReason,
}

pub fn run_headless(
    config: LoopConfig,
    scene: &mut dyn Scene,
    input: &mut dyn InputSource,
) -> Result<LoopSummary, AppError> {
    if config.window_width == 0 || config.window_height == 0 {
        return Err(AppError::InvalidWindowSize {
            width: config.window_width,
            height: config.window_height,
        });
    }
    let window_size = (config.window_width, config.window_height);
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let frame_interval =
        normalize_non_zero_duration(config.frame_interval, Duration::from_millis(16));

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        frame_interval_ms = frame_interval.as_millis() as u64,
        realtime = config.realtime,
        "loop_config"
    );

    scene.load();

    let mut accumulator = Duration::ZERO;
    let mut countdown = CountdownTimer::new(Duration::from_secs(1));
    let mut last_frame_instant = Instant::now();
    let mut summary = LoopSummary {
        frames: 0,
        ticks: 0,
        seconds: 0,
        dropped_backlog: Duration::ZERO,
        stop_reason: StopReason::FrameLimit,
    };

    'frames: loop {
        if let Some(max_frames) = config.max_frames {
            if summary.frames >= max_frames {
                break;
            }
        }

        let raw_frame_dt = if config.realtime {
            thread::sleep(frame_interval);
            let now = Instant::now();
            let elapsed = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            elapsed
        } else {
            frame_interval
        };

        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
        accumulator = accumulator.saturating_add(clamped_frame_dt);

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            let input_snapshot = input.snapshot_for_tick(window_size);
            summary.ticks = summary.ticks.saturating_add(1);
            if scene.update(fixed_dt, &input_snapshot) == SceneCommand::Quit {
                summary.stop_reason = StopReason::SceneQuit;
                summary.frames = summary.frames.saturating_add(1);
                break 'frames;
            }
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            summary.dropped_backlog = summary
                .dropped_backlog
                .saturating_add(step_plan.dropped_backlog);
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        for _ in 0..countdown.advance(clamped_frame_dt) {
            summary.seconds = summary.seconds.saturating_add(1);
            debug!(seconds = summary.seconds, ticks = summary.ticks, "second_elapsed");
            if scene.second_elapsed() == SceneCommand::Quit {
                summary.stop_reason = StopReason::SceneQuit;
                summary.frames = summary.frames.saturating_add(1);
                break 'frames;
            }
        }

        scene.render();
        summary.frames = summary.frames.saturating_add(1);
    }

    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        seconds = summary.seconds,
        dropped_backlog_ms = summary.dropped_backlog.as_millis() as u64,
        stop_reason = ?summary.stop_reason,
        "loop_finished"
    );
    Ok(summary)
}

/// Converts frame time into whole elapsed periods, carrying the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTimer {
    period: Duration,
    accumulated: Duration,
}

impl CountdownTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period: normalize_non_zero_duration(period, Duration::from_secs(1)),
            accumulated: Duration::ZERO,
        }
    }

    /// Adds `elapsed` and returns how many full periods completed.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated = self.accumulated.saturating_add(elapsed);
        let mut periods = 0u32;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            periods = periods.saturating_add(1);
        }
        periods
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

pub fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

pub fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn resolve_frame_interval(
    config_interval: Duration,
    env_value: Result<String, env::VarError>,
) -> Duration {
    match env_value {
        Ok(value) => parse_frame_interval(&value).unwrap_or_else(|| {
            warn!(
                env_var = FRAME_MS_ENV_VAR,
                value = value.as_str(),
                "invalid frame interval env var value; falling back to config"
            );
            config_interval
        }),
        Err(env::VarError::NotPresent) => config_interval,
        Err(err) => {
            warn!(
                env_var = FRAME_MS_ENV_VAR,
                error = %err,
                "unable to read frame interval env var; falling back to config"
            );
            config_interval
        }
    }
}

fn parse_frame_interval(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[derive(Default)]
    struct CountingScene {
        loaded: bool,
        updates: u64,
        seconds: u64,
        renders: u64,
        quit_after_seconds: Option<u64>,
    }

    impl Scene for CountingScene {
        fn load(&mut self) {
            self.loaded = true;
        }

        fn update(&mut self, _fixed_dt: Duration, _input: &InputSnapshot) -> SceneCommand {
            self.updates += 1;
            SceneCommand::None
        }

        fn second_elapsed(&mut self) -> SceneCommand {
            self.seconds += 1;
            match self.quit_after_seconds {
                Some(limit) if self.seconds >= limit => SceneCommand::Quit,
                _ => SceneCommand::None,
            }
        }

        fn render(&mut self) {
            self.renders += 1;
        }
    }

    struct NoPointer;

    impl InputSource for NoPointer {
        fn snapshot_for_tick(&mut self, window_size: (u32, u32)) -> InputSnapshot {
            InputSnapshot::empty().with_window_size(window_size)
        }
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn countdown_timer_carries_partial_periods() {
        let mut timer = CountdownTimer::new(Duration::from_secs(1));
        assert_eq!(timer.advance(Duration::from_millis(600)), 0);
        assert_eq!(timer.advance(Duration::from_millis(600)), 1);
        assert_eq!(timer.advance(Duration::from_millis(2_300)), 2);
        timer.reset();
        assert_eq!(timer.advance(Duration::from_millis(999)), 0);
    }

    #[test]
    fn frame_interval_parse_rejects_garbage_and_zero() {
        assert_eq!(parse_frame_interval(" 33 "), Some(Duration::from_millis(33)));
        assert_eq!(parse_frame_interval("0"), None);
        assert_eq!(parse_frame_interval("fast"), None);
    }

    #[test]
    fn frame_interval_override_falls_back_to_config() {
        let configured = Duration::from_millis(16);
        assert_eq!(
            resolve_frame_interval(configured, Ok("33".to_string())),
            Duration::from_millis(33)
        );
        assert_eq!(resolve_frame_interval(configured, Ok("0".to_string())), configured);
        assert_eq!(
            resolve_frame_interval(configured, Err(env::VarError::NotPresent)),
            configured
        );
        assert_eq!(
            resolve_frame_interval(
                configured,
                Err(env::VarError::NotUnicode(OsString::from("16")))
            ),
            configured
        );
    }

    #[test]
    fn run_headless_uses_configured_frame_interval() {
        let mut scene = CountingScene::default();
        let config = LoopConfig {
            target_tps: 100,
            frame_interval: Duration::from_millis(50),
            max_frames: Some(4),
            ..LoopConfig::default()
        };

        let summary = run_headless(config, &mut scene, &mut NoPointer).expect("loop runs");

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.ticks, 20);
        assert_eq!(summary.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn run_headless_stops_at_frame_limit() {
        let mut scene = CountingScene::default();
        let config = LoopConfig {
            target_tps: 50,
            frame_interval: Duration::from_millis(20),
            max_frames: Some(100),
            ..LoopConfig::default()
        };

        let summary = run_headless(config, &mut scene, &mut NoPointer).expect("loop runs");

        assert!(scene.loaded);
        assert_eq!(summary.stop_reason, StopReason::FrameLimit);
        assert_eq!(summary.frames, 100);
        assert_eq!(scene.renders, 100);
        assert_eq!(summary.ticks, scene.updates);
        assert_eq!(summary.seconds, 2);
    }

    #[test]
    fn run_headless_stops_when_scene_quits() {
        let mut scene = CountingScene {
            quit_after_seconds: Some(3),
            ..CountingScene::default()
        };
        let config = LoopConfig {
            frame_interval: Duration::from_millis(100),
            ..LoopConfig::default()
        };

        let summary = run_headless(config, &mut scene, &mut NoPointer).expect("loop runs");

        assert_eq!(summary.stop_reason, StopReason::SceneQuit);
        assert_eq!(scene.seconds, 3);
        assert_eq!(summary.frames, 30);
    }

    #[test]
    fn run_headless_rejects_zero_window() {
        let config = LoopConfig {
            window_width: 0,
            ..LoopConfig::default()
        };
        let result = run_headless(config, &mut CountingScene::default(), &mut NoPointer);
        assert!(matches!(result, Err(AppError::InvalidWindowSize { .. })));
    }
}
