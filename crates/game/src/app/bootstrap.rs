use std::cell::Cell;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use retail_engine::{LoopConfig, SeededRandom, DEFAULT_SEED};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{
    Difficulty, GameSession, SessionError, SessionTuning, Simulation, TuningError, TUNING_ENV_VAR,
};
use super::loop_runner::{AutopilotPointer, FloorScene, TraceRenderer};

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub difficulty: Difficulty,
    pub seed: u64,
    pub tuning_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub snapshot_out: Option<PathBuf>,
    pub max_frames: Option<u64>,
    pub realtime: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            seed: DEFAULT_SEED,
            tuning_path: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            snapshot_out: None,
            max_frames: None,
            realtime: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(CliOptions),
    Help,
}

/// Everything the loop runner needs for one headless session.
pub struct AppWiring {
    pub config: LoopConfig,
    pub scene: FloorScene,
    pub input: AutopilotPointer,
    pub snapshot_out: Option<PathBuf>,
    /// Filled by the completion callback when the countdown runs out.
    pub final_score: Rc<Cell<Option<i32>>>,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub fn parse_args(args: &[String]) -> Result<CliCommand, BootError> {
    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--difficulty" => {
                let value = flag_value(args, index, "--difficulty")?;
                options.difficulty = value
                    .parse::<Difficulty>()
                    .map_err(|err| BootError::Usage(err.to_string()))?;
                index += 2;
            }
            "--seed" => {
                let value = flag_value(args, index, "--seed")?;
                options.seed = value.parse::<u64>().map_err(|_| {
                    BootError::Usage(format!("invalid --seed value '{value}' (expected u64)"))
                })?;
                index += 2;
            }
            "--tuning" => {
                options.tuning_path = Some(PathBuf::from(flag_value(args, index, "--tuning")?));
                index += 2;
            }
            "--width" => {
                let value = flag_value(args, index, "--width")?;
                options.width = parse_dimension(value, "--width")?;
                index += 2;
            }
            "--height" => {
                let value = flag_value(args, index, "--height")?;
                options.height = parse_dimension(value, "--height")?;
                index += 2;
            }
            "--snapshot-out" => {
                options.snapshot_out =
                    Some(PathBuf::from(flag_value(args, index, "--snapshot-out")?));
                index += 2;
            }
            "--frames" => {
                let value = flag_value(args, index, "--frames")?;
                options.max_frames = Some(value.parse::<u64>().map_err(|_| {
                    BootError::Usage(format!("invalid --frames value '{value}' (expected u64)"))
                })?);
                index += 2;
            }
            "--realtime" => {
                options.realtime = true;
                index += 1;
            }
            other => return Err(BootError::Usage(format!("unknown argument '{other}'"))),
        }
    }
    Ok(CliCommand::Run(options))
}

pub fn usage_text() -> String {
    [
        "usage: retail_floor [options]",
        "",
        "options:",
        "  --difficulty <easy|medium|hard>  roster and countdown (default easy)",
        "  --seed <u64>                     random seed (default 42)",
        "  --tuning <path>                  tuning json; falls back to $RETAIL_FLOOR_TUNING",
        "  --width <px> --height <px>       canvas size (default 800x600)",
        "  --snapshot-out <path>            write the final session snapshot as json",
        "  --frames <n>                     stop after n frames",
        "  --realtime                       pace frames against the wall clock",
        "  -h, --help                       print this help",
    ]
    .join("\n")
}

pub fn build_app(options: CliOptions) -> Result<AppWiring, BootError> {
    let mut app = wire_app(options, env::var_os(TUNING_ENV_VAR))?;
    app.config = app.config.with_env_overrides();
    Ok(app)
}

/// Builds the wiring from `options` and the raw tuning env value without
/// reading the process environment.
pub(crate) fn wire_app(
    options: CliOptions,
    tuning_env: Option<OsString>,
) -> Result<AppWiring, BootError> {
    info!("=== Retail Floor Startup ===");

    let tuning = resolve_tuning(options.tuning_path.as_deref(), tuning_env)?;
    let config = LoopConfig {
        window_width: options.width,
        window_height: options.height,
        target_tps: ticks_per_second(tuning.tick_ms),
        frame_interval: Duration::from_millis(tuning.tick_ms),
        max_frames: options.max_frames,
        realtime: options.realtime,
        ..LoopConfig::default()
    };

    let session =
        GameSession::initialize(options.width, options.height, options.difficulty, tuning)?;
    let input = AutopilotPointer::patrol(session.layout(), session.projection());

    let mut simulation = Simulation::new(session, SeededRandom::from_seed_u64(options.seed));
    let final_score = Rc::new(Cell::new(None));
    let sink = Rc::clone(&final_score);
    simulation.set_completion_callback(move |score| {
        sink.set(Some(score));
        println!("final score: {score}");
    });

    info!(
        difficulty = %options.difficulty,
        seed = options.seed,
        width = options.width,
        height = options.height,
        "app_wired"
    );

    Ok(AppWiring {
        config,
        scene: FloorScene::new(simulation, Box::new(TraceRenderer::new())),
        input,
        snapshot_out: options.snapshot_out,
        final_score,
    })
}

/// `--tuning` wins over the environment; neither means defaults.
fn resolve_tuning(
    flag: Option<&Path>,
    env_value: Option<OsString>,
) -> Result<SessionTuning, TuningError> {
    let path = match (flag, env_value) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(raw)) if !raw.is_empty() => PathBuf::from(raw),
        _ => {
            info!("tuning_defaults");
            return Ok(SessionTuning::default());
        }
    };
    let tuning = SessionTuning::load_from_path(&path)?;
    info!(path = %path.display(), "tuning_loaded");
    Ok(tuning)
}

fn ticks_per_second(tick_ms: u64) -> u32 {
    (1_000 / tick_ms.max(1)).clamp(1, 1_000) as u32
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, BootError> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| BootError::Usage(format!("missing value for {flag}")))
}

fn parse_dimension(value: &str, flag: &str) -> Result<u32, BootError> {
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(BootError::Usage(format!(
            "invalid {flag} value '{value}' (expected positive u32)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn run_options(raw: &[&str]) -> CliOptions {
        match parse_args(&args(raw)).expect("parse") {
            CliCommand::Run(options) => options,
            CliCommand::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn no_arguments_use_defaults() {
        assert_eq!(run_options(&[]), CliOptions::default());
    }

    #[test]
    fn parses_every_flag() {
        let options = run_options(&[
            "--difficulty",
            "hard",
            "--seed",
            "7",
            "--tuning",
            "tuning.json",
            "--width",
            "1024",
            "--height",
            "768",
            "--snapshot-out",
            "out.json",
            "--frames",
            "120",
            "--realtime",
        ]);
        assert_eq!(options.difficulty, Difficulty::Hard);
        assert_eq!(options.seed, 7);
        assert_eq!(options.tuning_path, Some(PathBuf::from("tuning.json")));
        assert_eq!((options.width, options.height), (1024, 768));
        assert_eq!(options.snapshot_out, Some(PathBuf::from("out.json")));
        assert_eq!(options.max_frames, Some(120));
        assert!(options.realtime);
    }

    #[test]
    fn help_flag_short_circuits() {
        assert_eq!(
            parse_args(&args(&["--seed", "1", "--help"])).expect("parse"),
            CliCommand::Help
        );
    }

    #[test]
    fn rejects_bad_values_and_unknown_flags() {
        for (raw, needle) in [
            (vec!["--difficulty", "nightmare"], "nightmare"),
            (vec!["--seed", "-1"], "--seed"),
            (vec!["--width", "0"], "--width"),
            (vec!["--height"], "missing value for --height"),
            (vec!["--fullscreen"], "unknown argument '--fullscreen'"),
        ] {
            let err = parse_args(&args(&raw)).expect_err("should fail");
            assert!(err.to_string().contains(needle), "args={raw:?} err={err}");
        }
    }

    #[test]
    fn tuning_flag_wins_over_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let flag_path = dir.path().join("flag.json");
        fs::write(&flag_path, r#"{"tick_ms": 20}"#).expect("write flag tuning");

        let tuning = resolve_tuning(
            Some(&flag_path),
            Some(OsString::from("/definitely/missing.json")),
        )
        .expect("flag tuning");
        assert_eq!(tuning.tick_ms, 20);
    }

    #[test]
    fn environment_tuning_is_used_without_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let env_path = dir.path().join("env.json");
        fs::write(&env_path, r#"{"scoring": {"satisfied_points": 25}}"#).expect("write env tuning");

        let tuning = resolve_tuning(None, Some(env_path.into_os_string())).expect("env tuning");
        assert_eq!(tuning.scoring.satisfied_points, 25);
        assert_eq!(tuning.tick_ms, 16);
    }

    #[test]
    fn missing_sources_fall_back_to_defaults() {
        assert_eq!(
            resolve_tuning(None, None).expect("defaults"),
            SessionTuning::default()
        );
        assert_eq!(
            resolve_tuning(None, Some(OsString::new())).expect("defaults"),
            SessionTuning::default()
        );
    }

    #[test]
    fn unreadable_tuning_path_is_an_error() {
        let err = resolve_tuning(Some(Path::new("/definitely/missing.json")), None)
            .expect_err("missing file");
        assert!(matches!(err, TuningError::Read { .. }));
    }

    #[test]
    fn loop_rate_follows_tick_length() {
        assert_eq!(ticks_per_second(16), 62);
        assert_eq!(ticks_per_second(1_000), 1);
        assert_eq!(ticks_per_second(5_000), 1);
    }

    #[test]
    fn wiring_builds_session_and_loop() {
        let options = CliOptions {
            difficulty: Difficulty::Medium,
            max_frames: Some(10),
            tuning_path: None,
            ..CliOptions::default()
        };
        let app = wire_app(options, None).expect("app");
        assert_eq!(app.config.max_frames, Some(10));
        assert_eq!(app.config.frame_interval, Duration::from_millis(16));
        assert_eq!(app.scene.session().difficulty(), Difficulty::Medium);
        assert_eq!(app.final_score.get(), None);
    }

    #[test]
    fn wiring_follows_environment_tuning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let env_path = dir.path().join("env.json");
        fs::write(&env_path, r#"{"tick_ms": 20, "cols": 24}"#).expect("write env tuning");

        let app = wire_app(CliOptions::default(), Some(env_path.into_os_string())).expect("app");
        assert_eq!(app.config.target_tps, 50);
        assert_eq!(app.config.frame_interval, Duration::from_millis(20));
        assert_eq!(app.scene.session().layout().cols(), 24);
    }
}
