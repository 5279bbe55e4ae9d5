use std::env;
use std::process::ExitCode;

use retail_floor::app::bootstrap::{self, CliCommand};
use retail_floor::app::loop_runner;
use tracing::error;

fn main() -> ExitCode {
    bootstrap::init_tracing();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let options = match bootstrap::parse_args(&args) {
        Ok(CliCommand::Run(options)) => options,
        Ok(CliCommand::Help) => {
            println!("{}", bootstrap::usage_text());
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}\n\n{}", bootstrap::usage_text());
            return ExitCode::from(2);
        }
    };

    match bootstrap::build_app(options) {
        Ok(app) => loop_runner::run(app),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
