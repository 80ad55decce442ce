use std::process::ExitCode;

use config::ConmonConfig;

mod cli;
mod config;
mod config_file;
mod docker;
mod event;
mod monitor;
mod notifier;
mod signals;
mod tracker;

#[tokio::main]
async fn main() -> ExitCode {
    // Values from a local .env file fill in unset environment variables.
    let _ = dotenv::dotenv();

    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let config = match ConmonConfig::try_init(cli::get_cli_args()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err} - exiting...");
            return ExitCode::FAILURE;
        }
    };

    log::info!("Starting... Config: {config}");

    let shutdown = match signals::handle_shutdown() {
        Ok(shutdown) => shutdown,
        Err(err) => {
            log::error!("Unable to install signal handlers: {err}");
            return ExitCode::FAILURE;
        }
    };

    match monitor::run(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
