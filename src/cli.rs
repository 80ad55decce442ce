use std::{path::PathBuf, sync::OnceLock};

use clap::Parser;

/// Alert when containers of the same image keep dying.
///
/// Every setting can be given as a flag, an environment variable or a key in
/// the TOML config file, in that order of precedence.
#[derive(Parser, Debug, Default, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to an optional TOML config file.
    #[arg(short, long, env = "CONMON_CONFIG")]
    pub config: Option<PathBuf>,
    /// Host name used in alert messages.
    #[arg(long, env = "CONMON_HOSTNAME")]
    pub hostname: Option<String>,
    /// Webhook the alerts are posted to.
    #[arg(long, env = "CONMON_SLACK_WEBHOOK")]
    pub webhook_url: Option<String>,
    /// Trailing window, in seconds, in which restarts are counted [default: 600].
    #[arg(long, env = "CONMON_TIME_LIMIT")]
    pub time_limit: Option<u32>,
    /// Restarts within the window that trigger an alert [default: 5].
    #[arg(long, env = "CONMON_RESTART_LIMIT")]
    pub restart_limit: Option<usize>,
    /// Channel override sent along with the webhook payload.
    #[arg(long, env = "CONMON_SLACK_CHANNEL")]
    pub channel: Option<String>,
    /// HTTP proxy used to reach the webhook.
    #[arg(long, env = "CONMON_PROXY")]
    pub proxy: Option<String>,
}

static ARGS: OnceLock<Args> = OnceLock::new();

pub fn get_cli_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}
