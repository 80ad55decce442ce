use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::cli::Args;
use crate::config_file::ConmonConfigFile;
use crate::tracker::TrackerSettings;

pub const DEFAULT_TIME_LIMIT: u32 = 600;
pub const DEFAULT_RESTART_LIMIT: usize = 5;
/// Upper bound on `restart_limit`; each image keeps this many timestamps.
pub const MAX_RESTART_LIMIT: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("No {env} set (use --{flag}, {env} or `{key}` in the config file)")]
    Missing {
        env: &'static str,
        flag: &'static str,
        key: &'static str,
    },
    #[error("Invalid {setting}: {reason}")]
    Invalid {
        setting: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: Url,
    pub channel: Option<String>,
    pub proxy: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConmonConfig {
    pub tracker: TrackerSettings,
    pub webhook: WebhookConfig,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_http_url(setting: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        setting,
        reason: format!("{value:?} is not a URL ({e})"),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid {
            setting,
            reason: format!("{value:?} must be an http(s) URL with a host"),
        });
    }
    Ok(url)
}

impl ConmonConfig {
    /// Read the config file named by `args`, if any, and merge it with `args`.
    pub fn try_init(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => ConmonConfigFile::try_init(path)?,
            None => ConmonConfigFile::default(),
        };
        Self::resolve(args, &file)
    }

    /// Merge flags/environment over the config file and validate the result.
    pub fn resolve(args: &Args, file: &ConmonConfigFile) -> Result<Self, ConfigError> {
        let hostname = non_empty(args.hostname.as_ref())
            .or(non_empty(file.hostname.as_ref()))
            .ok_or(ConfigError::Missing {
                env: "CONMON_HOSTNAME",
                flag: "hostname",
                key: "hostname",
            })?;

        let webhook_url = non_empty(args.webhook_url.as_ref())
            .or(non_empty(file.webhook_url.as_ref()))
            .ok_or(ConfigError::Missing {
                env: "CONMON_SLACK_WEBHOOK",
                flag: "webhook-url",
                key: "webhook_url",
            })?;
        let url = parse_http_url("webhook_url", webhook_url)?;

        let proxy = non_empty(args.proxy.as_ref())
            .or(non_empty(file.proxy.as_ref()))
            .map(|proxy| parse_http_url("proxy", proxy))
            .transpose()?;

        let channel = non_empty(args.channel.as_ref())
            .or(non_empty(file.channel.as_ref()))
            .map(str::to_string);

        let time_limit = args
            .time_limit
            .or(file.time_limit)
            .unwrap_or(DEFAULT_TIME_LIMIT);
        if time_limit == 0 {
            return Err(ConfigError::Invalid {
                setting: "time_limit",
                reason: "must be greater than zero".to_string(),
            });
        }

        let restart_limit = args
            .restart_limit
            .or(file.restart_limit)
            .unwrap_or(DEFAULT_RESTART_LIMIT);
        if restart_limit == 0 {
            return Err(ConfigError::Invalid {
                setting: "restart_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if restart_limit > MAX_RESTART_LIMIT {
            return Err(ConfigError::Invalid {
                setting: "restart_limit",
                reason: format!("{restart_limit} is above the maximum of {MAX_RESTART_LIMIT}"),
            });
        }

        Ok(Self {
            tracker: TrackerSettings {
                hostname: hostname.to_string(),
                time_limit: i64::from(time_limit),
                restart_limit,
            },
            webhook: WebhookConfig {
                url,
                channel,
                proxy,
            },
        })
    }
}

/// Only scheme and host of the webhook are shown, the path usually holds a
/// secret token.
impl fmt::Display for ConmonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hostname={} time_limit={}s restart_limit={} webhook={}://{}/… channel={} proxy={}",
            self.tracker.hostname,
            self.tracker.time_limit,
            self.tracker.restart_limit,
            self.webhook.url.scheme(),
            self.webhook.url.host_str().unwrap_or_default(),
            self.webhook.channel.as_deref().unwrap_or("-"),
            self.webhook
                .proxy
                .as_ref()
                .and_then(|p| p.host_str())
                .unwrap_or("-"),
        )
    }
}
