//! Process configuration.
//!
//! Read once at startup from the environment and immutable afterwards.
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `SLACK_SIGNING_SECRET` | yes | |
//! | `SLACK_BOT_TOKEN` | yes | |
//! | `SLACK_DISPATCH_ADDR` | no | `0.0.0.0:3000` |
//! | `SLACK_API_BASE` | no | `https://slack.com/api` |

use std::net::SocketAddr;

use thiserror::Error;

use crate::slack::DEFAULT_API_BASE;

pub const ENV_SIGNING_SECRET: &str = "SLACK_SIGNING_SECRET";
pub const ENV_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
pub const ENV_LISTEN_ADDR: &str = "SLACK_DISPATCH_ADDR";
pub const ENV_API_BASE: &str = "SLACK_API_BASE";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Errors loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {0} is empty")]
    Empty(&'static str),

    #[error("invalid listen address {value:?} in {var}")]
    InvalidAddr { var: &'static str, value: String },
}

/// Dispatcher configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub signing_secret: String,
    pub bot_token: String,
    pub listen_addr: SocketAddr,
    pub api_base: String,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::Missing(name))?;
            if value.is_empty() {
                return Err(ConfigError::Empty(name));
            }
            Ok(value)
        };

        let signing_secret = required(ENV_SIGNING_SECRET)?;
        let bot_token = required(ENV_BOT_TOKEN)?;

        let addr = lookup(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = addr.parse().map_err(|_| ConfigError::InvalidAddr {
            var: ENV_LISTEN_ADDR,
            value: addr.clone(),
        })?;

        let api_base = lookup(ENV_API_BASE)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Config {
            signing_secret,
            bot_token,
            listen_addr,
            api_base,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("signing_secret", &"[REDACTED]")
            .field("bot_token", &"[REDACTED]")
            .field("listen_addr", &self.listen_addr)
            .field("api_base", &self.api_base)
            .finish()
    }
}
