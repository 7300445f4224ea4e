// Configuration module for codeschema
// Reads from environment variables with sensible defaults

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Structural matcher binary (CODESCHEMA_MATCHER_BIN)
    pub matcher_bin: String,

    /// Bounded wait per matcher invocation in seconds (CODESCHEMA_MATCHER_TIMEOUT_SECS)
    pub matcher_timeout_secs: u64,

    /// Bounded wait for the `--version` probe in seconds (CODESCHEMA_PROBE_TIMEOUT_SECS)
    pub probe_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matcher_bin: "ast-grep".to_string(),
            matcher_timeout_secs: 30,
            probe_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(val) = lookup("CODESCHEMA_MATCHER_BIN") {
            let val = val.trim();
            if val.is_empty() {
                warn!(
                    default = %config.matcher_bin,
                    "empty CODESCHEMA_MATCHER_BIN, using default"
                );
            } else {
                config.matcher_bin = val.to_string();
            }
        }

        parse_into(
            &lookup,
            "CODESCHEMA_MATCHER_TIMEOUT_SECS",
            &mut config.matcher_timeout_secs,
        );
        parse_into(
            &lookup,
            "CODESCHEMA_PROBE_TIMEOUT_SECS",
            &mut config.probe_timeout_secs,
        );

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

fn parse_into<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr + std::fmt::Display,
{
    let Some(val) = lookup(key) else {
        return;
    };
    match val.trim().parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value = %val, default = %slot, "invalid config value, using default"),
    }
}
