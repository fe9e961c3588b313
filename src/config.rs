//! Application configuration loaded from environment variables.
//!
//! - `PUMPPORTAL_WEBSOCKET_URL` overrides the default public feed endpoint.
//! - `PERPBOARD_MINT` is the token mint to subscribe to.
//! - `PERPBOARD_RECONNECT` enables automatic reconnection (`1`, `true`,
//!   `yes`, `on`); it is disabled by default.
//! - `PERPBOARD_RECONNECT_MAX_ATTEMPTS` bounds consecutive reconnects.

use std::time::Duration;

/// Default public WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://pumpportal.fun/api/data";

/// Initial backoff duration between reconnection attempts.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff duration between reconnection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub feed: FeedConfig,
}

/// Feed-specific configuration values.
#[derive(Debug)]
pub struct FeedConfig {
    pub websocket_url: String,
    /// Token mint used as the subscription key.
    pub mint: Option<String>,
    /// `None` keeps the feed down after a close or error.
    pub reconnect: Option<ReconnectPolicy>,
}

/// Bounded exponential backoff applied after a session ends on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive reconnects allowed without reaching `Connected`;
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// Returns the delay to use after `current`, doubling up to the cap.
    #[must_use]
    pub fn next_backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_backoff)
    }

    /// Returns `true` if another reconnect is allowed after `attempts`.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
            max_attempts: None,
        }
    }
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`PerpboardError::Config`](crate::PerpboardError::Config) if
/// `PERPBOARD_RECONNECT` is not a recognized boolean or
/// `PERPBOARD_RECONNECT_MAX_ATTEMPTS` is not a positive integer.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let websocket_url = non_empty_var("PUMPPORTAL_WEBSOCKET_URL")
        .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());

    let mint = non_empty_var("PERPBOARD_MINT");

    let reconnect_enabled = match non_empty_var("PERPBOARD_RECONNECT") {
        Some(raw) => parse_flag(&raw).ok_or_else(|| {
            crate::PerpboardError::Config(format!(
                "PERPBOARD_RECONNECT must be a boolean, got {raw:?}"
            ))
        })?,
        None => false,
    };

    let max_attempts = match non_empty_var("PERPBOARD_RECONNECT_MAX_ATTEMPTS") {
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                return Err(crate::PerpboardError::Config(format!(
                    "PERPBOARD_RECONNECT_MAX_ATTEMPTS must be a positive integer, got {raw:?}"
                )));
            }
        },
        None => None,
    };

    let reconnect = reconnect_enabled.then(|| ReconnectPolicy {
        max_attempts,
        ..ReconnectPolicy::default()
    });

    Ok(AppConfig {
        feed: FeedConfig {
            websocket_url,
            mint,
            reconnect,
        },
    })
}

/// Checks the arguments of a feed `start` call before anything touches
/// the network.
///
/// # Errors
///
/// Returns [`PerpboardError::Config`](crate::PerpboardError::Config) if
/// either value is blank or the endpoint is not a `ws://`/`wss://` URL.
pub fn validate_endpoint(endpoint: &str, subscription_key: &str) -> crate::Result<()> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(crate::PerpboardError::Config(
            "feed endpoint is empty".to_string(),
        ));
    }
    if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
        return Err(crate::PerpboardError::Config(format!(
            "feed endpoint must be a ws:// or wss:// URL, got {endpoint:?}"
        )));
    }
    if subscription_key.trim().is_empty() {
        return Err(crate::PerpboardError::Config(
            "subscription key is empty".to_string(),
        ));
    }

    Ok(())
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper that temporarily sets env vars, runs `f`, then restores originals.
    ///
    /// Env vars are process-global, so every test touching them holds
    /// `ENV_LOCK` for its whole duration.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
        let _guard = ENV_LOCK.lock();

        let originals: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: all env mutation in this crate's tests is serialized by ENV_LOCK.
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values under the same lock.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    const ALL_VARS: [&str; 4] = [
        "PUMPPORTAL_WEBSOCKET_URL",
        "PERPBOARD_MINT",
        "PERPBOARD_RECONNECT",
        "PERPBOARD_RECONNECT_MAX_ATTEMPTS",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|k| (*k, None)).collect()
    }

    fn cleared_with(
        overrides: &[(&'static str, &'static str)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        let mut vars = cleared();
        for (name, value) in overrides {
            for slot in vars.iter_mut() {
                if slot.0 == *name {
                    slot.1 = Some(*value);
                }
            }
        }
        vars
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&cleared(), || {
            let config = fetch_config().unwrap();
            assert_eq!(config.feed.websocket_url, DEFAULT_WEBSOCKET_URL);
            assert!(config.feed.mint.is_none());
            assert!(config.feed.reconnect.is_none());
        });
    }

    #[test]
    fn loads_mint_and_url_from_env() {
        with_env(
            &cleared_with(&[
                ("PUMPPORTAL_WEBSOCKET_URL", "wss://custom.example.com"),
                ("PERPBOARD_MINT", "So11111111111111111111111111111111111111112"),
            ]),
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.feed.websocket_url, "wss://custom.example.com");
                assert_eq!(
                    config.feed.mint.as_deref(),
                    Some("So11111111111111111111111111111111111111112")
                );
            },
        );
    }

    #[test]
    fn reconnect_flag_enables_default_policy() {
        with_env(&cleared_with(&[("PERPBOARD_RECONNECT", "TRUE")]), || {
            let config = fetch_config().unwrap();
            assert_eq!(config.feed.reconnect, Some(ReconnectPolicy::default()));
        });
    }

    #[test]
    fn reconnect_max_attempts_is_applied() {
        with_env(
            &cleared_with(&[
                ("PERPBOARD_RECONNECT", "on"),
                ("PERPBOARD_RECONNECT_MAX_ATTEMPTS", "3"),
            ]),
            || {
                let policy = fetch_config().unwrap().feed.reconnect.unwrap();
                assert_eq!(policy.max_attempts, Some(3));
            },
        );
    }

    #[test]
    fn rejects_unknown_reconnect_flag() {
        with_env(&cleared_with(&[("PERPBOARD_RECONNECT", "maybe")]), || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("PERPBOARD_RECONNECT must be a boolean"));
        });
    }

    #[test]
    fn rejects_zero_max_attempts() {
        with_env(
            &cleared_with(&[("PERPBOARD_RECONNECT_MAX_ATTEMPTS", "0")]),
            || {
                let err = fetch_config().unwrap_err();
                assert!(err.to_string().contains("positive integer"));
            },
        );
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &cleared_with(&[
                ("PUMPPORTAL_WEBSOCKET_URL", ""),
                ("PERPBOARD_MINT", ""),
                ("PERPBOARD_RECONNECT", ""),
            ]),
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.feed.websocket_url, DEFAULT_WEBSOCKET_URL);
                assert!(config.feed.mint.is_none());
                assert!(config.feed.reconnect.is_none());
            },
        );
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = ReconnectPolicy::default();
        let mut backoff = policy.initial_backoff;
        for _ in 0..10 {
            backoff = policy.next_backoff(backoff);
        }
        assert_eq!(backoff, MAX_BACKOFF);
        assert_eq!(
            policy.next_backoff(Duration::from_secs(2)),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn max_attempts_bounds_reconnects() {
        let policy = ReconnectPolicy {
            max_attempts: Some(2),
            ..ReconnectPolicy::default()
        };
        assert!(policy.allows(0));
        assert!(policy.allows(1));
        assert!(!policy.allows(2));
        assert!(ReconnectPolicy::default().allows(u32::MAX - 1));
    }

    #[test]
    fn validate_endpoint_rejects_blank_values() {
        assert!(validate_endpoint("", "mint").is_err());
        assert!(validate_endpoint("wss://pumpportal.fun/api/data", "  ").is_err());
        assert!(validate_endpoint("https://pumpportal.fun", "mint").is_err());
        assert!(validate_endpoint("wss://pumpportal.fun/api/data", "mint").is_ok());
        assert!(validate_endpoint("ws://127.0.0.1:9000", "mint").is_ok());
    }
}
