use std::path::PathBuf;

use crate::ConfigError;

/// Runtime configuration for a collection run.
///
/// Every knob has a default; nothing here is required. API credentials are
/// deliberately *not* part of this struct — they come from the requirements
/// file parsed by [`crate::CredentialStore`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory scanned for `*_input.csv` files and the credential file,
    /// and where the consolidated report is written.
    pub input_dir: PathBuf,
    /// Per-request timeout for provider API calls.
    pub request_timeout_secs: u64,
    /// Total attempts per request (first try included) before giving up.
    pub max_attempts: u32,
    /// Fixed courtesy delay inserted before every request attempt.
    pub request_delay_ms: u64,
    pub user_agent: String,
    pub log_level: String,
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable holds an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable holds an unparseable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing logic, decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let input_dir = PathBuf::from(or_default("PLACEGRAB_INPUT_DIR", "."));
    let request_timeout_secs = parse_u64("PLACEGRAB_REQUEST_TIMEOUT_SECS", "3")?;
    let max_attempts = parse_u32("PLACEGRAB_MAX_ATTEMPTS", "3")?;
    let request_delay_ms = parse_u64("PLACEGRAB_REQUEST_DELAY_MS", "100")?;
    let user_agent = or_default(
        "PLACEGRAB_USER_AGENT",
        "placegrab/0.1 (location-data-collection)",
    );
    let log_level = or_default("PLACEGRAB_LOG_LEVEL", "info");

    Ok(AppConfig {
        input_dir,
        request_timeout_secs,
        max_attempts,
        request_delay_ms,
        user_agent,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("."));
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.request_delay_ms, 100);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn overrides_are_picked_up() {
        let mut map = HashMap::new();
        map.insert("PLACEGRAB_INPUT_DIR", "/data/runs");
        map.insert("PLACEGRAB_MAX_ATTEMPTS", "5");
        map.insert("PLACEGRAB_REQUEST_DELAY_MS", "0");
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("/data/runs"));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.request_delay_ms, 0);
    }

    #[test]
    fn invalid_numeric_value_fails() {
        let mut map = HashMap::new();
        map.insert("PLACEGRAB_REQUEST_TIMEOUT_SECS", "soon");
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PLACEGRAB_REQUEST_TIMEOUT_SECS"),
        );
    }
}
