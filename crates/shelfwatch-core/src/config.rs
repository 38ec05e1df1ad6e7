use crate::app_config::{AppConfig, HistoryBackend, SchemaDrift};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("'{other}' is not a boolean"))),
        }
    };

    let log_level = or_default("SHELFWATCH_LOG_LEVEL", "info");
    let categories_path = PathBuf::from(or_default(
        "SHELFWATCH_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let webdriver_url = or_default("SHELFWATCH_WEBDRIVER_URL", "http://localhost:9515");
    let headless = parse_bool("SHELFWATCH_HEADLESS", "true")?;

    let page_load_timeout_secs = parse_u64("SHELFWATCH_PAGE_LOAD_TIMEOUT_SECS", "10")?;
    if page_load_timeout_secs == 0 {
        return Err(invalid(
            "SHELFWATCH_PAGE_LOAD_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let settle_delay_ms = parse_u64("SHELFWATCH_SETTLE_DELAY_MS", "2000")?;
    let inter_request_delay_ms = parse_u64("SHELFWATCH_INTER_REQUEST_DELAY_MS", "1000")?;

    let output_dir = PathBuf::from(or_default("SHELFWATCH_OUTPUT_DIR", "scraping_results"));
    let history_backend = parse_history_backend(&or_default("SHELFWATCH_HISTORY_BACKEND", "drive"))?;
    let history_dir = PathBuf::from(or_default("SHELFWATCH_HISTORY_DIR", "./history"));

    let drive_api_base = or_default("SHELFWATCH_DRIVE_API_BASE", "https://www.googleapis.com");
    let drive_access_token = lookup("GOOGLE_DRIVE_ACCESS_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());
    let drive_max_retries = parse_u32("SHELFWATCH_DRIVE_MAX_RETRIES", "3")?;
    let drive_backoff_base_ms = parse_u64("SHELFWATCH_DRIVE_BACKOFF_BASE_MS", "1000")?;

    let schema_drift = or_default("SHELFWATCH_SCHEMA_DRIFT", "intersection")
        .parse::<SchemaDrift>()
        .map_err(|reason| invalid("SHELFWATCH_SCHEMA_DRIFT", reason))?;

    Ok(AppConfig {
        log_level,
        categories_path,
        webdriver_url,
        headless,
        page_load_timeout_secs,
        settle_delay_ms,
        inter_request_delay_ms,
        output_dir,
        history_backend,
        history_dir,
        drive_api_base,
        drive_access_token,
        drive_max_retries,
        drive_backoff_base_ms,
        schema_drift,
    })
}

/// Parse a string into a `HistoryBackend` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_history_backend(s: &str) -> Result<HistoryBackend, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "drive" => Ok(HistoryBackend::Drive),
        "local" => Ok(HistoryBackend::Local),
        "none" | "off" => Ok(HistoryBackend::None),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHELFWATCH_HISTORY_BACKEND".to_string(),
            reason: format!("unknown backend '{other}'; must be drive, local, or none"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
