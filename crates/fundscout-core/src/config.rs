use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Desktop browser user agent sent by the static-HTML adapter. Many
/// university sites serve a stripped page (or a 403) to obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

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
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values count as unset so `.env` templates with blank keys work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("FUNDSCOUT_ENV", "development"))?;
    let log_level = or_default("FUNDSCOUT_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default(
        "FUNDSCOUT_SOURCES_PATH",
        "./config/sources.yaml",
    ));

    let user_agent = or_default("FUNDSCOUT_USER_AGENT", DEFAULT_USER_AGENT);
    let http_timeout_secs = parse_u64("FUNDSCOUT_HTTP_TIMEOUT_SECS", "15")?;
    let api_timeout_secs = parse_u64("FUNDSCOUT_API_TIMEOUT_SECS", "15")?;
    let render_timeout_secs = parse_u64("FUNDSCOUT_RENDER_TIMEOUT_SECS", "30")?;
    let render_settle_ms = parse_u64("FUNDSCOUT_RENDER_SETTLE_MS", "3000")?;
    let browserless_url = optional("FUNDSCOUT_BROWSERLESS_URL");
    let browserless_token = optional("FUNDSCOUT_BROWSERLESS_TOKEN");

    let batch_size = parse_usize("FUNDSCOUT_BATCH_SIZE", "3")?;
    if batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FUNDSCOUT_BATCH_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let batch_delay_ms = parse_u64("FUNDSCOUT_BATCH_DELAY_MS", "2000")?;

    let interval_cron = or_default("FUNDSCOUT_INTERVAL_CRON", "0 0 */6 * * *");
    let daily_cron = or_default("FUNDSCOUT_DAILY_CRON", "0 0 6 * * *");

    Ok(AppConfig {
        env,
        log_level,
        sources_path,
        user_agent,
        http_timeout_secs,
        api_timeout_secs,
        render_timeout_secs,
        render_settle_ms,
        browserless_url,
        browserless_token,
        batch_size,
        batch_delay_ms,
        interval_cron,
        daily_cron,
        linkedin_api_key: optional("LINKEDIN_API_KEY"),
        facebook_api_key: optional("FACEBOOK_API_KEY"),
        sam_api_key: optional("SAM_API_KEY"),
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FUNDSCOUT_ENV".to_string(),
            reason: format!(
                "unrecognized value '{other}'; expected development, test, or production"
            ),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
