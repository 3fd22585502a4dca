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
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "FUNDSCOUT_ENV"));
}

#[test]
fn build_app_config_succeeds_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.sources_path.to_str(), Some("./config/sources.yaml"));
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.http_timeout_secs, 15);
    assert_eq!(cfg.api_timeout_secs, 15);
    assert_eq!(cfg.render_timeout_secs, 30);
    assert_eq!(cfg.render_settle_ms, 3000);
    assert!(cfg.browserless_url.is_none());
    assert_eq!(cfg.batch_size, 3);
    assert_eq!(cfg.batch_delay_ms, 2000);
    assert_eq!(cfg.interval_cron, "0 0 */6 * * *");
    assert_eq!(cfg.daily_cron, "0 0 6 * * *");
    assert!(cfg.linkedin_api_key.is_none());
    assert!(cfg.facebook_api_key.is_none());
    assert!(cfg.sam_api_key.is_none());
}

#[test]
fn batch_size_override() {
    let mut map = HashMap::new();
    map.insert("FUNDSCOUT_BATCH_SIZE", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.batch_size, 5);
}

#[test]
fn batch_size_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("FUNDSCOUT_BATCH_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FUNDSCOUT_BATCH_SIZE"),
        "expected InvalidEnvVar(FUNDSCOUT_BATCH_SIZE), got: {result:?}"
    );
}

#[test]
fn batch_delay_invalid() {
    let mut map = HashMap::new();
    map.insert("FUNDSCOUT_BATCH_DELAY_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FUNDSCOUT_BATCH_DELAY_MS"),
        "expected InvalidEnvVar(FUNDSCOUT_BATCH_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn http_timeout_override() {
    let mut map = HashMap::new();
    map.insert("FUNDSCOUT_HTTP_TIMEOUT_SECS", "10");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.http_timeout_secs, 10);
}

#[test]
fn render_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("FUNDSCOUT_RENDER_TIMEOUT_SECS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FUNDSCOUT_RENDER_TIMEOUT_SECS"),
        "expected InvalidEnvVar(FUNDSCOUT_RENDER_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn blank_credentials_are_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("FACEBOOK_API_KEY", "   ");
    map.insert("LINKEDIN_API_KEY", "li-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.facebook_api_key.is_none());
    assert_eq!(cfg.linkedin_api_key.as_deref(), Some("li-token"));
}

#[test]
fn cron_overrides() {
    let mut map = HashMap::new();
    map.insert("FUNDSCOUT_INTERVAL_CRON", "0 30 */2 * * *");
    map.insert("FUNDSCOUT_DAILY_CRON", "0 0 7 * * *");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.interval_cron, "0 30 */2 * * *");
    assert_eq!(cfg.daily_cron, "0 0 7 * * *");
}

#[test]
fn debug_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("SAM_API_KEY", "sam-secret");
    map.insert("FUNDSCOUT_BROWSERLESS_TOKEN", "bl-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("sam-secret"));
    assert!(!rendered.contains("bl-secret"));
    assert!(rendered.contains("[redacted]"));
}
