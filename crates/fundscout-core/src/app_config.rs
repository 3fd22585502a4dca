use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub api_timeout_secs: u64,
    pub render_timeout_secs: u64,
    pub render_settle_ms: u64,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub interval_cron: String,
    pub daily_cron: String,
    pub linkedin_api_key: Option<String>,
    pub facebook_api_key: Option<String>,
    pub sam_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("user_agent", &self.user_agent)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("render_settle_ms", &self.render_settle_ms)
            .field("browserless_url", &self.browserless_url)
            .field(
                "browserless_token",
                &self.browserless_token.as_ref().map(|_| "[redacted]"),
            )
            .field("batch_size", &self.batch_size)
            .field("batch_delay_ms", &self.batch_delay_ms)
            .field("interval_cron", &self.interval_cron)
            .field("daily_cron", &self.daily_cron)
            .field(
                "linkedin_api_key",
                &self.linkedin_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "facebook_api_key",
                &self.facebook_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "sam_api_key",
                &self.sam_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
