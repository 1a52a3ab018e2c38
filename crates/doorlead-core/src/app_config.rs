use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub locations_path: PathBuf,
    pub master_email: String,
    pub from_email: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub rate_limit_max: usize,
    pub rate_limit_window_secs: u64,
    pub meta_pixel_id: Option<String>,
    pub meta_access_token: Option<String>,
    pub meta_test_event_code: Option<String>,
    pub meta_max_retries: u32,
    pub meta_retry_base_ms: u64,
    pub meta_timeout_secs: u64,
    pub resend_api_key: Option<String>,
    pub blob_rw_token: Option<String>,
    pub leadbridge_secret: Option<String>,
    pub zapier_secret: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("locations_path", &self.locations_path)
            .field("master_email", &self.master_email)
            .field("from_email", &self.from_email)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("meta_pixel_id", &self.meta_pixel_id)
            .field(
                "meta_access_token",
                &self.meta_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("meta_test_event_code", &self.meta_test_event_code)
            .field("meta_max_retries", &self.meta_max_retries)
            .field("meta_retry_base_ms", &self.meta_retry_base_ms)
            .field("meta_timeout_secs", &self.meta_timeout_secs)
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "blob_rw_token",
                &self.blob_rw_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "leadbridge_secret",
                &self.leadbridge_secret.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "zapier_secret",
                &self.zapier_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
