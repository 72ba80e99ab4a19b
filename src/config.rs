use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub contact: ContactConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Exact origin allowed for CORS. Unset allows any origin.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5341
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Connection URL for the remote tier, e.g. `rediss://:<token>@host:6379`.
    /// Unset disables the remote tier; the in-process cache still applies.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Cap on upstream API calls per endpoint within the trailing window.
    #[serde(default = "default_upstream_max")]
    pub upstream_max_per_hour: usize,
    #[serde(default = "default_upstream_window")]
    pub upstream_window_secs: u64,
    /// Inbound per-IP limits for the proxy routes.
    #[serde(default = "default_per_second")]
    pub per_second: u64,
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
    /// Stricter inbound limits for the contact route.
    #[serde(default = "default_contact_per_second")]
    pub contact_per_second: u64,
    #[serde(default = "default_contact_burst_size")]
    pub contact_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            upstream_max_per_hour: default_upstream_max(),
            upstream_window_secs: default_upstream_window(),
            per_second: default_per_second(),
            burst_size: default_burst_size(),
            contact_per_second: default_contact_per_second(),
            contact_burst_size: default_contact_burst_size(),
        }
    }
}

fn default_upstream_max() -> usize {
    4000
}
fn default_upstream_window() -> u64 {
    3600
}
fn default_per_second() -> u64 {
    10
}
fn default_burst_size() -> u32 {
    20
}
fn default_contact_per_second() -> u64 {
    1
}
fn default_contact_burst_size() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    /// Account whose profile, repositories and contributions are served.
    #[serde(default)]
    pub username: String,
    /// Personal access token. Optional for REST endpoints (at anonymous
    /// quota), required for the GraphQL contributions endpoint.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    #[serde(default = "default_profile_ttl")]
    pub profile_ttl_secs: u64,
    #[serde(default = "default_repos_ttl")]
    pub repos_ttl_secs: u64,
    #[serde(default = "default_contributions_ttl")]
    pub contributions_ttl_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            token: None,
            api_base_url: default_api_base_url(),
            graphql_url: default_graphql_url(),
            profile_ttl_secs: default_profile_ttl(),
            repos_ttl_secs: default_repos_ttl(),
            contributions_ttl_secs: default_contributions_ttl(),
        }
    }
}

impl GithubConfig {
    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }
    pub fn repos_ttl(&self) -> Duration {
        Duration::from_secs(self.repos_ttl_secs)
    }
    pub fn contributions_ttl(&self) -> Duration {
        Duration::from_secs(self.contributions_ttl_secs)
    }
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}
fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}
fn default_profile_ttl() -> u64 {
    300
}
fn default_repos_ttl() -> u64 {
    300
}
fn default_contributions_ttl() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactConfig {
    /// Mailbox receiving contact submissions.
    #[serde(default)]
    pub to: String,
    #[serde(default = "default_contact_from")]
    pub from: String,
    /// HTTP email-delivery API endpoint (Resend-compatible). Preferred over
    /// SMTP when both are configured.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            to: String::new(),
            from: default_contact_from(),
            api_url: None,
            api_key: None,
            smtp: SmtpConfig::default(),
        }
    }
}

fn default_contact_from() -> String {
    "folio@example.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_smtp_starttls")]
    pub starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "smtp.example.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            starttls: true,
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.example.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_smtp_starttls() -> bool {
    true
}

impl AppConfig {
    /// Validate configuration before startup.
    pub fn validate(&self) -> Result<(), String> {
        if self.github.username.is_empty() {
            return Err("github.username must be set. \
                 Set it in config.toml or via FOLIO__GITHUB__USERNAME env var."
                .to_string());
        }
        if self.rate_limit.upstream_max_per_hour == 0 {
            return Err("rate_limit.upstream_max_per_hour must be greater than zero".to_string());
        }
        if self.contact.api_url.is_some() && self.contact.api_key.is_none() {
            return Err("contact.api_key must be set when contact.api_url is set".to_string());
        }
        if (self.contact.api_url.is_some() || self.contact.smtp.enabled) && self.contact.to.is_empty()
        {
            return Err("contact.to must be set when contact delivery is configured".to_string());
        }
        Ok(())
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // Load from config file
        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (FOLIO__SERVER__PORT=5341, etc.)
        builder = builder.add_source(
            Environment::with_prefix("FOLIO")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
