//! Server configuration.
//!
//! Layered, later sources win: built-in defaults, an optional TOML file,
//! then environment variables (`PORT`, `REDIS_HOST`, `MAX_CONCURRENCY`, ...).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use episode_calendar_core::bangumi::DEFAULT_BASE_URL;
use episode_calendar_core::cache::RedisSettings;
use episode_calendar_core::constants::{
    DEFAULT_FUTURE_GRACE_DAYS, DEFAULT_MAX_CONCURRENCY, MAX_FUTURE_GRACE_DAYS,
};
use episode_calendar_core::ServiceOptions;

/// Where subject and feed cache entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    pub cache_backend: CacheBackend,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: u8,
    pub redis_username: Option<String>,
    pub redis_password: Option<String>,

    /// Log every HTTP request through tower-http's TraceLayer
    pub enable_request_logging: bool,
    pub max_concurrency: usize,
    pub future_grace_days: i64,

    pub bangumi_base_url: String,
}

impl ServerConfig {
    /// `<config dir>/episode-calendar/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("episode-calendar").join("config.toml"))
    }

    /// Load from `path` (or the default path) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        Self::from_sources(path.as_deref(), config::Environment::default())
    }

    fn from_sources(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000_i64)?
            .set_default("cache_backend", "redis")?
            .set_default("redis_host", "127.0.0.1")?
            .set_default("redis_port", 6379_i64)?
            .set_default("redis_db", 0_i64)?
            .set_default("enable_request_logging", false)?
            .set_default("max_concurrency", DEFAULT_MAX_CONCURRENCY as i64)?
            .set_default("future_grace_days", DEFAULT_FUTURE_GRACE_DAYS)?
            .set_default("bangumi_base_url", DEFAULT_BASE_URL)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let mut cfg: ServerConfig = builder
            .add_source(env.ignore_empty(true))
            .build()
            .context("Could not read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if !(0..=MAX_FUTURE_GRACE_DAYS).contains(&cfg.future_grace_days) {
            bail!(
                "future_grace_days must be between 0 and {MAX_FUTURE_GRACE_DAYS}, got {}",
                cfg.future_grace_days
            );
        }

        cfg.bangumi_base_url = cfg.bangumi_base_url.trim_end_matches('/').to_string();
        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn redis_settings(&self) -> RedisSettings {
        RedisSettings {
            host: self.redis_host.clone(),
            port: self.redis_port,
            db: self.redis_db,
            username: self.redis_username.clone().filter(|s| !s.is_empty()),
            password: self.redis_password.clone().filter(|s| !s.is_empty()),
        }
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            max_concurrency: self.max_concurrency,
            future_grace_days: self.future_grace_days,
        }
    }
}
