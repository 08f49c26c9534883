use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> Result<u16, ConfigError> {
    match profiled_env_opt(profile, key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: v,
        }),
        None => Ok(default),
    }
}

fn profiled_env_bool(profile: &str, key: &str) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub mysql: MySqlConfig,
    pub mongo: MongoConfig,
    pub datadog: DatadogConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `QUERYGATE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env_or("QUERYGATE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p)?,
            mysql: MySqlConfig::from_env_profiled(p)?,
            mongo: MongoConfig::from_env_profiled(p),
            datadog: DatadogConfig::from_env_profiled(p),
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:   {}:{}, api_key={}", self.server.host, self.server.port, redact(&self.server.api_key));
        tracing::info!("  mysql:    {}@{}:{}/{}", self.mysql.user, self.mysql.host, self.mysql.port, self.mysql.database);
        tracing::info!("  mongodb:  enabled={}, db={}", self.mongo.enabled, self.mongo.database);
        tracing::info!("  datadog:  enabled={}, site={}", self.datadog.enabled, self.datadog.site);
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "(set)" } else { "(none)" }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret expected in `X-API-Key` (or `apiKey` on SSE routes).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3000)?,
            api_key: profiled_env_opt(p, "API_KEY"),
        })
    }
}

// ── MySQL ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
}

impl MySqlConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            host: profiled_env_or(p, "MYSQL_HOST", "localhost"),
            port: profiled_env_u16(p, "MYSQL_PORT", 3306)?,
            user: profiled_env_or(p, "MYSQL_USER", "root"),
            password: profiled_env_or(p, "MYSQL_PASSWORD", ""),
            database: profiled_env_or(p, "MYSQL_DATABASE", ""),
        })
    }
}

// ── MongoDB ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub url: String,
    pub database: String,
}

impl MongoConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "MONGO_ENABLED"),
            url: profiled_env_or(p, "MONGO_URL", "mongodb://localhost:27017"),
            database: profiled_env_or(p, "MONGO_DATABASE", "test"),
        }
    }
}

// ── Datadog Logs ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatadogConfig {
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub app_key: Option<String>,
    /// e.g. "datadoghq.com", "datadoghq.eu", "us5.datadoghq.com"
    pub site: String,
}

impl DatadogConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "DATADOG_ENABLED"),
            api_key: profiled_env_opt(p, "DATADOG_API_KEY"),
            app_key: profiled_env_opt(p, "DATADOG_APP_KEY"),
            site: profiled_env_or(p, "DATADOG_SITE", "datadoghq.com"),
        }
    }

    pub fn base_url(&self) -> String {
        format!("https://api.{}", self.site)
    }

    /// Returns `(api_key, app_key)`, both of which the Logs API requires.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("DATADOG_API_KEY".to_string()))?;
        let app_key = self
            .app_key
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("DATADOG_APP_KEY".to_string()))?;
        Ok((api_key, app_key))
    }
}
