use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub llm: LlmConfig,
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL of this service, used to build the render callback.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub jwt_issuer: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    pub base_url: String,
    pub render_timeout_secs: u64,
    pub merge_timeout_secs: u64,
    /// Storage domain the renderer returns URLs on, e.g. `https://<account>.r2.dev`.
    pub r2_internal_domain: Option<String>,
    /// Public domain clients should use instead of the internal one.
    pub r2_public_domain: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. `from_env` wraps this
    /// with `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST").filter(|v| !v.is_empty()) {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = v.parse().map_err(|_| ConfigError::Invalid { key: "PORT", value: v })?;
        }
        if let Some(v) = lookup("PUBLIC_BASE_URL").filter(|v| !v.is_empty()) {
            self.server.public_base_url = Some(v.trim_end_matches('/').to_string());
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_JWT_ISSUER").filter(|v| !v.is_empty()) {
            self.security.jwt_issuer = v;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // LLM overrides
        if let Some(v) = lookup("GEMINI_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("GEMINI_MODEL").filter(|v| !v.is_empty()) {
            self.llm.model = v;
        }
        if let Some(v) = lookup("GEMINI_BASE_URL").filter(|v| !v.is_empty()) {
            self.llm.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = v.parse().unwrap_or(self.llm.timeout_secs);
        }

        // Renderer overrides
        if let Some(v) = lookup("MANIM_RENDERER_URL") {
            self.renderer.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("RENDERER_RENDER_TIMEOUT_SECS") {
            self.renderer.render_timeout_secs = v.parse().unwrap_or(self.renderer.render_timeout_secs);
        }
        if let Some(v) = lookup("RENDERER_MERGE_TIMEOUT_SECS") {
            self.renderer.merge_timeout_secs = v.parse().unwrap_or(self.renderer.merge_timeout_secs);
        }
        self.renderer.r2_internal_domain = lookup("PYTHON_R2_INTERNAL_DOMAIN")
            .filter(|v| !v.is_empty())
            .or(self.renderer.r2_internal_domain);
        self.renderer.r2_public_domain = lookup("FRONTEND_R2_PUBLIC_DOMAIN")
            .filter(|v| !v.is_empty())
            .or(self.renderer.r2_public_domain);

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::Invalid {
                key: "SECURITY_JWT_EXPIRY_HOURS",
                value: self.security.jwt_expiry_hours.to_string(),
            });
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.llm.api_key.is_empty() {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }
        if self.renderer.base_url.is_empty() {
            return Err(ConfigError::Missing("MANIM_RENDERER_URL"));
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                jwt_issuer: DEFAULT_ISSUER.to_string(),
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            llm: LlmConfig::default(),
            renderer: RendererConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                jwt_issuer: DEFAULT_ISSUER.to_string(),
                cors_origins: Vec::new(),
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 25,
                connection_timeout: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                jwt_issuer: DEFAULT_ISSUER.to_string(),
                cors_origins: vec!["https://manime-frontend-gen.vercel.app".to_string()],
            },
            ..Self::development()
        }
    }
}

const DEFAULT_ISSUER: &str = "manim-orchestrator-api";

/// Token lifetimes are capped at one year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_base_url: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            render_timeout_secs: 10,
            merge_timeout_secs: 60,
            r2_internal_domain: None,
            r2_public_domain: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL the renderer uses to reach this service. Loopback and unspecified
    /// hosts are swapped for `host.docker.internal` since the renderer runs in a container.
    pub fn callback_base_url(&self) -> String {
        if let Some(base) = &self.public_base_url {
            return base.clone();
        }
        let host = match self.host.as_str() {
            "127.0.0.1" | "0.0.0.0" | "localhost" => "host.docker.internal",
            other => other,
        };
        format!("http://{}:{}", host, self.port)
    }
}

impl RendererConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn merge_timeout(&self) -> Duration {
        Duration::from_secs(self.merge_timeout_secs)
    }
}
