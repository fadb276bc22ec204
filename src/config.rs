use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Deployment tier. Selects the token signing algorithm: the lower-trust
/// tiers use a shared secret so development does not require key files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Testing,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn uses_symmetric_keys(self) -> bool {
        !matches!(self, Self::Production)
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "testing" => Some(Self::Testing),
            "production" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub environment: Environment,

    /// Shared HMAC secret for non-production tiers.
    pub jwt_secret: String,

    /// RSA key pair used in production (RS512). Read once at startup;
    /// a missing or malformed file aborts startup.
    pub private_key_path: String,

    pub public_key_path: String,

    /// Access/refresh token lifetime. Both tokens currently share it.
    pub token_ttl_days: i64,

    /// Password-reset code lifetime in minutes.
    pub otp_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            jwt_secret: "change-me".to_string(),
            private_key_path: "private.key".to_string(),
            public_key_path: "public.key".to_string(),
            token_ttl_days: 7,
            otp_ttl_minutes: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/doorman.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables take precedence over the config file so
    /// deployments can inject secrets without editing it.
    fn apply_env_overrides(&mut self) {
        if let Ok(env) = std::env::var("APP_ENV")
            && let Some(parsed) = Environment::parse(&env)
        {
            self.auth.environment = parsed;
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Ok(minutes) = std::env::var("OTP_TTL_MINUTES")
            && let Ok(parsed) = minutes.parse()
        {
            self.auth.otp_ttl_minutes = parsed;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.general.database_path = url;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        vec![PathBuf::from("config.toml")]
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.environment.uses_symmetric_keys() && self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty outside production");
        }

        if self.auth.token_ttl_days <= 0 {
            anyhow::bail!("Token TTL must be > 0 days");
        }

        if self.auth.otp_ttl_minutes <= 0 {
            anyhow::bail!("OTP TTL must be > 0 minutes");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.auth.environment, Environment::Development);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.auth.otp_ttl_minutes, 10);
        assert_eq!(config.security.argon2_parallelism, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [auth]
            environment = "staging"
            otp_ttl_minutes = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.auth.environment, Environment::Staging);
        assert_eq!(config.auth.otp_ttl_minutes, 5);

        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validation_rejects_empty_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = String::new();
        assert!(config.validate().is_err());

        config.auth.environment = Environment::Production;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            Environment::parse("production"),
            Some(Environment::Production)
        );
        assert_eq!(Environment::parse("qa"), None);
        assert!(!Environment::Production.uses_symmetric_keys());
        assert!(Environment::Testing.uses_symmetric_keys());
    }
}
