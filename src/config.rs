//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)
//!
//! Note that the Firebase connection parameters (`CloudConfig`) are not part
//! of this file. They are user data, stored in the local key-value area and
//! editable at runtime.

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cloud: CloudEndpointsConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Local database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Remote endpoints used once a CloudConfig is present
#[derive(Debug, Clone, Deserialize)]
pub struct CloudEndpointsConfig {
    /// Firestore REST base URL (e.g. "https://firestore.googleapis.com")
    pub firestore_url: String,
    /// Firebase Storage REST base URL
    pub storage_url: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

/// Upload limits
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted image upload in bytes
    pub max_image_bytes: usize,
    /// Largest accepted request body; backup bundles carry images inline
    pub max_backup_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (YUYU__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/yuyu.db")?
            .set_default("cloud.firestore_url", "https://firestore.googleapis.com")?
            .set_default("cloud.storage_url", "https://firebasestorage.googleapis.com")?
            .set_default("cloud.timeout_seconds", 30)?
            .set_default("upload.max_image_bytes", 20 * 1024 * 1024)?
            .set_default("upload.max_backup_bytes", 200 * 1024 * 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("YUYU")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(crate::error::AppError::Config(
                "database.path must not be empty".to_string(),
            ));
        }

        if self.cloud.timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "cloud.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("cloud.firestore_url", &self.cloud.firestore_url),
            ("cloud.storage_url", &self.cloud.storage_url),
        ] {
            if !is_http_url(value) {
                return Err(crate::error::AppError::Config(format!(
                    "{name} must be an http(s) URL"
                )));
            }
        }

        if self.upload.max_image_bytes == 0 {
            return Err(crate::error::AppError::Config(
                "upload.max_image_bytes must be greater than 0".to_string(),
            ));
        }

        if self.upload.max_backup_bytes < self.upload.max_image_bytes {
            return Err(crate::error::AppError::Config(
                "upload.max_backup_bytes must not be smaller than upload.max_image_bytes"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) fn test_config(db_path: PathBuf) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig { path: db_path },
        cloud: CloudEndpointsConfig {
            firestore_url: "http://127.0.0.1:9".to_string(),
            storage_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 5,
        },
        upload: UploadConfig {
            max_image_bytes: 1024 * 1024,
            max_backup_bytes: 8 * 1024 * 1024,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        test_config(PathBuf::from("/tmp/yuyu-test.db"))
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.cloud.timeout_seconds = 0;

        let error = config.validate().expect_err("zero timeout must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("cloud.timeout_seconds")
        ));
    }

    #[test]
    fn validate_rejects_non_http_endpoint() {
        let mut config = valid_config();
        config.cloud.storage_url = "ftp://storage.example.com".to_string();

        let error = config
            .validate()
            .expect_err("non-http endpoints must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("cloud.storage_url")
        ));
    }

    #[test]
    fn validate_rejects_empty_database_path() {
        let mut config = valid_config();
        config.database.path = PathBuf::new();

        assert!(config.validate().is_err());
    }
}
