//! Configuration module for the farm visit backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory uploaded photos are stored under
    pub upload_dir: PathBuf,
    /// Base URL prefixed to public photo URLs
    pub public_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Bootstrap admin account
    pub admin_username: String,
    pub admin_password: String,
    /// When set, exported documents are also archived here
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("FARM_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let upload_dir = env::var("FARM_UPLOAD_DIR")
            .unwrap_or_else(|_| "./data/uploads".to_string())
            .into();

        let public_url = env::var("FARM_PUBLIC_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let raw_addr =
            env::var("FARM_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr.parse().map_err(|_| {
            AppError::Internal(format!("Invalid FARM_BIND_ADDR format: {}", raw_addr))
        })?;

        let log_level = env::var("FARM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("FARM_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let admin_username =
            env::var("FARM_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            env::var("FARM_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        let export_dir = env::var("FARM_EXPORT_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            db_path,
            upload_dir,
            public_url,
            bind_addr,
            log_level,
            log_format,
            admin_username,
            admin_password,
            export_dir,
        })
    }
}
