use std::path::PathBuf;

/// Server configuration.
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | DATA_DIR | ./data | Directory for the database and legacy files |
/// | DATABASE_FILE | labels.redb | Database filename inside DATA_DIR |
/// | LEGACY_JSON_FILE | records.json | Legacy JSON document inside DATA_DIR |
/// | HTTP_PORT | 5000 | HTTP service port |
/// | LOG_LEVEL | info | Log level filter |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for all persistent files
    pub data_dir: String,
    /// Database filename (relative to `data_dir`)
    pub database_file: String,
    /// Legacy JSON document filename (relative to `data_dir`)
    pub legacy_json_file: String,
    /// HTTP API port
    pub http_port: u16,
    /// Log level filter: trace | debug | info | warn | error
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".into()),
            database_file: std::env::var("DATABASE_FILE")
                .unwrap_or_else(|_| "labels.redb".into()),
            legacy_json_file: std::env::var("LEGACY_JSON_FILE")
                .unwrap_or_else(|_| "records.json".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// Override the data directory and port, typically for tests.
    pub fn with_overrides(data_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.http_port = http_port;
        config
    }

    /// Full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.database_file)
    }

    /// Full path to the legacy JSON document.
    pub fn legacy_json_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.legacy_json_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
