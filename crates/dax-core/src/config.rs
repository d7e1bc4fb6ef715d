use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DaxError, Result};

/// Top-level configuration for the Dax backend.
///
/// Loaded from `~/.dax/config.toml` by default. Every section falls back to
/// its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaxConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl DaxConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaxConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if !(0.0..=1.0).contains(&search.similarity_threshold) {
            return Err(DaxError::Config(format!(
                "search.similarity_threshold must be between 0 and 1, got {}",
                search.similarity_threshold
            )));
        }
        if search.default_limit == 0 || search.max_limit == 0 {
            return Err(DaxError::Config(
                "search limits must be greater than zero".to_string(),
            ));
        }
        if search.default_limit > search.max_limit {
            return Err(DaxError::Config(format!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                search.default_limit, search.max_limit
            )));
        }
        if self.server.port == 0 {
            return Err(DaxError::Config("server.port must not be 0".to_string()));
        }
        Ok(())
    }

    /// Data directory with `~` expanded.
    pub fn data_dir(&self) -> PathBuf {
        resolve_data_dir(&self.general.data_dir)
    }

    /// SQLite database file: `database.path` if set, else `<data_dir>/dax.db`.
    pub fn database_path(&self) -> PathBuf {
        match self.database.path.as_deref() {
            Some(p) if !p.trim().is_empty() => resolve_data_dir(p),
            _ => self.data_dir().join("dax.db"),
        }
    }

    /// Where a generated API token is persisted.
    pub fn token_path(&self) -> PathBuf {
        self.data_dir().join("api_token")
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir == "~" || data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let rest = data_dir.get(2..).unwrap_or("");
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(data_dir)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the database and the generated API token.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.dax".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP / GraphQL server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Serve the GraphiQL playground at `/`.
    pub playground: bool,
    /// Fixed bearer token. When unset a token is generated and persisted
    /// under the data directory.
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            playground: true,
            api_token: None,
        }
    }
}

/// Database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file. Defaults to `<data_dir>/dax.db`.
    pub path: Option<String>,
}

/// Heading search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum trigram similarity for a heading to match (0.0 to 1.0).
    pub similarity_threshold: f64,
    /// Default number of results.
    pub default_limit: u64,
    /// Maximum number of results.
    pub max_limit: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl SearchConfig {
    /// Clamp a requested limit into `1..=max_limit`, using the default when
    /// none was given.
    pub fn clamp_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit)
    }
}
