//! CLI argument definitions for the Dax server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dax_core::config::DaxConfig;

/// Dax - a GraphQL backend for vaults of notes.
#[derive(Parser, Debug)]
#[command(name = "dax", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Data directory for the database and the API token.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// SQLite database file (overrides `<data-dir>/dax.db`).
    #[arg(long = "database", global = true)]
    pub database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the GraphQL server (default).
    Serve,
    /// Open the database, apply pending migrations and report the version.
    Migrate,
    /// Create a user account.
    CreateUser {
        #[arg(short = 'u', long)]
        username: String,
        /// Password; read from DAX_PASSWORD when not given.
        #[arg(long, env = "DAX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print the GraphQL schema (SDL).
    Schema {
        /// Write to this file instead of stdout.
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

impl CliArgs {
    /// The subcommand to run, `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DAX_CONFIG env var > ~/.dax/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        pick_config_path(self.config.clone(), std::env::var("DAX_CONFIG").ok())
    }

    /// Apply flag and env overrides on top of a loaded config.
    ///
    /// Port: --port > DAX_PORT > config. Database: --database > DAX_DATABASE
    /// > config. Data dir and log level come from flags only.
    pub fn apply_overrides(&self, config: &mut DaxConfig) {
        self.apply_overrides_with_env(
            config,
            std::env::var("DAX_PORT").ok(),
            std::env::var("DAX_DATABASE").ok(),
        );
    }

    fn apply_overrides_with_env(
        &self,
        config: &mut DaxConfig,
        env_port: Option<String>,
        env_database: Option<String>,
    ) {
        if let Some(port) = self
            .port
            .or_else(|| env_port.and_then(|p| p.trim().parse::<u16>().ok()))
        {
            config.server.port = port;
        }

        if let Some(data_dir) = &self.data_dir {
            config.general.data_dir = data_dir.to_string_lossy().into_owned();
        }

        let database = self
            .database
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .or(env_database.filter(|p| !p.trim().is_empty()));
        if let Some(path) = database {
            config.database.path = Some(path);
        }

        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

fn pick_config_path(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    if let Some(p) = flag {
        return p;
    }
    if let Some(p) = env.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(p);
    }
    default_config_path()
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".dax").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".dax").join("config.toml");
    }
    PathBuf::from("config.toml")
}
