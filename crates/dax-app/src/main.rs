//! Dax application binary - composition root.
//!
//! 1. Parse the command line and initialize tracing
//! 2. Load configuration from TOML and apply CLI/env overrides
//! 3. Open the SQLite database (migrations run on open)
//! 4. Run the requested command: serve, migrate, create-user or schema

mod cli;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use dax_api::state::AppState;
use dax_api::{auth, routes};
use dax_core::config::DaxConfig;
use dax_core::error::DaxError;
use dax_core::password;
use dax_core::types::NewUser;
use dax_storage::{Database, UserRepository};

use cli::{CliArgs, Command};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the subscriber before the config is read so config warnings are
/// not lost. Returns a handle when the filter may still follow the config,
/// i.e. when RUST_LOG is not set.
fn init_tracing(flag_level: Option<&str>) -> Option<FilterHandle> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(flag_level.unwrap_or("info")), false),
    };
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    (!from_env).then_some(handle)
}

fn open_database(config: &DaxConfig) -> Result<Database, DaxError> {
    Database::new(&config.database_path())
}

async fn serve(config: DaxConfig) -> Result<(), DaxError> {
    let db = open_database(&config)?;
    let token = auth::resolve_token(&config);

    let state = AppState::new(config.clone(), db, token);
    routes::start_server(&config, state).await
}

fn migrate(config: &DaxConfig) -> Result<(), DaxError> {
    let db = open_database(config)?;
    let version = db.schema_version()?;
    println!(
        "Database {} is at schema version {}",
        config.database_path().display(),
        version
    );
    Ok(())
}

fn create_user(config: &DaxConfig, username: &str, plain: &str) -> Result<(), DaxError> {
    let db = std::sync::Arc::new(open_database(config)?);
    let hash = password::hash_password(plain)?;
    let user = UserRepository::new(db).create(&NewUser {
        username: username.to_string(),
        hash,
        ..NewUser::default()
    })?;
    println!("Created user {} with id {}", user.username, user.id);
    Ok(())
}

fn write_schema(output: Option<&Path>) -> Result<(), DaxError> {
    let sdl = dax_api::sdl();
    match output {
        Some(path) => {
            std::fs::write(path, sdl)?;
            tracing::info!(path = %path.display(), "GraphQL schema written");
        }
        None => print!("{}", sdl),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let filter_handle = init_tracing(args.log_level.as_deref());

    let config_path = args.resolve_config_path();
    let mut config = DaxConfig::load_or_default(&config_path);
    args.apply_overrides(&mut config);

    // RUST_LOG > --log-level > config.
    if let Some(handle) = filter_handle {
        if let Err(e) = handle.reload(EnvFilter::new(&config.general.log_level)) {
            tracing::warn!(error = %e, "Failed to apply configured log level");
        }
    }
    tracing::info!("Dax v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;

    match args.command() {
        Command::Serve => serve(config).await?,
        Command::Migrate => migrate(&config)?,
        Command::CreateUser { username, password } => create_user(&config, &username, &password)?,
        Command::Schema { output } => write_schema(output.as_deref())?,
    }

    Ok(())
}
