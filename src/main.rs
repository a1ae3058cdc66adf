use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use explorer::api::{build_http_client, ApiClient};
use explorer::app::{App, AppEvent};
use explorer::config::Config;
use explorer::favorites::{FavoritesHub, FavoritesStore};
use explorer::navigation::Location;
use explorer::preferences::PreferenceManager;
use explorer::storage::{Database, DatabaseError};

/// Get the config directory path (~/.config/explorer/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("explorer"))
}

#[derive(Parser, Debug)]
#[command(name = "explorer", about = "Browse Rick and Morty characters in the terminal")]
struct Args {
    /// Start location, e.g. "/?status=Alive&page=2" or "/characters/1"
    #[arg(long, value_name = "LOC", default_value = "/")]
    location: String,

    /// Add a character to favorites and exit
    #[arg(long, value_name = "ID", conflicts_with_all = ["remove_favorite", "list_favorites"])]
    add_favorite: Option<i64>,

    /// Remove a character from favorites and exit
    #[arg(long, value_name = "ID", conflicts_with = "list_favorites")]
    remove_favorite: Option<i64>,

    /// Print favorite characters and exit
    #[arg(long)]
    list_favorites: bool,

    /// Delete stored favorites and preferences before starting
    #[arg(long)]
    reset_storage: bool,

    /// Use a different config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // User-only access on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(&config_dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                eprintln!(
                    "Warning: could not restrict permissions on {}: {}",
                    config_dir.display(),
                    e
                );
            }
        }
    }

    init_logging(&config_dir)?;

    let start = Location::parse(&args.location)
        .with_context(|| format!("Invalid --location '{}'", args.location))?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = config_dir.join("storage.db");

    let http = build_http_client(config.request_timeout()).context("Failed to build HTTP client")?;
    let api = ApiClient::new(http, &config.api_base_url)
        .context("Invalid api_base_url in config")?
        .with_timeout(config.request_timeout());
    tracing::info!(base_url = api.base_url(), "API client ready");

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in storage path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of explorer appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open storage: {}", e)),
    };

    if args.reset_storage {
        db.clear().await.context("Failed to reset storage")?;
        tracing::info!("Storage reset");
        println!("Storage reset.");
    }

    if args.add_favorite.is_some() || args.remove_favorite.is_some() || args.list_favorites {
        let hub = FavoritesHub::new(db, api);
        let mut store = hub.store();
        store.initialize().await;
        if let Some(id) = args.add_favorite {
            let pending = store.add(id).await.context("Failed to add favorite")?;
            store.drive(pending).await;
            println!("Added character {} to favorites.", id);
        }
        if let Some(id) = args.remove_favorite {
            let pending = store.remove(id).await.context("Failed to remove favorite")?;
            store.drive(pending).await;
            println!("Removed character {} from favorites.", id);
        }
        print_favorites(&store);
        return Ok(());
    }

    let prefs = match PreferenceManager::load(&config, &db).await {
        Ok(prefs) => prefs,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read stored preferences, using config");
            PreferenceManager::from_config(&config)
        }
    };

    let mut app = App::new(db, api, &config, prefs, start);

    // Event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    explorer::ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}

/// Log to `explorer.log` in the config dir so output never lands on the TUI.
fn init_logging(config_dir: &std::path::Path) -> Result<()> {
    let log_path = config_dir.join("explorer.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_favorites(store: &FavoritesStore) {
    if store.count() == 0 {
        println!("No favorites yet.");
        return;
    }
    if let Some(error) = store.error() {
        eprintln!("Warning: {}", error);
    }

    println!("Favorites ({}):", store.count());
    let characters = store.favorite_characters();
    for id in store.ids() {
        match characters.iter().find(|c| c.id == *id) {
            Some(c) => println!("  #{:<4} {} ({}, {})", c.id, c.name, c.status, c.species),
            None => println!("  #{:<4} (unavailable)", id),
        }
    }
}
