use tracing::{error, info};

use gatekeep::db::AccountRepository;
use gatekeep::{Config, Database};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = gatekeep::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        gatekeep::logging::init_console_only(&config.logging.level);
    }

    info!("gatekeep - registration admission service");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // Opening the database applies pending migrations
    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    match AccountRepository::new(db.pool()).count().await {
        Ok(count) => info!(accounts = count, path = %config.database.path, "Database ready"),
        Err(e) => error!("Failed to count accounts: {}", e),
    }

    db.close().await;
}
