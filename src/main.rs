use dotenvy::dotenv;
use resihub::{
    config::{
        database::{create_connection, create_tables},
        settings::{Settings, load_default_settings},
    },
    core::dashboard::{admin_overview, format_admin_summary},
    errors::Result,
    store::Store,
};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long to wait for every dashboard source to deliver.
const WARM_UP: Duration = Duration::from_secs(2);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal
    dotenv().ok();

    // 3. Community settings
    let settings = load_default_settings().unwrap_or_else(|e| {
        warn!("Using default settings: {e}");
        Settings::default()
    });
    info!(community = %settings.community.name, "Loaded settings");

    // 4. Open the store
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let store = Store::new(db);

    // 5. Print the admin overview once all sources have delivered
    let overview = admin_overview(&store, &settings);
    let deadline = tokio::time::Instant::now() + WARM_UP;
    while !overview.is_warm() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    if !overview.is_warm() {
        warn!("Some dashboard sources have not delivered yet");
    }
    info!("\n{}", format_admin_summary(&overview.current()));
    overview.cancel();

    Ok(())
}
