use dotenvy::dotenv;
use henhouse::{
    bot::{self, BotData},
    config::{api, database, storefront},
    core::gateway::HttpOrderGateway,
    errors::{Error, Result},
    storage::DatabaseStore,
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Storefront configuration (catalog, FAQ topics, chat settings)
    let config = storefront::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    let catalog = config.catalog();
    let responder = config
        .responder()
        .inspect_err(|e| error!("Invalid FAQ configuration: {e}"))?;
    info!(
        "Loaded {} product(s) and {} FAQ topic(s)",
        catalog.products().len(),
        responder.topics().len()
    );

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Order service client
    let api_config = api::get_order_api_config()?;
    let gateway = HttpOrderGateway::new(&api_config.base_url, api_config.timeout)?;
    info!("Orders will be sent to {}", gateway.endpoint());

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(
        DatabaseStore::new(db),
        catalog,
        responder,
        gateway,
        config.typing_delay(),
    );
    bot::run_bot(token, data).await
}
