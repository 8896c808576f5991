use std::sync::Arc;

use color_eyre::eyre::Result;
use dotenv::dotenv;
use medshare_api::config::ApiConfig;
use medshare_db::{PgStore, create_pool, schema::initialize_database};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    let config = ApiConfig::from_env()?;

    let db_pool = create_pool(&config.database_url).await?;
    initialize_database(&db_pool).await?;

    medshare_api::start_server(config, Arc::new(PgStore::new(db_pool))).await?;

    Ok(())
}
