use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use medshare_db::{create_pool, schema::initialize_database};
use tracing::info;

/// Creates or updates the MedShare schema without starting the server.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let database_url = std::env::var("DATABASE_URL")
        .wrap_err("DATABASE_URL environment variable must be set")?;

    info!("Connecting to database");
    let db_pool = create_pool(&database_url).await?;

    info!("Applying schema");
    initialize_database(&db_pool).await?;
    info!("Schema is up to date");

    Ok(())
}
