use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use officehours_db::{create_pool, schema::initialize_database};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();
    tracing_subscriber::fmt().init();

    let database_url =
        std::env::var("DATABASE_URL").wrap_err("DATABASE_URL environment variable must be set")?;

    info!("Connecting to database");
    let db_pool = create_pool(&database_url).await?;

    info!("Creating users, availability_slots and appointments tables");
    initialize_database(&db_pool).await?;
    info!("Database schema initialized");

    Ok(())
}
