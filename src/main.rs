use std::sync::Arc;

use color_eyre::eyre::Result;
use dotenv::dotenv;
use officehours_api::config::ApiConfig;
use officehours_db::{create_pool, schema::initialize_database, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;

    let db_pool = create_pool(&config.database_url).await?;
    initialize_database(&db_pool).await?;

    let store = Arc::new(PgStore::new(db_pool));
    officehours_api::start_server(config, store).await?;

    Ok(())
}
