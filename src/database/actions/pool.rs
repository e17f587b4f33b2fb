use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{error::ApiError, settings::DatabaseConfig};

pub async fn connect(config: &DatabaseConfig) -> Result<Pool<Postgres>, ApiError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    log::info!("> Connected to database with {} max connections", config.max_connections);
    Ok(pool)
}

/// Applies the embedded migrations
pub async fn migrate(pool: &Pool<Postgres>) -> Result<(), ApiError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
