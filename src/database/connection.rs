use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{config::Config, error::QueryError};

pub async fn connect(config: &Config) -> Result<Pool<Postgres>, potion::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    log::info!("Connected to database ({} connections)", config.max_connections);
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &Pool<Postgres>) -> Result<(), potion::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| QueryError::new(format!("Migration failed: {e}")).into())?;

    log::info!("Database schema is up to date");
    Ok(())
}
