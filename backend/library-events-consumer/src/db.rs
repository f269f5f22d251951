use db_pool::{create_pool, DbConfig};
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Build the pool and bring the schema up to date
pub async fn init_pool(config: DbConfig) -> Result<PgPool> {
    config.log_config();
    let pool = create_pool(config).await?;

    MIGRATOR.run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}
