use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates the PostgreSQL connection pool.
///
/// The pool connects lazily: persistence is best-effort, so an unreachable
/// database must not stop the service from starting.
pub fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Configuring PostgreSQL pool (max_connections={max_connections})");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_lazy(database_url)?;

    Ok(pool)
}
