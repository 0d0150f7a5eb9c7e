//! Storage for users, profiles, and follow edges.
//!
//! [`connect`] opens the shared Postgres pool and [`migrate`] brings the
//! schema up to date before the repositories in [`repositories`] use it.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use std::time::Duration;

use followers_common::{AppError, config::DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::log::LevelFilter;

use crate::migrations::Migrator;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool options for the configured database.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&config.url);
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .connect_timeout(CONNECT_TIMEOUT)
        .acquire_timeout(CONNECT_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);
    opt
}

/// Open the connection pool.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let db = Database::connect(connect_options(config))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connected to follow graph database"
    );
    Ok(db)
}

/// Apply pending migrations, returning how many ran.
pub async fn migrate(db: &DatabaseConnection) -> Result<usize, AppError> {
    let pending = Migrator::get_pending_migrations(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .len();

    Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(applied = pending, "Follow graph schema is up to date");
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_connections: u32, min_connections: u32) -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://localhost/followers".to_string(),
            max_connections,
            min_connections,
        }
    }

    #[test]
    fn test_connect_options_use_pool_sizes() {
        let opt = connect_options(&config(20, 2));

        assert_eq!(opt.get_url(), "postgres://localhost/followers");
        assert_eq!(opt.get_max_connections(), Some(20));
        assert_eq!(opt.get_min_connections(), Some(2));
        assert_eq!(opt.get_connect_timeout(), Some(CONNECT_TIMEOUT));
    }

    #[test]
    fn test_min_connections_capped_at_max() {
        let opt = connect_options(&config(4, 10));

        assert_eq!(opt.get_min_connections(), Some(4));
    }
}
