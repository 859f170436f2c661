//! In-memory SQLite driver for unit tests.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::db::{migrations, DbError, DbResult, Driver};

#[derive(Default)]
pub struct SqliteDriver {
    connection: OnceLock<DatabaseConnection>,
}

impl SqliteDriver {
    /// A connected driver with the gateway schema applied.
    pub async fn migrated() -> Arc<dyn Driver> {
        let driver = Arc::new(Self::default());
        driver.connect("sqlite::memory:").await.unwrap();
        driver.migrate_up(migrations::GATEWAY).await.unwrap();
        driver
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn connect(&self, url: &str) -> DbResult<()> {
        let mut options = ConnectOptions::new(url.to_string());
        options.max_connections(1).sqlx_logging(false);
        let connection = Database::connect(options).await?;
        self.connection
            .set(connection)
            .map_err(|_| DbError::AlreadyConnected)
    }

    async fn migrate_up(&self, migration_set: &str) -> DbResult<usize> {
        migrations::migrate_up(self.connection()?, migration_set).await
    }

    fn connection(&self) -> DbResult<&DatabaseConnection> {
        self.connection.get().ok_or(DbError::NotConnected)
    }
}
