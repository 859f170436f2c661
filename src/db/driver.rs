//! SQL drivers backed by SeaORM.

use std::sync::OnceLock;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::db::{migrations, DbError, DbResult, Driver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    MySql,
    Postgres,
}

impl Dialect {
    fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    fn accepts(self, scheme: &str) -> bool {
        match self {
            Self::MySql => scheme == "mysql",
            Self::Postgres => scheme == "postgres" || scheme == "postgresql",
        }
    }
}

/// A MySQL or PostgreSQL driver.
pub struct SqlDriver {
    dialect: Dialect,
    connection: OnceLock<DatabaseConnection>,
}

impl SqlDriver {
    pub fn mysql() -> Self {
        Self::with_dialect(Dialect::MySql)
    }

    pub fn postgres() -> Self {
        Self::with_dialect(Dialect::Postgres)
    }

    fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            connection: OnceLock::new(),
        }
    }

    fn check_url(&self, url: &str) -> DbResult<()> {
        let parsed = url::Url::parse(url).map_err(|e| DbError::InvalidUrl(e.to_string()))?;
        if !self.dialect.accepts(parsed.scheme()) {
            return Err(DbError::SchemeMismatch {
                driver: self.dialect.name(),
                scheme: parsed.scheme().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for SqlDriver {
    fn name(&self) -> &'static str {
        self.dialect.name()
    }

    async fn connect(&self, url: &str) -> DbResult<()> {
        if self.connection.get().is_some() {
            return Err(DbError::AlreadyConnected);
        }
        self.check_url(url)?;

        let mut options = ConnectOptions::new(url.to_string());
        options.sqlx_logging(false);
        let connection = Database::connect(options).await?;

        tracing::info!(driver = self.name(), "Database connected");
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
