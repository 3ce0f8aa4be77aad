//! Connection manager: one pooled database handle shared by every request.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    FromQueryResult, StatementBuilder,
};

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;

/// Cheaply cloneable handle around the connection pool.
#[derive(Clone, Debug)]
pub struct DbClient {
    conn: Arc<DatabaseConnection>,
}

impl DbClient {
    /// Open the pool described by `config`.
    #[tracing::instrument(skip(config), fields(host = %config.host, name = %config.name))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .connection_url()
            .map_err(|e| DatabaseError::Connection(sea_orm::DbErr::Custom(e.to_string())))?;
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(config.max_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(true);

        let conn = Database::connect(options)
            .await
            .map_err(DatabaseError::Connection)?;
        tracing::info!(backend = ?conn.get_database_backend(), "connected to database");
        Ok(Self::new(conn))
    }

    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn: Arc::new(conn),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    /// Run a sea-query statement and decode every row into `T`.
    ///
    /// Values inside the statement are always sent as bound parameters; the
    /// backend decides on placeholder syntax and identifier quoting.
    pub async fn fetch_all<T, S>(&self, stmt: &S) -> Result<Vec<T>, DatabaseError>
    where
        T: FromQueryResult,
        S: StatementBuilder,
    {
        let stmt = self.backend().build(stmt);
        tracing::trace!(sql = %stmt.sql, "fetch_all");
        Ok(T::find_by_statement(stmt).all(self.connection()).await?)
    }

    /// Like [`DbClient::fetch_all`] but returns only the first row.
    pub async fn fetch_one<T, S>(&self, stmt: &S) -> Result<Option<T>, DatabaseError>
    where
        T: FromQueryResult,
        S: StatementBuilder,
    {
        let stmt = self.backend().build(stmt);
        tracing::trace!(sql = %stmt.sql, "fetch_one");
        Ok(T::find_by_statement(stmt).one(self.connection()).await?)
    }
}
