use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions},
    postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode},
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use tracing::{info, instrument};

use crate::error::PersistenceError;

/// SQL dialect chosen from the DSN scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    MySql,
    Sqlite,
}

impl Backend {
    pub fn from_url(database_url: &str) -> Result<Self, PersistenceError> {
        let scheme = database_url
            .split_once(':')
            .map(|(s, _)| s.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(PersistenceError::UnsupportedScheme(scheme)),
        }
    }

    /// Column type for a zone-less timestamp.
    pub fn datetime_type(self) -> &'static str {
        match self {
            Self::Postgres => "timestamp",
            Self::MySql | Self::Sqlite => "datetime",
        }
    }
}

/// Single-connection pool for one of the supported backends.
///
/// The pool is opened once per run and must be released with [`Db::close`]
/// whether or not the writes succeeded.
#[derive(Debug, Clone)]
pub enum Db {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let backend = Backend::from_url(database_url)?;
        let db = match backend {
            Backend::Postgres => {
                let mut opts =
                    PgConnectOptions::from_str(database_url).map_err(PersistenceError::Connect)?;
                if database_url.contains("sslmode=require") {
                    opts = opts.ssl_mode(PgSslMode::Require);
                }
                // PgBouncer txn mode safe
                opts = opts.statement_cache_capacity(0);
                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect_with(opts)
                    .await
                    .map_err(PersistenceError::Connect)?;
                Self::Postgres(pool)
            }
            Backend::MySql => {
                let opts = MySqlConnectOptions::from_str(database_url)
                    .map_err(PersistenceError::Connect)?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect_with(opts)
                    .await
                    .map_err(PersistenceError::Connect)?;
                Self::MySql(pool)
            }
            Backend::Sqlite => {
                let opts = SqliteConnectOptions::from_str(database_url)
                    .map_err(PersistenceError::Connect)?
                    .create_if_missing(true);
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect_with(opts)
                    .await
                    .map_err(PersistenceError::Connect)?;
                Self::Sqlite(pool)
            }
        };
        info!(?backend, "connected to db");
        Ok(db)
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Postgres(_) => Backend::Postgres,
            Self::MySql(_) => Backend::MySql,
            Self::Sqlite(_) => Backend::Sqlite,
        }
    }

    /// Run a statement verbatim (no prepared statement; PgBouncer safe).
    pub async fn execute_raw(&self, sql: &str) -> Result<(), sqlx::Error> {
        match self {
            Self::Postgres(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
            Self::MySql(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
            Self::Sqlite(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
        }
    }

    pub async fn close(self) {
        match self {
            Self::Postgres(pool) => pool.close().await,
            Self::MySql(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
        info!("db connection released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_follows_scheme() {
        assert_eq!(Backend::from_url("postgres://u@h/db").unwrap(), Backend::Postgres);
        assert_eq!(Backend::from_url("postgresql://h/db").unwrap(), Backend::Postgres);
        assert_eq!(Backend::from_url("mysql://root:@localhost/SEO").unwrap(), Backend::MySql);
        assert_eq!(Backend::from_url("sqlite::memory:").unwrap(), Backend::Sqlite);
        assert!(matches!(
            Backend::from_url("mssql://h/db"),
            Err(PersistenceError::UnsupportedScheme(s)) if s == "mssql"
        ));
    }

    #[test]
    fn datetime_type_per_dialect() {
        assert_eq!(Backend::Postgres.datetime_type(), "timestamp");
        assert_eq!(Backend::MySql.datetime_type(), "datetime");
    }

    #[tokio::test]
    async fn sqlite_memory_connects_and_closes() {
        let db = Db::connect("sqlite::memory:").await.unwrap();
        assert_eq!(db.backend(), Backend::Sqlite);
        db.execute_raw("CREATE TABLE t (x integer)").await.unwrap();
        db.close().await;
    }
}
