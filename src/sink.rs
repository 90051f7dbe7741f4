use std::path::Path;

use chrono::NaiveDateTime;
use sqlx::{MySql, Postgres, QueryBuilder, Sqlite};
use tracing::{error, info, instrument};

use crate::config::{ColumnKind, SinkConfig, TableSpec};
use crate::error::PersistenceError;
use crate::normalization::date::parse_canonical;
use crate::records::RecordSet;
use crate::util::db::Db;

enum BoundValue {
    Text(Option<String>),
    Timestamp(Option<NaiveDateTime>),
}

/// Destination table writer: create-if-absent, then append-only inserts.
pub struct Sink {
    db: Db,
    table: TableSpec,
    batch_size: usize,
}

impl Sink {
    pub async fn connect(config: &SinkConfig, table: TableSpec) -> Result<Self, PersistenceError> {
        table.validate().map_err(PersistenceError::InvalidTable)?;
        let url = config
            .database_url
            .as_deref()
            .ok_or(PersistenceError::NotConfigured)?;
        let db = Db::connect(url).await?;
        Ok(Self {
            db,
            table,
            batch_size: config.batch_size.max(1),
        })
    }

    #[instrument(skip(self), fields(table = %self.table.name))]
    pub async fn ensure_table(&self) -> Result<(), PersistenceError> {
        let sql = self.table.create_sql(self.db.backend().datetime_type());
        self.db
            .execute_raw(&sql)
            .await
            .map_err(|source| self.write_err(source))
    }

    /// Insert every record inside a single transaction. Existing rows are
    /// never touched.
    #[instrument(skip_all, fields(table = %self.table.name, rows = set.len()))]
    pub async fn append(&self, set: &RecordSet) -> Result<u64, PersistenceError> {
        let plan = self.bind_plan(set)?;
        let rows: Vec<Vec<BoundValue>> = set
            .rows()
            .iter()
            .map(|row| {
                plan.iter()
                    .map(|&(idx, kind)| match kind {
                        ColumnKind::Varchar(_) => BoundValue::Text(row.get(idx).map(str::to_owned)),
                        ColumnKind::DateTime => {
                            BoundValue::Timestamp(row.get(idx).and_then(parse_canonical))
                        }
                    })
                    .collect()
            })
            .collect();

        let column_list: Vec<&str> = self.table.columns.iter().map(|c| c.name.as_str()).collect();
        let prefix = format!("INSERT INTO {} ({}) ", self.table.name, column_list.join(", "));

        insert_rows(&self.db, &prefix, &rows, self.batch_size)
            .await
            .map_err(|source| self.write_err(source))?;
        info!(written = rows.len(), "rows appended");
        Ok(rows.len() as u64)
    }

    pub async fn close(self) {
        self.db.close().await;
    }

    /// Pair each table column with a record column, ignoring ASCII case
    /// (`Ma_URL` takes `MA_URL`, `Message_ID` takes `Message_Id`).
    fn bind_plan(&self, set: &RecordSet) -> Result<Vec<(usize, ColumnKind)>, PersistenceError> {
        self.table
            .columns
            .iter()
            .map(|spec| {
                set.columns()
                    .position(|c| c.eq_ignore_ascii_case(&spec.name))
                    .map(|idx| (idx, spec.kind))
                    .ok_or_else(|| PersistenceError::ColumnMismatch {
                        table: self.table.name.clone(),
                        column: spec.name.clone(),
                    })
            })
            .collect()
    }

    fn write_err(&self, source: sqlx::Error) -> PersistenceError {
        PersistenceError::Write {
            table: self.table.name.clone(),
            source,
        }
    }
}

macro_rules! insert_batches {
    ($pool:expr, $db:ty, $prefix:expr, $rows:expr, $batch:expr) => {{
        let mut tx = $pool.begin().await?;
        for chunk in $rows.chunks($batch) {
            let mut qb: QueryBuilder<'_, $db> = QueryBuilder::new($prefix);
            qb.push_values(chunk, |mut b, row| {
                for value in row {
                    match value {
                        BoundValue::Text(v) => {
                            b.push_bind(v.clone());
                        }
                        BoundValue::Timestamp(v) => {
                            b.push_bind(*v);
                        }
                    }
                }
            });
            qb.build().persistent(false).execute(&mut *tx).await?;
        }
        tx.commit().await
    }};
}

async fn insert_rows(
    db: &Db,
    prefix: &str,
    rows: &[Vec<BoundValue>],
    batch: usize,
) -> Result<(), sqlx::Error> {
    match db {
        Db::Postgres(pool) => insert_batches!(pool, Postgres, prefix, rows, batch),
        Db::MySql(pool) => insert_batches!(pool, MySql, prefix, rows, batch),
        Db::Sqlite(pool) => insert_batches!(pool, Sqlite, prefix, rows, batch),
    }
}

/// Open the sink, create the table, append `set`, and release the connection
/// on every path out.
pub async fn persist(
    config: &SinkConfig,
    table: &TableSpec,
    set: &RecordSet,
) -> Result<u64, PersistenceError> {
    let sink = Sink::connect(config, table.clone()).await?;
    let result = async {
        sink.ensure_table().await?;
        sink.append(set).await
    }
    .await;
    sink.close().await;
    if let Err(e) = &result {
        error!(error = %e, "persisting records failed");
    }
    result
}

/// Write shaped records to CSV; nulls become empty fields.
pub fn export_csv(set: &RecordSet, path: &Path) -> Result<(), PersistenceError> {
    let export_err = |source: csv::Error| PersistenceError::Export {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(export_err)?;
    wtr.write_record(set.columns()).map_err(export_err)?;
    for row in set.rows() {
        wtr.write_record(row.cells().iter().map(|c| c.as_deref().unwrap_or("")))
            .map_err(export_err)?;
    }
    wtr.flush()
        .map_err(|e| export_err(csv::Error::from(e)))?;
    info!(path = %path.display(), rows = set.len(), "records exported to csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BATCH_SIZE;
    use sqlx::sqlite::SqlitePoolOptions;

    const SHAPED: [&str; 11] = [
        "Email",
        "Type",
        "Name",
        "Title",
        "MA_URL",
        "MA_Referrer",
        "ma_path",
        "IP_Address",
        "cuid",
        "Date",
        "Message_Id",
    ];

    fn shaped_set(rows: &[(&str, Option<&str>)]) -> RecordSet {
        RecordSet::from_rows(
            SHAPED,
            rows.iter()
                .map(|(cuid, date)| {
                    SHAPED
                        .iter()
                        .map(|c| match *c {
                            "cuid" => Some(cuid.to_string()),
                            "Date" => date.map(str::to_owned),
                            "Message_Id" => None,
                            other => Some(format!("{other}-{cuid}")),
                        })
                        .collect()
                })
                .collect(),
        )
        .unwrap()
    }

    fn sqlite_config(dir: &tempfile::TempDir, batch_size: usize) -> (SinkConfig, String) {
        let url = format!("sqlite://{}", dir.path().join("seo.db").display());
        (
            SinkConfig {
                database_url: Some(url.clone()),
                batch_size,
                fallback_csv: None,
            },
            url,
        )
    }

    #[tokio::test]
    async fn creates_table_and_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let (config, url) = sqlite_config(&dir, 2);
        let table = TableSpec::seo_default();

        let first = shaped_set(&[
            ("c1", Some("2023-06-15 10:30:00")),
            ("c2", Some("")),
            ("c3", None),
        ]);
        assert_eq!(persist(&config, &table, &first).await.unwrap(), 3);
        let second = shaped_set(&[("c4", Some("2024-01-01 00:00:00"))]);
        assert_eq!(persist(&config, &table, &second).await.unwrap(), 1);

        let pool = SqlitePoolOptions::new().connect(&url).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM SEO_table")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 4);

        let stored: Option<String> =
            sqlx::query_scalar("SELECT CAST(Date AS TEXT) FROM SEO_table WHERE cuid = 'c1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(stored.unwrap().starts_with("2023-06-15 10:30:00"));

        let blank: Option<String> =
            sqlx::query_scalar("SELECT CAST(Date AS TEXT) FROM SEO_table WHERE cuid = 'c2'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(blank, None);

        let url_col: String =
            sqlx::query_scalar("SELECT Ma_URL FROM SEO_table WHERE cuid = 'c4'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(url_col, "MA_URL-c4");
        pool.close().await;
    }

    #[tokio::test]
    async fn missing_record_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = sqlite_config(&dir, DEFAULT_BATCH_SIZE);
        let mut set = shaped_set(&[("c1", None)]);
        set.drop_column("Email").unwrap();

        let err = persist(&config, &TableSpec::seo_default(), &set)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::ColumnMismatch { ref column, .. } if column == "Email"
        ));
    }

    #[tokio::test]
    async fn unconfigured_or_unsupported_urls_fail_cleanly() {
        let set = shaped_set(&[("c1", None)]);
        let mut config = SinkConfig {
            database_url: None,
            batch_size: DEFAULT_BATCH_SIZE,
            fallback_csv: None,
        };
        let table = TableSpec::seo_default();
        assert!(matches!(
            persist(&config, &table, &set).await,
            Err(PersistenceError::NotConfigured)
        ));

        config.database_url = Some("oracle://h/db".into());
        assert!(matches!(
            persist(&config, &table, &set).await,
            Err(PersistenceError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn csv_export_writes_header_and_blanks_for_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fallback.csv");
        export_csv(&shaped_set(&[("c9", None)]), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(SHAPED.join(",").as_str()));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Email-c9,Type-c9,"));
        assert!(row.ends_with(",c9,,"));
    }
}
