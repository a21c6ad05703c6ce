#![forbid(unsafe_code)]

mod aggregation;
mod error;
mod hierarchy;
mod links;
mod registry;
mod requests;
mod schema;
mod structure;

pub use aggregation::{LinkSnapshot, distinct_beneficiary_counts};
pub use error::StoreError;
pub use hierarchy::CascadeSummary;
pub use links::{BatchLinkOutcome, LinkedActivity};
pub use requests::*;

use lf_core::ids::EntityIdError;
use rusqlite::{Connection, ErrorCode, Params, Row, Statement};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DB_FILE_NAME: &str = "logframe.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: Option<PathBuf>,
    statements: StatementCounter,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        info!(path = %db_path.display(), "opening logframe store");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        Self::from_connection(conn, Some(storage_dir))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("opening in-memory logframe store");
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, storage_dir: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        schema::preflight_gate(&conn)?;
        schema::install_schema(&conn)?;

        Ok(Self {
            conn,
            storage_dir,
            statements: StatementCounter::default(),
        })
    }

    /// `None` for in-memory stores.
    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    /// Number of query statements run since open or the last reset. Every
    /// SELECT the store issues goes through [`Queries`], so the count covers
    /// lookups, existence checks, link listings, aggregation and structure
    /// assembly alike.
    pub fn statements_issued(&self) -> u64 {
        self.statements.get()
    }

    pub fn reset_statement_count(&self) {
        self.statements.reset();
    }

    fn queries(&self) -> Queries<'_> {
        Queries::new(&self.conn, &self.statements)
    }
}

#[derive(Debug, Default)]
struct StatementCounter(Cell<u64>);

impl StatementCounter {
    fn bump(&self) {
        self.0.set(self.0.get().saturating_add(1));
    }

    fn get(&self) -> u64 {
        self.0.get()
    }

    fn reset(&self) {
        self.0.set(0);
    }
}

/// Counted query access over a connection or an open transaction.
#[derive(Clone, Copy)]
pub(crate) struct Queries<'c> {
    conn: &'c Connection,
    statements: &'c StatementCounter,
}

impl<'c> Queries<'c> {
    fn new(conn: &'c Connection, statements: &'c StatementCounter) -> Self {
        Self { conn, statements }
    }

    fn prepare(&self, sql: &str) -> Result<Statement<'c>, StoreError> {
        self.statements.bump();
        Ok(self.conn.prepare(sql)?)
    }

    /// First row of `sql`, decoded with `decode`.
    fn first_row<T>(
        &self,
        sql: &str,
        params: impl Params,
        decode: fn(&Row<'_>) -> Result<T, StoreError>,
    ) -> Result<Option<T>, StoreError> {
        let mut stmt = self.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => decode(row).map(Some),
            None => Ok(None),
        }
    }

    fn collect_rows<T>(
        &self,
        sql: &str,
        params: impl Params,
        decode: fn(&Row<'_>) -> Result<T, StoreError>,
    ) -> Result<Vec<T>, StoreError> {
        let mut stmt = self.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(decode(row)?);
        }
        Ok(out)
    }

    fn exists(&self, sql: &str, params: impl Params) -> Result<bool, StoreError> {
        let mut stmt = self.prepare(sql)?;
        Ok(stmt.exists(params)?)
    }

    fn count(&self, sql: &str, params: impl Params) -> Result<u64, StoreError> {
        Ok(self.first_row(sql, params, count_column)?.unwrap_or(0))
    }
}

fn count_column(row: &Row<'_>) -> Result<u64, StoreError> {
    Ok(count_from_sql(row.get(0)?))
}

fn row_id<T>(raw: i64, make: fn(i64) -> Result<T, EntityIdError>) -> Result<T, StoreError> {
    make(raw).map_err(|err| StoreError::Corrupt(err.message()))
}

fn target_to_sql(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Validation("target_value is too large".to_string()))
}

fn target_from_sql(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("negative target_value {value}")))
}

fn count_from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            (code.code == ErrorCode::ConstraintViolation
                && matches!(
                    code.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                ))
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::ids::FrameworkId;
    use lf_core::period::Period;

    const QUERY_MODULES: [(&str, &str); 10] = [
        ("aggregation.rs", include_str!("aggregation.rs")),
        ("links.rs", include_str!("links.rs")),
        ("registry.rs", include_str!("registry.rs")),
        ("structure.rs", include_str!("structure.rs")),
        ("hierarchy/mod.rs", include_str!("hierarchy/mod.rs")),
        ("hierarchy/frameworks.rs", include_str!("hierarchy/frameworks.rs")),
        ("hierarchy/objectives.rs", include_str!("hierarchy/objectives.rs")),
        ("hierarchy/outcomes.rs", include_str!("hierarchy/outcomes.rs")),
        ("hierarchy/outputs.rs", include_str!("hierarchy/outputs.rs")),
        ("hierarchy/indicators.rs", include_str!("hierarchy/indicators.rs")),
    ];

    #[test]
    fn reads_outside_the_counter_are_rejected() {
        let raw_calls = [
            ".prepare(",
            ".prepare_cached(",
            ".query_row(",
            ".query_map(",
            ".query(",
            ".bump(",
        ];
        for (file, source) in QUERY_MODULES {
            for call in raw_calls {
                assert!(
                    !source.contains(call),
                    "{file} calls {call} directly; route reads through Queries"
                );
            }
        }
    }

    #[test]
    fn lookups_and_existence_checks_are_counted() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let framework = store
            .create_framework(CreateFrameworkRequest {
                name: "Plan 2024".to_string(),
                period: Period::parse("2024-01-01", "2024-12-31").expect("period"),
            })
            .expect("create framework");

        store.reset_statement_count();
        store.get_framework(framework.id).expect("get framework");
        assert_eq!(store.statements_issued(), 1);

        store.reset_statement_count();
        assert!(store.list_objectives(framework.id).expect("list").is_empty());
        assert_eq!(store.statements_issued(), 2);

        store.reset_statement_count();
        let ghost = FrameworkId::try_new(99).expect("id");
        assert!(store.list_objectives(ghost).is_err());
        assert_eq!(store.statements_issued(), 1);
    }
}
