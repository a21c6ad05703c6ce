#![forbid(unsafe_code)]

use super::{StoreError, now_ms};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::collections::BTreeSet;

pub(super) const SCHEMA_VERSION: i64 = 1;

const TABLES: [&str; 10] = [
    "store_state",
    "frameworks",
    "objectives",
    "outcomes",
    "outputs",
    "indicators",
    "activities",
    "beneficiaries",
    "activity_indicators",
    "activity_beneficiaries",
];

/// Refuses to touch a database that was not created by this schema.
pub(super) fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }

    if tables.is_empty() {
        return Ok(());
    }

    let required: BTreeSet<&str> = TABLES.into_iter().collect();

    if tables
        .iter()
        .any(|table| !required.contains(table.as_str()))
    {
        return Err(StoreError::ResetRequired(
            "unsupported tables detected".to_string(),
        ));
    }

    for table in required {
        if !tables.contains(table) {
            return Err(StoreError::ResetRequired(format!(
                "required table {table} is missing"
            )));
        }
    }

    let version = conn
        .query_row(
            "SELECT schema_version FROM store_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match version {
        Some(v) if v == SCHEMA_VERSION => Ok(()),
        Some(v) => Err(StoreError::ResetRequired(format!(
            "schema version mismatch (expected={SCHEMA_VERSION}, stored={v})"
        ))),
        None => Err(StoreError::ResetRequired(
            "schema state row is missing".to_string(),
        )),
    }
}

pub(super) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    let now_ms = now_ms();
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS frameworks (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          start_date TEXT NOT NULL,
          end_date TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          CHECK(start_date <= end_date)
        );

        CREATE INDEX IF NOT EXISTS idx_frameworks_period
          ON frameworks(start_date, end_date);

        CREATE TABLE IF NOT EXISTS objectives (
          id INTEGER PRIMARY KEY,
          framework_id INTEGER NOT NULL,
          name TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(framework_id) REFERENCES frameworks(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_objectives_framework
          ON objectives(framework_id, id);

        CREATE TABLE IF NOT EXISTS outcomes (
          id INTEGER PRIMARY KEY,
          objective_id INTEGER NOT NULL,
          name TEXT NOT NULL,
          code TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(objective_id) REFERENCES objectives(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_outcomes_objective
          ON outcomes(objective_id, id);

        CREATE TABLE IF NOT EXISTS outputs (
          id INTEGER PRIMARY KEY,
          outcome_id INTEGER NOT NULL,
          name TEXT NOT NULL,
          code TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(outcome_id) REFERENCES outcomes(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_outputs_outcome
          ON outputs(outcome_id, id);

        CREATE TABLE IF NOT EXISTS indicators (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          code TEXT NOT NULL,
          target_value INTEGER NOT NULL,
          outcome_id INTEGER,
          output_id INTEGER,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(outcome_id) REFERENCES outcomes(id) ON DELETE CASCADE,
          FOREIGN KEY(output_id) REFERENCES outputs(id) ON DELETE CASCADE,
          CHECK(target_value >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_indicators_outcome
          ON indicators(outcome_id, id);
        CREATE INDEX IF NOT EXISTS idx_indicators_output
          ON indicators(output_id, id);

        CREATE TABLE IF NOT EXISTS activities (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS beneficiaries (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activity_indicators (
          activity_id INTEGER NOT NULL,
          indicator_id INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY(activity_id, indicator_id),
          FOREIGN KEY(activity_id) REFERENCES activities(id) ON DELETE CASCADE,
          FOREIGN KEY(indicator_id) REFERENCES indicators(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_activity_indicators_indicator
          ON activity_indicators(indicator_id, activity_id);

        CREATE TABLE IF NOT EXISTS activity_beneficiaries (
          activity_id INTEGER NOT NULL,
          beneficiary_id INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY(activity_id, beneficiary_id),
          FOREIGN KEY(activity_id) REFERENCES activities(id) ON DELETE CASCADE,
          FOREIGN KEY(beneficiary_id) REFERENCES beneficiaries(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_activity_beneficiaries_beneficiary
          ON activity_beneficiaries(beneficiary_id, activity_id);
        "#,
    )?;

    tx.execute(
        "INSERT INTO store_state(singleton, schema_version, created_at_ms, updated_at_ms) \
         VALUES (1, ?1, ?2, ?2) \
         ON CONFLICT(singleton) DO UPDATE SET schema_version=excluded.schema_version, updated_at_ms=excluded.updated_at_ms",
        params![SCHEMA_VERSION, now_ms],
    )?;

    tx.commit()?;
    Ok(())
}
