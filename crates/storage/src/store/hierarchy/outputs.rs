#![forbid(unsafe_code)]

use super::{
    CascadeSummary, OUTPUT_SCOPE, cascade_summary, outcome_exists, output_exists, valid_code,
    valid_name,
};
use crate::store::{
    CreateOutputRequest, Queries, SqliteStore, StoreError, UpdateOutputRequest, now_ms, row_id,
};
use lf_core::ids::{OutcomeId, OutputId};
use lf_core::model::Output;
use rusqlite::{Row, TransactionBehavior, params};
use tracing::{debug, info};

pub(crate) const OUTPUT_COLUMNS: &str = "id, outcome_id, name, code";

impl SqliteStore {
    pub fn create_output(&mut self, request: CreateOutputRequest) -> Result<Output, StoreError> {
        let name = valid_name(&request.name)?;
        let code = valid_code(&request.code)?;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !outcome_exists(&q, request.outcome_id.get())? {
            return Err(StoreError::missing_parent("outcome", request.outcome_id));
        }

        tx.execute(
            "INSERT INTO outputs(outcome_id, name, code, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![request.outcome_id.get(), name, code, now_ms],
        )?;
        let id = row_id(tx.last_insert_rowid(), OutputId::try_new)?;

        tx.commit()?;
        debug!(output_id = %id, outcome_id = %request.outcome_id, "output created");
        Ok(Output {
            id,
            outcome_id: request.outcome_id,
            name,
            code,
        })
    }

    /// Moving an output to another outcome detaches its dual-attached
    /// indicators from the old outcome so they follow the output.
    pub fn update_output(&mut self, request: UpdateOutputRequest) -> Result<Output, StoreError> {
        let id = request.output_id;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        let current =
            read_output(&q, id)?.ok_or_else(|| StoreError::not_found("output", id))?;
        let name = match request.name {
            Some(name) => valid_name(&name)?,
            None => current.name,
        };
        let code = match request.code {
            Some(code) => valid_code(&code)?,
            None => current.code,
        };
        let outcome_id = request.outcome_id.unwrap_or(current.outcome_id);
        if !outcome_exists(&q, outcome_id.get())? {
            return Err(StoreError::missing_parent("outcome", outcome_id));
        }

        tx.execute(
            "UPDATE outputs SET outcome_id=?2, name=?3, code=?4, updated_at_ms=?5 WHERE id=?1",
            params![id.get(), outcome_id.get(), name, code, now_ms],
        )?;
        let moved = tx.execute(
            "UPDATE indicators SET outcome_id=?2, updated_at_ms=?3 \
             WHERE output_id=?1 AND outcome_id IS NOT NULL AND outcome_id <> ?2",
            params![id.get(), outcome_id.get(), now_ms],
        )?;

        tx.commit()?;
        debug!(output_id = %id, moved_indicators = moved, "output updated");
        Ok(Output {
            id,
            outcome_id,
            name,
            code,
        })
    }

    pub fn delete_output(&mut self, id: OutputId) -> Result<CascadeSummary, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !output_exists(&q, id.get())? {
            return Err(StoreError::not_found("output", id));
        }

        let summary = cascade_summary(&q, OUTPUT_SCOPE, id.get())?;
        tx.execute("DELETE FROM outputs WHERE id=?1", params![id.get()])?;

        tx.commit()?;
        info!(output_id = %id, indicators = summary.indicators, "output deleted");
        Ok(summary)
    }

    pub fn get_output(&self, id: OutputId) -> Result<Output, StoreError> {
        read_output(&self.queries(), id)?.ok_or_else(|| StoreError::not_found("output", id))
    }

    pub fn list_outputs(&self, outcome_id: OutcomeId) -> Result<Vec<Output>, StoreError> {
        if !outcome_exists(&self.queries(), outcome_id.get())? {
            return Err(StoreError::not_found("outcome", outcome_id));
        }

        self.queries().collect_rows(
            &format!("SELECT {OUTPUT_COLUMNS} FROM outputs WHERE outcome_id=?1 ORDER BY id ASC"),
            params![outcome_id.get()],
            output_from_row,
        )
    }
}

fn read_output(q: &Queries<'_>, id: OutputId) -> Result<Option<Output>, StoreError> {
    q.first_row(
        &format!("SELECT {OUTPUT_COLUMNS} FROM outputs WHERE id=?1"),
        params![id.get()],
        output_from_row,
    )
}

pub(crate) fn output_from_row(row: &Row<'_>) -> Result<Output, StoreError> {
    Ok(Output {
        id: row_id(row.get(0)?, OutputId::try_new)?,
        outcome_id: row_id(row.get(1)?, OutcomeId::try_new)?,
        name: row.get(2)?,
        code: row.get(3)?,
    })
}
