#![forbid(unsafe_code)]

use super::{
    CascadeSummary, OUTCOME_SCOPE, cascade_summary, objective_exists, outcome_exists, valid_code,
    valid_name,
};
use crate::store::{
    CreateOutcomeRequest, Queries, SqliteStore, StoreError, UpdateOutcomeRequest, now_ms, row_id,
};
use lf_core::ids::{ObjectiveId, OutcomeId};
use lf_core::model::Outcome;
use rusqlite::{Row, TransactionBehavior, params};
use tracing::{debug, info};

pub(crate) const OUTCOME_COLUMNS: &str = "id, objective_id, name, code";

impl SqliteStore {
    pub fn create_outcome(&mut self, request: CreateOutcomeRequest) -> Result<Outcome, StoreError> {
        let name = valid_name(&request.name)?;
        let code = valid_code(&request.code)?;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !objective_exists(&q, request.objective_id.get())? {
            return Err(StoreError::missing_parent("objective", request.objective_id));
        }

        tx.execute(
            "INSERT INTO outcomes(objective_id, name, code, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![request.objective_id.get(), name, code, now_ms],
        )?;
        let id = row_id(tx.last_insert_rowid(), OutcomeId::try_new)?;

        tx.commit()?;
        debug!(outcome_id = %id, objective_id = %request.objective_id, "outcome created");
        Ok(Outcome {
            id,
            objective_id: request.objective_id,
            name,
            code,
        })
    }

    pub fn update_outcome(&mut self, request: UpdateOutcomeRequest) -> Result<Outcome, StoreError> {
        let id = request.outcome_id;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        let current =
            read_outcome(&q, id)?.ok_or_else(|| StoreError::not_found("outcome", id))?;
        let name = match request.name {
            Some(name) => valid_name(&name)?,
            None => current.name,
        };
        let code = match request.code {
            Some(code) => valid_code(&code)?,
            None => current.code,
        };
        let objective_id = request.objective_id.unwrap_or(current.objective_id);
        if !objective_exists(&q, objective_id.get())? {
            return Err(StoreError::missing_parent("objective", objective_id));
        }

        tx.execute(
            "UPDATE outcomes SET objective_id=?2, name=?3, code=?4, updated_at_ms=?5 WHERE id=?1",
            params![id.get(), objective_id.get(), name, code, now_ms()],
        )?;

        tx.commit()?;
        debug!(outcome_id = %id, "outcome updated");
        Ok(Outcome {
            id,
            objective_id,
            name,
            code,
        })
    }

    /// Cascades to the outcome's outputs and to every indicator attached to the
    /// outcome or to one of those outputs.
    pub fn delete_outcome(&mut self, id: OutcomeId) -> Result<CascadeSummary, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !outcome_exists(&q, id.get())? {
            return Err(StoreError::not_found("outcome", id));
        }

        let summary = cascade_summary(&q, OUTCOME_SCOPE, id.get())?;
        tx.execute("DELETE FROM outcomes WHERE id=?1", params![id.get()])?;

        tx.commit()?;
        info!(
            outcome_id = %id,
            outputs = summary.outputs,
            indicators = summary.indicators,
            "outcome deleted"
        );
        Ok(summary)
    }

    pub fn get_outcome(&self, id: OutcomeId) -> Result<Outcome, StoreError> {
        read_outcome(&self.queries(), id)?.ok_or_else(|| StoreError::not_found("outcome", id))
    }

    pub fn list_outcomes(&self, objective_id: ObjectiveId) -> Result<Vec<Outcome>, StoreError> {
        if !objective_exists(&self.queries(), objective_id.get())? {
            return Err(StoreError::not_found("objective", objective_id));
        }

        self.queries().collect_rows(
            &format!("SELECT {OUTCOME_COLUMNS} FROM outcomes WHERE objective_id=?1 ORDER BY id ASC"),
            params![objective_id.get()],
            outcome_from_row,
        )
    }
}

fn read_outcome(q: &Queries<'_>, id: OutcomeId) -> Result<Option<Outcome>, StoreError> {
    q.first_row(
        &format!("SELECT {OUTCOME_COLUMNS} FROM outcomes WHERE id=?1"),
        params![id.get()],
        outcome_from_row,
    )
}

pub(crate) fn outcome_from_row(row: &Row<'_>) -> Result<Outcome, StoreError> {
    Ok(Outcome {
        id: row_id(row.get(0)?, OutcomeId::try_new)?,
        objective_id: row_id(row.get(1)?, ObjectiveId::try_new)?,
        name: row.get(2)?,
        code: row.get(3)?,
    })
}
