#![forbid(unsafe_code)]

use super::{
    CascadeSummary, OBJECTIVE_SCOPE, cascade_summary, framework_exists, objective_exists,
    valid_name,
};
use crate::store::{
    CreateObjectiveRequest, Queries, SqliteStore, StoreError, UpdateObjectiveRequest, now_ms,
    row_id,
};
use lf_core::ids::{FrameworkId, ObjectiveId};
use lf_core::model::Objective;
use rusqlite::{Row, TransactionBehavior, params};
use tracing::{debug, info};

pub(crate) const OBJECTIVE_COLUMNS: &str = "id, framework_id, name";

impl SqliteStore {
    pub fn create_objective(
        &mut self,
        request: CreateObjectiveRequest,
    ) -> Result<Objective, StoreError> {
        let name = valid_name(&request.name)?;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !framework_exists(&q, request.framework_id.get())? {
            return Err(StoreError::missing_parent("framework", request.framework_id));
        }

        tx.execute(
            "INSERT INTO objectives(framework_id, name, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?3)",
            params![request.framework_id.get(), name, now_ms],
        )?;
        let id = row_id(tx.last_insert_rowid(), ObjectiveId::try_new)?;

        tx.commit()?;
        debug!(objective_id = %id, framework_id = %request.framework_id, "objective created");
        Ok(Objective {
            id,
            framework_id: request.framework_id,
            name,
        })
    }

    /// Renames the objective and moves it to another framework. The stored
    /// row is read and merged inside the write transaction.
    pub fn update_objective(
        &mut self,
        request: UpdateObjectiveRequest,
    ) -> Result<Objective, StoreError> {
        let id = request.objective_id;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        let current = read_objective(&q, id)?
            .ok_or_else(|| StoreError::not_found("objective", id))?;
        let name = match request.name {
            Some(name) => valid_name(&name)?,
            None => current.name,
        };
        let framework_id = request.framework_id.unwrap_or(current.framework_id);
        if !framework_exists(&q, framework_id.get())? {
            return Err(StoreError::missing_parent("framework", framework_id));
        }

        tx.execute(
            "UPDATE objectives SET framework_id=?2, name=?3, updated_at_ms=?4 WHERE id=?1",
            params![id.get(), framework_id.get(), name, now_ms()],
        )?;

        tx.commit()?;
        debug!(objective_id = %id, "objective updated");
        Ok(Objective {
            id,
            framework_id,
            name,
        })
    }

    pub fn delete_objective(&mut self, id: ObjectiveId) -> Result<CascadeSummary, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !objective_exists(&q, id.get())? {
            return Err(StoreError::not_found("objective", id));
        }

        let summary = cascade_summary(&q, OBJECTIVE_SCOPE, id.get())?;
        tx.execute("DELETE FROM objectives WHERE id=?1", params![id.get()])?;

        tx.commit()?;
        info!(
            objective_id = %id,
            outcomes = summary.outcomes,
            indicators = summary.indicators,
            "objective deleted"
        );
        Ok(summary)
    }

    pub fn get_objective(&self, id: ObjectiveId) -> Result<Objective, StoreError> {
        read_objective(&self.queries(), id)?.ok_or_else(|| StoreError::not_found("objective", id))
    }

    pub fn list_objectives(&self, framework_id: FrameworkId) -> Result<Vec<Objective>, StoreError> {
        if !framework_exists(&self.queries(), framework_id.get())? {
            return Err(StoreError::not_found("framework", framework_id));
        }

        self.queries().collect_rows(
            &format!(
                "SELECT {OBJECTIVE_COLUMNS} FROM objectives WHERE framework_id=?1 ORDER BY id ASC"
            ),
            params![framework_id.get()],
            objective_from_row,
        )
    }
}

fn read_objective(q: &Queries<'_>, id: ObjectiveId) -> Result<Option<Objective>, StoreError> {
    q.first_row(
        &format!("SELECT {OBJECTIVE_COLUMNS} FROM objectives WHERE id=?1"),
        params![id.get()],
        objective_from_row,
    )
}

pub(crate) fn objective_from_row(row: &Row<'_>) -> Result<Objective, StoreError> {
    Ok(Objective {
        id: row_id(row.get(0)?, ObjectiveId::try_new)?,
        framework_id: row_id(row.get(1)?, FrameworkId::try_new)?,
        name: row.get(2)?,
    })
}
