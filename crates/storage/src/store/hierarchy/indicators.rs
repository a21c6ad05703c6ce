#![forbid(unsafe_code)]

use super::{indicator_exists, outcome_exists, output_exists, valid_code, valid_name};
use crate::store::{
    CreateIndicatorRequest, Queries, SqliteStore, StoreError, UpdateIndicatorRequest, now_ms,
    row_id, target_from_sql, target_to_sql,
};
use lf_core::ids::{IndicatorId, OutcomeId, OutputId};
use lf_core::model::Indicator;
use rusqlite::{Row, TransactionBehavior, params};
use tracing::{debug, info};

pub(crate) const INDICATOR_COLUMNS: &str = "id, name, code, target_value, outcome_id, output_id";

impl SqliteStore {
    pub fn create_indicator(
        &mut self,
        request: CreateIndicatorRequest,
    ) -> Result<Indicator, StoreError> {
        let name = valid_name(&request.name)?;
        let code = valid_code(&request.code)?;
        let target = target_to_sql(request.target_value)?;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        check_attachment(&q, request.outcome_id, request.output_id)?;

        tx.execute(
            "INSERT INTO indicators(name, code, target_value, outcome_id, output_id, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                name,
                code,
                target,
                request.outcome_id.map(OutcomeId::get),
                request.output_id.map(OutputId::get),
                now_ms,
            ],
        )?;
        let id = row_id(tx.last_insert_rowid(), IndicatorId::try_new)?;

        tx.commit()?;
        debug!(
            indicator_id = %id,
            outcome_id = ?request.outcome_id.map(OutcomeId::get),
            output_id = ?request.output_id.map(OutputId::get),
            "indicator created"
        );
        Ok(Indicator {
            id,
            name,
            code,
            target_value: request.target_value,
            outcome_id: request.outcome_id,
            output_id: request.output_id,
        })
    }

    /// Merges the request into the stored row inside the write transaction.
    /// Clearing both parents orphans the indicator; its activity links are kept.
    pub fn update_indicator(
        &mut self,
        request: UpdateIndicatorRequest,
    ) -> Result<Indicator, StoreError> {
        let id = request.indicator_id;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        let current =
            read_indicator(&q, id)?.ok_or_else(|| StoreError::not_found("indicator", id))?;
        let name = match request.name {
            Some(name) => valid_name(&name)?,
            None => current.name,
        };
        let code = match request.code {
            Some(code) => valid_code(&code)?,
            None => current.code,
        };
        let target_value = request.target_value.unwrap_or(current.target_value);
        let target = target_to_sql(target_value)?;
        let outcome_id = request.outcome_id.unwrap_or(current.outcome_id);
        let output_id = request.output_id.unwrap_or(current.output_id);
        check_attachment(&q, outcome_id, output_id)?;

        tx.execute(
            "UPDATE indicators \
             SET name=?2, code=?3, target_value=?4, outcome_id=?5, output_id=?6, updated_at_ms=?7 \
             WHERE id=?1",
            params![
                id.get(),
                name,
                code,
                target,
                outcome_id.map(OutcomeId::get),
                output_id.map(OutputId::get),
                now_ms(),
            ],
        )?;

        tx.commit()?;
        debug!(indicator_id = %id, "indicator updated");
        Ok(Indicator {
            id,
            name,
            code,
            target_value,
            outcome_id,
            output_id,
        })
    }

    /// Returns the number of activity links removed with the indicator.
    pub fn delete_indicator(&mut self, id: IndicatorId) -> Result<u64, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !indicator_exists(&q, id.get())? {
            return Err(StoreError::not_found("indicator", id));
        }

        let links = q.count(
            "SELECT COUNT(1) FROM activity_indicators WHERE indicator_id=?1",
            params![id.get()],
        )?;
        tx.execute("DELETE FROM indicators WHERE id=?1", params![id.get()])?;

        tx.commit()?;
        info!(indicator_id = %id, indicator_links = links, "indicator deleted");
        Ok(links)
    }

    pub fn get_indicator(&self, id: IndicatorId) -> Result<Indicator, StoreError> {
        read_indicator(&self.queries(), id)?.ok_or_else(|| StoreError::not_found("indicator", id))
    }

    /// Indicators attached to the outcome and to none of its outputs.
    pub fn list_indicators_for_outcome(
        &self,
        outcome_id: OutcomeId,
    ) -> Result<Vec<Indicator>, StoreError> {
        if !outcome_exists(&self.queries(), outcome_id.get())? {
            return Err(StoreError::not_found("outcome", outcome_id));
        }

        self.queries().collect_rows(
            &format!(
                "SELECT {INDICATOR_COLUMNS} FROM indicators \
                 WHERE outcome_id=?1 AND output_id IS NULL ORDER BY id ASC"
            ),
            params![outcome_id.get()],
            indicator_from_row,
        )
    }

    pub fn list_indicators_for_output(
        &self,
        output_id: OutputId,
    ) -> Result<Vec<Indicator>, StoreError> {
        if !output_exists(&self.queries(), output_id.get())? {
            return Err(StoreError::not_found("output", output_id));
        }

        self.queries().collect_rows(
            &format!(
                "SELECT {INDICATOR_COLUMNS} FROM indicators WHERE output_id=?1 ORDER BY id ASC"
            ),
            params![output_id.get()],
            indicator_from_row,
        )
    }

    pub fn list_orphan_indicators(&self) -> Result<Vec<Indicator>, StoreError> {
        self.queries().collect_rows(
            &format!(
                "SELECT {INDICATOR_COLUMNS} FROM indicators \
                 WHERE outcome_id IS NULL AND output_id IS NULL ORDER BY id ASC"
            ),
            [],
            indicator_from_row,
        )
    }
}

/// Parents must exist, and an output given alongside an outcome must belong to it.
fn check_attachment(
    q: &Queries<'_>,
    outcome_id: Option<OutcomeId>,
    output_id: Option<OutputId>,
) -> Result<(), StoreError> {
    if let Some(outcome_id) = outcome_id {
        if !outcome_exists(q, outcome_id.get())? {
            return Err(StoreError::missing_parent("outcome", outcome_id));
        }
    }

    let Some(output_id) = output_id else {
        return Ok(());
    };
    let owner = q.first_row(
        "SELECT outcome_id FROM outputs WHERE id=?1",
        params![output_id.get()],
        raw_id_column,
    )?;
    let Some(owner) = owner else {
        return Err(StoreError::missing_parent("output", output_id));
    };

    match outcome_id {
        Some(outcome_id) if outcome_id.get() != owner => Err(StoreError::Validation(format!(
            "output {output_id} belongs to outcome {owner}, not outcome {outcome_id}"
        ))),
        _ => Ok(()),
    }
}

fn read_indicator(q: &Queries<'_>, id: IndicatorId) -> Result<Option<Indicator>, StoreError> {
    q.first_row(
        &format!("SELECT {INDICATOR_COLUMNS} FROM indicators WHERE id=?1"),
        params![id.get()],
        indicator_from_row,
    )
}

fn raw_id_column(row: &Row<'_>) -> Result<i64, StoreError> {
    Ok(row.get(0)?)
}

pub(crate) fn indicator_from_row(row: &Row<'_>) -> Result<Indicator, StoreError> {
    let outcome_id = row
        .get::<_, Option<i64>>(4)?
        .map(|raw| row_id(raw, OutcomeId::try_new))
        .transpose()?;
    let output_id = row
        .get::<_, Option<i64>>(5)?
        .map(|raw| row_id(raw, OutputId::try_new))
        .transpose()?;
    Ok(Indicator {
        id: row_id(row.get(0)?, IndicatorId::try_new)?,
        name: row.get(1)?,
        code: row.get(2)?,
        target_value: target_from_sql(row.get(3)?)?,
        outcome_id,
        output_id,
    })
}
