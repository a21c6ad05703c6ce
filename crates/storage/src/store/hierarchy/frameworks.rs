#![forbid(unsafe_code)]

use super::{CascadeSummary, FRAMEWORK_SCOPE, cascade_summary, framework_exists, valid_name};
use crate::store::{
    CreateFrameworkRequest, Queries, SqliteStore, StoreError, UpdateFrameworkRequest, now_ms,
    row_id,
};
use lf_core::ids::FrameworkId;
use lf_core::model::Framework;
use lf_core::period::{Period, format_date};
use rusqlite::{Row, TransactionBehavior, params};
use time::Date;
use tracing::{debug, info};

const FRAMEWORK_COLUMNS: &str = "id, name, start_date, end_date";

impl SqliteStore {
    pub fn create_framework(
        &mut self,
        request: CreateFrameworkRequest,
    ) -> Result<Framework, StoreError> {
        let name = valid_name(&request.name)?;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        ensure_no_overlap(&q, &request.period, None)?;

        tx.execute(
            "INSERT INTO frameworks(name, start_date, end_date, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                name,
                format_date(request.period.start()),
                format_date(request.period.end()),
                now_ms,
            ],
        )?;
        let id = row_id(tx.last_insert_rowid(), FrameworkId::try_new)?;

        tx.commit()?;
        info!(framework_id = %id, "framework created");
        Ok(Framework {
            id,
            name,
            period: request.period,
        })
    }

    pub fn update_framework(
        &mut self,
        request: UpdateFrameworkRequest,
    ) -> Result<Framework, StoreError> {
        let id = request.framework_id;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        let current =
            read_framework(&q, id)?.ok_or_else(|| StoreError::not_found("framework", id))?;
        let name = match request.name {
            Some(name) => valid_name(&name)?,
            None => current.name,
        };
        let period = Period::try_new(
            request.start_date.unwrap_or(current.period.start()),
            request.end_date.unwrap_or(current.period.end()),
        )
        .map_err(|err| StoreError::Validation(err.message()))?;
        ensure_no_overlap(&q, &period, Some(id))?;

        tx.execute(
            "UPDATE frameworks SET name=?2, start_date=?3, end_date=?4, updated_at_ms=?5 WHERE id=?1",
            params![
                id.get(),
                name,
                format_date(period.start()),
                format_date(period.end()),
                now_ms(),
            ],
        )?;

        tx.commit()?;
        debug!(framework_id = %id, "framework updated");
        Ok(Framework { id, name, period })
    }

    /// Removes the framework and, through foreign-key cascades, every objective,
    /// outcome, output, indicator and indicator link beneath it, in one transaction.
    pub fn delete_framework(&mut self, id: FrameworkId) -> Result<CascadeSummary, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !framework_exists(&q, id.get())? {
            return Err(StoreError::not_found("framework", id));
        }

        let summary = cascade_summary(&q, FRAMEWORK_SCOPE, id.get())?;
        tx.execute("DELETE FROM frameworks WHERE id=?1", params![id.get()])?;

        tx.commit()?;
        info!(
            framework_id = %id,
            objectives = summary.objectives,
            outcomes = summary.outcomes,
            outputs = summary.outputs,
            indicators = summary.indicators,
            indicator_links = summary.indicator_links,
            "framework deleted"
        );
        Ok(summary)
    }

    pub fn get_framework(&self, id: FrameworkId) -> Result<Framework, StoreError> {
        read_framework(&self.queries(), id)?.ok_or_else(|| StoreError::not_found("framework", id))
    }

    pub fn list_frameworks(&self) -> Result<Vec<Framework>, StoreError> {
        self.queries().collect_rows(
            &format!("SELECT {FRAMEWORK_COLUMNS} FROM frameworks ORDER BY start_date ASC, id ASC"),
            [],
            framework_from_row,
        )
    }

    /// The framework whose period contains `date`. Periods never overlap, so
    /// there is at most one.
    pub fn framework_active_on(&self, date: Date) -> Result<Option<Framework>, StoreError> {
        self.queries().first_row(
            &format!(
                "SELECT {FRAMEWORK_COLUMNS} FROM frameworks \
                 WHERE start_date <= ?1 AND end_date >= ?1 \
                 ORDER BY id ASC LIMIT 1"
            ),
            params![format_date(date)],
            framework_from_row,
        )
    }
}

pub(crate) fn read_framework(
    q: &Queries<'_>,
    id: FrameworkId,
) -> Result<Option<Framework>, StoreError> {
    q.first_row(
        &format!("SELECT {FRAMEWORK_COLUMNS} FROM frameworks WHERE id=?1"),
        params![id.get()],
        framework_from_row,
    )
}

fn framework_from_row(row: &Row<'_>) -> Result<Framework, StoreError> {
    let id = row.get::<_, i64>(0)?;
    let start = row.get::<_, String>(2)?;
    let end = row.get::<_, String>(3)?;
    let period = Period::parse(&start, &end)
        .map_err(|err| StoreError::Corrupt(format!("framework {id}: {}", err.message())))?;
    Ok(Framework {
        id: row_id(id, FrameworkId::try_new)?,
        name: row.get(1)?,
        period,
    })
}

fn id_and_name(row: &Row<'_>) -> Result<(i64, String), StoreError> {
    Ok((row.get(0)?, row.get(1)?))
}

/// Inclusive bounds: stored ISO dates compare lexically in calendar order.
fn ensure_no_overlap(
    q: &Queries<'_>,
    period: &Period,
    exclude: Option<FrameworkId>,
) -> Result<(), StoreError> {
    let clash = q.first_row(
        "SELECT id, name FROM frameworks \
         WHERE start_date <= ?2 AND end_date >= ?1 AND id <> ?3 \
         ORDER BY id ASC LIMIT 1",
        params![
            format_date(period.start()),
            format_date(period.end()),
            exclude.map_or(0, FrameworkId::get),
        ],
        id_and_name,
    )?;

    match clash {
        Some((other_id, other_name)) => Err(StoreError::Conflict(format!(
            "period {}..{} overlaps framework {other_id} ({other_name})",
            format_date(period.start()),
            format_date(period.end()),
        ))),
        None => Ok(()),
    }
}
