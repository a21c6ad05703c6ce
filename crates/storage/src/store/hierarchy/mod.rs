#![forbid(unsafe_code)]

mod frameworks;
mod indicators;
mod objectives;
mod outcomes;
mod outputs;

pub(super) use frameworks::read_framework;
pub(super) use indicators::{INDICATOR_COLUMNS, indicator_from_row};
pub(super) use objectives::{OBJECTIVE_COLUMNS, objective_from_row};
pub(super) use outcomes::{OUTCOME_COLUMNS, outcome_from_row};
pub(super) use outputs::{OUTPUT_COLUMNS, output_from_row};

use super::{Queries, StoreError};
use lf_core::model::{FieldError, normalize_code, normalize_name};
use rusqlite::{Row, params};

/// Rows removed by a cascading delete, counted before the delete runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub objectives: u64,
    pub outcomes: u64,
    pub outputs: u64,
    pub indicators: u64,
    pub indicator_links: u64,
}

/// Descendant scopes of one framework. Shared by cascade accounting, the
/// aggregation engine and structure assembly.
pub(super) const FRAMEWORK_SCOPE: &str = "\
WITH s_objectives AS ( \
    SELECT id FROM objectives WHERE framework_id = ?1 \
), s_outcomes AS ( \
    SELECT id FROM outcomes WHERE objective_id IN (SELECT id FROM s_objectives) \
), s_outputs AS ( \
    SELECT id FROM outputs WHERE outcome_id IN (SELECT id FROM s_outcomes) \
), s_indicators AS ( \
    SELECT id FROM indicators \
    WHERE outcome_id IN (SELECT id FROM s_outcomes) \
       OR output_id IN (SELECT id FROM s_outputs) \
)";

const OBJECTIVE_SCOPE: &str = "\
WITH s_objectives AS ( \
    SELECT id FROM objectives WHERE 0 \
), s_outcomes AS ( \
    SELECT id FROM outcomes WHERE objective_id = ?1 \
), s_outputs AS ( \
    SELECT id FROM outputs WHERE outcome_id IN (SELECT id FROM s_outcomes) \
), s_indicators AS ( \
    SELECT id FROM indicators \
    WHERE outcome_id IN (SELECT id FROM s_outcomes) \
       OR output_id IN (SELECT id FROM s_outputs) \
)";

const OUTCOME_SCOPE: &str = "\
WITH s_objectives AS ( \
    SELECT id FROM objectives WHERE 0 \
), s_outcomes AS ( \
    SELECT id FROM outcomes WHERE 0 \
), s_outputs AS ( \
    SELECT id FROM outputs WHERE outcome_id = ?1 \
), s_indicators AS ( \
    SELECT id FROM indicators \
    WHERE outcome_id = ?1 \
       OR output_id IN (SELECT id FROM s_outputs) \
)";

const OUTPUT_SCOPE: &str = "\
WITH s_objectives AS ( \
    SELECT id FROM objectives WHERE 0 \
), s_outcomes AS ( \
    SELECT id FROM outcomes WHERE 0 \
), s_outputs AS ( \
    SELECT id FROM outputs WHERE 0 \
), s_indicators AS ( \
    SELECT id FROM indicators WHERE output_id = ?1 \
)";

const SUMMARY_SELECT: &str = " \
SELECT \
  (SELECT COUNT(1) FROM s_objectives), \
  (SELECT COUNT(1) FROM s_outcomes), \
  (SELECT COUNT(1) FROM s_outputs), \
  (SELECT COUNT(1) FROM s_indicators), \
  (SELECT COUNT(1) FROM activity_indicators \
     WHERE indicator_id IN (SELECT id FROM s_indicators))";

fn cascade_summary(q: &Queries<'_>, scope: &str, id: i64) -> Result<CascadeSummary, StoreError> {
    q.first_row(&format!("{scope}{SUMMARY_SELECT}"), params![id], summary_from_row)?
        .ok_or_else(|| StoreError::Corrupt("cascade summary returned no row".to_string()))
}

fn summary_from_row(row: &Row<'_>) -> Result<CascadeSummary, StoreError> {
    let count = |idx: usize| -> Result<u64, StoreError> {
        Ok(super::count_from_sql(row.get::<_, i64>(idx)?))
    };
    Ok(CascadeSummary {
        objectives: count(0)?,
        outcomes: count(1)?,
        outputs: count(2)?,
        indicators: count(3)?,
        indicator_links: count(4)?,
    })
}

pub(super) fn framework_exists(q: &Queries<'_>, id: i64) -> Result<bool, StoreError> {
    q.exists("SELECT 1 FROM frameworks WHERE id=?1", params![id])
}

pub(super) fn objective_exists(q: &Queries<'_>, id: i64) -> Result<bool, StoreError> {
    q.exists("SELECT 1 FROM objectives WHERE id=?1", params![id])
}

pub(super) fn outcome_exists(q: &Queries<'_>, id: i64) -> Result<bool, StoreError> {
    q.exists("SELECT 1 FROM outcomes WHERE id=?1", params![id])
}

pub(super) fn output_exists(q: &Queries<'_>, id: i64) -> Result<bool, StoreError> {
    q.exists("SELECT 1 FROM outputs WHERE id=?1", params![id])
}

pub(super) fn indicator_exists(q: &Queries<'_>, id: i64) -> Result<bool, StoreError> {
    q.exists("SELECT 1 FROM indicators WHERE id=?1", params![id])
}

fn valid_name(value: &str) -> Result<String, StoreError> {
    normalize_name("name", value).map_err(field_error)
}

fn valid_code(value: &str) -> Result<String, StoreError> {
    normalize_code("code", value).map_err(field_error)
}

fn field_error(err: FieldError) -> StoreError {
    StoreError::Validation(err.message())
}
