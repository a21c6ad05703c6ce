#![forbid(unsafe_code)]

use super::hierarchy::indicator_exists;
use super::registry::{activity_exists, activity_from_row};
use super::{
    BatchLinkRequest, Queries, SqliteStore, StoreError, count_from_sql, is_unique_violation,
    now_ms, row_id,
};
use lf_core::ids::{ActivityId, BeneficiaryId, IndicatorId};
use lf_core::model::Activity;
use rusqlite::{Row, TransactionBehavior, params, params_from_iter};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchLinkOutcome {
    pub added_count: u64,
    pub skipped_duplicate_count: u64,
}

/// An activity linked to an indicator, with the number of distinct
/// beneficiaries enrolled in that activity alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedActivity {
    pub activity: Activity,
    pub beneficiary_count: u64,
}

impl SqliteStore {
    pub fn link_activity_to_indicator(
        &mut self,
        activity_id: ActivityId,
        indicator_id: IndicatorId,
    ) -> Result<(), StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !indicator_exists(&q, indicator_id.get())? {
            return Err(StoreError::not_found("indicator", indicator_id));
        }
        if !activity_exists(&q, activity_id)? {
            return Err(StoreError::missing_parent("activity", activity_id));
        }

        let insert = tx.execute(
            "INSERT INTO activity_indicators(activity_id, indicator_id, created_at_ms) \
             VALUES (?1, ?2, ?3)",
            params![activity_id.get(), indicator_id.get(), now_ms()],
        );
        match insert {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::Conflict(format!(
                    "activity {activity_id} is already linked to indicator {indicator_id}"
                )));
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit()?;
        debug!(%activity_id, %indicator_id, "activity linked");
        Ok(())
    }

    /// Links every activity in the set with one insert. Pairs that already
    /// exist, including ones inserted concurrently by another connection, are
    /// counted as skipped. Unknown activities reject the whole batch before
    /// anything is written.
    pub fn batch_link_activities_to_indicator(
        &mut self,
        request: BatchLinkRequest,
    ) -> Result<BatchLinkOutcome, StoreError> {
        let BatchLinkRequest {
            indicator_id,
            activity_ids,
        } = request;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !indicator_exists(&q, indicator_id.get())? {
            return Err(StoreError::not_found("indicator", indicator_id));
        }
        if activity_ids.is_empty() {
            return Ok(BatchLinkOutcome::default());
        }

        let known = q.collect_rows(
            &format!(
                "SELECT id FROM activities WHERE id IN ({})",
                numbered_placeholders(1, activity_ids.len())
            ),
            params_from_iter(activity_ids.iter().map(|id| id.get())),
            activity_id_column,
        )?;
        let missing = activity_ids
            .iter()
            .filter(|id| !known.contains(*id))
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "unknown activity ids: {}",
                missing.join(", ")
            )));
        }

        let added = tx.execute(
            &format!(
                "INSERT INTO activity_indicators(activity_id, indicator_id, created_at_ms) \
                 SELECT id, ?1, ?2 FROM activities WHERE id IN ({}) \
                 ON CONFLICT(activity_id, indicator_id) DO NOTHING",
                numbered_placeholders(3, activity_ids.len())
            ),
            params_from_iter(
                [indicator_id.get(), now_ms]
                    .into_iter()
                    .chain(activity_ids.iter().map(|id| id.get())),
            ),
        )? as u64;
        let outcome = BatchLinkOutcome {
            added_count: added,
            skipped_duplicate_count: (activity_ids.len() as u64).saturating_sub(added),
        };

        tx.commit()?;
        info!(
            %indicator_id,
            added = outcome.added_count,
            skipped = outcome.skipped_duplicate_count,
            "activities linked"
        );
        Ok(outcome)
    }

    pub fn unlink_activity_from_indicator(
        &mut self,
        activity_id: ActivityId,
        indicator_id: IndicatorId,
    ) -> Result<(), StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM activity_indicators WHERE activity_id=?1 AND indicator_id=?2",
            params![activity_id.get(), indicator_id.get()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!(
                "activity {activity_id} is not linked to indicator {indicator_id}"
            )));
        }
        debug!(%activity_id, %indicator_id, "activity unlinked");
        Ok(())
    }

    /// Sorted activity ids linked to the indicator.
    pub fn list_activity_ids_for_indicator(
        &self,
        indicator_id: IndicatorId,
    ) -> Result<Vec<ActivityId>, StoreError> {
        let q = self.queries();
        if !indicator_exists(&q, indicator_id.get())? {
            return Err(StoreError::not_found("indicator", indicator_id));
        }
        activity_ids_for_indicator(&q, indicator_id)
    }

    /// Sorted, distinct beneficiary ids enrolled in the activity.
    pub fn list_beneficiary_ids_for_activity(
        &self,
        activity_id: ActivityId,
    ) -> Result<Vec<BeneficiaryId>, StoreError> {
        let q = self.queries();
        if !activity_exists(&q, activity_id)? {
            return Err(StoreError::not_found("activity", activity_id));
        }

        q.collect_rows(
            "SELECT beneficiary_id FROM activity_beneficiaries \
             WHERE activity_id=?1 ORDER BY beneficiary_id ASC",
            params![activity_id.get()],
            beneficiary_id_column,
        )
    }

    /// Activities linked to the indicator, each with its own beneficiary count.
    /// The counts are per activity and may overlap; they do not sum to the
    /// indicator's actual value.
    pub fn linked_activities_with_counts(
        &self,
        indicator_id: IndicatorId,
    ) -> Result<Vec<LinkedActivity>, StoreError> {
        let q = self.queries();
        if !indicator_exists(&q, indicator_id.get())? {
            return Err(StoreError::not_found("indicator", indicator_id));
        }

        q.collect_rows(
            "SELECT a.id, a.name, COUNT(DISTINCT ab.beneficiary_id) \
             FROM activity_indicators ai \
             JOIN activities a ON a.id = ai.activity_id \
             LEFT JOIN activity_beneficiaries ab ON ab.activity_id = a.id \
             WHERE ai.indicator_id=?1 \
             GROUP BY a.id, a.name \
             ORDER BY a.id ASC",
            params![indicator_id.get()],
            linked_activity_from_row,
        )
    }
}

pub(super) fn activity_ids_for_indicator(
    q: &Queries<'_>,
    indicator_id: IndicatorId,
) -> Result<Vec<ActivityId>, StoreError> {
    q.collect_rows(
        "SELECT activity_id FROM activity_indicators \
         WHERE indicator_id=?1 ORDER BY activity_id ASC",
        params![indicator_id.get()],
        activity_id_column,
    )
}

/// `?start, ?start+1, ...` for `count` parameters.
fn numbered_placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn activity_id_column(row: &Row<'_>) -> Result<ActivityId, StoreError> {
    row_id(row.get(0)?, ActivityId::try_new)
}

fn beneficiary_id_column(row: &Row<'_>) -> Result<BeneficiaryId, StoreError> {
    row_id(row.get(0)?, BeneficiaryId::try_new)
}

fn linked_activity_from_row(row: &Row<'_>) -> Result<LinkedActivity, StoreError> {
    Ok(LinkedActivity {
        activity: activity_from_row(row)?,
        beneficiary_count: count_from_sql(row.get(2)?),
    })
}
