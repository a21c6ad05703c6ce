#![forbid(unsafe_code)]

//! Distinct-beneficiary aggregation.
//!
//! An indicator's actual value is the size of the union of the beneficiary
//! sets of its linked activities. Framework-wide values come from two link
//! fetches (indicator links, then beneficiary links of the activities found)
//! followed by an in-memory union per indicator, so the statement count does
//! not grow with the number of indicators.

use super::hierarchy::{FRAMEWORK_SCOPE, framework_exists, indicator_exists};
use super::{Queries, SqliteStore, StoreError, row_id};
use lf_core::ids::{ActivityId, BeneficiaryId, FrameworkId, IndicatorId};
use rusqlite::{Row, params};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// In-memory view of the two link relations for a set of indicators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkSnapshot {
    indicator_activities: BTreeMap<IndicatorId, BTreeSet<ActivityId>>,
    activity_beneficiaries: BTreeMap<ActivityId, BTreeSet<BeneficiaryId>>,
}

impl LinkSnapshot {
    pub fn from_rows(
        indicator_links: impl IntoIterator<Item = (IndicatorId, ActivityId)>,
        beneficiary_links: impl IntoIterator<Item = (ActivityId, BeneficiaryId)>,
    ) -> Self {
        let mut snapshot = Self::default();
        for (indicator_id, activity_id) in indicator_links {
            snapshot.add_indicator_link(indicator_id, activity_id);
        }
        for (activity_id, beneficiary_id) in beneficiary_links {
            snapshot.add_beneficiary_link(activity_id, beneficiary_id);
        }
        snapshot
    }

    pub fn add_indicator_link(&mut self, indicator_id: IndicatorId, activity_id: ActivityId) {
        self.indicator_activities
            .entry(indicator_id)
            .or_default()
            .insert(activity_id);
    }

    pub fn add_beneficiary_link(&mut self, activity_id: ActivityId, beneficiary_id: BeneficiaryId) {
        self.activity_beneficiaries
            .entry(activity_id)
            .or_default()
            .insert(beneficiary_id);
    }

    pub fn activities_of(&self, indicator_id: IndicatorId) -> impl Iterator<Item = ActivityId> + '_ {
        self.indicator_activities
            .get(&indicator_id)
            .into_iter()
            .flat_map(|activities| activities.iter().copied())
    }

    /// Union of the beneficiaries reached through any of the indicators.
    pub fn beneficiaries_reached<'a>(
        &self,
        indicators: impl IntoIterator<Item = &'a IndicatorId>,
    ) -> BTreeSet<BeneficiaryId> {
        let mut reached = BTreeSet::new();
        for indicator_id in indicators {
            for activity_id in self.activities_of(*indicator_id) {
                if let Some(beneficiaries) = self.activity_beneficiaries.get(&activity_id) {
                    reached.extend(beneficiaries.iter().copied());
                }
            }
        }
        reached
    }

    pub fn actual_value(&self, indicator_id: IndicatorId) -> u64 {
        self.reached_by(std::iter::once(&indicator_id))
    }

    pub fn reached_by<'a>(&self, indicators: impl IntoIterator<Item = &'a IndicatorId>) -> u64 {
        self.beneficiaries_reached(indicators).len() as u64
    }

    /// Actual value of every indicator that has at least one link.
    pub fn actual_values(&self) -> BTreeMap<IndicatorId, u64> {
        self.indicator_activities
            .keys()
            .map(|indicator_id| (*indicator_id, self.actual_value(*indicator_id)))
            .collect()
    }
}

/// Per-indicator distinct beneficiary counts over raw link rows.
pub fn distinct_beneficiary_counts(
    indicator_links: impl IntoIterator<Item = (IndicatorId, ActivityId)>,
    beneficiary_links: impl IntoIterator<Item = (ActivityId, BeneficiaryId)>,
) -> BTreeMap<IndicatorId, u64> {
    LinkSnapshot::from_rows(indicator_links, beneficiary_links).actual_values()
}

impl SqliteStore {
    /// Orphaned indicators are aggregated like any other.
    pub fn indicator_actual_value(&self, indicator_id: IndicatorId) -> Result<u64, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let q = Queries::new(&tx, &self.statements);

        if !indicator_exists(&q, indicator_id.get())? {
            return Err(StoreError::not_found("indicator", indicator_id));
        }

        let activity_ids = super::links::activity_ids_for_indicator(&q, indicator_id)?;
        if activity_ids.is_empty() {
            return Ok(0);
        }

        let snapshot = LinkSnapshot::from_rows(
            activity_ids
                .into_iter()
                .map(|activity_id| (indicator_id, activity_id)),
            q.collect_rows(
                "SELECT ab.activity_id, ab.beneficiary_id FROM activity_beneficiaries ab \
                 WHERE ab.activity_id IN ( \
                   SELECT activity_id FROM activity_indicators WHERE indicator_id=?1 \
                 )",
                params![indicator_id.get()],
                beneficiary_link_from_row,
            )?,
        );

        let value = snapshot.actual_value(indicator_id);
        debug!(%indicator_id, actual_value = value, "indicator aggregated");
        Ok(value)
    }

    /// Actual value of every indicator in the framework, zero included.
    pub fn framework_actual_values(
        &self,
        framework_id: FrameworkId,
    ) -> Result<BTreeMap<IndicatorId, u64>, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let q = Queries::new(&tx, &self.statements);

        if !framework_exists(&q, framework_id.get())? {
            return Err(StoreError::not_found("framework", framework_id));
        }

        let mut values = q
            .collect_rows(
                &format!("{FRAMEWORK_SCOPE} SELECT id FROM s_indicators"),
                params![framework_id.get()],
                indicator_id_column,
            )?
            .into_iter()
            .map(|indicator_id| (indicator_id, 0))
            .collect::<BTreeMap<_, _>>();

        let snapshot = load_framework_links(&q, framework_id)?;
        values.extend(snapshot.actual_values());
        debug!(
            %framework_id,
            indicators = values.len(),
            "framework aggregated"
        );
        Ok(values)
    }
}

/// Issues at most two statements regardless of how many indicators the
/// framework holds; the second is skipped when nothing is linked.
pub(super) fn load_framework_links(
    q: &Queries<'_>,
    framework_id: FrameworkId,
) -> Result<LinkSnapshot, StoreError> {
    let indicator_links = q.collect_rows(
        &format!(
            "{FRAMEWORK_SCOPE} \
             SELECT ai.indicator_id, ai.activity_id FROM activity_indicators ai \
             WHERE ai.indicator_id IN (SELECT id FROM s_indicators)"
        ),
        params![framework_id.get()],
        indicator_link_from_row,
    )?;
    if indicator_links.is_empty() {
        return Ok(LinkSnapshot::default());
    }

    let beneficiary_links = q.collect_rows(
        &format!(
            "{FRAMEWORK_SCOPE} \
             SELECT ab.activity_id, ab.beneficiary_id FROM activity_beneficiaries ab \
             WHERE ab.activity_id IN ( \
               SELECT activity_id FROM activity_indicators \
               WHERE indicator_id IN (SELECT id FROM s_indicators) \
             )"
        ),
        params![framework_id.get()],
        beneficiary_link_from_row,
    )?;

    Ok(LinkSnapshot::from_rows(indicator_links, beneficiary_links))
}

fn indicator_id_column(row: &Row<'_>) -> Result<IndicatorId, StoreError> {
    row_id(row.get(0)?, IndicatorId::try_new)
}

fn indicator_link_from_row(row: &Row<'_>) -> Result<(IndicatorId, ActivityId), StoreError> {
    Ok((
        row_id(row.get(0)?, IndicatorId::try_new)?,
        row_id(row.get(1)?, ActivityId::try_new)?,
    ))
}

fn beneficiary_link_from_row(row: &Row<'_>) -> Result<(ActivityId, BeneficiaryId), StoreError> {
    Ok((
        row_id(row.get(0)?, ActivityId::try_new)?,
        row_id(row.get(1)?, BeneficiaryId::try_new)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(raw: i64) -> IndicatorId {
        IndicatorId::try_new(raw).unwrap()
    }

    fn activity(raw: i64) -> ActivityId {
        ActivityId::try_new(raw).unwrap()
    }

    fn beneficiary(raw: i64) -> BeneficiaryId {
        BeneficiaryId::try_new(raw).unwrap()
    }

    #[test]
    fn shared_beneficiary_counts_once() {
        let snapshot = LinkSnapshot::from_rows(
            [(indicator(1), activity(1)), (indicator(1), activity(2))],
            [
                (activity(1), beneficiary(1)),
                (activity(1), beneficiary(2)),
                (activity(1), beneficiary(3)),
                (activity(2), beneficiary(3)),
                (activity(2), beneficiary(4)),
            ],
        );
        assert_eq!(snapshot.actual_value(indicator(1)), 4);
    }

    #[test]
    fn unlinked_indicator_is_zero() {
        let snapshot = LinkSnapshot::from_rows([(indicator(1), activity(1))], []);
        assert_eq!(snapshot.actual_value(indicator(1)), 0);
        assert_eq!(snapshot.actual_value(indicator(2)), 0);
    }

    #[test]
    fn roll_up_unions_across_indicators() {
        let snapshot = LinkSnapshot::from_rows(
            [
                (indicator(1), activity(1)),
                (indicator(2), activity(2)),
                (indicator(3), activity(3)),
            ],
            [
                (activity(1), beneficiary(1)),
                (activity(1), beneficiary(2)),
                (activity(2), beneficiary(2)),
                (activity(3), beneficiary(9)),
            ],
        );
        assert_eq!(snapshot.reached_by(&[indicator(1), indicator(2)]), 2);
        assert_eq!(
            snapshot.reached_by(&[indicator(1), indicator(2), indicator(3)]),
            3
        );
        assert_eq!(snapshot.reached_by(std::iter::empty()), 0);
    }

    #[test]
    fn counts_cover_every_linked_indicator() {
        let counts = distinct_beneficiary_counts(
            [
                (indicator(7), activity(1)),
                (indicator(8), activity(1)),
                (indicator(8), activity(2)),
            ],
            [
                (activity(1), beneficiary(1)),
                (activity(2), beneficiary(1)),
                (activity(2), beneficiary(5)),
            ],
        );
        assert_eq!(counts.get(&indicator(7)), Some(&1));
        assert_eq!(counts.get(&indicator(8)), Some(&2));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn duplicate_rows_collapse() {
        let snapshot = LinkSnapshot::from_rows(
            [(indicator(1), activity(1)), (indicator(1), activity(1))],
            [(activity(1), beneficiary(1)), (activity(1), beneficiary(1))],
        );
        assert_eq!(snapshot.actual_value(indicator(1)), 1);
    }
}
