#![forbid(unsafe_code)]

use super::aggregation::{LinkSnapshot, load_framework_links};
use super::hierarchy::{
    FRAMEWORK_SCOPE, INDICATOR_COLUMNS, OBJECTIVE_COLUMNS, OUTCOME_COLUMNS, OUTPUT_COLUMNS,
    indicator_from_row, objective_from_row, outcome_from_row, output_from_row, read_framework,
};
use super::{Queries, SqliteStore, StoreError};
use lf_core::ids::{FrameworkId, IndicatorId, ObjectiveId, OutcomeId, OutputId};
use lf_core::model::{Indicator, Outcome, Output};
use lf_core::structure::{
    FrameworkStructure, IndicatorNode, ObjectiveNode, OutcomeNode, OutputNode,
};
use rusqlite::params;
use std::collections::BTreeMap;
use tracing::debug;

impl SqliteStore {
    /// Full tree of a framework with actual values and roll-ups.
    ///
    /// Runs at most seven statements inside one read transaction whatever the
    /// size of the tree: the framework row, one per hierarchy level, and the two
    /// link fetches. Orphaned indicators never appear.
    pub fn get_structure(
        &self,
        framework_id: FrameworkId,
    ) -> Result<FrameworkStructure, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let q = Queries::new(&tx, &self.statements);

        let framework = read_framework(&q, framework_id)?
            .ok_or_else(|| StoreError::not_found("framework", framework_id))?;
        let raw_id = framework_id.get();

        let objectives = q.collect_rows(
            &format!(
                "{FRAMEWORK_SCOPE} SELECT {OBJECTIVE_COLUMNS} FROM objectives \
                 WHERE id IN (SELECT id FROM s_objectives) ORDER BY id ASC"
            ),
            params![raw_id],
            objective_from_row,
        )?;

        let outcomes = q.collect_rows(
            &format!(
                "{FRAMEWORK_SCOPE} SELECT {OUTCOME_COLUMNS} FROM outcomes \
                 WHERE id IN (SELECT id FROM s_outcomes) ORDER BY id ASC"
            ),
            params![raw_id],
            outcome_from_row,
        )?;

        let outputs = q.collect_rows(
            &format!(
                "{FRAMEWORK_SCOPE} SELECT {OUTPUT_COLUMNS} FROM outputs \
                 WHERE id IN (SELECT id FROM s_outputs) ORDER BY id ASC"
            ),
            params![raw_id],
            output_from_row,
        )?;

        let indicators = q.collect_rows(
            &format!(
                "{FRAMEWORK_SCOPE} SELECT {INDICATOR_COLUMNS} FROM indicators \
                 WHERE id IN (SELECT id FROM s_indicators) ORDER BY id ASC"
            ),
            params![raw_id],
            indicator_from_row,
        )?;

        let snapshot = load_framework_links(&q, framework_id)?;
        tx.commit()?;

        let indicator_count = indicators.len();
        let mut tree = TreeParts::new(outcomes, outputs, indicators);
        let objectives = objectives
            .into_iter()
            .map(|objective| {
                let outcomes = tree.outcome_nodes(objective.id, &snapshot);
                let reached_beneficiaries = snapshot.reached_by(
                    outcomes
                        .iter()
                        .flat_map(outcome_indicator_ids)
                        .collect::<Vec<_>>()
                        .iter(),
                );
                ObjectiveNode {
                    objective,
                    reached_beneficiaries,
                    outcomes,
                }
            })
            .collect::<Vec<_>>();

        let all_ids = objectives
            .iter()
            .flat_map(|objective| objective.outcomes.iter())
            .flat_map(outcome_indicator_ids)
            .collect::<Vec<_>>();
        let structure = FrameworkStructure {
            reached_beneficiaries: snapshot.reached_by(all_ids.iter()),
            framework,
            objectives,
        };

        debug!(
            %framework_id,
            indicators = indicator_count,
            reached = structure.reached_beneficiaries,
            "structure assembled"
        );
        Ok(structure)
    }
}

/// Hierarchy rows grouped by parent, consumed while the tree is built.
struct TreeParts {
    outcomes: BTreeMap<ObjectiveId, Vec<Outcome>>,
    outputs: BTreeMap<OutcomeId, Vec<Output>>,
    outcome_indicators: BTreeMap<OutcomeId, Vec<Indicator>>,
    output_indicators: BTreeMap<OutputId, Vec<Indicator>>,
}

impl TreeParts {
    fn new(outcomes: Vec<Outcome>, outputs: Vec<Output>, indicators: Vec<Indicator>) -> Self {
        let mut parts = Self {
            outcomes: BTreeMap::new(),
            outputs: BTreeMap::new(),
            outcome_indicators: BTreeMap::new(),
            output_indicators: BTreeMap::new(),
        };
        for outcome in outcomes {
            parts
                .outcomes
                .entry(outcome.objective_id)
                .or_default()
                .push(outcome);
        }
        for output in outputs {
            parts.outputs.entry(output.outcome_id).or_default().push(output);
        }
        for indicator in indicators {
            match (indicator.output_id, indicator.outcome_id) {
                (Some(output_id), _) => parts
                    .output_indicators
                    .entry(output_id)
                    .or_default()
                    .push(indicator),
                (None, Some(outcome_id)) => parts
                    .outcome_indicators
                    .entry(outcome_id)
                    .or_default()
                    .push(indicator),
                (None, None) => {}
            }
        }
        parts
    }

    fn outcome_nodes(
        &mut self,
        objective_id: ObjectiveId,
        snapshot: &LinkSnapshot,
    ) -> Vec<OutcomeNode> {
        let outcomes = self.outcomes.remove(&objective_id).unwrap_or_default();
        outcomes
            .into_iter()
            .map(|outcome| {
                let indicators = indicator_nodes(
                    self.outcome_indicators.remove(&outcome.id).unwrap_or_default(),
                    snapshot,
                );
                let outputs = self
                    .outputs
                    .remove(&outcome.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|output| {
                        let indicators = indicator_nodes(
                            self.output_indicators.remove(&output.id).unwrap_or_default(),
                            snapshot,
                        );
                        OutputNode {
                            reached_beneficiaries: snapshot
                                .reached_by(indicators.iter().map(|node| &node.indicator.id)),
                            output,
                            indicators,
                        }
                    })
                    .collect::<Vec<_>>();

                let mut node = OutcomeNode {
                    outcome,
                    reached_beneficiaries: 0,
                    indicators,
                    outputs,
                };
                let ids = outcome_indicator_ids(&node).collect::<Vec<_>>();
                node.reached_beneficiaries = snapshot.reached_by(ids.iter());
                node
            })
            .collect()
    }
}

fn indicator_nodes(indicators: Vec<Indicator>, snapshot: &LinkSnapshot) -> Vec<IndicatorNode> {
    indicators
        .into_iter()
        .map(|indicator| IndicatorNode {
            actual_value: snapshot.actual_value(indicator.id),
            indicator,
        })
        .collect()
}

fn outcome_indicator_ids(outcome: &OutcomeNode) -> impl Iterator<Item = IndicatorId> + '_ {
    outcome
        .indicators
        .iter()
        .chain(outcome.outputs.iter().flat_map(|output| output.indicators.iter()))
        .map(|node| node.indicator.id)
}
