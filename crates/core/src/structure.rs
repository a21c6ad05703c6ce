#![forbid(unsafe_code)]

//! Rendered logical-framework tree. Every indicator carries its target and the
//! distinct-beneficiary actual value; every node above it carries the distinct
//! beneficiaries reached anywhere beneath it.

use crate::model::{Framework, Indicator, Objective, Outcome, Output};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameworkStructure {
    pub framework: Framework,
    pub reached_beneficiaries: u64,
    pub objectives: Vec<ObjectiveNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectiveNode {
    pub objective: Objective,
    pub reached_beneficiaries: u64,
    pub outcomes: Vec<OutcomeNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutcomeNode {
    pub outcome: Outcome,
    pub reached_beneficiaries: u64,
    /// Indicators attached to the outcome without an output.
    pub indicators: Vec<IndicatorNode>,
    pub outputs: Vec<OutputNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNode {
    pub output: Output,
    pub reached_beneficiaries: u64,
    pub indicators: Vec<IndicatorNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndicatorNode {
    pub indicator: Indicator,
    pub actual_value: u64,
}

impl IndicatorNode {
    pub fn target_value(&self) -> u64 {
        self.indicator.target_value
    }

    /// `None` when the target is zero.
    pub fn achievement_percent(&self) -> Option<u64> {
        achievement_percent(self.actual_value, self.indicator.target_value)
    }
}

pub fn achievement_percent(actual: u64, target: u64) -> Option<u64> {
    if target == 0 {
        return None;
    }
    Some(actual.saturating_mul(100) / target)
}

impl FrameworkStructure {
    pub fn indicators(&self) -> impl Iterator<Item = &IndicatorNode> {
        self.objectives
            .iter()
            .flat_map(|objective| objective.outcomes.iter())
            .flat_map(|outcome| {
                outcome
                    .indicators
                    .iter()
                    .chain(outcome.outputs.iter().flat_map(|output| output.indicators.iter()))
            })
    }
}
