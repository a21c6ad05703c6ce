#![forbid(unsafe_code)]

use lf_core::model::{Activity, Beneficiary, Framework, Indicator, Objective, Outcome, Output};
use lf_core::period::format_date;
use lf_core::structure::{
    FrameworkStructure, IndicatorNode, ObjectiveNode, OutcomeNode, OutputNode,
};
use lf_storage::CascadeSummary;
use serde_json::{Value, json};

pub(crate) fn framework_json(framework: &Framework) -> Value {
    json!({
        "id": framework.id.get(),
        "name": framework.name,
        "start_date": format_date(framework.period.start()),
        "end_date": format_date(framework.period.end())
    })
}

pub(crate) fn objective_json(objective: &Objective) -> Value {
    json!({
        "id": objective.id.get(),
        "framework_id": objective.framework_id.get(),
        "name": objective.name
    })
}

pub(crate) fn outcome_json(outcome: &Outcome) -> Value {
    json!({
        "id": outcome.id.get(),
        "objective_id": outcome.objective_id.get(),
        "name": outcome.name,
        "code": outcome.code
    })
}

pub(crate) fn output_json(output: &Output) -> Value {
    json!({
        "id": output.id.get(),
        "outcome_id": output.outcome_id.get(),
        "name": output.name,
        "code": output.code
    })
}

pub(crate) fn indicator_json(indicator: &Indicator) -> Value {
    json!({
        "id": indicator.id.get(),
        "name": indicator.name,
        "code": indicator.code,
        "target_value": indicator.target_value,
        "outcome_id": indicator.outcome_id.map(|id| id.get()),
        "output_id": indicator.output_id.map(|id| id.get()),
        "attached": indicator.is_attached()
    })
}

pub(crate) fn activity_json(activity: &Activity) -> Value {
    json!({ "id": activity.id.get(), "name": activity.name })
}

pub(crate) fn beneficiary_json(beneficiary: &Beneficiary) -> Value {
    json!({ "id": beneficiary.id.get(), "name": beneficiary.name })
}

pub(crate) fn cascade_json(summary: &CascadeSummary) -> Value {
    json!({
        "objectives": summary.objectives,
        "outcomes": summary.outcomes,
        "outputs": summary.outputs,
        "indicators": summary.indicators,
        "indicator_links": summary.indicator_links
    })
}

fn indicator_node_json(node: &IndicatorNode) -> Value {
    json!({
        "indicator": indicator_json(&node.indicator),
        "target_value": node.target_value(),
        "actual_value": node.actual_value,
        "achievement_percent": node.achievement_percent()
    })
}

fn output_node_json(node: &OutputNode) -> Value {
    json!({
        "output": output_json(&node.output),
        "reached_beneficiaries": node.reached_beneficiaries,
        "indicators": node.indicators.iter().map(indicator_node_json).collect::<Vec<_>>()
    })
}

fn outcome_node_json(node: &OutcomeNode) -> Value {
    json!({
        "outcome": outcome_json(&node.outcome),
        "reached_beneficiaries": node.reached_beneficiaries,
        "indicators": node.indicators.iter().map(indicator_node_json).collect::<Vec<_>>(),
        "outputs": node.outputs.iter().map(output_node_json).collect::<Vec<_>>()
    })
}

fn objective_node_json(node: &ObjectiveNode) -> Value {
    json!({
        "objective": objective_json(&node.objective),
        "reached_beneficiaries": node.reached_beneficiaries,
        "outcomes": node.outcomes.iter().map(outcome_node_json).collect::<Vec<_>>()
    })
}

pub(crate) fn structure_json(structure: &FrameworkStructure) -> Value {
    json!({
        "framework": framework_json(&structure.framework),
        "reached_beneficiaries": structure.reached_beneficiaries,
        "objectives": structure.objectives.iter().map(objective_node_json).collect::<Vec<_>>()
    })
}
