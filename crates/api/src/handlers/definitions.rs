#![forbid(unsafe_code)]

use serde_json::{Map, Value, json};

fn id_prop(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 1, "description": description })
}

fn nullable_id_prop(description: &str) -> Value {
    json!({ "type": ["integer", "null"], "minimum": 1, "description": description })
}

fn string_prop(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn date_prop(description: &str) -> Value {
    json!({ "type": "string", "format": "date", "description": description })
}

fn count_prop(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 0, "description": description })
}

fn tool(name: &str, description: &str, props: &[(&str, Value)], required: &[&str]) -> Value {
    let properties = props
        .iter()
        .map(|(key, schema)| ((*key).to_string(), schema.clone()))
        .collect::<Map<String, Value>>();
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required
        }
    })
}

fn hierarchy_definitions() -> Vec<Value> {
    let framework_id = || ("framework_id", id_prop("Framework id."));
    let objective_id = || ("objective_id", id_prop("Objective id."));
    let outcome_id = || ("outcome_id", id_prop("Outcome id."));
    let output_id = || ("output_id", id_prop("Output id."));
    let name = || ("name", string_prop("Display name (trimmed, non-empty)."));
    let code = || ("code", string_prop("Short code without whitespace."));

    vec![
        tool(
            "framework_create",
            "Create a framework; its period must not overlap another framework.",
            &[
                name(),
                ("start_date", date_prop("First day, YYYY-MM-DD.")),
                ("end_date", date_prop("Last day (inclusive), YYYY-MM-DD.")),
            ],
            &["name", "start_date", "end_date"],
        ),
        tool(
            "framework_update",
            "Rename a framework or move its period. Omitted fields are kept.",
            &[
                framework_id(),
                name(),
                ("start_date", date_prop("First day, YYYY-MM-DD.")),
                ("end_date", date_prop("Last day (inclusive), YYYY-MM-DD.")),
            ],
            &["framework_id"],
        ),
        tool(
            "framework_delete",
            "Delete a framework with every descendant and their activity links.",
            &[framework_id()],
            &["framework_id"],
        ),
        tool("framework_get", "Read one framework.", &[framework_id()], &["framework_id"]),
        tool("framework_list", "List frameworks ordered by start date.", &[], &[]),
        tool(
            "framework_active",
            "Find the framework whose period covers a date (default today, UTC).",
            &[("date", date_prop("Date to look up, YYYY-MM-DD."))],
            &[],
        ),
        tool(
            "framework_actuals",
            "Distinct-beneficiary actual value of every indicator in a framework.",
            &[framework_id()],
            &["framework_id"],
        ),
        tool(
            "objective_create",
            "Create an objective under a framework.",
            &[framework_id(), name()],
            &["framework_id", "name"],
        ),
        tool(
            "objective_update",
            "Rename an objective or move it to another framework.",
            &[objective_id(), framework_id(), name()],
            &["objective_id"],
        ),
        tool(
            "objective_delete",
            "Delete an objective with its outcomes, outputs and indicators.",
            &[objective_id()],
            &["objective_id"],
        ),
        tool("objective_get", "Read one objective.", &[objective_id()], &["objective_id"]),
        tool(
            "objective_list",
            "List the objectives of a framework.",
            &[framework_id()],
            &["framework_id"],
        ),
        tool(
            "outcome_create",
            "Create an outcome under an objective.",
            &[objective_id(), name(), code()],
            &["objective_id", "name", "code"],
        ),
        tool(
            "outcome_update",
            "Edit an outcome or move it to another objective.",
            &[outcome_id(), objective_id(), name(), code()],
            &["outcome_id"],
        ),
        tool(
            "outcome_delete",
            "Delete an outcome with its outputs and indicators.",
            &[outcome_id()],
            &["outcome_id"],
        ),
        tool("outcome_get", "Read one outcome.", &[outcome_id()], &["outcome_id"]),
        tool(
            "outcome_list",
            "List the outcomes of an objective.",
            &[objective_id()],
            &["objective_id"],
        ),
        tool(
            "output_create",
            "Create an output under an outcome.",
            &[outcome_id(), name(), code()],
            &["outcome_id", "name", "code"],
        ),
        tool(
            "output_update",
            "Edit an output or move it to another outcome.",
            &[output_id(), outcome_id(), name(), code()],
            &["output_id"],
        ),
        tool(
            "output_delete",
            "Delete an output with its indicators.",
            &[output_id()],
            &["output_id"],
        ),
        tool("output_get", "Read one output.", &[output_id()], &["output_id"]),
        tool(
            "output_list",
            "List the outputs of an outcome.",
            &[outcome_id()],
            &["outcome_id"],
        ),
        tool(
            "indicator_create",
            "Create an indicator under an outcome, an output, or both (the output must belong to the outcome).",
            &[
                name(),
                code(),
                ("target_value", count_prop("Target number of distinct beneficiaries.")),
                ("outcome_id", nullable_id_prop("Parent outcome.")),
                ("output_id", nullable_id_prop("Parent output.")),
            ],
            &["name", "code", "target_value"],
        ),
        tool(
            "indicator_update",
            "Edit an indicator. Omitted fields are kept; null outcome_id/output_id detaches.",
            &[
                ("indicator_id", id_prop("Indicator id.")),
                name(),
                code(),
                ("target_value", count_prop("Target number of distinct beneficiaries.")),
                ("outcome_id", nullable_id_prop("Parent outcome.")),
                ("output_id", nullable_id_prop("Parent output.")),
            ],
            &["indicator_id"],
        ),
        tool(
            "indicator_delete",
            "Delete an indicator and its activity links.",
            &[("indicator_id", id_prop("Indicator id."))],
            &["indicator_id"],
        ),
        tool(
            "indicator_get",
            "Read one indicator.",
            &[("indicator_id", id_prop("Indicator id."))],
            &["indicator_id"],
        ),
        tool(
            "indicator_list",
            "List indicators directly under an outcome, under an output, or detached ones.",
            &[
                outcome_id(),
                output_id(),
                ("orphans", json!({ "type": "boolean", "description": "List detached indicators." })),
            ],
            &[],
        ),
        tool(
            "indicator_actual",
            "Distinct beneficiaries reached through the activities linked to an indicator.",
            &[("indicator_id", id_prop("Indicator id."))],
            &["indicator_id"],
        ),
        tool(
            "structure_get",
            "Full objective/outcome/output/indicator tree with targets, actual values and roll-ups.",
            &[framework_id()],
            &["framework_id"],
        ),
    ]
}

fn link_definitions() -> Vec<Value> {
    let indicator_id = || ("indicator_id", id_prop("Indicator id."));
    let activity_id = || ("activity_id", id_prop("Activity id."));

    vec![
        tool(
            "links_batch",
            "Link a set of activities to an indicator. Existing links are skipped, never rejected.",
            &[
                indicator_id(),
                (
                    "activity_ids",
                    json!({
                        "type": "array",
                        "items": { "type": "integer", "minimum": 1 },
                        "description": "Activities to link; duplicates collapse."
                    }),
                ),
            ],
            &["indicator_id", "activity_ids"],
        ),
        tool(
            "link_add",
            "Link one activity to an indicator; an existing link is a conflict.",
            &[indicator_id(), activity_id()],
            &["indicator_id", "activity_id"],
        ),
        tool(
            "link_remove",
            "Remove one activity link from an indicator.",
            &[indicator_id(), activity_id()],
            &["indicator_id", "activity_id"],
        ),
        tool(
            "links_list",
            "Activities linked to an indicator, each with its own beneficiary count.",
            &[indicator_id()],
            &["indicator_id"],
        ),
    ]
}

fn registry_definitions() -> Vec<Value> {
    let activity_id = || ("activity_id", id_prop("Activity id."));
    let beneficiary_id = || ("beneficiary_id", id_prop("Beneficiary id."));
    let name = || ("name", string_prop("Display name (trimmed, non-empty)."));

    vec![
        tool(
            "activity_register",
            "Register an activity.",
            &[name()],
            &["name"],
        ),
        tool(
            "activity_delete",
            "Delete an activity with its indicator links and enrollments.",
            &[activity_id()],
            &["activity_id"],
        ),
        tool(
            "activity_get",
            "Read an activity and its enrolled beneficiary ids.",
            &[activity_id()],
            &["activity_id"],
        ),
        tool(
            "beneficiary_register",
            "Register a beneficiary.",
            &[name()],
            &["name"],
        ),
        tool(
            "beneficiary_delete",
            "Delete a beneficiary and its enrollments.",
            &[beneficiary_id()],
            &["beneficiary_id"],
        ),
        tool(
            "beneficiary_get",
            "Read one beneficiary.",
            &[beneficiary_id()],
            &["beneficiary_id"],
        ),
        tool(
            "enrollment_add",
            "Enroll a beneficiary in an activity. Re-enrolling is a no-op.",
            &[activity_id(), beneficiary_id()],
            &["activity_id", "beneficiary_id"],
        ),
        tool(
            "enrollment_remove",
            "Withdraw a beneficiary from an activity.",
            &[activity_id(), beneficiary_id()],
            &["activity_id", "beneficiary_id"],
        ),
    ]
}

pub(crate) fn handler_definitions() -> Vec<Value> {
    let mut handlers = hierarchy_definitions();
    handlers.extend(link_definitions());
    handlers.extend(registry_definitions());
    handlers.sort_by_key(|tool| {
        tool.get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    });
    handlers
}
