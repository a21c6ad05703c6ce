#![forbid(unsafe_code)]

use crate::entry::handle_line;
use crate::{IdentityContext, LogframeServer, Role};
use lf_storage::SqliteStore;
use serde_json::{Value, json};

fn server(role: Role) -> LogframeServer {
    let store = SqliteStore::open_in_memory().expect("open store");
    let identity = IdentityContext::new("tester", role).expect("identity");
    LogframeServer::new(store, identity)
}

fn ok(server: &mut LogframeServer, name: &str, args: Value) -> Value {
    let resp = server.call_tool(name, args);
    assert_eq!(
        resp.get("success").and_then(|v| v.as_bool()),
        Some(true),
        "{name} failed: {resp}"
    );
    resp["result"].clone()
}

fn error_code(server: &mut LogframeServer, name: &str, args: Value) -> String {
    let resp = server.call_tool(name, args);
    assert_eq!(resp["success"], json!(false), "{name} unexpectedly succeeded");
    resp["error"]["code"].as_str().unwrap_or_default().to_string()
}

fn id_of(result: &Value, key: &str) -> i64 {
    result[key]["id"].as_i64().expect("id")
}

/// Framework -> objective -> outcome -> output -> indicator; returns (framework, indicator).
fn seed_tree(server: &mut LogframeServer) -> (i64, i64) {
    let framework = id_of(
        &ok(
            server,
            "framework_create",
            json!({ "name": "Plan", "start_date": "2024-01-01", "end_date": "2024-12-31" }),
        ),
        "framework",
    );
    let objective = id_of(
        &ok(
            server,
            "objective_create",
            json!({ "framework_id": framework, "name": "Nutrition" }),
        ),
        "objective",
    );
    let outcome = id_of(
        &ok(
            server,
            "outcome_create",
            json!({ "objective_id": objective, "name": "Diets improve", "code": "OC1" }),
        ),
        "outcome",
    );
    let output = id_of(
        &ok(
            server,
            "output_create",
            json!({ "outcome_id": outcome, "name": "Trainings held", "code": "OP1" }),
        ),
        "output",
    );
    let indicator = id_of(
        &ok(
            server,
            "indicator_create",
            json!({ "name": "People trained", "code": "IN1", "target_value": 8, "output_id": output }),
        ),
        "indicator",
    );
    (framework, indicator)
}

fn activity_with(server: &mut LogframeServer, beneficiaries: &[i64]) -> i64 {
    let activity = id_of(
        &ok(server, "activity_register", json!({ "name": "Session" })),
        "activity",
    );
    for beneficiary in beneficiaries {
        ok(
            server,
            "enrollment_add",
            json!({ "activity_id": activity, "beneficiary_id": beneficiary }),
        );
    }
    activity
}

fn beneficiaries(server: &mut LogframeServer, count: usize) -> Vec<i64> {
    (0..count)
        .map(|n| {
            id_of(
                &ok(
                    server,
                    "beneficiary_register",
                    json!({ "name": format!("Person {n}") }),
                ),
                "beneficiary",
            )
        })
        .collect()
}

#[test]
fn linking_flow_reports_distinct_beneficiaries() {
    let mut server = server(Role::Editor);
    let (framework, indicator) = seed_tree(&mut server);
    let b = beneficiaries(&mut server, 4);
    let a1 = activity_with(&mut server, &[b[0], b[1], b[2]]);
    let a2 = activity_with(&mut server, &[b[2], b[3]]);

    let first = ok(
        &mut server,
        "links_batch",
        json!({ "indicator_id": indicator, "activity_ids": [a1, a2, a1] }),
    );
    assert_eq!(first["added_count"], json!(2));
    assert_eq!(first["skipped_duplicate_count"], json!(0));

    let second = ok(
        &mut server,
        "links_batch",
        json!({ "indicator_id": indicator, "activity_ids": [a1, a2] }),
    );
    assert_eq!(second["added_count"], json!(0));
    assert_eq!(second["skipped_duplicate_count"], json!(2));

    let actual = ok(
        &mut server,
        "indicator_actual",
        json!({ "indicator_id": indicator }),
    );
    assert_eq!(actual["actual_value"], json!(4));
    assert_eq!(actual["achievement_percent"], json!(50));

    let listed = ok(&mut server, "links_list", json!({ "indicator_id": indicator }));
    let counts = listed["activities"]
        .as_array()
        .expect("activities")
        .iter()
        .map(|entry| entry["beneficiary_count"].as_u64().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![3, 2]);

    let structure = ok(&mut server, "structure_get", json!({ "framework_id": framework }));
    assert_eq!(structure["reached_beneficiaries"], json!(4));
    let node = &structure["objectives"][0]["outcomes"][0]["outputs"][0]["indicators"][0];
    assert_eq!(node["actual_value"], json!(4));
    assert_eq!(node["target_value"], json!(8));

    let actuals = ok(&mut server, "framework_actuals", json!({ "framework_id": framework }));
    assert_eq!(actuals["indicators"][0]["actual_value"], json!(4));
}

#[test]
fn unlinking_a_missing_pair_is_not_found() {
    let mut server = server(Role::Editor);
    let (_, indicator) = seed_tree(&mut server);
    let activity = activity_with(&mut server, &[]);

    assert_eq!(
        error_code(
            &mut server,
            "link_remove",
            json!({ "indicator_id": indicator, "activity_id": activity }),
        ),
        "NOT_FOUND"
    );
    ok(
        &mut server,
        "link_add",
        json!({ "indicator_id": indicator, "activity_id": activity }),
    );
    assert_eq!(
        error_code(
            &mut server,
            "link_add",
            json!({ "indicator_id": indicator, "activity_id": activity }),
        ),
        "CONFLICT"
    );
    ok(
        &mut server,
        "link_remove",
        json!({ "indicator_id": indicator, "activity_id": activity }),
    );
}

#[test]
fn viewers_can_read_but_not_write() {
    let mut editor = server(Role::Editor);
    seed_tree(&mut editor);

    let mut viewer = server(Role::Viewer);
    assert_eq!(
        error_code(
            &mut viewer,
            "framework_create",
            json!({ "name": "Plan", "start_date": "2024-01-01", "end_date": "2024-12-31" }),
        ),
        "FORBIDDEN"
    );
    assert_eq!(
        error_code(
            &mut viewer,
            "links_batch",
            json!({ "indicator_id": 1, "activity_ids": [1] }),
        ),
        "FORBIDDEN"
    );
    let listed = ok(&mut viewer, "framework_list", json!({}));
    assert_eq!(listed["count"], json!(0));
}

#[test]
fn argument_and_store_errors_use_stable_codes() {
    let mut server = server(Role::Editor);
    let (framework, indicator) = seed_tree(&mut server);

    assert_eq!(error_code(&mut server, "nope", json!({})), "UNKNOWN_TOOL");
    assert_eq!(
        error_code(
            &mut server,
            "links_batch",
            json!({ "indicator_id": indicator, "activity_ids": "1,2" }),
        ),
        "VALIDATION_ERROR"
    );
    assert_eq!(
        error_code(
            &mut server,
            "links_batch",
            json!({ "indicator_id": indicator, "activity_ids": [404] }),
        ),
        "VALIDATION_ERROR"
    );
    assert_eq!(
        error_code(&mut server, "structure_get", json!({ "framework_id": framework + 10 })),
        "NOT_FOUND"
    );
    assert_eq!(
        error_code(
            &mut server,
            "framework_create",
            json!({ "name": "Overlap", "start_date": "2024-12-31", "end_date": "2025-06-30" }),
        ),
        "CONFLICT"
    );
    assert_eq!(
        error_code(
            &mut server,
            "framework_create",
            json!({ "name": "Backwards", "start_date": "2026-02-01", "end_date": "2026-01-01" }),
        ),
        "VALIDATION_ERROR"
    );
    assert_eq!(
        error_code(&mut server, "indicator_list", json!({})),
        "VALIDATION_ERROR"
    );
    assert_eq!(error_code(&mut server, "framework_get", json!([1])), "VALIDATION_ERROR");
}

#[test]
fn updates_keep_omitted_fields() {
    let mut server = server(Role::Editor);
    let (framework, indicator) = seed_tree(&mut server);

    let updated = ok(
        &mut server,
        "framework_update",
        json!({ "framework_id": framework, "end_date": "2025-03-31" }),
    );
    assert_eq!(updated["framework"]["name"], json!("Plan"));
    assert_eq!(updated["framework"]["start_date"], json!("2024-01-01"));
    assert_eq!(updated["framework"]["end_date"], json!("2025-03-31"));

    let detached = ok(
        &mut server,
        "indicator_update",
        json!({ "indicator_id": indicator, "output_id": null, "target_value": 12 }),
    );
    assert_eq!(detached["indicator"]["code"], json!("IN1"));
    assert_eq!(detached["indicator"]["target_value"], json!(12));
    assert_eq!(detached["indicator"]["attached"], json!(false));

    let orphans = ok(&mut server, "indicator_list", json!({ "orphans": true }));
    assert_eq!(orphans["indicators"][0]["id"], json!(indicator));
}

#[test]
fn active_framework_lookup_warns_when_nothing_covers_the_date() {
    let mut server = server(Role::Editor);
    let (framework, _) = seed_tree(&mut server);

    let hit = ok(&mut server, "framework_active", json!({ "date": "2024-06-15" }));
    assert_eq!(hit["framework"]["id"], json!(framework));

    let resp = server.call_tool("framework_active", json!({ "date": "2030-01-01" }));
    assert_eq!(resp["result"]["framework"], Value::Null);
    assert_eq!(resp["warnings"][0]["code"], json!("NO_ACTIVE_FRAMEWORK"));
}

#[test]
fn framework_delete_reports_the_cascade() {
    let mut server = server(Role::Editor);
    let (framework, indicator) = seed_tree(&mut server);
    let activity = activity_with(&mut server, &[]);
    ok(
        &mut server,
        "links_batch",
        json!({ "indicator_id": indicator, "activity_ids": [activity] }),
    );

    let removed = ok(&mut server, "framework_delete", json!({ "framework_id": framework }));
    assert_eq!(
        removed["removed"],
        json!({ "objectives": 1, "outcomes": 1, "outputs": 1, "indicators": 1, "indicator_links": 1 })
    );
    assert_eq!(
        error_code(&mut server, "indicator_get", json!({ "indicator_id": indicator })),
        "NOT_FOUND"
    );
    ok(&mut server, "activity_get", json!({ "activity_id": activity }));
}

#[test]
fn protocol_errors_use_json_rpc_codes() {
    let mut server = server(Role::Editor);

    let parse = handle_line(&mut server, "{not json").expect("response");
    assert_eq!(parse["error"]["code"], json!(-32700));

    let invalid = handle_line(&mut server, "[1,2]").expect("response");
    assert_eq!(invalid["error"]["code"], json!(-32600));

    let early = handle_line(&mut server, r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#)
        .expect("response");
    assert_eq!(early["error"]["code"], json!(-32002));

    assert!(handle_line(&mut server, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());

    let unknown = handle_line(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
        .expect("response");
    assert_eq!(unknown["error"]["code"], json!(-32601));

    let no_params = handle_line(&mut server, r#"{"jsonrpc":"2.0","id":3,"method":"tools/call"}"#)
        .expect("response");
    assert_eq!(no_params["error"]["code"], json!(-32602));

    let ping = handle_line(&mut server, r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#)
        .expect("response");
    assert_eq!(ping["result"], json!({}));
}

#[test]
fn tools_call_wraps_the_envelope_as_text() {
    let mut server = server(Role::Viewer);
    let resp = handle_line(
        &mut server,
        r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"framework_list","arguments":null}}"#,
    )
    .expect("response");
    assert_eq!(resp["result"]["isError"], json!(false));
    let text = resp["result"]["content"][0]["text"].as_str().expect("text");
    let payload: Value = serde_json::from_str(text).expect("payload json");
    assert_eq!(payload["intent"], json!("framework_list"));

    let denied = handle_line(
        &mut server,
        r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"activity_register","arguments":{"name":"x"}}}"#,
    )
    .expect("response");
    assert_eq!(denied["result"]["isError"], json!(true));
}
