#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;

#[test]
fn initialize_echoes_protocol_and_lists_tools() {
    let mut server = Server::start("editor");

    let init = server.request(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": { "protocolVersion": "2025-03-26", "capabilities": {} }
    }));
    assert_eq!(init["result"]["protocolVersion"], json!("2025-03-26"));
    assert_eq!(init["result"]["serverInfo"]["name"], json!("logframe-linking-api"));

    let tools_list = server.request(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "params": {}
    }));
    let names = tools_list["result"]["tools"]
        .as_array()
        .expect("result.tools")
        .iter()
        .filter_map(|tool| tool.get("name").and_then(|v| v.as_str()))
        .collect::<Vec<_>>();
    for expected in ["links_batch", "link_remove", "links_list", "structure_get"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn batch_link_round_trip_over_stdio() {
    let mut server = Server::start_initialized("editor");

    let framework = server.call(
        10,
        "framework_create",
        json!({ "name": "Plan", "start_date": "2024-01-01", "end_date": "2024-12-31" }),
    );
    let framework_id = framework["result"]["framework"]["id"].clone();
    let objective = server.call(
        11,
        "objective_create",
        json!({ "framework_id": framework_id, "name": "Objective" }),
    );
    let outcome = server.call(
        12,
        "outcome_create",
        json!({ "objective_id": objective["result"]["objective"]["id"], "name": "Outcome", "code": "OC1" }),
    );
    let indicator = server.call(
        13,
        "indicator_create",
        json!({
            "name": "Reached",
            "code": "IN1",
            "target_value": 3,
            "outcome_id": outcome["result"]["outcome"]["id"]
        }),
    );
    let indicator_id = indicator["result"]["indicator"]["id"].clone();

    let activity = server.call(14, "activity_register", json!({ "name": "Clinic day" }));
    let activity_id = activity["result"]["activity"]["id"].clone();
    for (n, name) in ["Ana", "Ben"].into_iter().enumerate() {
        let beneficiary = server.call(20 + n as u64, "beneficiary_register", json!({ "name": name }));
        let enrolled = server.call(
            30 + n as u64,
            "enrollment_add",
            json!({ "activity_id": activity_id, "beneficiary_id": beneficiary["result"]["beneficiary"]["id"] }),
        );
        assert_eq!(enrolled["success"], json!(true));
    }

    let first = server.call(
        40,
        "links_batch",
        json!({ "indicator_id": indicator_id, "activity_ids": [activity_id] }),
    );
    assert_eq!(first["result"]["added_count"], json!(1));
    let second = server.call(
        41,
        "links_batch",
        json!({ "indicator_id": indicator_id, "activity_ids": [activity_id] }),
    );
    assert_eq!(second["result"]["added_count"], json!(0));
    assert_eq!(second["result"]["skipped_duplicate_count"], json!(1));

    let structure = server.call(42, "structure_get", json!({ "framework_id": framework_id }));
    let node = &structure["result"]["objectives"][0]["outcomes"][0]["indicators"][0];
    assert_eq!(node["actual_value"], json!(2));
    assert_eq!(node["achievement_percent"], json!(66));
}

#[test]
fn data_survives_a_restart() {
    let mut server = Server::start_initialized("editor");
    let created = server.call(
        5,
        "framework_create",
        json!({ "name": "Durable", "start_date": "2025-01-01", "end_date": "2025-12-31" }),
    );
    assert_eq!(created["success"], json!(true));
    let storage = server.stop();

    let mut viewer = Server::start_in(storage, "viewer");
    viewer.initialize_default();
    let listed = viewer.call(6, "framework_list", json!({}));
    assert_eq!(listed["result"]["count"], json!(1));
    assert_eq!(listed["result"]["frameworks"][0]["name"], json!("Durable"));

    let denied = viewer.call(
        7,
        "framework_delete",
        json!({ "framework_id": listed["result"]["frameworks"][0]["id"] }),
    );
    assert_eq!(denied["error"]["code"], json!("FORBIDDEN"));
}

#[test]
fn malformed_lines_get_json_rpc_errors() {
    let mut server = Server::start_initialized("editor");

    server.send_raw("{oops");
    assert_eq!(server.recv()["error"]["code"], json!(-32700));

    server.send_raw(r#"{"jsonrpc":"2.0","id":3}"#);
    let missing_method = server.recv();
    assert_eq!(missing_method["error"]["code"], json!(-32600));
    assert_eq!(missing_method["id"], json!(3));

    let unknown = server.request(json!({ "jsonrpc": "2.0", "id": 4, "method": "prompts/list" }));
    assert_eq!(unknown["error"]["code"], json!(-32601));
}
