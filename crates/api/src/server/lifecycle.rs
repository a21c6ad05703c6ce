#![forbid(unsafe_code)]

use crate::LogframeServer;
use serde_json::{Value, json};
use tracing::{debug, info_span, warn};

impl LogframeServer {
    pub(crate) fn handle(&mut self, request: crate::JsonRpcRequest) -> Option<Value> {
        let method = request.method.as_str();
        let expects_response = !matches!(request.id.as_ref(), None | Some(Value::Null));

        if method == "initialize" {
            let protocol_version = request
                .params
                .as_ref()
                .and_then(|v| v.get("protocolVersion"))
                .and_then(|v| v.as_str())
                .unwrap_or(crate::MCP_VERSION);

            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "protocolVersion": protocol_version,
                    "serverInfo": {
                        "name": crate::SERVER_NAME,
                        "version": crate::SERVER_VERSION
                    },
                    "capabilities": { "tools": {} }
                }),
            ));
        }

        if method == "notifications/initialized" || method == "initialized" {
            self.initialized = true;
            return None;
        }

        if !self.initialized {
            // Clients that skip the notification still get served.
            if matches!(method, "tools/call" | "tools/list" | "ping") {
                self.initialized = true;
            } else if expects_response {
                return Some(crate::json_rpc_error(
                    request.id,
                    -32002,
                    "Server not initialized",
                ));
            } else {
                return None;
            }
        }

        if method == "ping" {
            return Some(crate::json_rpc_response(request.id, json!({})));
        }

        if method == "tools/list" {
            let tools = crate::handlers::handler_definitions();
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "tools": tools }),
            ));
        }

        if method == "tools/call" {
            let Some(params_obj) = request.params.as_ref().and_then(|v| v.as_object()) else {
                return Some(crate::json_rpc_error(
                    request.id,
                    -32602,
                    "params must be an object",
                ));
            };

            let tool_name = params_obj
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            // `"arguments": null` is treated as `{}`; other non-objects reach the validator.
            let args = match params_obj.get("arguments") {
                None | Some(Value::Null) => json!({}),
                Some(v) => v.clone(),
            };
            let response_body = self.call_tool(&tool_name, args);

            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "content": [crate::tool_text_content(&response_body)],
                    "isError": !response_body.get("success").and_then(|v| v.as_bool()).unwrap_or(false)
                }),
            ));
        }

        if !expects_response {
            return None;
        }

        Some(crate::json_rpc_error(
            request.id,
            -32601,
            &format!("Method not found: {method}"),
        ))
    }

    pub(crate) fn call_tool(&mut self, name: &str, args: Value) -> Value {
        let name = name.trim();
        let span = info_span!("tool_call", actor = self.identity.actor(), tool = name);
        let _entered = span.enter();

        let Some(mutates) = crate::handlers::tool_mutates(name) else {
            warn!("unknown tool");
            return crate::error_unknown_tool(name);
        };
        if mutates && !self.identity.role().can_mutate() {
            warn!(role = %self.identity.role(), "mutating tool rejected");
            return crate::error_forbidden(name);
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            crate::handlers::dispatch_tool(self, name, args)
        }));
        let resp = match result {
            Ok(Some(resp)) => resp,
            Ok(None) => crate::error_unknown_tool(name),
            Err(_) => crate::error_internal(format!("Internal panic while handling {name}")),
        };

        match resp
            .get("error")
            .and_then(|err| err.get("code"))
            .and_then(|code| code.as_str())
        {
            Some(code) => warn!(code, "tool call failed"),
            None => debug!("tool call ok"),
        }
        resp
    }
}
