use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const RULES_PATH: &str = "/reward-punishment-rules";

fn handle_rules_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    match client.get_json(RULES_PATH, state.session.token()) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_rules_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let rule = match req.params.get("rule") {
        Some(v) if v.is_object() => v.clone(),
        _ => return err(&req.id, "bad_params", "missing rule object", None),
    };
    match client.post_json(RULES_PATH, state.session.token(), &rule) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_rules_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let rule_id = match req.params.get("ruleId").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing ruleId", None),
    };
    let patch = match req.params.get("patch") {
        Some(v) if v.is_object() => v.clone(),
        _ => return err(&req.id, "bad_params", "missing patch object", None),
    };
    match client.put_json(
        &format!("{}/{}", RULES_PATH, rule_id),
        state.session.token(),
        &patch,
    ) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_rules_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let rule_id = match req.params.get("ruleId").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing ruleId", None),
    };
    match client.delete_json(&format!("{}/{}", RULES_PATH, rule_id), state.session.token()) {
        Ok(body) => ok(&req.id, json!({ "deleted": true, "response": body })),
        Err(e) => remote_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rules.list" => Some(handle_rules_list(state, req)),
        "rules.create" => Some(handle_rules_create(state, req)),
        "rules.update" => Some(handle_rules_update(state, req)),
        "rules.delete" => Some(handle_rules_delete(state, req)),
        _ => None,
    }
}
