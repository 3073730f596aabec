use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const CONTROLS_PATH: &str = "/stimulus-controls";

fn handle_controls_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    match client.get_json(CONTROLS_PATH, state.session.token()) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

/// The server has no per-student endpoint; it returns everyone's controls
/// and each caller picks out its own, exactly like the listing screens do.
fn handle_controls_mine(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let student_id = match state.session.student() {
        Some(s) => s.id,
        None => {
            if state.session.token().is_none() {
                return err(&req.id, "not_logged_in", "sign in first", None);
            }
            return err(&req.id, "not_a_student", "account has no student profile", None);
        }
    };
    let body = match client.get_json(CONTROLS_PATH, state.session.token()) {
        Ok(body) => body,
        Err(e) => return remote_err(&req.id, e),
    };
    let mine = body
        .get("data")
        .and_then(|v| v.as_array())
        .and_then(|items| {
            items
                .iter()
                .find(|item| item.get("student_id").and_then(|v| v.as_i64()) == Some(student_id))
        })
        .cloned();
    ok(
        &req.id,
        json!({ "control": mine.unwrap_or(serde_json::Value::Null) }),
    )
}

fn handle_controls_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let (student_id, has_contract) = match state.session.student() {
        Some(s) => (s.id, s.has_self_contract()),
        None => {
            if state.session.token().is_none() {
                return err(&req.id, "not_logged_in", "sign in first", None);
            }
            return err(&req.id, "not_a_student", "account has no student profile", None);
        }
    };
    if !has_contract {
        return err(&req.id, "contract_required", "save a self-contract first", None);
    }
    let value = match req.params.get("value").and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing value", None),
    };
    let body = json!({ "student_id": student_id, "value": value });
    match client.post_json(CONTROLS_PATH, state.session.token(), &body) {
        Ok(resp) => ok(&req.id, resp),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_controls_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let control_id = match req.params.get("controlId").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing controlId", None),
    };
    let value = match req.params.get("value").and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing value", None),
    };
    match client.put_json(
        &format!("{}/{}", CONTROLS_PATH, control_id),
        state.session.token(),
        &json!({ "value": value }),
    ) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stimulusControls.list" => Some(handle_controls_list(state, req)),
        "stimulusControls.mine" => Some(handle_controls_mine(state, req)),
        "stimulusControls.create" => Some(handle_controls_create(state, req)),
        "stimulusControls.update" => Some(handle_controls_update(state, req)),
        _ => None,
    }
}
