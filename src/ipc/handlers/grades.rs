use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    match client.get_json("/grades", state.session.token()) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_grades_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let grade = match req.params.get("grade") {
        Some(v) if v.is_object() => v.clone(),
        _ => return err(&req.id, "bad_params", "missing grade object", None),
    };
    match client.post_json("/grades", state.session.token(), &grade) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_grades_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let grade_id = match req.params.get("gradeId").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing gradeId", None),
    };
    let patch = match req.params.get("patch") {
        Some(v) if v.is_object() => v.clone(),
        _ => return err(&req.id, "bad_params", "missing patch object", None),
    };
    match client.put_json(
        &format!("/grades/{}", grade_id),
        state.session.token(),
        &patch,
    ) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_grades_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let grade_id = match req.params.get("gradeId").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing gradeId", None),
    };
    match client.delete_json(&format!("/grades/{}", grade_id), state.session.token()) {
        Ok(body) => ok(&req.id, json!({ "deleted": true, "response": body })),
        Err(e) => remote_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(handle_grades_list(state, req)),
        "grades.create" => Some(handle_grades_create(state, req)),
        "grades.update" => Some(handle_grades_update(state, req)),
        "grades.delete" => Some(handle_grades_delete(state, req)),
        _ => None,
    }
}
