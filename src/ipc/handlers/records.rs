use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const RECORDS_PATH: &str = "/reward-punishment-records";

/// Flattens an optional `filters` object into query pairs. Scalar values
/// are rendered as-is; anything else is skipped.
fn filter_pairs(params: &serde_json::Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(filters) = params.get("filters").and_then(|v| v.as_object()) {
        for (key, value) in filters {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            pairs.push((key.clone(), rendered));
        }
    }
    pairs
}

fn handle_records_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let pairs = filter_pairs(&req.params);
    match client.get_json_query(RECORDS_PATH, state.session.token(), &pairs) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_records_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let record_id = match req.params.get("recordId").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing recordId", None),
    };
    let patch = match req.params.get("patch") {
        Some(v) if v.is_object() => v.clone(),
        _ => return err(&req.id, "bad_params", "missing patch object", None),
    };
    match client.put_json(
        &format!("{}/{}", RECORDS_PATH, record_id),
        state.session.token(),
        &patch,
    ) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_records_bulk_update_done(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let record_ids: Vec<i64> = match req.params.get("recordIds").and_then(|v| v.as_array()) {
        Some(items) => {
            let mut ids = Vec::with_capacity(items.len());
            for item in items {
                match item.as_i64() {
                    Some(id) => ids.push(id),
                    None => {
                        return err(&req.id, "bad_params", "recordIds must be numbers", None)
                    }
                }
            }
            ids
        }
        None => return err(&req.id, "bad_params", "missing recordIds array", None),
    };
    if record_ids.is_empty() {
        return err(&req.id, "bad_params", "recordIds is empty", None);
    }
    let notes = req
        .params
        .get("notes")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let body = json!({ "record_ids": record_ids, "notes": notes });
    match client.post_json(
        &format!("{}/bulk-update-done", RECORDS_PATH),
        state.session.token(),
        &body,
    ) {
        Ok(resp) => ok(&req.id, resp),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_records_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let pairs = filter_pairs(&req.params);
    match client.get_json_query(
        &format!("{}/students/list", RECORDS_PATH),
        state.session.token(),
        &pairs,
    ) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.list" => Some(handle_records_list(state, req)),
        "records.update" => Some(handle_records_update(state, req)),
        "records.bulkUpdateDone" => Some(handle_records_bulk_update_done(state, req)),
        "records.studentsList" => Some(handle_records_students_list(state, req)),
        _ => None,
    }
}
