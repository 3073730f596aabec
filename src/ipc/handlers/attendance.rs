use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};
use crate::remote::{self, FilePart};
use serde_json::json;
use std::path::Path;

/// Builds the /attendances query. The server always wants a date; when the
/// caller leaves it out we ask for today.
fn attendance_query(params: &serde_json::Value) -> Vec<(String, String)> {
    let date = params
        .get("date")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
    let mut pairs = vec![("date".to_string(), date)];
    if let Some(status) = params.get("status").and_then(|v| v.as_str()) {
        pairs.push(("status".to_string(), status.to_string()));
    }
    if let Some(grade_id) = params.get("gradeId").and_then(|v| v.as_i64()) {
        pairs.push(("grade_id".to_string(), grade_id.to_string()));
    }
    pairs
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let pairs = attendance_query(&req.params);
    match client.get_json_query("/attendances", state.session.token(), &pairs) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_attendance_check_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let remark = match req.params.get("remark").and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing remark", None),
    };
    let photo_path = match req.params.get("photoPath").and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => return err(&req.id, "bad_params", "missing photoPath", None),
    };
    let bytes = match std::fs::read(&photo_path) {
        Ok(b) => b,
        Err(e) => {
            return err(
                &req.id,
                "photo_read_failed",
                "could not read the check-in photo",
                Some(json!({ "path": photo_path, "error": e.to_string() })),
            )
        }
    };
    let filename = Path::new(&photo_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo")
        .to_string();
    let part = FilePart {
        name: "images[]",
        filename: &filename,
        content_type: remote::content_type_for(&filename),
        bytes: &bytes,
    };
    match client.post_multipart(
        "/attendances",
        state.session.token(),
        &[("remarks", remark.as_str())],
        &[part],
    ) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_attendance_late_reasons(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    match client.get_json("/attendances/late-reasons", state.session.token()) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.list" => Some(handle_attendance_list(state, req)),
        "attendance.checkIn" => Some(handle_attendance_check_in(state, req)),
        "attendance.lateReasons" => Some(handle_attendance_late_reasons(state, req)),
        _ => None,
    }
}
