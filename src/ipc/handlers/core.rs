use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::remote::RemoteClient;
use crate::session;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "serverUrl": state.server.as_ref().map(|c| c.base_url().to_string()),
            "session": super::auth::session_summary(&state.session),
        }),
    )
}

fn handle_server_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let base_url = match req.params.get("baseUrl").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing params.baseUrl", None),
    };
    if base_url.is_empty() {
        return err(&req.id, "bad_params", "baseUrl must not be empty", None);
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return err(&req.id, "bad_params", "baseUrl must be http(s)", None);
    }
    let state_dir = req
        .params
        .get("stateDir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);

    let client = RemoteClient::new(&base_url);

    // Selecting a server resets whatever was cached from the previous one.
    state.session = session::Session::new();

    // Best-effort: restore a token saved by an earlier run against the same
    // server. A missing, corrupt, or foreign file must not fail the select.
    let mut restored_token = false;
    if let Some(dir) = state_dir.as_ref() {
        if let Ok(Some(saved)) = session::load_session_file(dir) {
            if saved.server_url == client.base_url() {
                state.session.set_token(saved.token);
                restored_token = true;
            }
        }
    }

    let server_url = client.base_url().to_string();
    state.server = Some(client);
    state.state_dir = state_dir;

    ok(
        &req.id,
        json!({ "serverUrl": server_url, "restoredToken": restored_token }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "server.select" => Some(handle_server_select(state, req)),
        _ => None,
    }
}
