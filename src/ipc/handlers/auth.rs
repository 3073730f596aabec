use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};
use crate::session::{self, Identity, IdentityState, SavedSession, Session};
use serde_json::json;

pub(super) fn session_summary(session: &Session) -> serde_json::Value {
    let state = match session.identity() {
        IdentityState::Loading => "loading",
        IdentityState::Anonymous => "anonymous",
        IdentityState::Authenticated(_) => "authenticated",
    };
    let mut summary = json!({
        "state": state,
        "tokenPresent": session.token().is_some(),
    });
    if let IdentityState::Authenticated(user) = session.identity() {
        summary["user"] = serde_json::to_value(user).unwrap_or(serde_json::Value::Null);
    }
    summary
}

fn handle_auth_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let email = match req.params.get("email").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing email", None),
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing password", None),
    };
    if email.is_empty() {
        return err(&req.id, "bad_params", "email must not be empty", None);
    }

    let body = json!({ "email": email, "password": password });
    let resp = match client.post_json("/login", None, &body) {
        Ok(v) => v,
        Err(e) => return remote_err(&req.id, e),
    };

    let token = match resp.get("token").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_payload", "login response missing token", None),
    };
    let user: Identity = match resp.get("user").cloned() {
        Some(v) if !v.is_null() => match serde_json::from_value(v) {
            Ok(u) => u,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_payload",
                    format!("login user payload: {}", e),
                    None,
                )
            }
        },
        _ => return err(&req.id, "bad_payload", "login response missing user", None),
    };

    let server_url = client.base_url().to_string();
    state.session.establish(token.clone(), user);

    // Best-effort: keep the token across restarts when a state dir is set.
    if let Some(dir) = state.state_dir.as_ref() {
        let saved = SavedSession { server_url, token };
        let _ = session::store_session_file(dir, &saved);
    }

    ok(&req.id, resp)
}

fn handle_auth_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let Some(token) = state.session.token().map(|t| t.to_string()) else {
        return err(&req.id, "not_logged_in", "no session token", None);
    };

    match client.post_json("/logout", Some(&token), &json!({})) {
        Ok(_) => {
            state.session.clear_token();
            state.session.invalidate();
            if let Some(dir) = state.state_dir.as_ref() {
                let _ = session::clear_session_file(dir);
            }
            ok(&req.id, json!({ "loggedOut": true }))
        }
        // The server still considers the token live, so keep it.
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_session_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_summary(&state.session))
}

fn handle_session_refresh(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    match state.session.refresh(client) {
        Ok(()) => ok(&req.id, session_summary(&state.session)),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_session_invalidate(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.invalidate();
    ok(&req.id, session_summary(&state.session))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_auth_login(state, req)),
        "auth.logout" => Some(handle_auth_logout(state, req)),
        "session.current" => Some(handle_session_current(state, req)),
        "session.refresh" => Some(handle_session_refresh(state, req)),
        "session.invalidate" => Some(handle_session_invalidate(state, req)),
        _ => None,
    }
}
