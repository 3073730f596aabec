use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};
use crate::remote::RemoteClient;
use crate::session::{IdentityState, StudentRef};
use serde_json::json;

fn server<'a>(state: &'a AppState, req: &Request) -> Result<&'a RemoteClient, serde_json::Value> {
    state
        .server
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_server", "select a server first", None))
}

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn required_object(req: &Request, key: &str) -> Result<serde_json::Value, serde_json::Value> {
    match req.params.get(key) {
        Some(v) if v.is_object() => Ok(v.clone()),
        _ => Err(err(
            &req.id,
            "bad_params",
            format!("missing {} object", key),
            None,
        )),
    }
}

fn signed_in_student<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a StudentRef, serde_json::Value> {
    match state.session.identity() {
        IdentityState::Authenticated(user) => user
            .student
            .as_ref()
            .ok_or_else(|| err(&req.id, "not_a_student", "account has no student profile", None)),
        _ => Err(err(&req.id, "not_logged_in", "sign in first", None)),
    }
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = match server(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match client.get_json("/students", state.session.token()) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = match server(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student = match required_object(req, "student") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match client.post_json("/students", state.session.token(), &student) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = match server(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_i64(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = match required_object(req, "patch") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match client.put_json(
        &format!("/students/{}", student_id),
        state.session.token(),
        &patch,
    ) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = match server(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_i64(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match client.delete_json(&format!("/students/{}", student_id), state.session.token()) {
        Ok(body) => ok(&req.id, json!({ "deleted": true, "response": body })),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_save_self_contract(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = match server(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match signed_in_student(state, req) {
        Ok(s) => s.id,
        Err(resp) => return resp,
    };
    let contract = match required_str(req, "selfContract") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if contract.is_empty() {
        return err(&req.id, "bad_params", "selfContract must not be empty", None);
    }

    let body = json!({ "self_contract": contract });
    match client.put_json(
        &format!("/students/{}", student_id),
        state.session.token(),
        &body,
    ) {
        Ok(resp) => {
            // The gate reads the cached identity; write the new contract
            // through so the next evaluation sees it.
            state
                .session
                .patch_student(|s| s.self_contract = Some(contract.clone()));
            ok(&req.id, resp)
        }
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_reward_claim(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = match server(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let (student_id, eligible) = match signed_in_student(state, req) {
        Ok(s) => (s.id, s.reward_eligible),
        Err(resp) => return resp,
    };
    if !eligible {
        return err(&req.id, "not_eligible", "no reward is claimable yet", None);
    }
    let reward = match required_str(req, "reward") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if reward.is_empty() {
        return err(&req.id, "bad_params", "reward must not be empty", None);
    }

    // Claiming parks the chosen reward and restarts the streak; the next
    // five late-free days re-arm eligibility on the server.
    let body = json!({
        "pending_reward": reward,
        "reward_eligible": false,
        "late_free_streak": 0,
    });
    match client.put_json(
        &format!("/students/{}", student_id),
        state.session.token(),
        &body,
    ) {
        Ok(resp) => {
            state.session.patch_student(|s| {
                s.pending_reward = Some(reward.clone());
                s.reward_eligible = false;
                s.late_free_streak = 0;
            });
            ok(&req.id, resp)
        }
        Err(e) => remote_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.saveSelfContract" => Some(handle_save_self_contract(state, req)),
        "reward.claim" => Some(handle_reward_claim(state, req)),
        _ => None,
    }
}
