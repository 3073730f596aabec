use serde_json::json;

use crate::remote::ApiError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Map a remote failure onto the envelope. Backend statuses keep their
/// meaning (409 = already exists, 422 = validation, ...) and the backend's
/// own body rides in the details so the UI can render its message.
pub fn remote_err(id: &str, error: ApiError) -> serde_json::Value {
    match error {
        ApiError::Status(status, body) => {
            let code = match status {
                401 => "unauthorized",
                403 => "forbidden",
                404 => "not_found",
                409 => "conflict",
                422 => "invalid",
                _ => "remote_status",
            };
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("remote request failed")
                .to_string();
            err(
                id,
                code,
                message,
                Some(json!({ "status": status, "body": body })),
            )
        }
        ApiError::Transport(msg) => err(id, "network", msg, None),
        ApiError::Decode(msg) => err(id, "bad_payload", msg, None),
    }
}
