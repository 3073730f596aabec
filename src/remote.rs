use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

const CONNECT_TIMEOUT_MS: u64 = 10_000;
const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Synchronous client for the school backend. One agent per selected
/// server; every call attaches the bearer token when one is supplied.
pub struct RemoteClient {
    agent: ureq::Agent,
    base_url: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Non-2xx response; carries the parsed error body so the caller can
    /// surface the backend's own message and validation details.
    Status(u16, Value),
    Transport(String),
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status(code, _) => write!(f, "remote returned http status {}", code),
            ApiError::Transport(msg) => write!(f, "transport error: {}", msg),
            ApiError::Decode(msg) => write!(f, "malformed response body: {}", msg),
        }
    }
}

/// One file entry of a multipart upload.
pub struct FilePart<'a> {
    pub name: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

/// Entry of the remote stimulus-control collection. Existence per student
/// is all the access gate reads from it.
#[derive(Debug, Clone, Deserialize)]
pub struct StimulusControlRecord {
    pub id: i64,
    pub student_id: i64,
    #[serde(default)]
    pub value: Option<String>,
}

impl RemoteClient {
    pub fn new(base_url: &str) -> RemoteClient {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(CONNECT_TIMEOUT_MS))
            .timeout_read(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .timeout_write(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .user_agent(concat!("presenced/", env!("CARGO_PKG_VERSION")))
            .build();
        RemoteClient {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, method: &str, path: &str, token: Option<&str>) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, &self.url(path))
            .set("accept", "application/json");
        if let Some(token) = token {
            req = req.set("authorization", &format!("Bearer {}", token));
        }
        req
    }

    pub fn get_json(&self, path: &str, token: Option<&str>) -> Result<Value, ApiError> {
        finish(self.prepare("GET", path, token).call())
    }

    pub fn get_json_query(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(String, String)],
    ) -> Result<Value, ApiError> {
        let mut req = self.prepare("GET", path, token);
        for (key, value) in query {
            req = req.query(key, value);
        }
        finish(req.call())
    }

    pub fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Value, ApiError> {
        finish(
            self.prepare("POST", path, token)
                .set("content-type", "application/json")
                .send_string(&body.to_string()),
        )
    }

    pub fn put_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Value, ApiError> {
        finish(
            self.prepare("PUT", path, token)
                .set("content-type", "application/json")
                .send_string(&body.to_string()),
        )
    }

    pub fn delete_json(&self, path: &str, token: Option<&str>) -> Result<Value, ApiError> {
        finish(self.prepare("DELETE", path, token).call())
    }

    pub fn post_multipart(
        &self,
        path: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
        files: &[FilePart<'_>],
    ) -> Result<Value, ApiError> {
        let boundary = format!("----presenced-{}", Uuid::new_v4());
        let body = multipart_body(&boundary, fields, files);
        finish(
            self.prepare("POST", path, token)
                .set(
                    "content-type",
                    &format!("multipart/form-data; boundary={}", boundary),
                )
                .send_bytes(&body),
        )
    }

    /// Fetch the stimulus-control collection. The backend wraps it as
    /// `{ "data": [...] }`; a missing or malformed wrapper is a decode
    /// failure for the caller to handle.
    pub fn stimulus_records(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<StimulusControlRecord>, ApiError> {
        let body = self.get_json("/stimulus-controls", token)?;
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn finish(outcome: Result<ureq::Response, ureq::Error>) -> Result<Value, ApiError> {
    match outcome {
        Ok(resp) => parse_body(resp),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp
                .into_string()
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok())
                .unwrap_or(Value::Null);
            Err(ApiError::Status(code, body))
        }
        Err(ureq::Error::Transport(err)) => Err(ApiError::Transport(err.to_string())),
    }
}

fn parse_body(resp: ureq::Response) -> Result<Value, ApiError> {
    let text = resp
        .into_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for file in files {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                file.name, file.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
