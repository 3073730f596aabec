mod support;

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_presenced");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn presenced");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn student_user() -> serde_json::Value {
    json!({
        "id": 11,
        "name": "Ari Wibowo",
        "email": "ari@example.sch.id",
        "role": "student",
        "student": {
            "id": 42,
            "fullname": "Ari Wibowo",
            "self_contract": "be early",
            "late_free_streak": 1,
            "reward_eligible": false,
            "pending_reward": null
        }
    })
}

fn auth_server() -> (String, support::Hits) {
    support::spawn_server(|hit| match (hit.method.as_str(), hit.path_only()) {
        ("POST", "/login") => (200, json!({ "token": "tok-9", "user": student_user() })),
        ("GET", "/user") => {
            if hit.header("authorization") == Some("Bearer tok-9") {
                (200, student_user())
            } else {
                (401, json!({ "message": "Unauthenticated." }))
            }
        }
        ("POST", "/logout") => (200, json!({ "message": "Logged out" })),
        _ => (200, json!({})),
    })
}

#[test]
fn saved_token_survives_a_restart() {
    let (base_url, _hits) = auth_server();
    let state_dir = temp_dir("presenced-persist");

    let (mut first, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "server.select",
        json!({ "baseUrl": base_url, "stateDir": state_dir.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "email": "ari@example.sch.id", "password": "secret" }),
    );

    let session_file = state_dir.join("session.json");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&session_file).expect("session file"))
            .expect("session json");
    assert_eq!(
        saved.get("serverUrl").and_then(|v| v.as_str()),
        Some(base_url.as_str())
    );
    assert_eq!(saved.get("token").and_then(|v| v.as_str()), Some("tok-9"));

    drop(stdin);
    let _ = first.wait();

    // Fresh process, same server and state dir: the token comes back, the
    // identity does not.
    let (mut second, mut stdin, mut reader) = spawn_sidecar();
    let selected = request(
        &mut stdin,
        &mut reader,
        "1",
        "server.select",
        json!({ "baseUrl": base_url, "stateDir": state_dir.to_string_lossy() }),
    );
    assert_eq!(
        selected.pointer("/result/restoredToken"),
        Some(&json!(true))
    );
    let current = request(&mut stdin, &mut reader, "2", "session.current", json!({}));
    assert_eq!(
        current.pointer("/result/state").and_then(|v| v.as_str()),
        Some("loading")
    );
    assert_eq!(current.pointer("/result/tokenPresent"), Some(&json!(true)));

    let refreshed = request(&mut stdin, &mut reader, "3", "session.refresh", json!({}));
    assert_eq!(
        refreshed.pointer("/result/state").and_then(|v| v.as_str()),
        Some("authenticated")
    );

    drop(stdin);
    let _ = second.wait();
    let _ = std::fs::remove_dir_all(state_dir);
}

#[test]
fn tokens_saved_for_another_server_are_ignored() {
    let (base_url, _hits) = auth_server();
    let state_dir = temp_dir("presenced-persist-foreign");
    std::fs::write(
        state_dir.join("session.json"),
        serde_json::to_string_pretty(&json!({
            "serverUrl": "https://other.example.sch.id",
            "token": "tok-foreign"
        }))
        .expect("serialize"),
    )
    .expect("seed session file");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request(
        &mut stdin,
        &mut reader,
        "1",
        "server.select",
        json!({ "baseUrl": base_url, "stateDir": state_dir.to_string_lossy() }),
    );
    assert_eq!(
        selected.pointer("/result/restoredToken"),
        Some(&json!(false))
    );
    let current = request(&mut stdin, &mut reader, "2", "session.current", json!({}));
    assert_eq!(current.pointer("/result/tokenPresent"), Some(&json!(false)));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(state_dir);
}

#[test]
fn corrupt_state_files_do_not_fail_the_select() {
    let (base_url, _hits) = auth_server();
    let state_dir = temp_dir("presenced-persist-corrupt");
    std::fs::write(state_dir.join("session.json"), "definitely not json")
        .expect("seed corrupt file");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request(
        &mut stdin,
        &mut reader,
        "1",
        "server.select",
        json!({ "baseUrl": base_url, "stateDir": state_dir.to_string_lossy() }),
    );
    assert_eq!(selected.get("ok"), Some(&json!(true)));
    assert_eq!(
        selected.pointer("/result/restoredToken"),
        Some(&json!(false))
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(state_dir);
}

#[test]
fn logout_removes_the_saved_token() {
    let (base_url, _hits) = auth_server();
    let state_dir = temp_dir("presenced-persist-logout");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "server.select",
        json!({ "baseUrl": base_url, "stateDir": state_dir.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "email": "ari@example.sch.id", "password": "secret" }),
    );
    let session_file = state_dir.join("session.json");
    assert!(session_file.is_file());

    let done = request(&mut stdin, &mut reader, "3", "auth.logout", json!({}));
    assert_eq!(done.pointer("/result/loggedOut"), Some(&json!(true)));
    assert!(!session_file.exists());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(state_dir);
}
