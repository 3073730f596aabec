use crate::ipc::error::{err, ok, remote_err};
use crate::ipc::types::{AppState, Request};

fn handle_attendance_trend(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let period = req
        .params
        .get("period")
        .and_then(|v| v.as_str())
        .unwrap_or("month")
        .to_string();
    let limit = req
        .params
        .get("limit")
        .and_then(|v| v.as_i64())
        .unwrap_or(6);
    let pairs = vec![
        ("period".to_string(), period),
        ("limit".to_string(), limit.to_string()),
    ];
    match client.get_json_query("/charts/attendance-trend", state.session.token(), &pairs) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_class_performance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    match client.get_json("/charts/class-performance", state.session.token()) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

fn handle_dashboard_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    match client.get_json("/dashboard/stats", state.session.token()) {
        Ok(body) => ok(&req.id, body),
        Err(e) => remote_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "charts.attendanceTrend" => Some(handle_attendance_trend(state, req)),
        "charts.classPerformance" => Some(handle_class_performance(state, req)),
        "dashboard.stats" => Some(handle_dashboard_stats(state, req)),
        _ => None,
    }
}
