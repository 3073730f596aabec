use crate::gate::{self, GateDecision, GateStep};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn decision_json(decision: GateDecision, stimulus_checked: bool) -> serde_json::Value {
    let outcome = match decision {
        GateDecision::Wait => "wait",
        GateDecision::Allow => "allow",
        GateDecision::RedirectToLogin
        | GateDecision::RedirectToSelfContract
        | GateDecision::RedirectToStimulusControl => "redirect",
    };
    let mut result = json!({
        "outcome": outcome,
        "stimulusChecked": stimulus_checked,
    });
    if let Some(target) = decision.redirect_target() {
        result["redirectTo"] = json!(target);
    }
    result
}

fn handle_gate_evaluate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(client) = state.server.as_ref() else {
        return err(&req.id, "no_server", "select a server first", None);
    };
    let path = match req.params.get("path").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing path", None),
    };

    match gate::preflight(state.session.identity(), &path) {
        GateStep::Decided(decision) => ok(&req.id, decision_json(decision, false)),
        GateStep::CheckStimulusControl { student_id } => {
            // Re-issued on every qualifying evaluation; nothing is cached
            // across navigations.
            let outcome = client
                .stimulus_records(state.session.token())
                .map(|records| records.iter().any(|r| r.student_id == student_id));
            let decision = gate::resolve_stimulus_check(outcome);
            ok(&req.id, decision_json(decision, true))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gate.evaluate" => Some(handle_gate_evaluate(state, req)),
        _ => None,
    }
}
