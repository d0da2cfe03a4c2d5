use std::path::PathBuf;

use serde_json::json;

use crate::exports::{self, ExportOutcome};
use crate::ipc::error::{core_err, err, ok};
use crate::ipc::handlers::require_store;
use crate::ipc::types::{AppState, Request};

fn dest_path(req: &Request) -> Option<PathBuf> {
    req.params
        .get("destPath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

fn outcome_response(id: &str, outcome: ExportOutcome) -> serde_json::Value {
    ok(
        id,
        json!({
            "path": outcome.path.to_string_lossy(),
            "name": outcome.name,
            "recorded": outcome.recorded,
        }),
    )
}

fn handle_export_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match exports::export_students(store, dest_path(req).as_deref()) {
        Ok(outcome) => outcome_response(&req.id, outcome),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_export_scores(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match exports::export_scores(store, dest_path(req).as_deref()) {
        Ok(outcome) => outcome_response(&req.id, outcome),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match exports::list_exports(store) {
        Ok(entries) => ok(&req.id, json!({ "files": entries })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_forget(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.name", None);
    };
    match exports::forget_export(store, name) {
        Ok(()) => ok(&req.id, json!({})),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exports.students" => Some(handle_export_students(state, req)),
        "exports.scores" => Some(handle_export_scores(state, req)),
        "exports.list" => Some(handle_list(state, req)),
        "exports.forget" => Some(handle_forget(state, req)),
        _ => None,
    }
}
