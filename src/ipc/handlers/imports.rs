use std::path::PathBuf;

use serde_json::json;

use crate::import::import_scores;
use crate::ipc::error::{core_err, err, ok};
use crate::ipc::handlers::require_store;
use crate::ipc::types::{AppState, Request};

fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(path) = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
    else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match import_scores(store, &path) {
        Ok(summary) => ok(&req.id, json!(summary)),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scores.import" => Some(handle_import(state, req)),
        _ => None,
    }
}
