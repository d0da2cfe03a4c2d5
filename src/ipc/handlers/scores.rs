use serde_json::json;

use crate::ipc::error::{core_err, err, ok};
use crate::ipc::handlers::require_store;
use crate::ipc::types::{AppState, Request};
use crate::roster;

fn handle_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };
    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.name", None);
    };
    let Some(credit) = req.params.get("credit").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "missing numeric params.credit", None);
    };
    let Some(score) = req.params.get("score").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "missing numeric params.score", None);
    };

    let mut students = match store.load() {
        Ok(s) => s,
        Err(e) => return core_err(&req.id, &e),
    };
    if let Err(e) = roster::upsert_score(&mut students, id, name, credit, score) {
        return core_err(&req.id, &e);
    }
    match store.save(&students) {
        Ok(()) => ok(&req.id, json!({})),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scores.upsert" => Some(handle_upsert(state, req)),
        _ => None,
    }
}
