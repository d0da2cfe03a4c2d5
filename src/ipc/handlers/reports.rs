use serde_json::json;

use crate::calc;
use crate::ipc::error::{core_err, ok};
use crate::ipc::handlers::require_store;
use crate::ipc::types::{AppState, Request};

fn handle_rank(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match store.load() {
        Ok(students) => ok(&req.id, json!({ "rank": calc::rank(&students) })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rank.list" => Some(handle_rank(state, req)),
        _ => None,
    }
}
