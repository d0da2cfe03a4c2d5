use serde_json::json;

use crate::calc::gpa;
use crate::ipc::error::{core_err, err, ok};
use crate::ipc::handlers::require_store;
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, StudentInput, StudentPatch};

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students = match store.load() {
        Ok(s) => s,
        Err(e) => return core_err(&req.id, &e),
    };

    // Each record is returned with its derived GPA attached.
    let out: Vec<serde_json::Value> = students
        .iter()
        .map(|s| {
            let mut v = json!(s);
            v["gpa"] = json!(gpa(&s.courses));
            v
        })
        .collect();
    ok(&req.id, json!({ "students": out }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("student") else {
        return err(&req.id, "bad_params", "missing params.student", None);
    };
    let input: StudentInput = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    let mut students = match store.load() {
        Ok(s) => s,
        Err(e) => return core_err(&req.id, &e),
    };
    if let Err(e) = roster::create(&mut students, input) {
        return core_err(&req.id, &e);
    }
    match store.save(&students) {
        Ok(()) => ok(&req.id, json!({})),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };
    let patch: StudentPatch = match req.params.get("fields") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        },
        None => StudentPatch::default(),
    };

    let mut students = match store.load() {
        Ok(s) => s,
        Err(e) => return core_err(&req.id, &e),
    };
    if let Err(e) = roster::apply_update(&mut students, id, patch) {
        return core_err(&req.id, &e);
    }
    match store.save(&students) {
        Ok(()) => ok(&req.id, json!({})),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };

    let mut students = match store.load() {
        Ok(s) => s,
        Err(e) => return core_err(&req.id, &e),
    };
    if let Err(e) = roster::remove(&mut students, id) {
        return core_err(&req.id, &e);
    }
    match store.save(&students) {
        Ok(()) => ok(&req.id, json!({})),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.create" => Some(handle_create(state, req)),
        "students.update" => Some(handle_update(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
