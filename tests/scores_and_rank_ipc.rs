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
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
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
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn create_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    sid: &str,
    name: &str,
) {
    request_ok(
        stdin,
        reader,
        id,
        "students.create",
        json!({ "student": { "id": sid, "name": name } }),
    );
}

#[test]
fn upsert_twice_then_rank_orders_by_gpa() {
    let workspace = temp_dir("rosterd-rank");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    create_student(&mut stdin, &mut reader, "2", "S1", "Alice");
    create_student(&mut stdin, &mut reader, "3", "S2", "Bob");
    create_student(&mut stdin, &mut reader, "4", "S3", "Cara");

    // Second upsert for the same (id, course) overwrites in place.
    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "scores.upsert",
        json!({ "id": "S1", "name": "Math", "credit": 3.0, "score": 60.0 }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "scores.upsert",
        json!({ "id": "S1", "name": "Math", "credit": 3.0, "score": 70.0 }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "scores.upsert",
        json!({ "id": "S2", "name": "Math", "credit": 3.0, "score": 95.0 }),
    );

    let missing = request(
        &mut stdin,
        &mut reader,
        "8",
        "scores.upsert",
        json!({ "id": "S9", "name": "Math", "credit": 3.0, "score": 50.0 }),
    );
    assert_eq!(
        missing["error"]["code"].as_str(),
        Some("not_found"),
        "unknown id must be rejected"
    );

    let list = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({}));
    let students = list["students"].as_array().expect("students");
    let s1 = students
        .iter()
        .find(|s| s["id"] == "S1")
        .expect("S1 present");
    assert_eq!(s1["courses"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(s1["courses"][0]["score"].as_f64(), Some(70.0));
    assert_eq!(s1["gpa"].as_f64(), Some(70.0));

    // S2 (95) ahead of S1 (70); S3 has no GPA and ranks last.
    let rank = request_ok(&mut stdin, &mut reader, "10", "rank.list", json!({}));
    let entries = rank["rank"].as_array().expect("rank array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["id"].as_str(), Some("S2"));
    assert_eq!(entries[0]["rank"].as_u64(), Some(1));
    assert_eq!(entries[1]["id"].as_str(), Some("S1"));
    assert_eq!(entries[2]["id"].as_str(), Some("S3"));
    assert!(entries[2]["gpa"].is_null());
    assert_eq!(entries[2]["rank"].as_u64(), Some(3));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
