use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{Store, Student};

/// Column labels for the students sheet, in export order. The label text
/// matches the legacy desktop exports so existing spreadsheets line up.
pub const STUDENT_LABELS: [&str; 10] = [
    "学号",
    "姓名",
    "性别",
    "年龄",
    "学院",
    "班级",
    "政治面貌",
    "电话",
    "生源省份",
    "家长电话",
];

pub const SCORE_LABELS: [&str; 4] = ["id", "course", "credit", "score"];

/// One ledger row in `exports/exports.json`. `mtime` is the artifact's
/// last-known modification time in unix seconds and may be null when the
/// file was removed externally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportEntry {
    pub name: String,
    pub mtime: Option<i64>,
    pub saved_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub name: String,
    /// Whether a ledger entry was written. Destinations outside the managed
    /// export directory are never recorded.
    pub recorded: bool,
}

/// Writes the students sheet as CSV and, when the destination lands in the
/// managed export directory, records it in the ledger. A ledger failure is
/// logged and does not undo the already-written artifact.
pub fn export_students(store: &Store, dest: Option<&Path>) -> Result<ExportOutcome> {
    let students = store.load()?;
    let rows: Vec<Vec<String>> = students.iter().map(student_row).collect();
    write_export(store, dest, "students", &STUDENT_LABELS, &rows)
}

/// Writes one row per (student, course) with the raw score fields.
pub fn export_scores(store: &Store, dest: Option<&Path>) -> Result<ExportOutcome> {
    let students = store.load()?;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for s in &students {
        for c in &s.courses {
            rows.push(vec![
                s.id.clone(),
                c.name.clone(),
                c.credit.to_string(),
                c.score.to_string(),
            ]);
        }
    }
    write_export(store, dest, "scores", &SCORE_LABELS, &rows)
}

fn write_export(
    store: &Store,
    dest: Option<&Path>,
    kind: &str,
    labels: &[&str],
    rows: &[Vec<String>],
) -> Result<ExportOutcome> {
    let path = match dest {
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| Error::StorageUnavailable {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            p.to_path_buf()
        }
        None => {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            store.export_dir().join(format!("{kind}_{stamp}.csv"))
        }
    };

    let bytes = csv_bytes(labels, rows);
    std::fs::write(&path, bytes).map_err(|source| Error::StorageUnavailable {
        path: path.clone(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut recorded = false;
    if in_export_dir(store, &path) {
        match record_export(store, &name) {
            Ok(()) => recorded = true,
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "export written but ledger update failed");
            }
        }
    }

    Ok(ExportOutcome {
        path,
        name,
        recorded,
    })
}

fn in_export_dir(store: &Store, path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    match (parent.canonicalize(), store.export_dir().canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// UTF-8 CSV with a leading byte-order mark so spreadsheet tools pick the
/// right encoding; rows joined with `\n`, no trailing newline.
fn csv_bytes(labels: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut lines: Vec<String> = Vec::with_capacity(rows.len() + 1);
    lines.push(
        labels
            .iter()
            .map(|l| csv_quote(l))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            row.iter()
                .map(|f| csv_quote(f))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    format!("\u{feff}{}", lines.join("\n")).into_bytes()
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn student_row(s: &Student) -> Vec<String> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        s.id.clone(),
        opt(&s.name),
        opt(&s.gender),
        s.age.map(|a| a.to_string()).unwrap_or_default(),
        opt(&s.college),
        opt(&s.classnum),
        opt(&s.plcstatus),
        opt(&s.phone),
        opt(&s.province),
        opt(&s.parphone),
    ]
}

/// Appends a ledger entry for an artifact in the managed export directory.
pub fn record_export(store: &Store, name: &str) -> Result<()> {
    let mut entries: Vec<ExportEntry> = crate::store::read_json_array(store.ledger_file())?;
    entries.push(ExportEntry {
        name: name.to_string(),
        mtime: file_mtime(&store.export_dir().join(name)),
        saved_time: chrono::Utc::now().timestamp(),
    });
    crate::store::write_json_array(store.ledger_file(), &entries)
}

/// Ledger entries, newest first. For artifacts still on disk the live
/// modification time replaces the stored one; entries whose files were
/// removed externally keep their stored value and stay listed.
pub fn list_exports(store: &Store) -> Result<Vec<ExportEntry>> {
    let mut entries: Vec<ExportEntry> = crate::store::read_json_array(store.ledger_file())?;
    entries.sort_by(|a, b| b.saved_time.cmp(&a.saved_time));
    for e in &mut entries {
        if let Some(live) = file_mtime(&store.export_dir().join(&e.name)) {
            e.mtime = Some(live);
        }
    }
    Ok(entries)
}

/// Drops the ledger entry with the given name. The artifact file itself is
/// never touched; this is how an export is hidden from history without
/// deleting it.
pub fn forget_export(store: &Store, name: &str) -> Result<()> {
    let mut entries: Vec<ExportEntry> = crate::store::read_json_array(store.ledger_file())?;
    let before = entries.len();
    entries.retain(|e| e.name != name);
    if entries.len() == before {
        return Err(Error::NotFound {
            what: "export entry",
            key: name.to_string(),
        });
    }
    crate::store::write_json_array(store.ledger_file(), &entries)
}

fn file_mtime(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(secs as i64)
}
