use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::roster::upsert_score_in_memory;
use crate::store::{Store, Student};

/// Per-import outcome counts. A line is in `total` once it is non-blank;
/// `skipped` covers both malformed lines and unknown student ids.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub total: usize,
    pub applied: usize,
    pub skipped: usize,
}

/// Header tokens accepted in the id column of a CSV import file.
const ID_HEADER_TOKENS: [&str; 2] = ["id", "学号"];

/// Imports score assignments (`id, course, credit, score` per line) from a
/// delimited text file. `.csv` files are parsed with quote escaping; any
/// other extension is treated as whitespace-delimited.
///
/// The collection is loaded once, mutated in memory, and saved once at the
/// end, so a failure while reading the source leaves the persisted state
/// untouched. Bad lines never abort the run; they are counted in `skipped`.
pub fn import_scores(store: &Store, source: &Path) -> Result<ImportSummary> {
    let text = std::fs::read_to_string(source).map_err(|e| Error::StorageUnavailable {
        path: source.to_path_buf(),
        source: e,
    })?;

    let is_csv = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let mut students = store.load()?;
    let summary = if is_csv {
        apply_csv(&mut students, &text)
    } else {
        apply_whitespace(&mut students, &text)
    };
    store.save(&students)?;

    tracing::info!(
        source = %source.display(),
        total = summary.total,
        applied = summary.applied,
        skipped = summary.skipped,
        "score import finished"
    );
    Ok(summary)
}

fn apply_csv(students: &mut [Student], text: &str) -> ImportSummary {
    let mut summary = ImportSummary {
        total: 0,
        applied: 0,
        skipped: 0,
    };

    let mut first_record = true;
    for record in split_csv_records(text) {
        if record.is_empty() {
            continue;
        }
        if first_record {
            first_record = false;
            let head = record[0].trim().to_lowercase();
            if ID_HEADER_TOKENS.contains(&head.as_str()) {
                continue;
            }
        }
        summary.total += 1;
        apply_fields(students, &record, &mut summary);
    }
    summary
}

fn apply_whitespace(students: &mut [Student], text: &str) -> ImportSummary {
    let mut summary = ImportSummary {
        total: 0,
        applied: 0,
        skipped: 0,
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        summary.total += 1;
        let fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        apply_fields(students, &fields, &mut summary);
    }
    summary
}

fn apply_fields(students: &mut [Student], fields: &[String], summary: &mut ImportSummary) {
    if fields.len() < 4 {
        summary.skipped += 1;
        return;
    }
    let (Ok(credit), Ok(score)) = (
        fields[2].trim().parse::<f64>(),
        fields[3].trim().parse::<f64>(),
    ) else {
        summary.skipped += 1;
        return;
    };

    if upsert_score_in_memory(students, &fields[0], &fields[1], credit, score) {
        summary.applied += 1;
    } else {
        summary.skipped += 1;
    }
}

/// Splits a whole CSV document into records of unquoted fields. Doubled
/// quotes escape a quote inside a quoted field; commas and newlines inside
/// quotes belong to the field, so a record may span source lines. Records
/// produced from blank lines come back empty.
fn split_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut record_started = false;

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            record_started = true;
            i += 1;
            continue;
        }
        if ch == ',' && !in_quotes {
            fields.push(std::mem::take(&mut buf));
            record_started = true;
            i += 1;
            continue;
        }
        if (ch == '\n' || ch == '\r') && !in_quotes {
            if ch == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n' {
                i += 1;
            }
            if record_started {
                fields.push(std::mem::take(&mut buf));
                records.push(std::mem::take(&mut fields));
            }
            record_started = false;
            i += 1;
            continue;
        }
        buf.push(ch);
        record_started = true;
        i += 1;
    }
    if record_started {
        fields.push(buf);
        records.push(fields);
    }
    records
}
