use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One course score owned by a student. `credit` and `score` default to
/// zero when absent in older data files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub name: String,
    #[serde(default)]
    pub credit: f64,
    #[serde(default)]
    pub score: f64,
}

/// A student record as persisted in `data/students.json`. The id is the
/// unique key of the collection; everything else is free-form profile data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classnum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plcstatus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parphone: Option<String>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// File-backed store for one workspace. All paths derive from the injected
/// root; there is no ambient global state.
pub struct Store {
    data_file: PathBuf,
    export_dir: PathBuf,
    ledger_file: PathBuf,
}

impl Store {
    /// Opens (and on first use initializes) the workspace layout:
    /// `data/students.json` and `exports/exports.json`, both seeded with an
    /// empty JSON array. Re-opening an initialized workspace is a no-op.
    pub fn open(root: &Path) -> Result<Store> {
        let data_dir = root.join("data");
        let export_dir = root.join("exports");
        let store = Store {
            data_file: data_dir.join("students.json"),
            export_dir: export_dir.clone(),
            ledger_file: export_dir.join("exports.json"),
        };

        create_dir_all(&data_dir)?;
        create_dir_all(&export_dir)?;
        seed_json_array(&store.data_file)?;
        seed_json_array(&store.ledger_file)?;

        Ok(store)
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn ledger_file(&self) -> &Path {
        &self.ledger_file
    }

    /// Reads the full collection. A missing file is not recoverable here
    /// (open() seeds it); unparsable content is fatal to the operation.
    pub fn load(&self) -> Result<Vec<Student>> {
        read_json_array(&self.data_file)
    }

    /// Replaces the full collection on disk. The write goes to a temp file
    /// in the same directory and is renamed over the target, so readers
    /// never observe a partially written document.
    pub fn save(&self, students: &[Student]) -> Result<()> {
        write_json_array(&self.data_file, students)
    }
}

fn create_dir_all(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::StorageUnavailable {
        path: dir.to_path_buf(),
        source,
    })
}

fn seed_json_array(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    tracing::info!(path = %path.display(), "initializing empty store file");
    atomic_write(path, b"[]")
}

pub(crate) fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).map_err(|source| Error::StorageUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::CorruptData {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let text = serde_json::to_string_pretty(items).map_err(|source| Error::CorruptData {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, text.as_bytes())
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let unavailable = |source: std::io::Error| Error::StorageUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".writing");
    let tmp = PathBuf::from(tmp);

    let mut f = fs::File::create(&tmp).map_err(unavailable)?;
    f.write_all(bytes).map_err(unavailable)?;
    f.flush().map_err(unavailable)?;
    drop(f);
    fs::rename(&tmp, path).map_err(unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_students() -> Vec<Student> {
        vec![
            Student {
                id: "S1".to_string(),
                name: Some("Alice".to_string()),
                gender: None,
                age: Some(20),
                college: Some("Engineering".to_string()),
                classnum: None,
                plcstatus: None,
                phone: None,
                province: None,
                parphone: None,
                courses: vec![Course {
                    name: "Math".to_string(),
                    credit: 3.0,
                    score: 90.0,
                }],
            },
            Student {
                id: "S2".to_string(),
                name: Some("Bob".to_string()),
                gender: None,
                age: None,
                college: None,
                classnum: None,
                plcstatus: None,
                phone: None,
                province: None,
                parphone: None,
                courses: vec![],
            },
        ]
    }

    #[test]
    fn open_seeds_empty_arrays_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path()).expect("open");
        assert!(store.load().expect("load").is_empty());
        assert_eq!(
            std::fs::read_to_string(store.ledger_file()).expect("read ledger"),
            "[]"
        );

        // Second open must not clobber existing data.
        store.save(&sample_students()).expect("save");
        let reopened = Store::open(dir.path()).expect("reopen");
        assert_eq!(reopened.load().expect("load").len(), 2);
    }

    #[test]
    fn save_load_roundtrip_is_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path()).expect("open");
        store.save(&sample_students()).expect("save");

        let first = std::fs::read(store.data_file()).expect("read");
        let loaded = store.load().expect("load");
        store.save(&loaded).expect("save again");
        let second = std::fs::read(store.data_file()).expect("read again");
        assert_eq!(first, second);
    }

    #[test]
    fn load_rejects_corrupt_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path()).expect("open");
        std::fs::write(store.data_file(), "{not json").expect("write");
        let err = store.load().expect_err("corrupt load must fail");
        assert_eq!(err.code(), "corrupt_data");
    }

    #[test]
    fn missing_course_fields_read_as_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path()).expect("open");
        std::fs::write(
            store.data_file(),
            r#"[{"id": "S1", "courses": [{"name": "Art"}]}]"#,
        )
        .expect("write");
        let students = store.load().expect("load");
        assert_eq!(students[0].courses[0].credit, 0.0);
        assert_eq!(students[0].courses[0].score, 0.0);
    }
}
