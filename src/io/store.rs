//! Append-only JSONL record logs with metadata sidecars.
//!
//! Each dataset is one log of self-delimited records, one JSON object per
//! line. Appends are whole-line writes, so a crash mid-append leaves at
//! most one trailing malformed line, which scans silently drop. There is
//! no cross-log transactionality: re-indexing is "clear snippets, rewrite
//! all, then clear clusters, write all", and callers accept that.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::core::errors::{RefrainError, Result};
use crate::core::records::{Cluster, Pattern, Snippet};

/// The three record logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    /// Extracted snippet records
    Snippets,
    /// Cluster records
    Clusters,
    /// Mined pattern records
    Patterns,
}

impl Dataset {
    /// Directory and file name of the dataset's log.
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Snippets => "snippets",
            Dataset::Clusters => "clusters",
            Dataset::Patterns => "patterns",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Records that expose their identifier for point lookups.
pub trait Identified {
    /// The record's opaque id.
    fn record_id(&self) -> &str;
}

impl Identified for Snippet {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Identified for Cluster {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Identified for Pattern {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Append-only store rooted at a data directory.
///
/// Layout:
///
/// ```text
/// <root>/snippets/snippets.jsonl
/// <root>/clusters/clusters.jsonl
/// <root>/patterns/patterns.jsonl
/// <root>/metadata/<key>.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonlStore {
    root: PathBuf,
}

impl JsonlStore {
    /// Open (creating if necessary) a store at the given root.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dataset in [Dataset::Snippets, Dataset::Clusters, Dataset::Patterns] {
            let dir = root.join(dataset.name());
            fs::create_dir_all(&dir).map_err(|e| {
                RefrainError::io(format!("Failed to create dataset dir {}", dir.display()), e)
            })?;
        }
        let metadata = root.join("metadata");
        fs::create_dir_all(&metadata).map_err(|e| {
            RefrainError::io(
                format!("Failed to create metadata dir {}", metadata.display()),
                e,
            )
        })?;

        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a dataset's log file.
    pub fn log_path(&self, dataset: Dataset) -> PathBuf {
        self.root
            .join(dataset.name())
            .join(format!("{}.jsonl", dataset.name()))
    }

    /// Append one record to the tail of a log.
    ///
    /// The append unit is one complete LF-terminated line; there is no
    /// uniqueness check.
    pub fn append<T: Serialize>(&self, dataset: Dataset, record: &T) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let path = self.log_path(dataset);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                RefrainError::storage_io(dataset.name(), "failed to open log for append", e)
            })?;

        // A crash can leave a torn, newline-less tail; start a fresh line
        // so the torn record is the only one a scan drops.
        if log_has_torn_tail(&mut file)
            .map_err(|e| RefrainError::storage_io(dataset.name(), "append failed", e))?
        {
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| RefrainError::storage_io(dataset.name(), "append failed", e))?;

        Ok(())
    }

    /// Lazily scan a log's records in insertion order.
    ///
    /// Malformed lines are logged and skipped; scans never abort on decode
    /// failures. A missing log scans as empty.
    pub fn scan<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<ScanIter<T>> {
        let path = self.log_path(dataset);
        let lines = match File::open(&path) {
            Ok(file) => Some(BufReader::new(file).lines()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(RefrainError::storage_io(
                    dataset.name(),
                    "failed to open log for scan",
                    e,
                ))
            }
        };

        Ok(ScanIter {
            lines,
            dataset,
            line_no: 0,
            _marker: PhantomData,
        })
    }

    /// Scan a log fully into memory.
    pub fn scan_all<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<Vec<T>> {
        Ok(self.scan(dataset)?.collect())
    }

    /// Count decodable records in a log.
    pub fn record_count(&self, dataset: Dataset) -> Result<usize> {
        Ok(self.scan::<serde_json::Value>(dataset)?.count())
    }

    /// Truncate a log, discarding all records.
    pub fn clear(&self, dataset: Dataset) -> Result<()> {
        let path = self.log_path(dataset);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RefrainError::storage_io(
                dataset.name(),
                "failed to truncate log",
                e,
            )),
        }
    }

    /// Linear-scan lookup of a record by id, with early exit.
    ///
    /// Acceptable because the pipeline stages stream whole logs; only the
    /// view layer point-looks-up.
    pub fn get_by_id<T: DeserializeOwned + Identified>(
        &self,
        dataset: Dataset,
        id: &str,
    ) -> Result<Option<T>> {
        Ok(self.scan::<T>(dataset)?.find(|r| r.record_id() == id))
    }

    /// Replace a metadata sidecar wholesale.
    pub fn write_sidecar<T: Serialize>(&self, key: &str, blob: &T) -> Result<()> {
        let path = self.sidecar_path(key);
        let json = serde_json::to_vec_pretty(blob)?;
        fs::write(&path, json)
            .map_err(|e| RefrainError::io(format!("Failed to write sidecar '{key}'"), e))
    }

    /// Read a metadata sidecar; absent sidecars read as `None`.
    pub fn read_sidecar<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.sidecar_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RefrainError::io(
                    format!("Failed to read sidecar '{key}'"),
                    e,
                ))
            }
        };

        let blob = serde_json::from_str(&content)
            .map_err(|e| RefrainError::decode("metadata", format!("sidecar '{key}': {e}")))?;
        Ok(Some(blob))
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.root.join("metadata").join(format!("{key}.json"))
    }
}

/// Whether a log file ends without a newline (a torn tail).
fn log_has_torn_tail(file: &mut File) -> std::io::Result<bool> {
    use std::io::{Read, Seek, SeekFrom};

    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Lazy, restartable scan over one dataset's records.
pub struct ScanIter<T> {
    lines: Option<Lines<BufReader<File>>>,
    dataset: Dataset,
    line_no: usize,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Iterator for ScanIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let lines = self.lines.as_mut()?;

        loop {
            self.line_no += 1;
            let line = match lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!(
                        dataset = self.dataset.name(),
                        line = self.line_no,
                        "read error during scan, stopping: {e}"
                    );
                    return None;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => return Some(record),
                Err(e) => {
                    warn!(
                        dataset = self.dataset.name(),
                        line = self.line_no,
                        "skipping malformed record: {e}"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::Snippet;
    use crate::lang::registry::Language;
    use tempfile::TempDir;

    fn snippet(content: &str) -> Snippet {
        Snippet::new(
            content.to_string(),
            Language::Rust,
            "lib.rs".to_string(),
            1,
            3,
        )
    }

    #[test]
    fn append_then_scan_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        let record = snippet("fn alpha() {}");
        store.append(Dataset::Snippets, &record).unwrap();

        let scanned: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0], record);
    }

    #[test]
    fn scan_preserves_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        for i in 0..5 {
            store
                .append(Dataset::Snippets, &snippet(&format!("fn f{i}() {{}}")))
                .unwrap();
        }

        let scanned: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
        let contents: Vec<&str> = scanned.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "fn f0() {}",
                "fn f1() {}",
                "fn f2() {}",
                "fn f3() {}",
                "fn f4() {}"
            ]
        );
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        store.append(Dataset::Snippets, &snippet("fn a() {}")).unwrap();

        // Simulate a crash mid-append: a trailing malformed line.
        let path = store.log_path(Dataset::Snippets);
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(b"{\"id\": \"truncat").unwrap();
        drop(file);

        store.append(Dataset::Snippets, &snippet("fn b() {}")).unwrap();

        let scanned: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
        let contents: Vec<&str> = scanned.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["fn a() {}", "fn b() {}"]);
    }

    #[test]
    fn missing_log_scans_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();
        assert_eq!(store.record_count(Dataset::Clusters).unwrap(), 0);
    }

    #[test]
    fn clear_truncates_the_log() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        store.append(Dataset::Patterns, &snippet("fn x() {}")).unwrap();
        store.clear(Dataset::Patterns).unwrap();
        assert_eq!(store.record_count(Dataset::Patterns).unwrap(), 0);

        // Clearing an already-empty log is fine.
        store.clear(Dataset::Patterns).unwrap();
    }

    #[test]
    fn get_by_id_finds_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        let a = snippet("fn a() {}");
        let b = snippet("fn b() {}");
        store.append(Dataset::Snippets, &a).unwrap();
        store.append(Dataset::Snippets, &b).unwrap();

        let found: Option<Snippet> = store.get_by_id(Dataset::Snippets, &b.id).unwrap();
        assert_eq!(found.unwrap().content, "fn b() {}");

        let missing: Option<Snippet> = store.get_by_id(Dataset::Snippets, "nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn sidecar_roundtrip_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        store
            .write_sidecar("config", &serde_json::json!({"bands": 20}))
            .unwrap();
        store
            .write_sidecar("config", &serde_json::json!({"bands": 10}))
            .unwrap();

        let read: Option<serde_json::Value> = store.read_sidecar("config").unwrap();
        assert_eq!(read.unwrap()["bands"], 10);

        let absent: Option<serde_json::Value> = store.read_sidecar("missing").unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn append_after_torn_tail_starts_fresh_line() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();

        let path = store.log_path(Dataset::Snippets);
        fs::write(&path, "{\"torn").unwrap();

        store.append(Dataset::Snippets, &snippet("fn a() {}")).unwrap();
        store.append(Dataset::Snippets, &snippet("fn b() {}")).unwrap();

        // Only the torn line is lost; both appended records survive.
        let scanned: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
        let contents: Vec<&str> = scanned.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["fn a() {}", "fn b() {}"]);
    }
}
