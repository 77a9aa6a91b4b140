//! Per-record import: load a fixture array, normalize identifiers, and write every record
//! with an existence check first.

use super::bson_helper::{json_to_bson, normalize_ids};
use super::progress::Progress;
use crate::blocking::Interrupt;
use crate::error::{FixtureError, Result};
use crate::ID_KEY;
use bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::sync::Collection;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::warn;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Minimal document store used by the importers, keyed by `_id`.
pub trait RecordStore {
    /// does a document with `id` exist?
    fn exists(&self, id: &Bson) -> Result<bool>;
    /// insert a new document.
    fn insert(&self, doc: &Document) -> Result<()>;
    /// replace document `id`, returns true when the stored document changed.
    fn replace(&self, id: &Bson, doc: &Document) -> Result<bool>;
}

impl RecordStore for Collection<Document> {
    fn exists(&self, id: &Bson) -> Result<bool> {
        Ok(self.find_one(doc! {ID_KEY: id.clone()}, None)?.is_some())
    }

    fn insert(&self, doc: &Document) -> Result<()> {
        self.insert_one(doc, None)?;
        Ok(())
    }

    fn replace(&self, id: &Bson, doc: &Document) -> Result<bool> {
        let res = self.replace_one(doc! {ID_KEY: id.clone()}, doc, None)?;
        Ok(res.modified_count > 0)
    }
}

/// What happened to one fixture record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// new document written.
    Inserted,
    /// existing document overwritten under force-update.
    Replaced,
    /// force-update found an identical document.
    Unchanged,
    /// existing document kept.
    Exists,
    /// rejected by a unique index.
    Duplicate,
    /// any other per-record failure.
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordStatus::Inserted => "inserted",
            RecordStatus::Replaced => "replaced",
            RecordStatus::Unchanged => "unchanged",
            RecordStatus::Exists => "already exists",
            RecordStatus::Duplicate => "duplicate",
            RecordStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Counters of one import batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// records in the fixture.
    pub total: usize,
    /// newly inserted.
    pub inserted: usize,
    /// overwritten with changes.
    pub replaced: usize,
    /// overwritten without changes.
    pub unchanged: usize,
    /// skipped because they exist.
    pub existing: usize,
    /// duplicate key or other failures.
    pub failed: usize,
}

impl ImportStats {
    fn record(&mut self, status: RecordStatus) {
        match status {
            RecordStatus::Inserted => self.inserted += 1,
            RecordStatus::Replaced => self.replaced += 1,
            RecordStatus::Unchanged => self.unchanged += 1,
            RecordStatus::Exists => self.existing += 1,
            RecordStatus::Duplicate | RecordStatus::Failed => self.failed += 1,
        }
    }

    /// records written to the store.
    pub fn written(&self) -> usize {
        self.inserted + self.replaced
    }

    /// no record failed?
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Read fixture `path`, which must hold a json array.
///
/// A missing file, unparsable json or a non-array top level is fatal.
pub fn load_fixture(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Err(FixtureError::MissingFixture {
            path: path.to_path_buf(),
        });
    }
    let data = std::fs::read_to_string(path).map_err(|source| FixtureError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&data).map_err(|source| FixtureError::JsonError {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(FixtureError::NotAnArray {
            path: path.to_path_buf(),
        }),
    }
}

/// Write `value` to `path` as pretty-printed json.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|source| FixtureError::JsonError {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| FixtureError::IoError {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert one fixture record to a normalized document.
///
/// Returns None when the record isn't a json object.
pub fn to_document(record: Value) -> Option<Document> {
    match normalize_ids(json_to_bson(record)) {
        Bson::Document(doc) => Some(doc),
        _ => None,
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Errors caused by the record itself.  Anything else (server selection, network, pool
/// cleared, auth...) leaves the server unusable for the remaining records.
fn is_record_error(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(_) | ErrorKind::InvalidArgument { .. }
    )
}

/// Is the server unreachable?
pub(crate) fn is_server_unavailable(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
    )
}

/// Write one document, skipping or replacing an existing one.
pub fn write_record<S: RecordStore + ?Sized>(
    store: &S,
    doc: &Document,
    force_update: bool,
) -> Result<RecordStatus> {
    let id = match doc.get(ID_KEY) {
        Some(id) => id,
        None => {
            warn!(?doc, "Record has no `_id` field, skipped.");
            return Ok(RecordStatus::Failed);
        }
    };
    if store.exists(id)? {
        if !force_update {
            return Ok(RecordStatus::Exists);
        }
        return Ok(if store.replace(id, doc)? {
            RecordStatus::Replaced
        } else {
            RecordStatus::Unchanged
        });
    }
    store.insert(doc)?;
    Ok(RecordStatus::Inserted)
}

/// Import `records` into `store` one by one.
///
/// Per-record failures are logged and counted, they never stop the batch.  An operator
/// interrupt or a mongo error unrelated to the record (server gone, timeout) aborts it,
/// records written before stay written.
pub fn import_records<S: RecordStore + ?Sized>(
    store: &S,
    label: &str,
    records: Vec<Value>,
    force_update: bool,
    interrupt: &Interrupt,
) -> Result<ImportStats> {
    let mut stats = ImportStats {
        total: records.len(),
        ..ImportStats::default()
    };
    let mut progress = Progress::new(label, records.len());
    for (idx, record) in records.into_iter().enumerate() {
        interrupt.check()?;
        let status = match to_document(record) {
            None => {
                warn!(label, idx, "Record is not a json object, skipped.");
                RecordStatus::Failed
            }
            Some(doc) => match write_record(store, &doc, force_update) {
                Ok(status) => status,
                Err(FixtureError::MongoError(e)) if is_duplicate_key(&e) => {
                    warn!(label, idx, id = ?doc.get(ID_KEY), "Duplicate key, skipped.");
                    RecordStatus::Duplicate
                }
                Err(FixtureError::MongoError(e)) if !is_record_error(&e) => {
                    return Err(FixtureError::MongoError(e));
                }
                Err(e) => {
                    warn!(label, idx, id = ?doc.get(ID_KEY), ?e, "Import record failed.");
                    RecordStatus::Failed
                }
            },
        };
        stats.record(status);
        progress.tick(status);
    }
    Ok(stats)
}
