use super::bson_helper::document_to_json;
use super::progress::Progress;
use super::record::{is_server_unavailable, save_json};
use super::time_helper;
use crate::blocking::{Connection, Interrupt};
use crate::catalog::Dataset;
use crate::error::{FixtureError, Result};
use bson::Document;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// companion report written next to the exported files.
const REPORT_FILE: &str = "export_report.json";

/// Counters of one exported collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectionExport {
    /// documents in the collection.
    pub total: usize,
    /// documents written to the export file.
    pub exported: usize,
    /// documents (or whole collection) which failed.
    pub errors: usize,
}

impl CollectionExport {
    fn failed() -> Self {
        CollectionExport {
            total: 0,
            exported: 0,
            errors: 1,
        }
    }
}

/// Outcome of an export run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    output_dir: PathBuf,
    entries: Vec<(Dataset, CollectionExport)>,
}

impl ExportSummary {
    /// per dataset counters, in export order.
    pub fn entries(&self) -> &[(Dataset, CollectionExport)] {
        &self.entries
    }

    /// directory holding the exported files.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// documents written over all collections.
    pub fn total_exported(&self) -> usize {
        self.entries.iter().map(|(_, s)| s.exported).sum()
    }

    /// errors over all collections.
    pub fn total_errors(&self) -> usize {
        self.entries.iter().map(|(_, s)| s.errors).sum()
    }

    /// no error at all?
    pub fn is_success(&self) -> bool {
        self.total_errors() == 0
    }
}

/// One collection line of `export_report.json`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportEntry {
    collection_name: &'static str,
    description: &'static str,
    filename: &'static str,
    total_documents: usize,
    exported_documents: usize,
    errors: usize,
    success: bool,
}

/// Content of `export_report.json`.
#[derive(Debug, Serialize)]
pub struct ExportReport {
    export_time: String,
    database_name: String,
    connection_string: String,
    collections: BTreeMap<&'static str, ReportEntry>,
}

impl ExportReport {
    /// Build a report of `summary`, `connection_string` should already be redacted.
    pub fn new(
        export_time: String,
        database_name: &str,
        connection_string: &str,
        summary: &ExportSummary,
    ) -> Self {
        let collections = summary
            .entries()
            .iter()
            .map(|(dataset, stats)| {
                let entry = ReportEntry {
                    collection_name: dataset.collection(),
                    description: dataset.description(),
                    filename: dataset.export_file().unwrap_or_default(),
                    total_documents: stats.total,
                    exported_documents: stats.exported,
                    errors: stats.errors,
                    success: stats.errors == 0,
                };
                (dataset.collection(), entry)
            })
            .collect();
        ExportReport {
            export_time,
            database_name: database_name.to_string(),
            connection_string: connection_string.to_string(),
            collections,
        }
    }
}

/// Convert every document yielded by `cursor` to json.
///
/// A document the cursor fails to yield is counted as an error and skipped.
pub fn collect_documents<I, E>(
    cursor: I,
    label: &str,
    total: usize,
    interrupt: &Interrupt,
) -> Result<(Vec<Value>, CollectionExport)>
where
    I: IntoIterator<Item = std::result::Result<Document, E>>,
    E: Debug,
{
    let mut stats = CollectionExport {
        total,
        ..CollectionExport::default()
    };
    let mut documents = Vec::with_capacity(total);
    let mut progress = Progress::new(label, total);
    for doc in cursor {
        interrupt.check()?;
        match doc {
            Ok(doc) => {
                documents.push(Value::Object(document_to_json(doc)));
                stats.exported += 1;
                progress.tick("exported");
            }
            Err(e) => {
                warn!(label, ?e, "Convert document failed, skipped.");
                stats.errors += 1;
                progress.tick("failed");
            }
        }
    }
    Ok((documents, stats))
}

/// Dump collections to json files.
pub struct Exporter<'a> {
    conn: &'a Connection,
    interrupt: &'a Interrupt,
}

impl<'a> Exporter<'a> {
    /// create an exporter over `conn`.
    pub fn new(conn: &'a Connection, interrupt: &'a Interrupt) -> Self {
        Exporter { conn, interrupt }
    }

    /// Log the document count of every dataset's collection, None when counting failed.
    pub fn stats(&self, datasets: &[Dataset]) -> Vec<(Dataset, Option<u64>)> {
        info!("Database statistics:");
        datasets
            .iter()
            .map(|dataset| {
                let count = self
                    .conn
                    .coll(dataset.collection())
                    .count_documents(None, None);
                match count {
                    Ok(cnt) => {
                        info!(
                            collection = dataset.collection(),
                            description = dataset.description(),
                            count = cnt
                        );
                        (*dataset, Some(cnt))
                    }
                    Err(e) => {
                        warn!(collection = dataset.collection(), ?e, "Count documents failed.");
                        (*dataset, None)
                    }
                }
            })
            .collect()
    }

    /// Export one collection into `output_file`.
    ///
    /// An empty collection is exported as an empty array, so the file can be seeded back.
    pub fn export_collection(
        &self,
        dataset: Dataset,
        output_file: &Path,
    ) -> Result<CollectionExport> {
        let coll = self.conn.coll(dataset.collection());
        let total = coll.count_documents(None, None)? as usize;
        if total == 0 {
            warn!(collection = dataset.collection(), "Collection is empty.");
            save_json(output_file, &Vec::<Value>::new())?;
            return Ok(CollectionExport::default());
        }

        info!(
            collection = dataset.collection(),
            description = dataset.description(),
            total,
            file = %output_file.display(),
            "Begin to export collection."
        );
        let cursor = coll.find(None, None)?;
        let (documents, stats) =
            collect_documents(cursor, dataset.collection(), total, self.interrupt)?;
        save_json(output_file, &documents)?;

        info!(
            collection = dataset.collection(),
            total = stats.total,
            exported = stats.exported,
            errors = stats.errors,
            file = %output_file.display(),
            "Export collection complete."
        );
        Ok(stats)
    }

    /// Export every dataset in `datasets` into `output_dir`, then write the report.
    ///
    /// A failing collection is counted as one error and the next collection is exported;
    /// an operator interrupt, an unreachable server or an uncreatable output directory
    /// aborts the run.
    pub fn export_all(
        &self,
        output_dir: impl AsRef<Path>,
        datasets: &[Dataset],
    ) -> Result<ExportSummary> {
        let output_dir = output_dir.as_ref();
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).map_err(|source| FixtureError::IoError {
                path: output_dir.to_path_buf(),
                source,
            })?;
            info!(dir = %output_dir.display(), "Output directory created.");
        }
        info!(count = datasets.len(), "Planning to export collections.");

        let mut entries = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            let filename = match dataset.export_file() {
                Some(f) => f,
                None => {
                    warn!(%dataset, "Dataset shares its collection, nothing to export.");
                    continue;
                }
            };
            let stats = match self.export_collection(*dataset, &output_dir.join(filename)) {
                Ok(stats) => stats,
                Err(FixtureError::Interrupted) => return Err(FixtureError::Interrupted),
                Err(FixtureError::MongoError(e)) if is_server_unavailable(&e) => {
                    return Err(FixtureError::MongoError(e));
                }
                Err(e) => {
                    error!(collection = dataset.collection(), ?e, "Export collection failed.");
                    CollectionExport::failed()
                }
            };
            entries.push((*dataset, stats));
        }

        let summary = ExportSummary {
            output_dir: output_dir.to_path_buf(),
            entries,
        };
        self.write_report(&summary);
        info!(
            collections = summary.entries().len(),
            exported = summary.total_exported(),
            errors = summary.total_errors(),
            dir = %output_dir.display(),
            finished_at = %time_helper::now_string(),
            "Export complete."
        );
        Ok(summary)
    }

    fn write_report(&self, summary: &ExportSummary) {
        let report = ExportReport::new(
            time_helper::now_string(),
            self.conn.get_db_name(),
            self.conn.get_redacted_uri(),
            summary,
        );
        let report_file = summary.output_dir().join(REPORT_FILE);
        match save_json(&report_file, &report) {
            Ok(()) => info!(file = %report_file.display(), "Export report written."),
            Err(e) => error!(file = %report_file.display(), ?e, "Write export report failed."),
        }
    }
}
