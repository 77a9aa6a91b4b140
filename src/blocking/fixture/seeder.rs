use super::index_helper::{self, IndexReport};
use super::record::{import_records, load_fixture, ImportStats};
use super::time_helper;
use crate::blocking::{Connection, Interrupt};
use crate::catalog::{distinct_collections, Dataset, INDEXES, SEED_ORDER};
use crate::Result;
use bson::doc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which file names the seeder reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureLayout {
    /// checked-in fixture names, `users.json`.
    Fixture,
    /// exporter output names, `users_export.json`.
    Export,
}

/// Seeder run options.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    data_dir: PathBuf,
    force_update: bool,
    layout: FixtureLayout,
    only: Option<Vec<Dataset>>,
}

impl SeedOptions {
    /// import every fixture found in `data_dir`, skipping existing documents.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        SeedOptions {
            data_dir: data_dir.into(),
            force_update: false,
            layout: FixtureLayout::Fixture,
            only: None,
        }
    }

    /// overwrite existing documents instead of skipping them.
    pub fn force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    /// read files named by `layout`.
    pub fn layout(mut self, layout: FixtureLayout) -> Self {
        self.layout = layout;
        self
    }

    /// restrict the run to `datasets`, the seed order still applies.
    pub fn only(mut self, datasets: Vec<Dataset>) -> Self {
        self.only = Some(datasets);
        self
    }

    /// Datasets to import with their file, in seed order.
    ///
    /// With the export layout, datasets without an export file are left out.
    pub fn plan(&self) -> Vec<(Dataset, PathBuf)> {
        SEED_ORDER
            .iter()
            .copied()
            .filter(|d| match &self.only {
                Some(only) => only.contains(d),
                None => true,
            })
            .filter_map(|d| {
                let file = match self.layout {
                    FixtureLayout::Fixture => Some(d.fixture_file()),
                    FixtureLayout::Export => d.export_file(),
                };
                file.map(|f| (d, self.data_dir.join(f)))
            })
            .collect()
    }

    /// datasets touched by this run.
    pub fn datasets(&self) -> Vec<Dataset> {
        self.plan().into_iter().map(|(d, _)| d).collect()
    }
}

/// Outcome of a seed run.
#[derive(Debug, Clone)]
pub struct SeedSummary {
    /// per dataset import counters, in seed order.
    pub datasets: Vec<(Dataset, ImportStats)>,
    /// index build outcome.
    pub indexes: IndexReport,
    /// document count per collection after the run.
    pub counts: Vec<(&'static str, u64)>,
}

impl SeedSummary {
    /// datasets imported without failed records.
    pub fn succeeded(&self) -> usize {
        self.datasets.iter().filter(|(_, s)| s.is_success()).count()
    }

    /// did every dataset import without failed records?
    pub fn is_success(&self) -> bool {
        self.succeeded() == self.datasets.len()
    }

    /// documents newly inserted over the whole run.
    pub fn inserted(&self) -> usize {
        self.datasets.iter().map(|(_, s)| s.inserted).sum()
    }
}

/// Import the fixture set in dependency order.
pub struct Seeder<'a> {
    conn: &'a Connection,
    interrupt: &'a Interrupt,
}

impl<'a> Seeder<'a> {
    /// create a seeder over `conn`.
    pub fn new(conn: &'a Connection, interrupt: &'a Interrupt) -> Self {
        Seeder { conn, interrupt }
    }

    /// Run the whole seed: import, build indexes, verify.
    ///
    /// A missing or malformed fixture aborts the run, records already written stay.
    pub fn seed(&self, opts: &SeedOptions) -> Result<SeedSummary> {
        info!(
            started_at = %time_helper::now_string(),
            db = self.conn.get_db_name(),
            "Begin to seed database."
        );
        let plan = opts.plan();
        let mut datasets = Vec::with_capacity(plan.len());
        for (dataset, path) in plan {
            self.interrupt.check()?;
            let stats = self.import_dataset(dataset, &path, opts.force_update)?;
            datasets.push((dataset, stats));
        }

        let indexes = self.create_indexes();
        let counts = self.verify()?;
        let summary = SeedSummary {
            datasets,
            indexes,
            counts,
        };
        info!(
            succeeded = summary.succeeded(),
            total = summary.datasets.len(),
            inserted = summary.inserted(),
            finished_at = %time_helper::now_string(),
            "Seed complete."
        );
        Ok(summary)
    }

    /// Import fixture `path` into `dataset`'s collection.
    pub fn import_dataset(
        &self,
        dataset: Dataset,
        path: &Path,
        force_update: bool,
    ) -> Result<ImportStats> {
        info!(
            %dataset,
            description = dataset.description(),
            collection = dataset.collection(),
            file = %path.display(),
            "Begin to import dataset."
        );
        let records = load_fixture(path)?;
        if records.is_empty() {
            warn!(%dataset, file = %path.display(), "Fixture is empty, nothing to import.");
        }

        let coll = self.conn.coll(dataset.collection());
        let stats = import_records(&coll, dataset.name(), records, force_update, self.interrupt)?;
        info!(
            %dataset,
            total = stats.total,
            inserted = stats.inserted,
            replaced = stats.replaced,
            unchanged = stats.unchanged,
            existing = stats.existing,
            failed = stats.failed,
            "Import dataset complete."
        );
        Ok(stats)
    }

    /// Build the secondary index set, failures are only logged.
    pub fn create_indexes(&self) -> IndexReport {
        info!("Begin to create indexes.");
        let report = index_helper::create_indexes(self.conn, &INDEXES);
        if report.is_success() {
            info!(created = report.created.len(), "Create indexes complete.");
        } else {
            warn!(
                created = report.created.len(),
                failed = ?report.failed,
                "Some indexes failed to build."
            );
        }
        report
    }

    /// Count the documents of every seeded collection and log them.
    ///
    /// Counts are informational, nothing is compared against the fixtures.
    pub fn verify(&self) -> Result<Vec<(&'static str, u64)>> {
        info!("Verify data:");
        let mut counts = Vec::new();
        for coll in distinct_collections(&SEED_ORDER) {
            let cnt = self.conn.coll(coll).count_documents(None, None)?;
            info!(collection = coll, count = cnt);
            counts.push((coll, cnt));
        }

        let count_of = |name: &str| {
            counts
                .iter()
                .find(|(c, _)| *c == name)
                .map_or(0, |(_, cnt)| *cnt)
        };
        info!(
            users = count_of(Dataset::Users.collection()),
            institutions = count_of(Dataset::Institutions.collection()),
            "User and institution relation."
        );
        info!(
            knowledge_bases = count_of(Dataset::KnowledgeBases.collection()),
            knowledge_points = count_of(Dataset::KnowledgePoints.collection()),
            "Knowledge base and knowledge point relation."
        );
        Ok(counts)
    }

    /// Delete every document of the collections behind `datasets`.
    ///
    /// Callers must confirm with the operator first.
    pub fn cleanup(&self, datasets: &[Dataset]) -> Result<u64> {
        warn!("Begin to clean up data.");
        let mut deleted = 0;
        for coll in distinct_collections(datasets) {
            self.interrupt.check()?;
            let res = self.conn.coll(coll).delete_many(doc! {}, None)?;
            info!(collection = coll, deleted = res.deleted_count, "Collection cleaned.");
            deleted += res.deleted_count;
        }
        Ok(deleted)
    }
}
