use crate::blocking::Connection;
use crate::catalog::IndexSpec;
use crate::Result;
use bson::{doc, Document};
use mongodb::sync::Database;
use tracing::{info, warn};

/// Outcome of one index build pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    /// names of indexes created (or already present with the same definition).
    pub created: Vec<String>,
    /// `collection.index` names which failed to build.
    pub failed: Vec<String>,
}

impl IndexReport {
    /// did every index build?
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `createIndexes` command for a single index.
///
/// # Example
/// ```
/// use mongo_fixture::blocking::fixture::index_helper::create_index_cmd;
/// use mongo_fixture::catalog::INDEXES;
/// use bson::doc;
///
/// let cmd = create_index_cmd(&INDEXES[0]);
/// assert_eq!(
///     cmd,
///     doc! {
///         "createIndexes": "users",
///         "indexes": [{"key": {"email": 1}, "name": "email_1", "unique": true}],
///     }
/// );
/// ```
pub fn create_index_cmd(spec: &IndexSpec) -> Document {
    let mut index = doc! {
        "key": spec.key_doc(),
        "name": spec.name(),
    };
    if spec.unique {
        index.insert("unique", true);
    }
    doc! {
        "createIndexes": spec.collection,
        "indexes": [index],
    }
}

fn create_one(db: &Database, spec: &IndexSpec) -> Result<()> {
    db.run_command(create_index_cmd(spec), None)?;
    Ok(())
}

/// Build every index in `specs`.
///
/// Failures are logged and collected in the report, the remaining indexes are still built.
pub fn create_indexes(conn: &Connection, specs: &[IndexSpec]) -> IndexReport {
    let db = conn.get_db();
    let mut report = IndexReport::default();
    for spec in specs {
        let full_name = format!("{}.{}", spec.collection, spec.name());
        match create_one(&db, spec) {
            Ok(()) => {
                info!(index = %full_name, unique = spec.unique, "Index created.");
                report.created.push(full_name);
            }
            Err(e) => {
                warn!(index = %full_name, ?e, "Create index failed, continue with the next one.");
                report.failed.push(full_name);
            }
        }
    }
    report
}
