//! Ad-hoc fixture pairs outside the seed order.
//!
//! Two supplements exist: extra learning records (exams, knowledge progress) and extra
//! students with their classes.  Both use the same skip-if-exists import as the seeder;
//! the class supplement also checks that every class member resolves to a user.

use super::index_helper::{self, IndexReport};
use super::record::{load_fixture, to_document, ImportStats, RecordStore};
use super::seeder::Seeder;
use crate::blocking::{Connection, Interrupt};
use crate::catalog::{indexes_for, Dataset, CLASS_SUPPLEMENT, LEARNING_SUPPLEMENT};
use crate::Result;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use std::path::Path;
use tracing::{info, warn};

/// user roles listed in the overview.
const ROLES: [&str; 5] = ["student", "teacher", "institution_admin", "admin", "super_admin"];

/// Membership check result of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMembership {
    /// class name.
    pub class_name: String,
    /// members listed in the class.
    pub members: usize,
    /// members whose user document doesn't exist, by username.
    pub missing: Vec<String>,
}

impl ClassMembership {
    /// every member resolved?
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Outcome of a supplement run.
#[derive(Debug, Clone, Default)]
pub struct SupplementSummary {
    /// per dataset import counters.
    pub datasets: Vec<(Dataset, ImportStats)>,
    /// class membership checks, class supplement only.
    pub memberships: Vec<ClassMembership>,
    /// class index build outcome, class supplement only.
    pub indexes: Option<IndexReport>,
}

impl SupplementSummary {
    /// did every dataset import without failed records?
    ///
    /// Unresolved class members are reported, they don't fail the run.
    pub fn is_success(&self) -> bool {
        self.datasets.iter().all(|(_, s)| s.is_success())
    }

    /// documents newly inserted.
    pub fn inserted(&self) -> usize {
        self.datasets.iter().map(|(_, s)| s.inserted).sum()
    }
}

/// `(userId, label)` of every member listed under `students`.
///
/// The label is the member's username, or its id when the username is absent.
pub fn member_refs(class: &Document) -> Vec<(Option<Bson>, String)> {
    let students = match class.get_array("students") {
        Ok(students) => students,
        Err(_) => return vec![],
    };
    students
        .iter()
        .map(|student| match student {
            Bson::Document(student) => {
                let user_id = student.get("userId").cloned();
                let label = match (student.get_str("username"), &user_id) {
                    (Ok(name), _) => name.to_string(),
                    (Err(_), Some(id)) => id.to_string(),
                    (Err(_), None) => "<unknown>".to_string(),
                };
                (user_id, label)
            }
            other => (Some(other.clone()), other.to_string()),
        })
        .collect()
}

/// Check that every member of `classes` exists in `users`.
pub fn check_memberships<S: RecordStore + ?Sized>(
    users: &S,
    classes: &[Document],
) -> Result<Vec<ClassMembership>> {
    let mut result = Vec::with_capacity(classes.len());
    for class in classes {
        let refs = member_refs(class);
        let mut missing = vec![];
        for (user_id, label) in refs.iter() {
            let found = match user_id {
                Some(id) => users.exists(id)?,
                None => false,
            };
            if !found {
                missing.push(label.clone());
            }
        }
        result.push(ClassMembership {
            class_name: class.get_str("name").unwrap_or("<unnamed>").to_string(),
            members: refs.len(),
            missing,
        });
    }
    Ok(result)
}

/// Import supplementary fixtures next to an already seeded database.
pub struct SupplementImporter<'a> {
    conn: &'a Connection,
    interrupt: &'a Interrupt,
}

impl<'a> SupplementImporter<'a> {
    /// create an importer over `conn`.
    pub fn new(conn: &'a Connection, interrupt: &'a Interrupt) -> Self {
        SupplementImporter { conn, interrupt }
    }

    fn import_datasets(
        &self,
        datasets: &[Dataset],
        data_dir: &Path,
        force_update: bool,
    ) -> Result<Vec<(Dataset, ImportStats)>> {
        let seeder = Seeder::new(self.conn, self.interrupt);
        let mut result = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            self.interrupt.check()?;
            let path = data_dir.join(dataset.fixture_file());
            let stats = seeder.import_dataset(*dataset, &path, force_update)?;
            result.push((*dataset, stats));
        }
        Ok(result)
    }

    /// Import extra exam records and knowledge progress, then report counts.
    ///
    /// With `focus_user`, that user's exam and progress counts are reported too.
    pub fn import_learning(
        &self,
        data_dir: &Path,
        force_update: bool,
        focus_user: Option<ObjectId>,
    ) -> Result<SupplementSummary> {
        let datasets = self.import_datasets(&LEARNING_SUPPLEMENT, data_dir, force_update)?;

        let exams = self.conn.coll(Dataset::Exams.collection());
        let progress = self.conn.coll(Dataset::KnowledgeProgress.collection());
        let total_exams = exams.count_documents(None, None)?;
        let total_progress = progress.count_documents(None, None)?;
        info!(exams = total_exams, knowledge_progress = total_progress, "Verify data.");
        if let Some(user) = focus_user {
            let user_exams = exams.count_documents(doc! {"user": user}, None)?;
            let user_progress = progress.count_documents(doc! {"user": user}, None)?;
            info!(
                %user,
                exams = user_exams,
                knowledge_progress = user_progress,
                "Focus user records."
            );
        }

        Ok(SupplementSummary {
            datasets,
            ..SupplementSummary::default()
        })
    }

    /// Import extra students and classes, check class members, build class indexes.
    pub fn import_classes(&self, data_dir: &Path, force_update: bool) -> Result<SupplementSummary> {
        let datasets = self.import_datasets(&CLASS_SUPPLEMENT, data_dir, force_update)?;

        let users = self.conn.coll(Dataset::Users.collection());
        let classes = self.conn.coll(Dataset::Classes.collection());
        let total_users = users.count_documents(None, None)?;
        let students = users.count_documents(doc! {"role": "student"}, None)?;
        let teachers = users.count_documents(doc! {"role": "teacher"}, None)?;
        info!(users = total_users, students, teachers, "Verify users.");
        let total_classes = classes.count_documents(None, None)?;
        let active_classes = classes.count_documents(doc! {"status": "active"}, None)?;
        info!(classes = total_classes, active_classes, "Verify classes.");

        let class_file = data_dir.join(Dataset::Classes.fixture_file());
        let class_docs: Vec<Document> = load_fixture(&class_file)?
            .into_iter()
            .filter_map(to_document)
            .collect();
        let memberships = check_memberships(&users, &class_docs)?;
        for m in memberships.iter() {
            if m.is_complete() {
                info!(class = %m.class_name, members = m.members, "Class members resolved.");
            } else {
                warn!(
                    class = %m.class_name,
                    missing = ?m.missing,
                    "Class references missing users."
                );
            }
        }

        info!("Begin to create class indexes.");
        let class_indexes = indexes_for(Dataset::Classes.collection());
        let indexes = index_helper::create_indexes(self.conn, &class_indexes);

        Ok(SupplementSummary {
            datasets,
            memberships,
            indexes: Some(indexes),
        })
    }

    /// Log users per role and every class with its member count and teacher.
    pub fn overview(&self) -> Result<()> {
        let users = self.conn.coll(Dataset::Users.collection());
        for role in ROLES {
            let count = users.count_documents(doc! {"role": role}, None)?;
            info!(role, count, "Users by role.");
        }

        let cursor = self.conn.coll(Dataset::Classes.collection()).find(
            None,
            FindOptions::builder()
                .projection(doc! {"name": 1, "grade": 1, "students": 1, "teacherName": 1})
                .build(),
        )?;
        let mut total = 0;
        for class in cursor {
            let class = class?;
            info!(
                name = class.get_str("name").unwrap_or("N/A"),
                grade = class.get_str("grade").unwrap_or("N/A"),
                members = class.get_array("students").map_or(0, |s| s.len()),
                teacher = class.get_str("teacherName").unwrap_or("N/A"),
                "Class."
            );
            total += 1;
        }
        info!(total, "Classes overview complete.");
        Ok(())
    }
}
