//! Static tables of the quiz platform data: which fixture goes to which collection,
//! the order fixtures must be imported in, and the secondary indexes to build.

use crate::error::{FixtureError, Result};
use bson::Document;
use std::fmt;

/// One logical fixture dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// sports institutions.
    Institutions,
    /// platform users of every role.
    Users,
    /// extra student accounts, stored with the other users.
    AdditionalStudents,
    /// teaching classes and their members.
    Classes,
    /// knowledge bases.
    KnowledgeBases,
    /// knowledge points, owned by knowledge bases.
    KnowledgePoints,
    /// learning paths over knowledge points.
    LearningPaths,
    /// quiz questions.
    Questions,
    /// exam records.
    Exams,
    /// per-user knowledge progress.
    KnowledgeProgress,
    /// ad-hoc exam records outside the seed order.
    AdditionalExams,
    /// ad-hoc knowledge progress outside the seed order.
    AdditionalProgress,
}

/// Seed order, every dataset comes after the datasets it references.
pub const SEED_ORDER: [Dataset; 10] = [
    Dataset::Institutions,
    Dataset::Users,
    Dataset::AdditionalStudents,
    Dataset::Classes,
    Dataset::KnowledgeBases,
    Dataset::KnowledgePoints,
    Dataset::LearningPaths,
    Dataset::Questions,
    Dataset::Exams,
    Dataset::KnowledgeProgress,
];

/// Extra learning records imported by the `learning` supplement.
pub const LEARNING_SUPPLEMENT: [Dataset; 2] =
    [Dataset::AdditionalExams, Dataset::AdditionalProgress];

/// Extra students and classes imported by the `classes` supplement.
pub const CLASS_SUPPLEMENT: [Dataset; 2] = [Dataset::AdditionalStudents, Dataset::Classes];

const ALL: [Dataset; 12] = [
    Dataset::Institutions,
    Dataset::Users,
    Dataset::AdditionalStudents,
    Dataset::Classes,
    Dataset::KnowledgeBases,
    Dataset::KnowledgePoints,
    Dataset::LearningPaths,
    Dataset::Questions,
    Dataset::Exams,
    Dataset::KnowledgeProgress,
    Dataset::AdditionalExams,
    Dataset::AdditionalProgress,
];

impl Dataset {
    /// logical name, used on the command line and in reports.
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Institutions => "institutions",
            Dataset::Users => "users",
            Dataset::AdditionalStudents => "additional_students",
            Dataset::Classes => "classes",
            Dataset::KnowledgeBases => "knowledge_bases",
            Dataset::KnowledgePoints => "knowledge_points",
            Dataset::LearningPaths => "learning_paths",
            Dataset::Questions => "questions",
            Dataset::Exams => "exams",
            Dataset::KnowledgeProgress => "knowledge_progress",
            Dataset::AdditionalExams => "additional_exams",
            Dataset::AdditionalProgress => "additional_progress",
        }
    }

    /// physical collection name.
    pub fn collection(self) -> &'static str {
        match self {
            Dataset::Institutions => "institutions",
            Dataset::Users | Dataset::AdditionalStudents => "users",
            Dataset::Classes => "classes",
            Dataset::KnowledgeBases => "knowledgebases",
            Dataset::KnowledgePoints => "knowledgepoints",
            Dataset::LearningPaths => "learningpaths",
            Dataset::Questions => "questions",
            Dataset::Exams | Dataset::AdditionalExams => "exams",
            Dataset::KnowledgeProgress | Dataset::AdditionalProgress => "knowledgeprogresses",
        }
    }

    /// fixture file name, relative to the fixture directory.
    pub fn fixture_file(self) -> &'static str {
        match self {
            Dataset::Institutions => "institutions.json",
            Dataset::Users => "users.json",
            Dataset::AdditionalStudents => "additional_students.json",
            Dataset::Classes => "classes.json",
            Dataset::KnowledgeBases => "knowledge_bases.json",
            Dataset::KnowledgePoints => "knowledge_points.json",
            Dataset::LearningPaths => "learning_paths.json",
            Dataset::Questions => "questions.json",
            Dataset::Exams => "exams.json",
            Dataset::KnowledgeProgress => "knowledge_progress.json",
            Dataset::AdditionalExams => "additional_exam_data.json",
            Dataset::AdditionalProgress => "additional_progress_data.json",
        }
    }

    /// export file name, only datasets which own their whole collection are exported.
    pub fn export_file(self) -> Option<&'static str> {
        match self {
            Dataset::Institutions => Some("institutions_export.json"),
            Dataset::Users => Some("users_export.json"),
            Dataset::Classes => Some("classes_export.json"),
            Dataset::KnowledgeBases => Some("knowledge_bases_export.json"),
            Dataset::KnowledgePoints => Some("knowledge_points_export.json"),
            Dataset::LearningPaths => Some("learning_paths_export.json"),
            Dataset::Questions => Some("questions_export.json"),
            Dataset::Exams => Some("exams_export.json"),
            Dataset::KnowledgeProgress => Some("knowledge_progress_export.json"),
            Dataset::AdditionalStudents
            | Dataset::AdditionalExams
            | Dataset::AdditionalProgress => None,
        }
    }

    /// human readable description.
    pub fn description(self) -> &'static str {
        match self {
            Dataset::Institutions => "institution data",
            Dataset::Users => "user data",
            Dataset::AdditionalStudents => "additional student data",
            Dataset::Classes => "class data",
            Dataset::KnowledgeBases => "knowledge base data",
            Dataset::KnowledgePoints => "knowledge point data",
            Dataset::LearningPaths => "learning path data",
            Dataset::Questions => "question data",
            Dataset::Exams => "exam record data",
            Dataset::KnowledgeProgress => "knowledge progress data",
            Dataset::AdditionalExams => "additional exam record data",
            Dataset::AdditionalProgress => "additional knowledge progress data",
        }
    }

    /// Find a dataset by logical name, or by collection name.
    ///
    /// Collection names resolve to the first dataset which owns that collection.
    ///
    /// # Example
    /// ```
    /// use mongo_fixture::Dataset;
    /// assert_eq!(Dataset::lookup("knowledge_bases").unwrap(), Dataset::KnowledgeBases);
    /// assert_eq!(Dataset::lookup("knowledgebases").unwrap(), Dataset::KnowledgeBases);
    /// assert_eq!(Dataset::lookup("users").unwrap(), Dataset::Users);
    /// ```
    pub fn lookup(name: &str) -> Result<Dataset> {
        ALL.iter()
            .find(|d| d.name() == name)
            .or_else(|| ALL.iter().find(|d| d.collection() == name))
            .copied()
            .ok_or_else(|| FixtureError::UnknownDataset(name.to_string()))
    }

    /// Parse every name in `names`, failing on the first unknown one.
    pub fn lookup_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Dataset>> {
        names.iter().map(|n| Dataset::lookup(n.as_ref())).collect()
    }

    /// datasets with an export file, in seed order.
    pub fn exported() -> Vec<Dataset> {
        SEED_ORDER
            .iter()
            .copied()
            .filter(|d| d.export_file().is_some())
            .collect()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Distinct collection names touched by `datasets`, first-seen order.
pub fn distinct_collections(datasets: &[Dataset]) -> Vec<&'static str> {
    let mut colls: Vec<&'static str> = Vec::with_capacity(datasets.len());
    for d in datasets {
        if !colls.contains(&d.collection()) {
            colls.push(d.collection());
        }
    }
    colls
}

/// Secondary index definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    /// collection to build the index on.
    pub collection: &'static str,
    /// index key fields with direction, 1 or -1.
    pub keys: &'static [(&'static str, i32)],
    /// is unique?.
    pub unique: bool,
}

impl IndexSpec {
    const fn asc(collection: &'static str, keys: &'static [(&'static str, i32)]) -> Self {
        IndexSpec {
            collection,
            keys,
            unique: false,
        }
    }

    const fn unique(collection: &'static str, keys: &'static [(&'static str, i32)]) -> Self {
        IndexSpec {
            collection,
            keys,
            unique: true,
        }
    }

    /// Index name, following the server's default naming.
    ///
    /// # Example
    /// ```
    /// use mongo_fixture::catalog::INDEXES;
    /// let exam_index = INDEXES
    ///     .iter()
    ///     .find(|i| i.collection == "exams" && i.keys.len() == 2)
    ///     .unwrap();
    /// assert_eq!(exam_index.name(), "status_1_completedAt_-1");
    /// ```
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, dir)| format!("{}_{}", field, dir))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// index key document.
    pub fn key_doc(&self) -> Document {
        let mut key = Document::new();
        for (field, dir) in self.keys {
            key.insert(*field, *dir);
        }
        key
    }
}

/// Every secondary index the seeder builds.
pub const INDEXES: [IndexSpec; 24] = [
    IndexSpec::unique("users", &[("email", 1)]),
    IndexSpec::unique("users", &[("username", 1)]),
    IndexSpec::asc("users", &[("institution", 1)]),
    IndexSpec::unique("institutions", &[("name", 1)]),
    IndexSpec::asc("institutions", &[("type", 1), ("status", 1)]),
    IndexSpec::asc("knowledgebases", &[("author", 1), ("status", 1)]),
    IndexSpec::asc(
        "knowledgebases",
        &[("category", 1), ("level", 1), ("isPublic", 1)],
    ),
    IndexSpec::asc("knowledgepoints", &[("knowledgeBaseId", 1)]),
    IndexSpec::asc("knowledgepoints", &[("category", 1), ("difficulty", 1)]),
    IndexSpec::asc("learningpaths", &[("knowledgeBase", 1)]),
    IndexSpec::asc("learningpaths", &[("difficulty", 1), ("status", 1)]),
    IndexSpec::asc("questions", &[("category.sport", 1)]),
    IndexSpec::asc("questions", &[("category.knowledgeType", 1)]),
    IndexSpec::asc("questions", &[("difficulty", 1), ("status", 1)]),
    IndexSpec::asc("exams", &[("user", 1)]),
    IndexSpec::asc("exams", &[("status", 1), ("completedAt", -1)]),
    IndexSpec::asc("exams", &[("examType", 1), ("createdAt", -1)]),
    IndexSpec::asc("knowledgeprogresses", &[("user", 1), ("knowledgeBase", 1)]),
    IndexSpec::asc(
        "knowledgeprogresses",
        &[("user", 1), ("status", 1), ("updatedAt", -1)],
    ),
    IndexSpec::asc("knowledgeprogresses", &[("knowledgeBase", 1), ("status", 1)]),
    IndexSpec::asc("classes", &[("teacherId", 1), ("status", 1)]),
    IndexSpec::asc("classes", &[("institutionId", 1), ("grade", 1)]),
    IndexSpec::asc("classes", &[("name", 1)]),
    IndexSpec::asc("classes", &[("students.userId", 1)]),
];

/// indexes of one collection.
pub fn indexes_for(collection: &str) -> Vec<IndexSpec> {
    INDEXES
        .iter()
        .copied()
        .filter(|i| i.collection == collection)
        .collect()
}
