use bson::{doc, Document};
use mongo_fixture::blocking::fixture::CollectionExport;
use mongo_fixture::catalog::SEED_ORDER;
use mongo_fixture::{
    ConnConf, Connection, Dataset, Exporter, FixtureError, FixtureLayout, Interrupt, SeedOptions,
    Seeder,
};
use mongodb::options::FindOptions;
use serde_json::{json, Value};
use tempfile::TempDir;

struct Context {
    conn: Connection,
    dir: TempDir,
}

impl Context {
    pub fn new(db_name: &str) -> Self {
        let conf = ConnConf::new(
            option_env!("FIXTURE_TEST_URI").unwrap_or("mongodb://localhost:27017"),
            db_name,
        );
        let conn = Connection::open(&conf).unwrap();
        conn.get_db().drop(None).unwrap();
        Context {
            conn,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write(&self, file: &str, value: Value) {
        std::fs::write(
            self.dir.path().join(file),
            serde_json::to_string_pretty(&value).unwrap(),
        )
        .unwrap();
    }

    /// one record per seeded dataset, so every exported collection has a file.
    pub fn write_seed_fixtures(&self) {
        self.write(
            "institutions.json",
            json!([{
                "_id": "650000000000000000000001",
                "name": "Wuhan Sports University",
                "type": "university",
                "status": "active",
                "founded": 1953,
            }]),
        );
        self.write(
            "users.json",
            json!([{
                "_id": "650000000000000000000011",
                "username": "teacher_sun",
                "email": "sun@example.com",
                "role": "teacher",
                "institution": "650000000000000000000001",
            }]),
        );
        self.write(
            "additional_students.json",
            json!([{
                "_id": "650000000000000000000012",
                "username": "student_zhou",
                "email": "zhou@example.com",
                "role": "student",
                "institution": "650000000000000000000001",
            }]),
        );
        self.write(
            "classes.json",
            json!([{
                "_id": "650000000000000000000021",
                "name": "Basketball Class",
                "teacherId": "650000000000000000000011",
                "students": [{"userId": "650000000000000000000012", "username": "student_zhou"}],
            }]),
        );
        self.write(
            "knowledge_bases.json",
            json!([{
                "_id": "650000000000000000000031",
                "name": "Basketball",
                "author": "650000000000000000000011",
                "isPublic": false,
            }]),
        );
        self.write(
            "knowledge_points.json",
            json!([{
                "_id": "650000000000000000000041",
                "title": "Travelling",
                "knowledgeBaseId": "650000000000000000000031",
                "weight": 1.5,
            }]),
        );
        self.write(
            "learning_paths.json",
            json!([{
                "_id": "650000000000000000000051",
                "name": "Basketball basics",
                "knowledgeBase": "650000000000000000000031",
            }]),
        );
        self.write(
            "questions.json",
            json!([{
                "_id": "650000000000000000000061",
                "content": "How long is a quarter in FIBA games?",
                "category": {"sport": "basketball", "knowledgeType": "rules"},
                "options": ["8", "10", "12"],
            }]),
        );
        self.write(
            "exams.json",
            json!([{
                "_id": "650000000000000000000071",
                "user": "650000000000000000000012",
                "questionIds": ["650000000000000000000061"],
                "score": 100,
            }]),
        );
        self.write(
            "knowledge_progress.json",
            json!([{
                "_id": "650000000000000000000081",
                "user": "650000000000000000000012",
                "knowledgeBase": "650000000000000000000031",
                "progress": 40,
            }]),
        );
    }

    pub fn all_documents(&self, coll: &str) -> Vec<Document> {
        let opts = FindOptions::builder().sort(doc! {"_id": 1}).build();
        self.conn
            .coll(coll)
            .find(None, opts)
            .unwrap()
            .map(|d| d.unwrap())
            .collect()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.conn.get_db().drop(None).unwrap();
    }
}

#[test]
#[ignore = "needs a running mongodb, see FIXTURE_TEST_URI"]
fn test_export_then_force_import_keeps_data() {
    let context = Context::new("fixture_test_export_round_trip");
    context.write_seed_fixtures();
    let interrupt = Interrupt::never();
    let seeder = Seeder::new(&context.conn, &interrupt);
    seeder.seed(&SeedOptions::new(context.dir.path())).unwrap();
    let before = seeder.verify().unwrap();
    let users_before = context.all_documents("users");
    let exams_before = context.all_documents("exams");

    let out_dir = context.dir.path().join("export");
    let exporter = Exporter::new(&context.conn, &interrupt);
    let summary = exporter.export_all(&out_dir, &Dataset::exported()).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.entries().len(), 9);
    assert_eq!(summary.total_exported(), 10);

    // identifiers are exported as hex strings.
    let users: Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join("users_export.json")).unwrap())
            .unwrap();
    assert_eq!(users[0]["_id"], "650000000000000000000011");
    assert_eq!(users[0]["institution"], "650000000000000000000001");

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join("export_report.json")).unwrap())
            .unwrap();
    assert_eq!(report["database_name"], "fixture_test_export_round_trip");
    assert_eq!(report["collections"]["users"]["exported_documents"], 2);
    assert_eq!(report["collections"]["exams"]["success"], true);

    seeder.cleanup(&SEED_ORDER).unwrap();
    let opts = SeedOptions::new(&out_dir)
        .layout(FixtureLayout::Export)
        .force_update(true);
    let summary = seeder.seed(&opts).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.counts, before);
    assert_eq!(context.all_documents("users"), users_before);
    assert_eq!(context.all_documents("exams"), exams_before);
}

#[test]
#[ignore = "needs a running mongodb, see FIXTURE_TEST_URI"]
fn test_round_trip_with_empty_collection() {
    let context = Context::new("fixture_test_export_empty");
    context.write_seed_fixtures();
    context.write("knowledge_progress.json", json!([]));
    let interrupt = Interrupt::never();
    let seeder = Seeder::new(&context.conn, &interrupt);
    seeder.seed(&SeedOptions::new(context.dir.path())).unwrap();
    let before = seeder.verify().unwrap();

    let out_dir = context.dir.path().join("nested").join("export");
    let exporter = Exporter::new(&context.conn, &interrupt);
    let summary = exporter.export_all(&out_dir, &Dataset::exported()).unwrap();
    assert!(summary.is_success());
    let (_, progress) = summary
        .entries()
        .iter()
        .find(|(d, _)| *d == Dataset::KnowledgeProgress)
        .unwrap();
    assert_eq!(*progress, CollectionExport::default());
    let written = std::fs::read_to_string(out_dir.join("knowledge_progress_export.json")).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), json!([]));

    seeder.cleanup(&SEED_ORDER).unwrap();
    let opts = SeedOptions::new(&out_dir)
        .layout(FixtureLayout::Export)
        .force_update(true);
    let summary = seeder.seed(&opts).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.counts, before);
}

#[test]
fn test_open_unreachable_server() {
    let conf = ConnConf::new(
        "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200",
        "fixture_test_unreachable",
    );
    assert!(matches!(
        Connection::open(&conf),
        Err(FixtureError::ConnectError { .. })
    ));
}

#[test]
#[ignore = "needs a running mongodb, see FIXTURE_TEST_URI"]
fn test_stats() {
    let context = Context::new("fixture_test_export_stats");
    context.write_seed_fixtures();
    let interrupt = Interrupt::never();
    let seeder = Seeder::new(&context.conn, &interrupt);
    seeder
        .seed(
            &SeedOptions::new(context.dir.path())
                .only(vec![Dataset::Users, Dataset::AdditionalStudents]),
        )
        .unwrap();

    let exporter = Exporter::new(&context.conn, &interrupt);
    let stats = exporter.stats(&[Dataset::Users, Dataset::Exams]);
    assert_eq!(stats, vec![(Dataset::Users, Some(2)), (Dataset::Exams, Some(0))]);
}
