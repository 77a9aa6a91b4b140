use bson::oid::ObjectId;
use mongo_fixture::catalog::indexes_for;
use mongo_fixture::{
    ConnConf, Connection, Dataset, FixtureError, Interrupt, Seeder, SupplementImporter,
};
use serde_json::{json, Value};
use tempfile::TempDir;

const TEACHER: &str = "660000000000000000000001";
const STUDENT_WU: &str = "660000000000000000000002";
const STUDENT_ZHENG: &str = "660000000000000000000003";
const STUDENT_GHOST: &str = "660000000000000000000099";

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

    /// seed the teacher, class fixtures reference it.
    pub fn seed_users(&self) {
        self.write(
            "users.json",
            json!([{
                "_id": TEACHER,
                "username": "teacher_feng",
                "email": "feng@example.com",
                "role": "teacher",
            }]),
        );
        let interrupt = Interrupt::never();
        Seeder::new(&self.conn, &interrupt)
            .import_dataset(
                Dataset::Users,
                &self.dir.path().join("users.json"),
                false,
            )
            .unwrap();
    }

    pub fn write_class_fixtures(&self) {
        self.write(
            "additional_students.json",
            json!([
                {
                    "_id": STUDENT_WU,
                    "username": "student_wu",
                    "email": "wu@example.com",
                    "role": "student",
                },
                {
                    "_id": STUDENT_ZHENG,
                    "username": "student_zheng",
                    "email": "zheng@example.com",
                    "role": "student",
                },
            ]),
        );
        self.write(
            "classes.json",
            json!([
                {
                    "_id": "660000000000000000000101",
                    "name": "Swimming Class",
                    "grade": "Grade 2",
                    "status": "active",
                    "teacherId": TEACHER,
                    "teacherName": "teacher_feng",
                    "students": [
                        {"userId": STUDENT_WU, "username": "student_wu"},
                        {"userId": STUDENT_ZHENG, "username": "student_zheng"},
                    ],
                },
                {
                    "_id": "660000000000000000000102",
                    "name": "Tennis Class",
                    "grade": "Grade 3",
                    "status": "archived",
                    "teacherId": TEACHER,
                    "students": [
                        {"userId": STUDENT_WU, "username": "student_wu"},
                        {"userId": STUDENT_GHOST, "username": "student_ghost"},
                    ],
                },
            ]),
        );
    }

    pub fn write_learning_fixtures(&self) {
        self.write(
            "additional_exam_data.json",
            json!([
                {
                    "_id": "660000000000000000000201",
                    "user": STUDENT_WU,
                    "examType": "practice",
                    "score": 60,
                },
                {
                    "_id": "660000000000000000000202",
                    "user": STUDENT_WU,
                    "examType": "final",
                    "score": 90,
                },
                {
                    "_id": "660000000000000000000203",
                    "user": STUDENT_ZHENG,
                    "examType": "practice",
                    "score": 75,
                },
            ]),
        );
        self.write(
            "additional_progress_data.json",
            json!([
                {
                    "_id": "660000000000000000000301",
                    "user": STUDENT_WU,
                    "knowledgeBase": "660000000000000000000401",
                    "status": "in_progress",
                },
            ]),
        );
    }

    pub fn count(&self, coll: &str) -> u64 {
        self.conn.coll(coll).count_documents(None, None).unwrap()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.conn.get_db().drop(None).unwrap();
    }
}

#[test]
#[ignore = "needs a running mongodb, see FIXTURE_TEST_URI"]
fn test_import_classes() {
    let context = Context::new("fixture_test_supplement_classes");
    context.seed_users();
    context.write_class_fixtures();
    let interrupt = Interrupt::never();
    let importer = SupplementImporter::new(&context.conn, &interrupt);

    let summary = importer.import_classes(context.dir.path(), false).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.inserted(), 4);
    assert_eq!(context.count("users"), 3);
    assert_eq!(context.count("classes"), 2);

    assert_eq!(summary.memberships.len(), 2);
    assert!(summary.memberships[0].is_complete());
    assert_eq!(summary.memberships[0].members, 2);
    assert_eq!(summary.memberships[1].class_name, "Tennis Class");
    assert_eq!(summary.memberships[1].missing, vec!["student_ghost".to_string()]);

    let indexes = summary.indexes.unwrap();
    assert!(indexes.is_success());
    let names = context.conn.coll("classes").list_index_names().unwrap();
    for spec in indexes_for("classes") {
        assert!(names.contains(&spec.name()), "missing index {}", spec.name());
    }

    importer.overview().unwrap();

    // second run skips everything.
    let summary = importer.import_classes(context.dir.path(), false).unwrap();
    assert_eq!(summary.inserted(), 0);
    assert!(summary.datasets.iter().all(|(_, s)| s.existing == s.total));
}

#[test]
#[ignore = "needs a running mongodb, see FIXTURE_TEST_URI"]
fn test_import_learning() {
    let context = Context::new("fixture_test_supplement_learning");
    context.write_learning_fixtures();
    let interrupt = Interrupt::never();
    let importer = SupplementImporter::new(&context.conn, &interrupt);

    let focus_user = ObjectId::parse_str(STUDENT_WU).unwrap();
    let summary = importer
        .import_learning(context.dir.path(), false, Some(focus_user))
        .unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.datasets.len(), 2);
    assert_eq!(summary.datasets[0].0, Dataset::AdditionalExams);
    assert_eq!(summary.datasets[0].1.inserted, 3);
    assert_eq!(summary.datasets[1].1.inserted, 1);
    assert!(summary.memberships.is_empty());
    assert!(summary.indexes.is_none());
    assert_eq!(context.count("exams"), 3);
    assert_eq!(context.count("knowledgeprogresses"), 1);

    let user_exams = context
        .conn
        .coll("exams")
        .count_documents(bson::doc! {"user": focus_user}, None)
        .unwrap();
    assert_eq!(user_exams, 2);
}

#[test]
#[ignore = "needs a running mongodb, see FIXTURE_TEST_URI"]
fn test_missing_supplement_fixture() {
    let context = Context::new("fixture_test_supplement_missing");
    let interrupt = Interrupt::never();
    let importer = SupplementImporter::new(&context.conn, &interrupt);

    let res = importer.import_learning(context.dir.path(), false, None);
    assert!(matches!(res, Err(FixtureError::MissingFixture { .. })));
}
