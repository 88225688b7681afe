use lyzr_desk::infrastructure::persistence::Database;
use std::path::PathBuf;
use uuid::Uuid;

pub struct TestDatabase {
    db: Database,
    path: PathBuf,
}

impl TestDatabase {
    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// Fresh file-backed SQLite database with migrations applied. One file per
/// test so tests can run in parallel.
pub async fn setup_test_db() -> TestDatabase {
    let path = std::env::temp_dir().join(format!("lyzr_desk_test_{}.db", Uuid::new_v4()));
    let db_url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations()
        .await
        .expect("Failed to run migrations");

    TestDatabase { db, path }
}

pub async fn teardown_test_db(test_db: TestDatabase) {
    test_db.db.pool().close().await;
    let _ = std::fs::remove_file(&test_db.path);
    let _ = std::fs::remove_file(test_db.path.with_extension("db-wal"));
    let _ = std::fs::remove_file(test_db.path.with_extension("db-shm"));
}
