#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use qdesk_db::models::print_job::{NewPrintJob, PrintJob};
use qdesk_db::repositories::PrintJobRepo;
use qdesk_db::DbPool;

/// Fresh in-memory database with migrations applied.
pub async fn pool() -> DbPool {
    qdesk_db::create_memory_pool()
        .await
        .expect("in-memory pool should open")
}

/// A database file under the temp dir, opened with the production pool
/// settings (several connections, WAL) so writers really contend.
pub struct FileDb {
    pub pool: DbPool,
    path: PathBuf,
}

impl FileDb {
    pub async fn open(label: &str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "qdesk-{label}-{}-{}.db",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        remove_files(&path);

        let pool = qdesk_db::create_pool(&format!("sqlite://{}", path.display()))
            .await
            .expect("file pool should open");
        qdesk_db::run_migrations(&pool).await.expect("migrations");
        Self { pool, path }
    }

    /// Close the pool and delete the database files.
    pub async fn remove(self) {
        self.pool.close().await;
        remove_files(&self.path);
    }
}

fn remove_files(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut name = path.clone().into_os_string();
        name.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(name));
    }
}

pub fn new_job(queue_number: &str) -> NewPrintJob {
    NewPrintJob {
        queue_entry_id: None,
        queue_number: queue_number.to_string(),
        type_name: "General".to_string(),
        date_time: "19/10/2026 09:00".to_string(),
        template_json: r#"{"ShowThanks":false}"#.to_string(),
        rejected: None,
    }
}

/// Insert a pending job on its own connection.
pub async fn create_job(pool: &DbPool, queue_number: &str) -> PrintJob {
    let mut conn = pool.acquire().await.expect("acquire");
    PrintJobRepo::create(&mut conn, &new_job(queue_number), Utc::now())
        .await
        .expect("create print job")
}
