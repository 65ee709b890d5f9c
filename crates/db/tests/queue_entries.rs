//! Integration tests for ticket issuance and queue transitions.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use qdesk_db::models::queue_entry::{EntryTransition, QueueEntry, QueueListQuery};
use qdesk_db::models::service_type::ServiceType;
use qdesk_db::models::status::QueueStatus;
use qdesk_db::repositories::{PrintJobRepo, QueueEntryRepo, ServiceTypeRepo, SettingRepo};
use qdesk_db::DbPool;

async fn general(pool: &DbPool) -> ServiceType {
    ServiceTypeRepo::find_by_id(pool, 1)
        .await
        .unwrap()
        .expect("seeded service type")
}

async fn issue(pool: &DbPool, service_type: &ServiceType, period: &str, start: i64) -> QueueEntry {
    let mut conn = pool.acquire().await.unwrap();
    QueueEntryRepo::issue(&mut conn, service_type, period, start, Utc::now())
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seeded_general_service_type() {
    let pool = common::pool().await;
    let st = general(&pool).await;
    assert_eq!(st.name, "General");
    assert_eq!(st.prefix, "A");
    assert!(st.is_active);
}

#[tokio::test]
async fn numbers_increment_within_a_period() {
    let pool = common::pool().await;
    let st = general(&pool).await;

    let first = issue(&pool, &st, "2026-10-19", 1).await;
    let second = issue(&pool, &st, "2026-10-19", 1).await;

    assert_eq!(first.queue_number, "A001");
    assert_eq!(second.queue_number, "A002");
    assert_eq!(second.sequence, 2);
    assert_eq!(second.status(), Some(QueueStatus::Waiting));
    assert_eq!(second.service_type_name, "General");
}

#[tokio::test]
async fn new_period_restarts_numbering() {
    let pool = common::pool().await;
    let st = general(&pool).await;

    issue(&pool, &st, "2026-10-19", 1).await;
    issue(&pool, &st, "2026-10-19", 1).await;
    let next_day = issue(&pool, &st, "2026-10-20", 1).await;

    assert_eq!(next_day.queue_number, "A001");
}

#[tokio::test]
async fn start_number_is_a_floor() {
    let pool = common::pool().await;
    let st = general(&pool).await;

    let first = issue(&pool, &st, "continuous", 100).await;
    let second = issue(&pool, &st, "continuous", 100).await;

    assert_eq!(first.queue_number, "A100");
    assert_eq!(second.queue_number, "A101");
}

#[tokio::test]
async fn service_types_number_independently() {
    let pool = common::pool().await;
    let general = general(&pool).await;
    let billing = ServiceTypeRepo::create(&pool, "Billing", "B", Utc::now())
        .await
        .unwrap();

    issue(&pool, &general, "2026-10-19", 1).await;
    let b = issue(&pool, &billing, "2026-10-19", 1).await;

    assert_eq!(b.queue_number, "B001");
}

#[tokio::test]
async fn duplicate_prefix_is_a_unique_violation() {
    let pool = common::pool().await;
    let err = ServiceTypeRepo::create(&pool, "Another", "A", Utc::now())
        .await
        .unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issuance_never_repeats_a_number() {
    let db = common::FileDb::open("issue-race").await;
    let st = general(&db.pool).await;

    let mut handles = Vec::new();
    for _ in 0..32 {
        let pool = db.pool.clone();
        let st = st.clone();
        handles.push(tokio::spawn(async move {
            let now = Utc::now();
            let mut tx = pool.begin().await?;
            let entry = QueueEntryRepo::issue(&mut tx, &st, "2026-10-19", 1, now).await?;
            let mut job = common::new_job(&entry.queue_number);
            job.queue_entry_id = Some(entry.id);
            PrintJobRepo::create(&mut tx, &job, now).await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(entry.queue_number)
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().expect("issue should succeed"));
    }
    numbers.sort();
    let expected: Vec<String> = (1..=32).map(|n| format!("A{n:03}")).collect();
    assert_eq!(numbers, expected);

    let pending = PrintJobRepo::list_pending(&db.pool).await.unwrap();
    assert_eq!(pending.len(), 32);

    db.remove().await;
}

// ---------------------------------------------------------------------------
// Calling and closing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn call_next_takes_oldest_waiting() {
    let pool = common::pool().await;
    let st = general(&pool).await;
    let first = issue(&pool, &st, "2026-10-19", 1).await;
    let second = issue(&pool, &st, "2026-10-19", 1).await;

    let called = QueueEntryRepo::call_next(&pool, "Counter 1", None, Utc::now())
        .await
        .unwrap()
        .expect("someone waiting");
    assert_eq!(called.id, first.id);
    assert_eq!(called.counter.as_deref(), Some("Counter 1"));
    assert!(called.called_at.is_some());

    let called = QueueEntryRepo::call_next(&pool, "Counter 2", None, Utc::now())
        .await
        .unwrap()
        .expect("someone waiting");
    assert_eq!(called.id, second.id);

    let none = QueueEntryRepo::call_next(&pool, "Counter 1", None, Utc::now())
        .await
        .unwrap();
    assert!(none.is_none());
    assert_eq!(QueueEntryRepo::waiting_count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn call_next_filters_by_service_type() {
    let pool = common::pool().await;
    let general = general(&pool).await;
    let billing = ServiceTypeRepo::create(&pool, "Billing", "B", Utc::now())
        .await
        .unwrap();
    issue(&pool, &general, "2026-10-19", 1).await;
    let b = issue(&pool, &billing, "2026-10-19", 1).await;

    let called = QueueEntryRepo::call_next(&pool, "Counter 3", Some(billing.id), Utc::now())
        .await
        .unwrap()
        .expect("billing ticket waiting");
    assert_eq!(called.id, b.id);
    assert_eq!(QueueEntryRepo::waiting_count(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn close_is_guarded() {
    let pool = common::pool().await;
    let st = general(&pool).await;
    let entry = issue(&pool, &st, "2026-10-19", 1).await;

    let served = QueueEntryRepo::close(&pool, entry.id, QueueStatus::Served, Utc::now())
        .await
        .unwrap();
    assert_matches!(served, EntryTransition::Applied(e) if e.status == "served");

    let cancel = QueueEntryRepo::close(&pool, entry.id, QueueStatus::Cancelled, Utc::now())
        .await
        .unwrap();
    assert_matches!(cancel, EntryTransition::AlreadyClosed(e) if e.status == "served");

    let missing = QueueEntryRepo::close(&pool, 999, QueueStatus::Served, Utc::now())
        .await
        .unwrap();
    assert_matches!(missing, EntryTransition::NotFound);
}

#[tokio::test]
async fn recent_called_is_newest_first() {
    let pool = common::pool().await;
    let st = general(&pool).await;
    for _ in 0..3 {
        issue(&pool, &st, "2026-10-19", 1).await;
    }
    let base = Utc::now();
    for n in 0..3 {
        QueueEntryRepo::call_next(&pool, "Counter 1", None, base + Duration::seconds(n))
            .await
            .unwrap();
    }

    let recent = QueueEntryRepo::recent_called(&pool, 2).await.unwrap();
    let numbers: Vec<_> = recent.iter().map(|e| e.queue_number.as_str()).collect();
    assert_eq!(numbers, vec!["A003", "A002"]);
}

#[tokio::test]
async fn list_filters_by_status() {
    let pool = common::pool().await;
    let st = general(&pool).await;
    issue(&pool, &st, "2026-10-19", 1).await;
    issue(&pool, &st, "2026-10-19", 1).await;
    QueueEntryRepo::call_next(&pool, "Counter 1", None, Utc::now())
        .await
        .unwrap();

    let waiting = QueueEntryRepo::list(
        &pool,
        &QueueListQuery {
            status: Some("waiting".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].queue_number, "A002");

    let all = QueueEntryRepo::list(&pool, &QueueListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn cancel_stale_closes_only_old_open_entries() {
    let pool = common::pool().await;
    let st = general(&pool).await;
    let entry = issue(&pool, &st, "2026-10-19", 1).await;

    let none = QueueEntryRepo::cancel_stale(&pool, Utc::now() - Duration::hours(24), Utc::now())
        .await
        .unwrap();
    assert_eq!(none, 0);

    let cancelled = QueueEntryRepo::cancel_stale(&pool, Utc::now() + Duration::seconds(1), Utc::now())
        .await
        .unwrap();
    assert_eq!(cancelled, 1);

    let stored = QueueEntryRepo::find_by_id(&pool, entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(QueueStatus::Cancelled));
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn settings_upsert() {
    let pool = common::pool().await;
    assert!(SettingRepo::get(&pool, "ticket_template").await.unwrap().is_none());

    SettingRepo::put(&pool, "ticket_template", "{}", Utc::now()).await.unwrap();
    SettingRepo::put(&pool, "ticket_template", r#"{"ShowThanks":false}"#, Utc::now())
        .await
        .unwrap();

    assert_eq!(
        SettingRepo::get(&pool, "ticket_template").await.unwrap().as_deref(),
        Some(r#"{"ShowThanks":false}"#)
    );
}
