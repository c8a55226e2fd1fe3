//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `connect_test`)
//!   `TEST_DB_PASSWORD` (default: `connect_test`)
//!   `TEST_DB_NAME` (default: `connect_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use connect_common::AppError;
use connect_db::entities::{
    complaint::{self, ComplaintCategory, ComplaintPriority, ComplaintStatus},
    complaint_timeline::{self, TimelineAction},
    feedback,
    user_role::Role,
};
use connect_db::repositories::{
    ComplaintRepository, FeedbackRepository, LockedUpdate, TimelineRepository,
};
use connect_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

fn new_complaint(id: &str, owner: &str) -> complaint::ActiveModel {
    let now = Utc::now();
    complaint::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(owner.to_string()),
        title: Set("Wi-Fi drops every hour".to_string()),
        description: Set("The lab network disconnects every hour during sessions.".to_string()),
        category: Set(ComplaintCategory::Technical),
        priority: Set(ComplaintPriority::Medium),
        status: Set(ComplaintStatus::Pending),
        center: Set("Kochi".to_string()),
        is_anonymous: Set(false),
        attachment_url: Set(None),
        assigned_admin_id: Set(None),
        version: Set(1),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

fn entry(id: &str, complaint_id: &str, action: TimelineAction, by: &str) -> complaint_timeline::ActiveModel {
    complaint_timeline::ActiveModel {
        id: Set(id.to_string()),
        complaint_id: Set(complaint_id.to_string()),
        action_type: Set(action),
        old_value: Set(None),
        new_value: Set(Some("Pending".to_string())),
        notes: Set(None),
        action_by: Set(by.to_string()),
        created_at: Set(Utc::now().into()),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_create_with_entry_is_atomic() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    db.seed_user("s1", Role::Student, "Kochi").await.unwrap();

    let conn = Arc::new(db.conn);
    let complaints = ComplaintRepository::new(conn.clone());
    let timeline = TimelineRepository::new(conn);

    complaints
        .create_with_entry(
            new_complaint("c1", "s1"),
            entry("t1", "c1", TimelineAction::Created, "s1"),
        )
        .await
        .unwrap();

    // Entry pointing at a missing complaint fails the FK and must roll back the complaint too.
    let failed = complaints
        .create_with_entry(
            new_complaint("c2", "s1"),
            entry("t2", "missing", TimelineAction::Created, "s1"),
        )
        .await;
    assert!(matches!(failed, Err(AppError::Database(_))));
    assert!(complaints.find_by_id("c2").await.unwrap().is_none());

    let entries = timeline.find_by_complaint("c1").await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_locked_updates_serialize() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    db.seed_user("s1", Role::Student, "Kochi").await.unwrap();

    let conn = Arc::new(db.conn);
    let complaints = ComplaintRepository::new(conn.clone());
    complaints
        .create_with_entry(
            new_complaint("c1", "s1"),
            entry("t1", "c1", TimelineAction::Created, "s1"),
        )
        .await
        .unwrap();

    let target = |status: ComplaintStatus, entry_id: &'static str| {
        let repo = complaints.clone();
        async move {
            repo.update_locked("c1", move |row| {
                let mut changes: complaint::ActiveModel = row.clone().into();
                changes.status = Set(status);
                changes.version = Set(row.version + 1);
                let mut log = entry(entry_id, "c1", TimelineAction::StatusChanged, "a1");
                log.old_value = Set(Some(row.status.as_str().to_string()));
                log.new_value = Set(Some(status.as_str().to_string()));
                Ok(LockedUpdate {
                    changes: Some(changes),
                    entries: vec![log],
                })
            })
            .await
        }
    };

    let (a, b) = tokio::join!(
        target(ComplaintStatus::InProgress, "t2"),
        target(ComplaintStatus::Resolved, "t3")
    );
    a.unwrap();
    b.unwrap();

    let history = TimelineRepository::new(conn)
        .find_by_complaint("c1")
        .await
        .unwrap();
    let changes: Vec<_> = history
        .iter()
        .filter(|e| e.action_type == TimelineAction::StatusChanged)
        .collect();
    assert_eq!(changes.len(), 2);
    // Whichever committed second saw the first one's value as its old value.
    assert!(changes.iter().any(|e| e.old_value.as_deref() == Some("Pending")));
    assert!(changes.iter().any(|e| e.old_value.as_deref() != Some("Pending")));

    let final_row = complaints.find_by_id("c1").await.unwrap().unwrap();
    assert_eq!(final_row.version, 3);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_second_feedback_is_conflict() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    db.seed_user("s1", Role::Student, "Kochi").await.unwrap();

    let conn = Arc::new(db.conn);
    ComplaintRepository::new(conn.clone())
        .create_with_entry(
            new_complaint("c1", "s1"),
            entry("t1", "c1", TimelineAction::Created, "s1"),
        )
        .await
        .unwrap();

    let repo = FeedbackRepository::new(conn);
    let make = |id: &str| feedback::ActiveModel {
        id: Set(id.to_string()),
        complaint_id: Set("c1".to_string()),
        student_id: Set("s1".to_string()),
        admin_id: Set(None),
        rating: Set(5),
        comment: Set(None),
        is_anonymous: Set(false),
        created_at: Set(Utc::now().into()),
    };

    repo.create(make("f1")).await.unwrap();
    let second = repo.create(make("f2")).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost:5432"));
    assert!(url.ends_with("/testdb"));
}
