//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_profile_table;
mod m20250101_000002_create_user_role_table;
mod m20250101_000003_create_center_table;
mod m20250101_000004_create_complaint_table;
mod m20250101_000005_create_complaint_timeline_table;
mod m20250101_000006_create_message_table;
mod m20250101_000007_create_feedback_table;
mod m20250101_000008_create_announcement_table;
mod m20250101_000009_create_meeting_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_profile_table::Migration),
            Box::new(m20250101_000002_create_user_role_table::Migration),
            Box::new(m20250101_000003_create_center_table::Migration),
            Box::new(m20250101_000004_create_complaint_table::Migration),
            Box::new(m20250101_000005_create_complaint_timeline_table::Migration),
            Box::new(m20250101_000006_create_message_table::Migration),
            Box::new(m20250101_000007_create_feedback_table::Migration),
            Box::new(m20250101_000008_create_announcement_table::Migration),
            Box::new(m20250101_000009_create_meeting_table::Migration),
        ]
    }
}
