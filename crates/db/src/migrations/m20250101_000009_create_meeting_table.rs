//! Create `meeting` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Meeting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Meeting::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Meeting::StudentId).string_len(64).not_null())
                    .col(ColumnDef::new(Meeting::ComplaintId).string_len(32))
                    .col(ColumnDef::new(Meeting::AdminId).string_len(64))
                    .col(
                        ColumnDef::new(Meeting::RequestedDateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Meeting::ScheduledDateTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Meeting::Status)
                            .string_len(16)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Meeting::Notes).text())
                    .col(ColumnDef::new(Meeting::MeetingLink).string_len(1024))
                    .col(
                        ColumnDef::new(Meeting::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Meeting::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meeting_complaint")
                            .from(Meeting::Table, Meeting::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for the student's own list and pending badge
        manager
            .create_index(
                Index::create()
                    .name("idx_meeting_student_status")
                    .table(Meeting::Table)
                    .col(Meeting::StudentId)
                    .col(Meeting::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Meeting::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Meeting {
    Table,
    Id,
    StudentId,
    ComplaintId,
    AdminId,
    RequestedDateTime,
    ScheduledDateTime,
    Status,
    Notes,
    MeetingLink,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
}
