//! Create `feedback` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feedback::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    // One feedback per complaint
                    .col(
                        ColumnDef::new(Feedback::ComplaintId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Feedback::StudentId).string_len(64).not_null())
                    .col(ColumnDef::new(Feedback::AdminId).string_len(64))
                    .col(ColumnDef::new(Feedback::Rating).integer().not_null())
                    .col(ColumnDef::new(Feedback::Comment).text())
                    .col(
                        ColumnDef::new(Feedback::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Feedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Feedback::Rating).between(1, 5))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_complaint")
                            .from(Feedback::Table, Feedback::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Feedback {
    Table,
    Id,
    ComplaintId,
    StudentId,
    AdminId,
    Rating,
    Comment,
    IsAnonymous,
    CreatedAt,
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
}
