//! Create `complaint` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaint::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Complaint::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Complaint::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(Complaint::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Complaint::Description).text().not_null())
                    .col(ColumnDef::new(Complaint::Category).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Complaint::Priority)
                            .string_len(16)
                            .not_null()
                            .default("Medium"),
                    )
                    .col(
                        ColumnDef::new(Complaint::Status)
                            .string_len(16)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Complaint::Center).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Complaint::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Complaint::AttachmentUrl).string_len(1024))
                    .col(ColumnDef::new(Complaint::AssignedAdminId).string_len(64))
                    .col(
                        ColumnDef::new(Complaint::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Complaint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Complaint::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_user")
                            .from(Complaint::Table, Complaint::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_assigned_admin")
                            .from(Complaint::Table, Complaint::AssignedAdminId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner listing, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_user_created")
                    .table(Complaint::Table)
                    .col(Complaint::UserId)
                    .col(Complaint::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: status for pending badges and dashboard counts
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_status")
                    .table(Complaint::Table)
                    .col(Complaint::Status)
                    .to_owned(),
            )
            .await?;

        // Index: assigned admin
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_assigned_admin")
                    .table(Complaint::Table)
                    .col(Complaint::AssignedAdminId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Complaint::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Category,
    Priority,
    Status,
    Center,
    IsAnonymous,
    AttachmentUrl,
    AssignedAdminId,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}
