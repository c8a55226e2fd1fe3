//! Create `complaint_timeline` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComplaintTimeline::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplaintTimeline::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ComplaintTimeline::ComplaintId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplaintTimeline::ActionType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComplaintTimeline::OldValue).string_len(256))
                    .col(ColumnDef::new(ComplaintTimeline::NewValue).string_len(256))
                    .col(ColumnDef::new(ComplaintTimeline::Notes).text())
                    .col(
                        ColumnDef::new(ComplaintTimeline::ActionBy)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplaintTimeline::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_timeline_complaint")
                            .from(ComplaintTimeline::Table, ComplaintTimeline::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for ordered history reads
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_timeline_complaint_created")
                    .table(ComplaintTimeline::Table)
                    .col(ComplaintTimeline::ComplaintId)
                    .col(ComplaintTimeline::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComplaintTimeline::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ComplaintTimeline {
    Table,
    Id,
    ComplaintId,
    ActionType,
    OldValue,
    NewValue,
    Notes,
    ActionBy,
    CreatedAt,
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
}
