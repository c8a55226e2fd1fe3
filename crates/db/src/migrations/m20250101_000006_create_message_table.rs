//! Create `message` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::ComplaintId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::SenderId).string_len(64).not_null())
                    .col(ColumnDef::new(Message::ReceiverId).string_len(64).not_null())
                    .col(ColumnDef::new(Message::MessageText).text().not_null())
                    .col(ColumnDef::new(Message::AttachmentUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Message::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_complaint")
                            .from(Message::Table, Message::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for thread reads
        manager
            .create_index(
                Index::create()
                    .name("idx_message_complaint_created")
                    .table(Message::Table)
                    .col(Message::ComplaintId)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Composite index for unread badges
        manager
            .create_index(
                Index::create()
                    .name("idx_message_receiver_unread")
                    .table(Message::Table)
                    .col(Message::ReceiverId)
                    .col(Message::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    ComplaintId,
    SenderId,
    ReceiverId,
    MessageText,
    AttachmentUrl,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
}
