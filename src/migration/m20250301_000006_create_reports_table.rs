use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
    ResourceType,
    ResourceId,
    ReporterId,
    Message,
    Resolution,
    ResolvedBy,
    ResolvedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reports::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Reports::ResourceType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reports::ResourceId).uuid().not_null())
                    .col(
                        ColumnDef::new(Reports::ReporterId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reports::Message).text().null())
                    .col(
                        ColumnDef::new(Reports::Resolution)
                            .string_len(16)
                            .not_null()
                            .default("unresolved"),
                    )
                    .col(ColumnDef::new(Reports::ResolvedBy).string_len(255).null())
                    .col(ColumnDef::new(Reports::ResolvedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Reports::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reports_reporter_id")
                            .from(Reports::Table, Reports::ReporterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reports_resolved_by")
                            .from(Reports::Table, Reports::ResolvedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_resolution")
                    .table(Reports::Table)
                    .col(Reports::Resolution)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_resource")
                    .table(Reports::Table)
                    .col(Reports::ResourceType)
                    .col(Reports::ResourceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // "Review next" fetches the oldest open report of a kind.
        manager
            .create_index(
                Index::create()
                    .name("idx_reports_created_at")
                    .table(Reports::Table)
                    .col(Reports::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await
    }
}
