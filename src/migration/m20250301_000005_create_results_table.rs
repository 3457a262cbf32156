use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Results {
    Table,
    Id,
    BenchmarkId,
    SiteId,
    FlavorId,
    ExecutionDatetime,
    Json,
    UploaderId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Benchmarks {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Sites {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Flavors {
    Table,
    Id,
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
                    .table(Results::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Results::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Results::BenchmarkId).uuid().not_null())
                    .col(ColumnDef::new(Results::SiteId).uuid().not_null())
                    .col(ColumnDef::new(Results::FlavorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Results::ExecutionDatetime)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Results::Json).json_binary().not_null())
                    .col(
                        ColumnDef::new(Results::UploaderId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Results::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_results_benchmark_id")
                            .from(Results::Table, Results::BenchmarkId)
                            .to(Benchmarks::Table, Benchmarks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_results_site_id")
                            .from(Results::Table, Results::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_results_flavor_id")
                            .from(Results::Table, Results::FlavorId)
                            .to(Flavors::Table, Flavors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_results_uploader_id")
                            .from(Results::Table, Results::UploaderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_results_benchmark_id")
                    .table(Results::Table)
                    .col(Results::BenchmarkId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_results_site_flavor")
                    .table(Results::Table)
                    .col(Results::SiteId)
                    .col(Results::FlavorId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Results::Table).to_owned())
            .await
    }
}
