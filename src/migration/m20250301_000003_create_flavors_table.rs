use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Flavors {
    Table,
    Id,
    SiteId,
    Name,
    Description,
    UploaderId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sites {
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
                    .table(Flavors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Flavors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Flavors::SiteId).uuid().not_null())
                    .col(ColumnDef::new(Flavors::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Flavors::Description).text().null())
                    .col(
                        ColumnDef::new(Flavors::UploaderId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Flavors::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Flavors::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flavors_site_id")
                            .from(Flavors::Table, Flavors::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flavors_uploader_id")
                            .from(Flavors::Table, Flavors::UploaderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A site may not list the same flavor name twice.
        manager
            .create_index(
                Index::create()
                    .name("idx_flavors_site_name_unique")
                    .table(Flavors::Table)
                    .col(Flavors::SiteId)
                    .col(Flavors::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flavors::Table).to_owned())
            .await
    }
}
