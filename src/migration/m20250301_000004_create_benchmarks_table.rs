use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Benchmarks {
    Table,
    Id,
    DockerImage,
    DockerTag,
    Description,
    JsonTemplate,
    UploaderId,
    CreatedAt,
    UpdatedAt,
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
                    .table(Benchmarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Benchmarks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Benchmarks::DockerImage)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Benchmarks::DockerTag)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Benchmarks::Description).text().null())
                    .col(
                        ColumnDef::new(Benchmarks::JsonTemplate)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Benchmarks::UploaderId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Benchmarks::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Benchmarks::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_benchmarks_uploader_id")
                            .from(Benchmarks::Table, Benchmarks::UploaderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // An image:tag pair identifies one benchmark definition.
        manager
            .create_index(
                Index::create()
                    .name("idx_benchmarks_image_tag_unique")
                    .table(Benchmarks::Table)
                    .col(Benchmarks::DockerImage)
                    .col(Benchmarks::DockerTag)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Benchmarks::Table).to_owned())
            .await
    }
}
