use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of entity a report refers to. Stored as a short string column;
/// the API uses the upper-case serde names.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    #[sea_orm(string_value = "site")]
    Site,
    #[sea_orm(string_value = "flavor")]
    Flavor,
    #[sea_orm(string_value = "benchmark")]
    Benchmark,
    #[sea_orm(string_value = "result")]
    Result,
}

/// Review verdict. Terminal once it leaves `Unresolved`.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    #[sea_orm(string_value = "unresolved")]
    Unresolved,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Moderation ticket. One is opened automatically with every created
/// entity; users may file additional ones against existing entities.
/// The `(resource_type, resource_id)` pair is a polymorphic reference
/// with no foreign key; services keep it consistent on deletion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub resource_type: ResourceType,
    pub resource_id: Uuid,
    pub reporter_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub resolution: Resolution,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ResolvedBy",
        to = "super::user::Column::Id"
    )]
    Resolver,
}

impl ActiveModelBehavior for ActiveModel {}
