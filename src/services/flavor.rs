use crate::{
    error::{AppError, AppResult},
    models::{
        flavor, result, BenchResult, Flavor, FlavorModel, ReportModel, ResourceType, Site,
    },
    services::{conflict_on_unique, report},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

const CONFLICT_NAME: &str = "The site already has a flavor with this name";

pub struct FlavorService {
    db: DatabaseConnection,
}

impl FlavorService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Flavors of one site, open-reported ones excluded.
    pub async fn list_for_site(
        &self,
        site_id: Uuid,
        name: Option<String>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<FlavorModel>, u64)> {
        self.require_site(site_id).await?;

        let mut query = Flavor::find().filter(flavor::Column::SiteId.eq(site_id));
        if let Some(name) = name {
            query = query.filter(flavor::Column::Name.eq(name));
        }

        let hidden = report::open_report_ids(&self.db, ResourceType::Flavor).await?;
        if !hidden.is_empty() {
            query = query.filter(flavor::Column::Id.is_not_in(hidden));
        }

        let paginator = query
            .order_by_asc(flavor::Column::Name)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let flavors = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((flavors, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<FlavorModel> {
        Flavor::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        uploader_id: &str,
        site_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> AppResult<(FlavorModel, ReportModel)> {
        self.require_site(site_id).await?;

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().naive_utc();

        let new_flavor = flavor::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(site_id),
            name: Set(name.to_string()),
            description: Set(description),
            uploader_id: Set(uploader_id.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let flavor = new_flavor
            .insert(&txn)
            .await
            .map_err(|e| conflict_on_unique(e, CONFLICT_NAME))?;
        let report =
            report::open_report(&txn, ResourceType::Flavor, flavor.id, uploader_id, None).await?;

        txn.commit().await?;
        Ok((flavor, report))
    }

    /// The owning site is immutable; only name and description change.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<FlavorModel> {
        let existing = self.get(id).await?;

        let mut active: flavor::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        active
            .update(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, CONFLICT_NAME))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id).await?;

        let txn = self.db.begin().await?;
        purge(&txn, id).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn require_site(&self, site_id: Uuid) -> AppResult<()> {
        Site::find_by_id(site_id)
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}

/// Remove a flavor, the results run on it, and their open reports.
pub(crate) async fn purge<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let result_ids: Vec<Uuid> = BenchResult::find()
        .filter(result::Column::FlavorId.eq(id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    BenchResult::delete_many()
        .filter(result::Column::FlavorId.eq(id))
        .exec(conn)
        .await?;
    Flavor::delete_by_id(id).exec(conn).await?;

    report::delete_open_reports(conn, ResourceType::Result, &result_ids).await?;
    report::delete_open_reports(conn, ResourceType::Flavor, &[id]).await?;
    Ok(())
}
