use crate::{
    error::{AppError, AppResult},
    models::{
        flavor, result, site, BenchResult, Flavor, ReportModel, ResourceType, Site, SiteModel,
    },
    services::{conflict_on_unique, report},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

const CONFLICT_SHORT_NAME: &str = "A site with this short_name already exists";

#[derive(Debug, Default)]
pub struct SiteFilter {
    pub short_name: Option<String>,
    pub name: Option<String>,
    pub uploader_id: Option<String>,
}

pub struct SiteService {
    db: DatabaseConnection,
}

impl SiteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Public listing: exact-match filters, sites under review excluded.
    pub async fn list(
        &self,
        filter: SiteFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<SiteModel>, u64)> {
        let mut query = Site::find();

        if let Some(short_name) = filter.short_name {
            query = query.filter(site::Column::ShortName.eq(short_name));
        }
        if let Some(name) = filter.name {
            query = query.filter(site::Column::Name.eq(name));
        }
        if let Some(uploader_id) = filter.uploader_id {
            query = query.filter(site::Column::UploaderId.eq(uploader_id));
        }

        let hidden = report::open_report_ids(&self.db, ResourceType::Site).await?;
        if !hidden.is_empty() {
            query = query.filter(site::Column::Id.is_not_in(hidden));
        }

        let paginator = query
            .order_by_asc(site::Column::ShortName)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let sites = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((sites, total))
    }

    /// Substring search over the site text columns. A site matches when
    /// any term occurs in any column; no terms matches everything.
    pub async fn search(
        &self,
        terms: &[String],
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<SiteModel>, u64)> {
        let mut query = Site::find();

        if !terms.is_empty() {
            let mut condition = Condition::any();
            for term in terms {
                condition = condition
                    .add(site::Column::ShortName.contains(term))
                    .add(site::Column::Name.contains(term))
                    .add(site::Column::Address.contains(term))
                    .add(site::Column::Description.contains(term));
            }
            query = query.filter(condition);
        }

        let hidden = report::open_report_ids(&self.db, ResourceType::Site).await?;
        if !hidden.is_empty() {
            query = query.filter(site::Column::Id.is_not_in(hidden));
        }

        let paginator = query
            .order_by_asc(site::Column::ShortName)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let sites = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((sites, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SiteModel> {
        Site::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Create the site together with its review report; both persist or
    /// neither does.
    pub async fn create(
        &self,
        uploader_id: &str,
        short_name: &str,
        name: &str,
        address: &str,
        description: Option<String>,
    ) -> AppResult<(SiteModel, ReportModel)> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().naive_utc();

        let new_site = site::ActiveModel {
            id: Set(Uuid::new_v4()),
            short_name: Set(short_name.to_string()),
            name: Set(name.to_string()),
            address: Set(address.to_string()),
            description: Set(description),
            uploader_id: Set(uploader_id.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let site = new_site
            .insert(&txn)
            .await
            .map_err(|e| conflict_on_unique(e, CONFLICT_SHORT_NAME))?;
        let report = report::open_report(&txn, ResourceType::Site, site.id, uploader_id, None).await?;

        txn.commit().await?;
        Ok((site, report))
    }

    pub async fn update(
        &self,
        id: Uuid,
        short_name: Option<String>,
        name: Option<String>,
        address: Option<String>,
        description: Option<String>,
    ) -> AppResult<SiteModel> {
        let existing = self.get(id).await?;

        let mut active: site::ActiveModel = existing.into();
        if let Some(short_name) = short_name {
            active.short_name = Set(short_name);
        }
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(address) = address {
            active.address = Set(address);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        active
            .update(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, CONFLICT_SHORT_NAME))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id).await?;

        let txn = self.db.begin().await?;
        purge(&txn, id).await?;
        txn.commit().await?;
        Ok(())
    }
}

/// Remove a site together with its flavors, the results run on it, and
/// the open reports of everything removed.
pub(crate) async fn purge<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let flavor_ids: Vec<Uuid> = Flavor::find()
        .filter(flavor::Column::SiteId.eq(id))
        .all(conn)
        .await?
        .into_iter()
        .map(|f| f.id)
        .collect();
    let result_ids: Vec<Uuid> = BenchResult::find()
        .filter(result::Column::SiteId.eq(id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    BenchResult::delete_many()
        .filter(result::Column::SiteId.eq(id))
        .exec(conn)
        .await?;
    Flavor::delete_many()
        .filter(flavor::Column::SiteId.eq(id))
        .exec(conn)
        .await?;
    Site::delete_by_id(id).exec(conn).await?;

    report::delete_open_reports(conn, ResourceType::Result, &result_ids).await?;
    report::delete_open_reports(conn, ResourceType::Flavor, &flavor_ids).await?;
    report::delete_open_reports(conn, ResourceType::Site, &[id]).await?;
    Ok(())
}
