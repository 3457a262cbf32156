use crate::{
    error::{AppError, AppResult},
    models::{report, BenchResult, Benchmark, Flavor, Report, ReportModel, Resolution, ResourceType, Site},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

pub struct ReportService {
    db: DatabaseConnection,
}

impl ReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List reports oldest first, so the first open report of a kind is
    /// always the next one to review.
    pub async fn list(
        &self,
        only_unanswered: bool,
        resource_type: Option<ResourceType>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        let mut query = Report::find();

        if only_unanswered {
            query = query.filter(report::Column::Resolution.eq(Resolution::Unresolved));
        }
        if let Some(kind) = resource_type {
            query = query.filter(report::Column::ResourceType.eq(kind));
        }

        let paginator = query
            .order_by_asc(report::Column::CreatedAt)
            .order_by_asc(report::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let reports = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((reports, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ReportModel> {
        Report::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// File a report against an existing entity, putting it back into
    /// review and hiding it from public listings.
    pub async fn file(
        &self,
        reporter_id: &str,
        resource_type: ResourceType,
        resource_id: Uuid,
        message: Option<String>,
    ) -> AppResult<ReportModel> {
        let target_exists = match resource_type {
            ResourceType::Site => Site::find_by_id(resource_id).one(&self.db).await?.is_some(),
            ResourceType::Flavor => Flavor::find_by_id(resource_id).one(&self.db).await?.is_some(),
            ResourceType::Benchmark => Benchmark::find_by_id(resource_id)
                .one(&self.db)
                .await?
                .is_some(),
            ResourceType::Result => BenchResult::find_by_id(resource_id)
                .one(&self.db)
                .await?
                .is_some(),
        };

        if !target_exists {
            return Err(AppError::NotFound);
        }

        open_report(&self.db, resource_type, resource_id, reporter_id, message).await
    }

    /// Settle a report. Approval keeps the entity and makes it visible;
    /// rejection deletes the entity and everything hanging off it. The
    /// report row is locked so a concurrent resolver of the same report
    /// observes `AlreadyResolved` instead of a double delete.
    pub async fn resolve(
        &self,
        id: Uuid,
        approve: bool,
        resolver_id: &str,
    ) -> AppResult<ReportModel> {
        let txn = self.db.begin().await?;

        let existing = Report::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if existing.resolution != Resolution::Unresolved {
            return Err(AppError::AlreadyResolved);
        }

        let resource_type = existing.resource_type;
        let resource_id = existing.resource_id;

        let mut active: report::ActiveModel = existing.into();
        active.resolution = Set(if approve {
            Resolution::Approved
        } else {
            Resolution::Rejected
        });
        active.resolved_by = Set(Some(resolver_id.to_string()));
        active.resolved_at = Set(Some(chrono::Utc::now().naive_utc()));
        let resolved = active.update(&txn).await?;

        // Rejection removes the entity itself; the resolved report row
        // stays behind as the audit record.
        if !approve {
            match resource_type {
                ResourceType::Site => crate::services::site::purge(&txn, resource_id).await?,
                ResourceType::Flavor => crate::services::flavor::purge(&txn, resource_id).await?,
                ResourceType::Benchmark => {
                    crate::services::benchmark::purge(&txn, resource_id).await?
                }
                ResourceType::Result => crate::services::result::purge(&txn, resource_id).await?,
            }
        }

        txn.commit().await?;
        Ok(resolved)
    }
}

/// Insert the UNRESOLVED report accompanying a new or flagged entity.
/// Runs on the caller's connection so entity and report commit together.
pub(crate) async fn open_report<C: ConnectionTrait>(
    conn: &C,
    resource_type: ResourceType,
    resource_id: Uuid,
    reporter_id: &str,
    message: Option<String>,
) -> AppResult<ReportModel> {
    let new_report = report::ActiveModel {
        id: Set(Uuid::new_v4()),
        resource_type: Set(resource_type),
        resource_id: Set(resource_id),
        reporter_id: Set(reporter_id.to_string()),
        message: Set(message),
        resolution: Set(Resolution::Unresolved),
        resolved_by: Set(None),
        resolved_at: Set(None),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };

    Ok(new_report.insert(conn).await?)
}

/// Ids of entities of one kind that are hidden behind an open report.
pub(crate) async fn open_report_ids<C: ConnectionTrait>(
    conn: &C,
    resource_type: ResourceType,
) -> AppResult<Vec<Uuid>> {
    let ids = Report::find()
        .select_only()
        .column(report::Column::ResourceId)
        .filter(report::Column::ResourceType.eq(resource_type))
        .filter(report::Column::Resolution.eq(Resolution::Unresolved))
        .into_tuple::<Uuid>()
        .all(conn)
        .await?;

    Ok(ids)
}

/// Drop open reports pointing at rows that are being deleted, so no
/// unresolved report is left referencing a missing entity. Resolved
/// reports are kept as audit records.
pub(crate) async fn delete_open_reports<C: ConnectionTrait>(
    conn: &C,
    resource_type: ResourceType,
    ids: &[Uuid],
) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    Report::delete_many()
        .filter(report::Column::ResourceType.eq(resource_type))
        .filter(report::Column::ResourceId.is_in(ids.iter().copied()))
        .filter(report::Column::Resolution.eq(Resolution::Unresolved))
        .exec(conn)
        .await?;

    Ok(())
}
