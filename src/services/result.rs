use crate::{
    error::{AppError, AppResult},
    models::{
        result, BenchResult, BenchResultModel, Benchmark, Flavor, ReportModel, ResourceType, Site,
    },
    services::report,
    utils::validate_template,
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JsonValue,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ResultFilter {
    pub benchmark_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub flavor_id: Option<Uuid>,
    pub uploader_id: Option<String>,
    pub upload_before: Option<NaiveDateTime>,
    pub upload_after: Option<NaiveDateTime>,
}

pub struct ResultService {
    db: DatabaseConnection,
}

impl ResultService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filter: ResultFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<BenchResultModel>, u64)> {
        let mut query = BenchResult::find();

        if let Some(benchmark_id) = filter.benchmark_id {
            query = query.filter(result::Column::BenchmarkId.eq(benchmark_id));
        }
        if let Some(site_id) = filter.site_id {
            query = query.filter(result::Column::SiteId.eq(site_id));
        }
        if let Some(flavor_id) = filter.flavor_id {
            query = query.filter(result::Column::FlavorId.eq(flavor_id));
        }
        if let Some(uploader_id) = filter.uploader_id {
            query = query.filter(result::Column::UploaderId.eq(uploader_id));
        }
        if let Some(upload_before) = filter.upload_before {
            query = query.filter(result::Column::CreatedAt.lt(upload_before));
        }
        if let Some(upload_after) = filter.upload_after {
            query = query.filter(result::Column::CreatedAt.gt(upload_after));
        }

        let hidden = report::open_report_ids(&self.db, ResourceType::Result).await?;
        if !hidden.is_empty() {
            query = query.filter(result::Column::Id.is_not_in(hidden));
        }

        let paginator = query
            .order_by_desc(result::Column::ExecutionDatetime)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let results = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((results, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BenchResultModel> {
        BenchResult::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Validate the submitted document against the benchmark's template
    /// and store it together with its review report. Nothing persists
    /// when validation fails.
    pub async fn submit(
        &self,
        uploader_id: &str,
        benchmark_id: Uuid,
        site_id: Uuid,
        flavor_id: Uuid,
        execution_datetime: NaiveDateTime,
        document: JsonValue,
    ) -> AppResult<(BenchResultModel, ReportModel)> {
        let benchmark = Benchmark::find_by_id(benchmark_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        validate_template(&document, &benchmark.json_template)?;

        let site = Site::find_by_id(site_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        let flavor = Flavor::find_by_id(flavor_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        if flavor.site_id != site.id {
            return Err(AppError::Validation(
                "flavor does not belong to the given site".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let new_result = result::ActiveModel {
            id: Set(Uuid::new_v4()),
            benchmark_id: Set(benchmark.id),
            site_id: Set(site.id),
            flavor_id: Set(flavor.id),
            execution_datetime: Set(execution_datetime),
            json: Set(document),
            uploader_id: Set(uploader_id.to_string()),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        let stored = new_result.insert(&txn).await?;
        let report =
            report::open_report(&txn, ResourceType::Result, stored.id, uploader_id, None).await?;

        txn.commit().await?;
        Ok((stored, report))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id).await?;

        let txn = self.db.begin().await?;
        purge(&txn, id).await?;
        txn.commit().await?;
        Ok(())
    }
}

/// Remove one result and its open reports.
pub(crate) async fn purge<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    BenchResult::delete_by_id(id).exec(conn).await?;
    report::delete_open_reports(conn, ResourceType::Result, &[id]).await?;
    Ok(())
}
