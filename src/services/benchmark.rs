use crate::{
    error::{AppError, AppResult},
    models::{
        benchmark, result, BenchResult, Benchmark, BenchmarkModel, ReportModel, ResourceType,
    },
    services::{conflict_on_unique, report},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    JsonValue, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

const CONFLICT_IMAGE_TAG: &str = "A benchmark with this docker image and tag already exists";

#[derive(Debug, Default)]
pub struct BenchmarkFilter {
    pub docker_image: Option<String>,
    pub docker_tag: Option<String>,
    pub uploader_id: Option<String>,
}

pub struct BenchmarkService {
    db: DatabaseConnection,
}

impl BenchmarkService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filter: BenchmarkFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<BenchmarkModel>, u64)> {
        let mut query = Benchmark::find();

        if let Some(docker_image) = filter.docker_image {
            query = query.filter(benchmark::Column::DockerImage.eq(docker_image));
        }
        if let Some(docker_tag) = filter.docker_tag {
            query = query.filter(benchmark::Column::DockerTag.eq(docker_tag));
        }
        if let Some(uploader_id) = filter.uploader_id {
            query = query.filter(benchmark::Column::UploaderId.eq(uploader_id));
        }

        let hidden = report::open_report_ids(&self.db, ResourceType::Benchmark).await?;
        if !hidden.is_empty() {
            query = query.filter(benchmark::Column::Id.is_not_in(hidden));
        }

        let paginator = query
            .order_by_asc(benchmark::Column::DockerImage)
            .order_by_asc(benchmark::Column::DockerTag)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let benchmarks = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((benchmarks, total))
    }

    /// Substring search over image name, tag and description.
    pub async fn search(
        &self,
        terms: &[String],
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<BenchmarkModel>, u64)> {
        let mut query = Benchmark::find();

        if !terms.is_empty() {
            let mut condition = Condition::any();
            for term in terms {
                condition = condition
                    .add(benchmark::Column::DockerImage.contains(term))
                    .add(benchmark::Column::DockerTag.contains(term))
                    .add(benchmark::Column::Description.contains(term));
            }
            query = query.filter(condition);
        }

        let hidden = report::open_report_ids(&self.db, ResourceType::Benchmark).await?;
        if !hidden.is_empty() {
            query = query.filter(benchmark::Column::Id.is_not_in(hidden));
        }

        let paginator = query
            .order_by_asc(benchmark::Column::DockerImage)
            .order_by_asc(benchmark::Column::DockerTag)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let benchmarks = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((benchmarks, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BenchmarkModel> {
        Benchmark::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        uploader_id: &str,
        docker_image: &str,
        docker_tag: &str,
        description: Option<String>,
        json_template: JsonValue,
    ) -> AppResult<(BenchmarkModel, ReportModel)> {
        require_template_object(&json_template)?;

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().naive_utc();

        let new_benchmark = benchmark::ActiveModel {
            id: Set(Uuid::new_v4()),
            docker_image: Set(docker_image.to_string()),
            docker_tag: Set(docker_tag.to_string()),
            description: Set(description),
            json_template: Set(json_template),
            uploader_id: Set(uploader_id.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let benchmark = new_benchmark
            .insert(&txn)
            .await
            .map_err(|e| conflict_on_unique(e, CONFLICT_IMAGE_TAG))?;
        let report =
            report::open_report(&txn, ResourceType::Benchmark, benchmark.id, uploader_id, None)
                .await?;

        txn.commit().await?;
        Ok((benchmark, report))
    }

    pub async fn update(
        &self,
        id: Uuid,
        docker_image: Option<String>,
        docker_tag: Option<String>,
        description: Option<String>,
        json_template: Option<JsonValue>,
    ) -> AppResult<BenchmarkModel> {
        let existing = self.get(id).await?;

        let mut active: benchmark::ActiveModel = existing.into();
        if let Some(docker_image) = docker_image {
            active.docker_image = Set(docker_image);
        }
        if let Some(docker_tag) = docker_tag {
            active.docker_tag = Set(docker_tag);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        if let Some(json_template) = json_template {
            require_template_object(&json_template)?;
            active.json_template = Set(json_template);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        active
            .update(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, CONFLICT_IMAGE_TAG))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id).await?;

        let txn = self.db.begin().await?;
        purge(&txn, id).await?;
        txn.commit().await?;
        Ok(())
    }
}

fn require_template_object(json_template: &JsonValue) -> AppResult<()> {
    if json_template.is_object() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "json_template must be a JSON object".to_string(),
        ))
    }
}

/// Remove a benchmark, the results submitted against it, and their open
/// reports.
pub(crate) async fn purge<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let result_ids: Vec<Uuid> = BenchResult::find()
        .filter(result::Column::BenchmarkId.eq(id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    BenchResult::delete_many()
        .filter(result::Column::BenchmarkId.eq(id))
        .exec(conn)
        .await?;
    Benchmark::delete_by_id(id).exec(conn).await?;

    report::delete_open_reports(conn, ResourceType::Result, &result_ids).await?;
    report::delete_open_reports(conn, ResourceType::Benchmark, &[id]).await?;
    Ok(())
}
