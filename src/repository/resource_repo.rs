//! Resource repository (资源数据访问)

use crate::{error::AppError, models::resource::Resource};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ResourceRepository {
    db: PgPool,
}

pub struct NewResource<'a> {
    pub hospital_id: Uuid,
    pub resource_type: &'a str,
    pub category: &'a str,
    pub total: i32,
    pub available: i32,
    pub occupied: i32,
    pub maintenance: i32,
    pub floor: Option<&'a str>,
    pub wing: Option<&'a str>,
    pub ward: Option<&'a str>,
    pub updated_by: Uuid,
}

/// Per-type aggregate across hospitals, for the dashboard
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeSummary {
    pub resource_type: String,
    pub total: i64,
    pub available: i64,
    pub occupied: i64,
    pub maintenance: i64,
}

impl ResourceRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewResource<'_>) -> Result<Resource, AppError> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (
                hospital_id, resource_type, category,
                total, available, occupied, maintenance,
                floor, wing, ward, last_updated, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), $11)
            RETURNING *
            "#,
        )
        .bind(new.hospital_id)
        .bind(new.resource_type)
        .bind(new.category)
        .bind(new.total)
        .bind(new.available)
        .bind(new.occupied)
        .bind(new.maintenance)
        .bind(new.floor)
        .bind(new.wing)
        .bind(new.ward)
        .bind(new.updated_by)
        .fetch_one(&self.db)
        .await?;

        Ok(resource)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(resource)
    }

    /// 查重：同一医院同一类型同一类别只允许一条记录
    pub async fn find_duplicate(
        &self,
        hospital_id: &Uuid,
        resource_type: &str,
        category: &str,
    ) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            SELECT * FROM resources
            WHERE hospital_id = $1 AND resource_type = $2 AND category = $3
            "#,
        )
        .bind(hospital_id)
        .bind(resource_type)
        .bind(category)
        .fetch_optional(&self.db)
        .await?;

        Ok(resource)
    }

    pub async fn list_by_hospital(&self, hospital_id: &Uuid) -> Result<Vec<Resource>, AppError> {
        let resources = sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE hospital_id = $1 ORDER BY resource_type, category",
        )
        .bind(hospital_id)
        .fetch_all(&self.db)
        .await?;

        Ok(resources)
    }

    /// 分页列出资源，可按类型和医院过滤
    pub async fn list(
        &self,
        resource_type: Option<&str>,
        hospital_id: Option<&Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Resource>, AppError> {
        let resources = sqlx::query_as::<_, Resource>(
            r#"
            SELECT * FROM resources
            WHERE ($1::text IS NULL OR resource_type = $1)
              AND ($2::uuid IS NULL OR hospital_id = $2)
            ORDER BY hospital_id, resource_type, category
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(resource_type)
        .bind(hospital_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(resources)
    }

    /// 与 list 相同过滤条件下的总数
    pub async fn count(
        &self,
        resource_type: Option<&str>,
        hospital_id: Option<&Uuid>,
    ) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM resources
            WHERE ($1::text IS NULL OR resource_type = $1)
              AND ($2::uuid IS NULL OR hospital_id = $2)
            "#,
        )
        .bind(resource_type)
        .bind(hospital_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count.0)
    }

    /// 全量更新（未提供的字段保持不变）；hospital_id 不允许变更
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: &Uuid,
        resource_type: Option<&str>,
        category: Option<&str>,
        total: i32,
        available: i32,
        occupied: i32,
        maintenance: i32,
        floor: Option<&str>,
        wing: Option<&str>,
        ward: Option<&str>,
        updated_by: Uuid,
    ) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            UPDATE resources
            SET resource_type = COALESCE($2, resource_type),
                category = COALESCE($3, category),
                total = $4,
                available = $5,
                occupied = $6,
                maintenance = $7,
                floor = COALESCE($8, floor),
                wing = COALESCE($9, wing),
                ward = COALESCE($10, ward),
                last_updated = NOW(),
                updated_by = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resource_type)
        .bind(category)
        .bind(total)
        .bind(available)
        .bind(occupied)
        .bind(maintenance)
        .bind(floor)
        .bind(wing)
        .bind(ward)
        .bind(updated_by)
        .fetch_optional(&self.db)
        .await?;

        Ok(resource)
    }

    /// 仅更新计数字段
    pub async fn update_counts(
        &self,
        id: &Uuid,
        available: i32,
        occupied: i32,
        maintenance: i32,
        updated_by: Uuid,
    ) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            UPDATE resources
            SET available = $2,
                occupied = $3,
                maintenance = $4,
                last_updated = NOW(),
                updated_by = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(available)
        .bind(occupied)
        .bind(maintenance)
        .bind(updated_by)
        .fetch_optional(&self.db)
        .await?;

        Ok(resource)
    }

    pub async fn delete(&self, id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 按类型汇总，用于仪表盘
    pub async fn summarize_by_type(
        &self,
        hospital_id: Option<&Uuid>,
    ) -> Result<Vec<ResourceTypeSummary>, AppError> {
        let summaries = sqlx::query_as::<_, ResourceTypeSummary>(
            r#"
            SELECT resource_type,
                   SUM(total)::bigint AS total,
                   SUM(available)::bigint AS available,
                   SUM(occupied)::bigint AS occupied,
                   SUM(maintenance)::bigint AS maintenance
            FROM resources
            WHERE ($1::uuid IS NULL OR hospital_id = $1)
            GROUP BY resource_type
            ORDER BY resource_type
            "#,
        )
        .bind(hospital_id)
        .fetch_all(&self.db)
        .await?;

        Ok(summaries)
    }
}
