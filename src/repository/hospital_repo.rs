//! Hospital repository (医院数据访问)

use crate::{
    error::AppError,
    models::hospital::{CreateHospitalRequest, Hospital, UpdateHospitalRequest},
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct HospitalRepository {
    db: PgPool,
}

impl HospitalRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建医院，编码统一大写存储
    pub async fn create(&self, req: &CreateHospitalRequest) -> Result<Hospital, AppError> {
        let hospital = sqlx::query_as::<_, Hospital>(
            r#"
            INSERT INTO hospitals (
                name, code, address, city, state, zip_code, country,
                phone, email, website, total_beds
            )
            VALUES ($1, upper($2), $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.code)
        .bind(&req.address)
        .bind(&req.city)
        .bind(&req.state)
        .bind(&req.zip_code)
        .bind(&req.country)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.website)
        .bind(req.total_beds)
        .fetch_one(&self.db)
        .await?;

        Ok(hospital)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Hospital>, AppError> {
        let hospital = sqlx::query_as::<_, Hospital>("SELECT * FROM hospitals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(hospital)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Hospital>, AppError> {
        let hospital =
            sqlx::query_as::<_, Hospital>("SELECT * FROM hospitals WHERE code = upper($1)")
                .bind(code)
                .fetch_optional(&self.db)
                .await?;

        Ok(hospital)
    }

    /// 分页列出医院，默认只含启用的
    pub async fn list(
        &self,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Hospital>, AppError> {
        let hospitals = sqlx::query_as::<_, Hospital>(
            r#"
            SELECT * FROM hospitals
            WHERE ($1 OR is_active = TRUE)
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(hospitals)
    }

    /// 与 list 相同过滤条件下的总数
    pub async fn count(&self, include_inactive: bool) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM hospitals WHERE ($1 OR is_active = TRUE)")
                .bind(include_inactive)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    /// 更新医院信息，未提供的字段保持不变
    pub async fn update(
        &self,
        id: &Uuid,
        req: &UpdateHospitalRequest,
    ) -> Result<Option<Hospital>, AppError> {
        let hospital = sqlx::query_as::<_, Hospital>(
            r#"
            UPDATE hospitals
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                city = COALESCE($4, city),
                state = COALESCE($5, state),
                zip_code = COALESCE($6, zip_code),
                country = COALESCE($7, country),
                phone = COALESCE($8, phone),
                email = COALESCE($9, email),
                website = COALESCE($10, website),
                total_beds = COALESCE($11, total_beds),
                is_active = COALESCE($12, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.city)
        .bind(&req.state)
        .bind(&req.zip_code)
        .bind(&req.country)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.website)
        .bind(req.total_beds)
        .bind(req.is_active)
        .fetch_optional(&self.db)
        .await?;

        Ok(hospital)
    }

    /// 软删除：停用而非物理删除，保留关联的资源和人员记录
    pub async fn deactivate(&self, id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE hospitals SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_active(&self) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM hospitals WHERE is_active = TRUE")
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }
}
