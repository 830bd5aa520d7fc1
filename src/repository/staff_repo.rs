//! Staff repository (人员数据访问)

use crate::{
    error::AppError,
    models::staff::{CreateStaffRequest, Staff, UpdateStaffRequest},
};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StaffRepository {
    db: PgPool,
}

/// Per-role headcount, for the dashboard
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffRoleCount {
    pub role: String,
    pub count: i64,
}

impl StaffRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建员工，工号统一大写存储
    pub async fn create(&self, req: &CreateStaffRequest) -> Result<Staff, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            INSERT INTO staff (
                employee_id, first_name, last_name, role, specialization,
                department, hospital_id, phone, email
            )
            VALUES (upper($1), $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&req.employee_id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(req.role.as_str())
        .bind(&req.specialization)
        .bind(&req.department)
        .bind(req.hospital_id)
        .bind(&req.phone)
        .bind(&req.email)
        .fetch_one(&self.db)
        .await?;

        Ok(staff)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(staff)
    }

    pub async fn find_by_employee_id(&self, employee_id: &str) -> Result<Option<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE employee_id = upper($1)")
            .bind(employee_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(staff)
    }

    /// 分页列表查询，可按医院和角色过滤
    pub async fn list(
        &self,
        hospital_id: Option<&Uuid>,
        role: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            SELECT * FROM staff
            WHERE ($1::uuid IS NULL OR hospital_id = $1)
                AND ($2::text IS NULL OR role = $2)
            ORDER BY last_name, first_name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(hospital_id)
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(staff)
    }

    /// 与 list 相同过滤条件下的总数
    pub async fn count(
        &self,
        hospital_id: Option<&Uuid>,
        role: Option<&str>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM staff
            WHERE ($1::uuid IS NULL OR hospital_id = $1)
                AND ($2::text IS NULL OR role = $2)
            "#,
        )
        .bind(hospital_id)
        .bind(role)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// 某医院的全部员工（不分页）
    pub async fn list_by_hospital(&self, hospital_id: &Uuid) -> Result<Vec<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE hospital_id = $1 ORDER BY last_name, first_name",
        )
        .bind(hospital_id)
        .fetch_all(&self.db)
        .await?;

        Ok(staff)
    }

    pub async fn update(
        &self,
        id: &Uuid,
        req: &UpdateStaffRequest,
    ) -> Result<Option<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            UPDATE staff
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role),
                specialization = COALESCE($5, specialization),
                department = COALESCE($6, department),
                phone = COALESCE($7, phone),
                email = COALESCE($8, email),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(req.role.map(|r| r.as_str()))
        .bind(&req.specialization)
        .bind(&req.department)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(req.is_active)
        .fetch_optional(&self.db)
        .await?;

        Ok(staff)
    }

    /// 软删除：停用而非物理删除
    pub async fn deactivate(&self, id: &Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE staff SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_active(&self, hospital_id: Option<&Uuid>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM staff
            WHERE is_active = TRUE AND ($1::uuid IS NULL OR hospital_id = $1)
            "#,
        )
        .bind(hospital_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// 按角色统计在职人数
    pub async fn count_by_role(
        &self,
        hospital_id: Option<&Uuid>,
    ) -> Result<Vec<StaffRoleCount>, AppError> {
        let counts = sqlx::query_as::<_, StaffRoleCount>(
            r#"
            SELECT role, COUNT(*)::bigint AS count
            FROM staff
            WHERE is_active = TRUE AND ($1::uuid IS NULL OR hospital_id = $1)
            GROUP BY role
            ORDER BY role
            "#,
        )
        .bind(hospital_id)
        .fetch_all(&self.db)
        .await?;

        Ok(counts)
    }
}
