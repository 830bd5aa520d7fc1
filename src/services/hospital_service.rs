//! 医院服务

use crate::{
    error::AppError,
    models::audit::AuditAction,
    models::hospital::*,
    repository::HospitalRepository,
    services::audit_service::{AuditService, RequestMeta},
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct HospitalService {
    db: PgPool,
    audit: Arc<AuditService>,
}

impl HospitalService {
    pub fn new(db: PgPool, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    pub async fn create(
        &self,
        req: CreateHospitalRequest,
        actor: Uuid,
        meta: &RequestMeta,
    ) -> Result<Hospital, AppError> {
        let repo = HospitalRepository::new(self.db.clone());

        if repo.find_by_code(&req.code).await?.is_some() {
            return Err(AppError::Conflict(
                "Hospital code already exists".to_string(),
            ));
        }

        let hospital = repo.create(&req).await?;

        self.audit.log(
            AuditAction::CreateHospital,
            actor,
            Some(hospital.id),
            serde_json::json!({ "name": hospital.name, "code": hospital.code }),
            meta,
        );

        Ok(hospital)
    }

    pub async fn get(&self, id: &Uuid) -> Result<Hospital, AppError> {
        let repo = HospitalRepository::new(self.db.clone());
        repo.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital not found"))
    }

    /// 分页列出医院，返回当前页和总数
    pub async fn list(
        &self,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Hospital>, i64), AppError> {
        let repo = HospitalRepository::new(self.db.clone());
        let hospitals = repo.list(include_inactive, limit, offset).await?;
        let total = repo.count(include_inactive).await?;
        Ok((hospitals, total))
    }

    pub async fn update(
        &self,
        id: &Uuid,
        req: UpdateHospitalRequest,
        actor: Uuid,
        meta: &RequestMeta,
    ) -> Result<Hospital, AppError> {
        let repo = HospitalRepository::new(self.db.clone());

        let hospital = repo
            .update(id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital not found"))?;

        self.audit.log(
            AuditAction::UpdateHospital,
            actor,
            Some(hospital.id),
            serde_json::json!({ "name": hospital.name }),
            meta,
        );

        Ok(hospital)
    }

    /// 停用医院（软删除）
    pub async fn delete(&self, id: &Uuid, actor: Uuid, meta: &RequestMeta) -> Result<(), AppError> {
        let repo = HospitalRepository::new(self.db.clone());

        let hospital = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital not found"))?;

        repo.deactivate(id).await?;

        self.audit.log(
            AuditAction::DeleteHospital,
            actor,
            Some(hospital.id),
            serde_json::json!({ "name": hospital.name, "code": hospital.code }),
            meta,
        );

        Ok(())
    }
}
