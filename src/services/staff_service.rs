//! 人员服务

use crate::{
    error::AppError,
    models::audit::AuditAction,
    models::staff::*,
    repository::{HospitalRepository, StaffRepository},
    services::audit_service::{AuditService, RequestMeta},
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct StaffService {
    db: PgPool,
    audit: Arc<AuditService>,
}

impl StaffService {
    pub fn new(db: PgPool, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    pub async fn create(
        &self,
        req: CreateStaffRequest,
        actor: Uuid,
        meta: &RequestMeta,
    ) -> Result<Staff, AppError> {
        req.validate_specialization()
            .map_err(|msg| AppError::BadRequest(msg.to_string()))?;

        let hospital_repo = HospitalRepository::new(self.db.clone());
        hospital_repo
            .find_by_id(&req.hospital_id)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital not found"))?;

        let repo = StaffRepository::new(self.db.clone());

        if repo.find_by_employee_id(&req.employee_id).await?.is_some() {
            return Err(AppError::Conflict("Employee ID already exists".to_string()));
        }

        let staff = repo.create(&req).await?;

        self.audit.log(
            AuditAction::CreateStaff,
            actor,
            Some(staff.hospital_id),
            serde_json::json!({
                "staffId": staff.id,
                "employeeId": staff.employee_id,
                "role": staff.role,
            }),
            meta,
        );

        Ok(staff)
    }

    pub async fn get(&self, id: &Uuid) -> Result<Staff, AppError> {
        let repo = StaffRepository::new(self.db.clone());
        repo.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Staff member not found"))
    }

    /// 分页列出员工，返回当前页和满足过滤条件的总数
    pub async fn list(
        &self,
        hospital_id: Option<&Uuid>,
        role: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Staff>, i64), AppError> {
        let repo = StaffRepository::new(self.db.clone());
        let staff = repo.list(hospital_id, role, limit, offset).await?;
        let total = repo.count(hospital_id, role).await?;
        Ok((staff, total))
    }

    pub async fn list_by_hospital(&self, hospital_id: &Uuid) -> Result<Vec<Staff>, AppError> {
        let repo = StaffRepository::new(self.db.clone());
        repo.list_by_hospital(hospital_id).await
    }

    pub async fn update(
        &self,
        id: &Uuid,
        req: UpdateStaffRequest,
        actor: Uuid,
        meta: &RequestMeta,
    ) -> Result<Staff, AppError> {
        let repo = StaffRepository::new(self.db.clone());

        // 角色改为医生时同样要求专科方向
        if let Some(StaffRole::Doctor) = req.role {
            let existing = repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found("Staff member not found"))?;

            let specialization = req
                .specialization
                .as_deref()
                .or(existing.specialization.as_deref());
            if specialization.map_or(true, |s| s.trim().is_empty()) {
                return Err(AppError::BadRequest(
                    "Specialization is required for doctors".to_string(),
                ));
            }
        }

        let staff = repo
            .update(id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("Staff member not found"))?;

        self.audit.log(
            AuditAction::UpdateStaff,
            actor,
            Some(staff.hospital_id),
            serde_json::json!({ "staffId": staff.id, "employeeId": staff.employee_id }),
            meta,
        );

        Ok(staff)
    }

    /// 停用员工（软删除）
    pub async fn delete(&self, id: &Uuid, actor: Uuid, meta: &RequestMeta) -> Result<(), AppError> {
        let repo = StaffRepository::new(self.db.clone());

        let staff = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Staff member not found"))?;

        repo.deactivate(id).await?;

        self.audit.log(
            AuditAction::DeleteStaff,
            actor,
            Some(staff.hospital_id),
            serde_json::json!({ "staffId": staff.id, "employeeId": staff.employee_id }),
            meta,
        );

        Ok(())
    }
}
