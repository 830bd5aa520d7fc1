//! 资源服务：库存计数的唯一写入口
//! Every write re-validates the count invariant against the merged state,
//! then persists, audits, and pushes the change to subscribers in that order.

use crate::{
    error::AppError,
    models::audit::AuditAction,
    models::resource::*,
    realtime::{EventBus, RealtimeEvent, ResourceAction},
    repository::{resource_repo::NewResource, HospitalRepository, ResourceRepository},
    services::audit_service::{AuditService, RequestMeta},
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct ResourceService {
    db: PgPool,
    audit: Arc<AuditService>,
    event_bus: EventBus,
}

impl ResourceService {
    pub fn new(db: PgPool, audit: Arc<AuditService>, event_bus: EventBus) -> Self {
        Self {
            db,
            audit,
            event_bus,
        }
    }

    /// 创建资源记录；同一医院同一类型同一类别只允许一条
    pub async fn create(
        &self,
        req: CreateResourceRequest,
        actor: Uuid,
        meta: &RequestMeta,
    ) -> Result<ResourceResponse, AppError> {
        validate_counts(req.total, req.available, req.occupied, req.maintenance)
            .map_err(|msg| AppError::BadRequest(msg.to_string()))?;

        let hospital_repo = HospitalRepository::new(self.db.clone());
        hospital_repo
            .find_by_id(&req.hospital_id)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital not found"))?;

        let repo = ResourceRepository::new(self.db.clone());
        let resource_type = req.resource_type.as_str();
        let category = req.category.as_str();

        if repo
            .find_duplicate(&req.hospital_id, resource_type, category)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "This resource type already exists for this hospital. Please update existing resource."
                    .to_string(),
            ));
        }

        let resource = repo
            .create(NewResource {
                hospital_id: req.hospital_id,
                resource_type,
                category,
                total: req.total,
                available: req.available,
                occupied: req.occupied,
                maintenance: req.maintenance,
                floor: req.floor.as_deref(),
                wing: req.wing.as_deref(),
                ward: req.ward.as_deref(),
                updated_by: actor,
            })
            .await?;

        self.audit.log(
            AuditAction::CreateResource,
            actor,
            Some(resource.hospital_id),
            serde_json::json!({
                "resourceId": resource.id,
                "resourceType": resource.resource_type,
                "category": resource.category,
            }),
            meta,
        );

        self.notify(&resource, ResourceAction::Create);

        Ok(ResourceResponse::from(resource))
    }

    pub async fn get(&self, id: &Uuid) -> Result<ResourceResponse, AppError> {
        let repo = ResourceRepository::new(self.db.clone());
        let resource = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;

        Ok(ResourceResponse::from(resource))
    }

    /// 分页列出资源，返回当前页和满足过滤条件的总数
    pub async fn list(
        &self,
        resource_type: Option<&str>,
        hospital_id: Option<&Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ResourceResponse>, i64), AppError> {
        let repo = ResourceRepository::new(self.db.clone());
        let resources = repo.list(resource_type, hospital_id, limit, offset).await?;
        let total = repo.count(resource_type, hospital_id).await?;
        Ok((
            resources.into_iter().map(ResourceResponse::from).collect(),
            total,
        ))
    }

    pub async fn list_by_hospital(
        &self,
        hospital_id: &Uuid,
    ) -> Result<Vec<ResourceResponse>, AppError> {
        let repo = ResourceRepository::new(self.db.clone());
        let resources = repo.list_by_hospital(hospital_id).await?;
        Ok(resources.into_iter().map(ResourceResponse::from).collect())
    }

    /// 全量更新。hospital_id 不允许迁移，请求中的值被静默忽略
    pub async fn update(
        &self,
        id: &Uuid,
        req: UpdateResourceRequest,
        actor: Uuid,
        meta: &RequestMeta,
    ) -> Result<ResourceResponse, AppError> {
        let repo = ResourceRepository::new(self.db.clone());

        let existing = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;

        // 合并后的计数整体校验，不信任客户端
        let total = req.total.unwrap_or(existing.total);
        let available = req.available.unwrap_or(existing.available);
        let occupied = req.occupied.unwrap_or(existing.occupied);
        let maintenance = req.maintenance.unwrap_or(existing.maintenance);

        validate_counts(total, available, occupied, maintenance)
            .map_err(|msg| AppError::BadRequest(msg.to_string()))?;

        let resource = repo
            .update(
                id,
                req.resource_type.map(|t| t.as_str()),
                req.category.map(|c| c.as_str()),
                total,
                available,
                occupied,
                maintenance,
                req.floor.as_deref(),
                req.wing.as_deref(),
                req.ward.as_deref(),
                actor,
            )
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;

        self.audit.log(
            AuditAction::UpdateResource,
            actor,
            Some(resource.hospital_id),
            serde_json::json!({
                "resourceId": resource.id,
                "resourceType": resource.resource_type,
            }),
            meta,
        );

        self.notify(&resource, ResourceAction::Update);

        Ok(ResourceResponse::from(resource))
    }

    /// 只调整可用/占用/维护计数，total 保持不变
    pub async fn update_availability(
        &self,
        id: &Uuid,
        req: UpdateAvailabilityRequest,
        actor: Uuid,
        meta: &RequestMeta,
    ) -> Result<ResourceResponse, AppError> {
        let repo = ResourceRepository::new(self.db.clone());

        let existing = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;

        let available = req.available.unwrap_or(existing.available);
        let occupied = req.occupied.unwrap_or(existing.occupied);
        let maintenance = req.maintenance.unwrap_or(existing.maintenance);

        validate_counts(existing.total, available, occupied, maintenance)
            .map_err(|msg| AppError::BadRequest(msg.to_string()))?;

        let resource = repo
            .update_counts(id, available, occupied, maintenance, actor)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;

        self.audit.log(
            AuditAction::UpdateAvailability,
            actor,
            Some(resource.hospital_id),
            serde_json::json!({
                "resourceId": resource.id,
                "available": resource.available,
                "occupied": resource.occupied,
                "maintenance": resource.maintenance,
            }),
            meta,
        );

        self.notify(&resource, ResourceAction::Update);

        Ok(ResourceResponse::from(resource))
    }

    pub async fn delete(&self, id: &Uuid, actor: Uuid, meta: &RequestMeta) -> Result<(), AppError> {
        let repo = ResourceRepository::new(self.db.clone());

        let resource = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;

        repo.delete(id).await?;

        self.audit.log(
            AuditAction::DeleteResource,
            actor,
            Some(resource.hospital_id),
            serde_json::json!({
                "resourceId": resource.id,
                "resourceType": resource.resource_type,
            }),
            meta,
        );

        self.notify(&resource, ResourceAction::Delete);

        Ok(())
    }

    /// 推送给该医院的订阅者。推送失败不影响已完成的写入
    fn notify(&self, resource: &Resource, action: ResourceAction) {
        let payload = match serde_json::to_value(ResourceResponse::from(resource.clone())) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Failed to serialize resource event payload: {}", e);
                return;
            }
        };

        let _ = self.event_bus.publish(RealtimeEvent::ResourceChanged {
            hospital_id: resource.hospital_id,
            action,
            resource: payload,
        });
    }
}
