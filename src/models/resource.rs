//! Resource inventory domain models
//! Owns the count invariant: available <= total and
//! available + occupied + maintenance <= total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const SUM_EXCEEDS_TOTAL: &str =
    "Sum of available, occupied, and maintenance cannot exceed total";
pub const AVAILABLE_EXCEEDS_TOTAL: &str = "Available count cannot exceed total count";

/// Resource type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Bed,
    IcuBed,
    Ventilator,
    EmergencyWard,
    Ambulance,
    OxygenCylinder,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Bed => "bed",
            ResourceType::IcuBed => "icu_bed",
            ResourceType::Ventilator => "ventilator",
            ResourceType::EmergencyWard => "emergency_ward",
            ResourceType::Ambulance => "ambulance",
            ResourceType::OxygenCylinder => "oxygen_cylinder",
        }
    }
}

/// Resource category
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    #[default]
    General,
    CriticalCare,
    Emergency,
    Pediatric,
    Maternity,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::General => "general",
            ResourceCategory::CriticalCare => "critical_care",
            ResourceCategory::Emergency => "emergency",
            ResourceCategory::Pediatric => "pediatric",
            ResourceCategory::Maternity => "maternity",
        }
    }
}

/// Derived status bucket based on availability percentage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Unavailable,
    Critical,
    Low,
    Available,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Unavailable => "unavailable",
            ResourceStatus::Critical => "critical",
            ResourceStatus::Low => "low",
            ResourceStatus::Available => "available",
        }
    }
}

/// 校验计数不变式；调用方不得信任客户端计算的和
pub fn validate_counts(
    total: i32,
    available: i32,
    occupied: i32,
    maintenance: i32,
) -> Result<(), &'static str> {
    if total < 0 || available < 0 || occupied < 0 || maintenance < 0 {
        return Err("Counts cannot be negative");
    }
    if available > total {
        return Err(AVAILABLE_EXCEEDS_TOTAL);
    }
    if available + occupied + maintenance > total {
        return Err(SUM_EXCEEDS_TOTAL);
    }
    Ok(())
}

/// Resource inventory record, one per (hospital, type, category)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub resource_type: String,
    pub category: String,

    pub total: i32,
    pub available: i32,
    pub occupied: i32,
    pub maintenance: i32,

    pub floor: Option<String>,
    pub wing: Option<String>,
    pub ward: Option<String>,

    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// 可用率百分比（total=0 时为 0）
    pub fn availability_percentage(&self) -> i32 {
        if self.total > 0 {
            ((self.available as f64 / self.total as f64) * 100.0).round() as i32
        } else {
            0
        }
    }

    /// 状态分类。total=0 直接归为 unavailable，
    /// 避免 0% 被错误地落入 critical 区间
    pub fn status(&self) -> ResourceStatus {
        if self.total == 0 {
            return ResourceStatus::Unavailable;
        }
        let percentage = self.availability_percentage();
        if percentage == 0 {
            ResourceStatus::Unavailable
        } else if percentage <= 20 {
            ResourceStatus::Critical
        } else if percentage <= 50 {
            ResourceStatus::Low
        } else {
            ResourceStatus::Available
        }
    }
}

/// Create resource request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    pub hospital_id: Uuid,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub category: ResourceCategory,
    #[validate(range(min = 0, message = "Total cannot be negative"))]
    pub total: i32,
    #[validate(range(min = 0, message = "Available count cannot be negative"))]
    pub available: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Occupied count cannot be negative"))]
    pub occupied: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Maintenance count cannot be negative"))]
    pub maintenance: i32,
    pub floor: Option<String>,
    pub wing: Option<String>,
    pub ward: Option<String>,
}

/// Full update request. A hospital change is silently dropped, never an error.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[serde(default)]
    pub hospital_id: Option<Uuid>,
    pub resource_type: Option<ResourceType>,
    pub category: Option<ResourceCategory>,
    #[validate(range(min = 0, message = "Total cannot be negative"))]
    pub total: Option<i32>,
    #[validate(range(min = 0, message = "Available count cannot be negative"))]
    pub available: Option<i32>,
    #[validate(range(min = 0, message = "Occupied count cannot be negative"))]
    pub occupied: Option<i32>,
    #[validate(range(min = 0, message = "Maintenance count cannot be negative"))]
    pub maintenance: Option<i32>,
    pub floor: Option<String>,
    pub wing: Option<String>,
    pub ward: Option<String>,
}

/// Availability-only patch
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAvailabilityRequest {
    #[validate(range(min = 0, message = "Available count cannot be negative"))]
    pub available: Option<i32>,
    #[validate(range(min = 0, message = "Occupied count cannot be negative"))]
    pub occupied: Option<i32>,
    #[validate(range(min = 0, message = "Maintenance count cannot be negative"))]
    pub maintenance: Option<i32>,
}

/// Resource response with derived fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub resource_type: String,
    pub category: String,
    pub total: i32,
    pub available: i32,
    pub occupied: i32,
    pub maintenance: i32,
    pub availability_percentage: i32,
    pub status: String,
    pub floor: Option<String>,
    pub wing: Option<String>,
    pub ward: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl From<Resource> for ResourceResponse {
    fn from(r: Resource) -> Self {
        let availability_percentage = r.availability_percentage();
        let status = r.status().as_str().to_string();
        Self {
            id: r.id,
            hospital_id: r.hospital_id,
            resource_type: r.resource_type,
            category: r.category,
            total: r.total,
            available: r.available,
            occupied: r.occupied,
            maintenance: r.maintenance,
            availability_percentage,
            status,
            floor: r.floor,
            wing: r.wing,
            ward: r.ward,
            last_updated: r.last_updated,
            updated_by: r.updated_by,
        }
    }
}
