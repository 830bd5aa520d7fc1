//! Staff domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Staff role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Doctor,
    Nurse,
    Technician,
    Receptionist,
    AdminStaff,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Doctor => "doctor",
            StaffRole::Nurse => "nurse",
            StaffRole::Technician => "technician",
            StaffRole::Receptionist => "receptionist",
            StaffRole::AdminStaff => "admin_staff",
        }
    }
}

/// Staff member record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Uuid,
    /// Unique employee id, stored uppercase
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    /// Required for doctors
    pub specialization: Option<String>,
    pub department: String,
    pub hospital_id: Uuid,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create staff request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    #[validate(length(min = 1, message = "Employee ID is required"))]
    pub employee_id: String,
    #[validate(length(min = 1, max = 50, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required"))]
    pub last_name: String,
    pub role: StaffRole,
    pub specialization: Option<String>,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    pub hospital_id: Uuid,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

impl CreateStaffRequest {
    /// 医生必须填写专科方向
    pub fn validate_specialization(&self) -> Result<(), &'static str> {
        if self.role == StaffRole::Doctor
            && self.specialization.as_deref().map_or(true, |s| s.trim().is_empty())
        {
            return Err("Specialization is required for doctors");
        }
        Ok(())
    }
}

/// Update staff request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffRequest {
    #[validate(length(min = 1, max = 50, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    pub role: Option<StaffRole>,
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub is_active: Option<bool>,
}
