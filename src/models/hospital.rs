//! Hospital domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Hospital record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    /// Unique short code, stored uppercase
    pub code: String,

    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,

    pub phone: String,
    pub email: String,
    pub website: Option<String>,

    pub total_beds: i32,
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create hospital request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHospitalRequest {
    #[validate(length(min = 1, max = 100, message = "Hospital name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "Hospital code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Zip code is required"))]
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    pub website: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Total beds cannot be negative"))]
    pub total_beds: i32,
}

fn default_country() -> String {
    "Pakistan".to_string()
}

/// Update hospital request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHospitalRequest {
    #[validate(length(min = 1, max = 100, message = "Hospital name cannot be empty"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub website: Option<String>,
    #[validate(range(min = 0, message = "Total beds cannot be negative"))]
    pub total_beds: Option<i32>,
    pub is_active: Option<bool>,
}
