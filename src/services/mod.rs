//! Business logic layer (业务逻辑层)

pub mod audit_service;
pub mod auth_service;
pub mod hospital_service;
pub mod resource_service;
pub mod staff_service;

pub use audit_service::{AuditService, RequestMeta};
pub use auth_service::AuthService;
pub use hospital_service::HospitalService;
pub use resource_service::ResourceService;
pub use staff_service::StaffService;
