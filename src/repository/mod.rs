//! Data access layer (数据访问层)

pub mod admin_repo;
pub mod audit_repo;
pub mod hospital_repo;
pub mod resource_repo;
pub mod staff_repo;

pub use admin_repo::AdminRepository;
pub use audit_repo::AuditRepository;
pub use hospital_repo::HospitalRepository;
pub use resource_repo::ResourceRepository;
pub use staff_repo::StaffRepository;
