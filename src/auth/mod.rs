//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtService, TokenPair};
pub use middleware::{auth_middleware, extract_token, AuthContext};
pub use password::PasswordHasher;
