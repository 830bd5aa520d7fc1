//! HTTP handlers (HTTP 处理器)

pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod hospital;
pub mod resource;
pub mod staff;
pub mod stream;
