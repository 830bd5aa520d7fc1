//! Domain models

pub mod admin;
pub mod audit;
pub mod hospital;
pub mod resource;
pub mod staff;
