//! Tenant Aggregate

pub mod entity;
pub mod repository;

pub use entity::Tenant;
pub use repository::{MongoTenantDirectory, TenantDirectory};
