//! Profile Aggregate
//!
//! Authorization-side user records: role, tenant binding, status, and the
//! forced-reset flag.

pub mod entity;
pub mod repository;

pub use entity::{Profile, ProfileStatus, Role};
pub use repository::{MongoProfileStore, ProfileStore};
