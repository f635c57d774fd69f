//! Shared Infrastructure
//!
//! Cross-cutting concerns used by every aggregate.

pub mod api_common;
pub mod error;
pub mod logging;
pub mod middleware;

pub use api_common::SuccessResponse;
pub use error::{ErrorResponse, PortalError, Result};
pub use middleware::{AppState, AuthLayer, Authenticated};
