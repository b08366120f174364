// API crate clippy configuration
// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Gymbook API Library
//!
//! HTTP components for the billing engine: application state, the error
//! mapping, the operator identity extractor, and the route tree.

pub mod error;
pub mod operator;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use operator::{OperatorContext, OPERATOR_HEADER};
pub use routes::create_router;
pub use state::AppState;
