//! # Middleware Modules
//!
//! Tower layers wrapped around the whole router: request tracing and CORS.
//! Authentication lives in [`crate::auth`] because it only guards `/api/v1`.

pub mod cors;
pub mod tracing_layer;
