//! Request and response bodies of the HTTP API
//!
//! Task and result bodies are the wire types in [`crate::types`]; only the
//! error body lives here.

pub mod errors;

pub use errors::ErrorResponse;
