//! DevConnector Shared Library
//!
//! This crate contains the API request/response types, request validation
//! and client-facing error messages shared by the backend and its clients.

pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
