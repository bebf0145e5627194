//! DevConnector Backend Library
//!
//! Accounts, developer profiles and posts behind a signed-token access
//! guard. Exposed as a library for the binary and the integration tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
