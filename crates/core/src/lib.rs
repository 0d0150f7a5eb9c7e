//! Core business logic for followers-rs.

pub mod services;

pub use services::*;
