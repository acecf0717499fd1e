//! Error Handling utilities
//!
//! Crate-wide error type and its HTTP mapping.

pub mod error;

pub use error::*;
