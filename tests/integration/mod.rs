//! Integration tests for wa-gateway
//!
//! These tests drive the crate through its public API.

pub mod admission_tests;
pub mod config_tests;
pub mod http_tests;
pub mod webhook_pipeline_tests;
