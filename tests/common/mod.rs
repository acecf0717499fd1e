//! Common test utilities for wa-gateway

pub mod fixtures;

pub use fixtures::{peer, test_config, wait_until, with_policy};

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}
