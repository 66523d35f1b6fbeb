//! Shared test utilities for the footprint tile workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Footprint fixtures with known counts and heights
//! - An in-memory spatial engine
//! - A skip macro for tests that need a live PostGIS database
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod memory;

pub use fixtures::*;
pub use memory::{decode_ids, MemoryEngine};

/// Environment variable naming the PostGIS database used by integration tests.
pub const TEST_DATABASE_URL_VAR: &str = "TEST_DATABASE_URL";

/// Macro to skip a test if no test database is configured.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_database;
///
/// #[tokio::test]
/// async fn test_against_postgis() {
///     let url = require_database!();
///     // Test code using url...
/// }
/// ```
///
/// If `TEST_DATABASE_URL` is unset, the test prints a skip message and returns early.
#[macro_export]
macro_rules! require_database {
    () => {{
        match std::env::var($crate::TEST_DATABASE_URL_VAR) {
            Ok(url) if !url.is_empty() => url,
            _ => {
                eprintln!(
                    "SKIPPED: {} not set. Point it at a PostGIS database to run this test.",
                    $crate::TEST_DATABASE_URL_VAR
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
