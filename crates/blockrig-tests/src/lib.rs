//! Blockrig End-to-End Test Infrastructure
//!
//! This crate holds integration tests for the reconciliation pipeline:
//!
//! - Scenarios: spec + live state -> expected plan
//! - **Determinism**: identical inputs give byte-identical plans
//! - Properties: ordering and idempotence over generated rigs
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p blockrig-tests
//! ```
//!
//! ## Determinism Testing
//!
//! ```rust,ignore
//! use blockrig_tests::determinism::verify_plan_determinism;
//!
//! let result = verify_plan_determinism(&spec, &existing, PlanMode::Merge, 3);
//! result.assert_deterministic();
//! ```

pub mod determinism;
pub mod fixtures;

// Re-export commonly used items
pub use determinism::{
    compute_hash, verify_determinism, verify_plan_determinism, DeterminismResult,
};
pub use fixtures::{RigFixture, SpecBuilder};
