//! CLI command implementations

pub mod json_output;
pub mod normalize;
pub mod plan;

mod reporting;
