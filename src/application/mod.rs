//! Application layer: the publish workflow.

pub mod use_cases;
