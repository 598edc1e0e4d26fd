//! Shared utilities: error type, result helpers, placeholder templates and
//! verbosity.

pub mod error;
pub mod result;
pub mod templates;
pub mod verbosity;
