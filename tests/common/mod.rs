//! Common test utilities and helpers
//!
//! Fixtures build a throwaway project repository plus local bare "remote"
//! repositories, so every test runs offline.

#![allow(dead_code)]

pub mod assertion_helpers;
pub mod test_fixtures;
pub mod test_helpers;
