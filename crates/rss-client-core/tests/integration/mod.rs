//! Integration tests: full protocol flows against the in-process committee

pub mod fault_test;
pub mod import_test;
pub mod refresh_test;
