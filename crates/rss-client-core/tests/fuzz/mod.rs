//! Property-based tests

pub mod encoding_fuzz;
