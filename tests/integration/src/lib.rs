//! Integration tests for the effort-verification pipeline
//!
//! This test suite validates:
//! - Session capture through proving, disclosure and reporting
//! - Backend fallback when the compiled circuit cannot be loaded
//! - Score agreement between the simulated and compiled backends
//! - Tamper detection on disclosures

pub mod test_utils;

#[cfg(test)]
mod session_pipeline_tests;

#[cfg(test)]
mod backend_fallback_tests;

#[cfg(test)]
mod disclosure_tamper_tests;
