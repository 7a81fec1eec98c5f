//! Stickwork End-to-End Test Infrastructure
//!
//! Shared fixtures and a determinism harness for the integration tests in
//! `tests/`.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p stickwork-tests
//! ```

pub mod determinism;
pub mod fixtures;
