//! Test utilities for KvLite integration tests
//!
//! Every fixture owns its own temporary data root, so tests can run in
//! parallel without sharing files.

pub mod store_fixture;
