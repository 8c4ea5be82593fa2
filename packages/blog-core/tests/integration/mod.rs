//! Integration tests for the blog store.
//!
//! 1. Fixture loading from disk
//! 2. Snapshot persistence round trips and corruption detection

mod fixture_tests;
mod persistence_tests;
