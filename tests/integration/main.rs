//! Integration tests for the listing indexer
//!
//! These tests stand up a mock search endpoint with wiremock and run the
//! collectors end-to-end against both storage backends.

mod collect_tests;
