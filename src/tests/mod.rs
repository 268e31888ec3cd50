//! Crate-internal test suites
//!
//! - `unit`: provider adapters against a mock HTTP server
//! - `integration`: generation sessions with scripted providers
//! - `property`: outline invariants with proptest
//! - `mocks`: shared test doubles

mod mocks;
