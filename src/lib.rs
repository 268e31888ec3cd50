//! PSDL Inspector
//!
//! Core library for inspecting clinical monitoring scenarios written in PSDL:
//! structural validation, dependency outlines, certified audit bundles, and
//! LLM-assisted authoring with a self-correcting validation loop.

pub mod api;
pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
