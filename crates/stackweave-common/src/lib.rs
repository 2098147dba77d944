//! # stackweave-common
//!
//! Shared types, error definitions, composition settings, and constants
//! used across the entire stackweave workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives the composition layer and the
//! CLI build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
