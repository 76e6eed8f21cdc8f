//! core
//!
//! Core domain types and pure algorithms for msm.
//!
//! # Modules
//!
//! - [`types`] - Strong types: LabelName, Category, SnippetName, etc.
//! - [`graph`] - In-memory forest with single-parent enforcement
//! - [`tree`] - Flattening tree input and rebuilding trees from traversals
//! - [`verify`] - Verification of forest invariants
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing here touches a store; all of it is deterministic

pub mod config;
pub mod graph;
pub mod tree;
pub mod types;
pub mod verify;
