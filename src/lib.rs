//! msm - a categorized label forest and the snippets tagged by it
//!
//! Labels ("metadata") live in one of a fixed set of categories and form a
//! forest inside it. Snippets are named pieces of content tagged with a set
//! of labels from a single category, and can carry translations into other
//! extensions.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`core`] - Domain types, tree flattening and reconstruction, forest
//!   verification, configuration
//! - [`store`] - The graph store the catalog runs against, and the pool of
//!   units of work over it
//! - [`catalog`] - Forest mutations, tree reads, navigation, the snippet
//!   index and translations
//! - [`tools`] - One named tool per catalog operation, with uniform envelopes
//! - [`cli`] - Command-line interface layer
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! msm maintains the following invariants after every successful mutation:
//!
//! 1. `(name, category)` identifies a label; a name identifies a snippet;
//!    `(snippet, extension)` identifies a translation
//! 2. Every label has at most one parent, and it shares the label's category
//! 3. A snippet's label set is non-empty and within one category
//! 4. Walking down from the roots reaches every label exactly once

pub mod catalog;
pub mod cli;
pub mod core;
pub mod store;
pub mod tools;
pub mod ui;
