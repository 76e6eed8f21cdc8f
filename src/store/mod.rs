//! store
//!
//! The graph-store collaborator and the pool of units of work over it.
//!
//! # Modules
//!
//! - [`traits`] - The `GraphStore` trait, its records and `StoreError`
//! - [`pool`] - `SessionPool` and the RAII `Session`
//! - [`memory`] - `MemoryStore`, the in-process implementation
//!
//! The catalog never talks to a store directly: it acquires a `Session`
//! from the pool, which dereferences to the store and gives its slot back
//! when dropped.

pub mod memory;
pub mod pool;
pub mod traits;

pub use memory::{MemoryStore, StoreOp};
pub use pool::{PoolError, Session, SessionPool};
pub use traits::{
    ClearReport, ForestExport, GraphStore, LabelRecord, NewSnippet, SnippetRecord, StoreError,
    TranslationRecord,
};
