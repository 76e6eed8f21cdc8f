//! store::traits
//!
//! The graph-store collaborator the catalog runs against.
//!
//! # Design
//!
//! The `GraphStore` trait is async because a real store sits behind a
//! network connection. Each method corresponds to one statement against the
//! store, so each call is atomic on its own but consecutive calls are not.
//! Batched writes (`insert_labels`, `insert_snippet`) take everything they
//! write in one argument so the store can apply them as a single statement.
//!
//! The store enforces the uniqueness constraints declared by
//! `ensure_constraints` and the single-parent check inside `attach_child`.
//! Everything else (category homogeneity, request validation, ambiguity)
//! is the catalog's job.
//!
//! # Example
//!
//! ```
//! use msm::core::types::{Category, LabelName};
//! use msm::core::tree::FlatNode;
//! use msm::store::{GraphStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let root = LabelName::new("programming").unwrap();
//! store
//!     .insert_labels(Category::Concept, &[FlatNode::root(root.clone())])
//!     .await
//!     .unwrap();
//!
//! let categories = store.label_categories(&root).await.unwrap();
//! assert_eq!(categories, vec![Category::Concept]);
//! # });
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::tree::{FlatNode, TraversalRow};
use crate::core::types::{Category, Extension, LabelKey, LabelName, MaxDepth, SnippetName, UtcTimestamp};

/// Errors from store operations.
///
/// These map to the failure modes of a graph database: a statement that
/// violates a declared constraint, a statement that references a node the
/// store cannot match, and transport-level failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The statement referenced a node that does not exist.
    #[error("node not found: {0}")]
    MissingNode(String),

    /// `attach_child` found the child already parented.
    #[error("{child} already has parent {existing}")]
    AlreadyParented { child: String, existing: String },

    /// `attach_child` would close a cycle.
    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCycle { parent: String, child: String },

    /// The store could not be reached or the statement failed in transit.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A label as stored, with its parent name if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub name: LabelName,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<LabelName>,
}

/// A snippet and the names of the labels its edges point at.
///
/// `metadata_names` is recomputed from the edges on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetRecord {
    pub name: SnippetName,
    pub content: String,
    pub extension: Extension,
    pub size: usize,
    pub created_at: UtcTimestamp,
    pub category: Category,
    pub metadata_names: BTreeSet<LabelName>,
}

/// Everything written by `insert_snippet` in one statement.
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub name: SnippetName,
    pub content: String,
    pub extension: Extension,
    pub category: Category,
    pub labels: Vec<LabelName>,
    pub created_at: UtcTimestamp,
}

/// An alternate rendition of a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub snippet_name: SnippetName,
    pub extension: Extension,
    pub content: String,
    pub translated_at: UtcTimestamp,
}

/// How much a `clear` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub labels: usize,
    pub snippets: usize,
    pub translations: usize,
}

/// Flat dump of the label forest used for verification.
#[derive(Debug, Clone, Default)]
pub struct ForestExport {
    pub labels: Vec<LabelKey>,
    /// `(parent, child)` pairs
    pub edges: Vec<(LabelKey, LabelKey)>,
}

/// The graph store the catalog consumes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single store is shared by every
/// session handed out by the pool.
///
/// # Error Handling
///
/// Lookups that can legitimately miss return `Option`/`bool`/empty
/// collections. `StoreError` is reserved for constraint rejections,
/// unmatched references inside a write, and transport failures.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short identifier for logs (e.g., "memory").
    fn name(&self) -> &'static str;

    /// Round-trip to the store.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Declare the uniqueness constraints on snippet name, label
    /// `(name, category)` and translation `(snippetName, extension)`.
    /// Idempotent.
    async fn ensure_constraints(&self) -> Result<(), StoreError>;

    /// Delete every label, snippet and translation. Declared constraints
    /// stay in place.
    async fn clear(&self) -> Result<ClearReport, StoreError>;

    // =========================================================================
    // Labels
    // =========================================================================

    /// Every category a label with this name exists under.
    async fn label_categories(&self, name: &LabelName) -> Result<Vec<Category>, StoreError>;

    /// The subset of `names` that exist under `category`.
    async fn existing_labels(
        &self,
        category: Category,
        names: &[LabelName],
    ) -> Result<Vec<LabelName>, StoreError>;

    /// Create every node, then every `parent_name` edge, in one statement.
    ///
    /// Fails with `ConstraintViolation` (writing nothing) if any node exists,
    /// and with `MissingNode` if a parent is neither in the batch nor stored.
    async fn insert_labels(&self, category: Category, nodes: &[FlatNode])
        -> Result<(), StoreError>;

    /// Rename in place. Returns `false` if `old` does not exist.
    async fn rename_label(
        &self,
        category: Category,
        old: &LabelName,
        new: &LabelName,
    ) -> Result<bool, StoreError>;

    /// Detach and delete. Returns `false` if the label does not exist.
    async fn delete_label(&self, key: &LabelKey) -> Result<bool, StoreError>;

    /// Name of the label's parent, if any.
    async fn parent_of(&self, key: &LabelKey) -> Result<Option<LabelName>, StoreError>;

    /// Names of the label's children, sorted.
    async fn children_of(&self, key: &LabelKey) -> Result<Vec<LabelName>, StoreError>;

    /// Create the `parent -> child` edge if the child has no parent.
    ///
    /// The check and the write are one statement.
    async fn attach_child(
        &self,
        category: Category,
        parent: &LabelName,
        child: &LabelName,
    ) -> Result<(), StoreError>;

    /// Delete the `parent -> child` edge. Returns `false` if absent.
    async fn detach_child(
        &self,
        category: Category,
        parent: &LabelName,
        child: &LabelName,
    ) -> Result<bool, StoreError>;

    /// Every node reachable from `root` within `max_depth`, with its depth
    /// and the name of its predecessor on the path. Ordered by depth.
    async fn traverse(
        &self,
        root: &LabelKey,
        max_depth: MaxDepth,
    ) -> Result<Vec<TraversalRow>, StoreError>;

    /// Every chain from a zero-parent label down to `key`, root first.
    async fn root_paths(&self, key: &LabelKey) -> Result<Vec<Vec<LabelName>>, StoreError>;

    /// Every zero-parent label, ordered by category then name.
    async fn roots(&self) -> Result<Vec<LabelKey>, StoreError>;

    /// Every label with its parent, ordered by category then name.
    async fn all_labels(&self) -> Result<Vec<LabelRecord>, StoreError>;

    /// Every label and every edge as stored.
    async fn export_forest(&self) -> Result<ForestExport, StoreError>;

    // =========================================================================
    // Snippets
    // =========================================================================

    async fn snippet_exists(&self, name: &SnippetName) -> Result<bool, StoreError>;

    /// Create the snippet and one edge per label in one statement.
    async fn insert_snippet(&self, snippet: NewSnippet) -> Result<SnippetRecord, StoreError>;

    async fn get_snippet(&self, name: &SnippetName) -> Result<Option<SnippetRecord>, StoreError>;

    /// Every snippet, ordered by name.
    async fn all_snippets(&self) -> Result<Vec<SnippetRecord>, StoreError>;

    /// Replace content and size. Returns `None` if the snippet is absent.
    async fn set_snippet_content(
        &self,
        name: &SnippetName,
        content: &str,
    ) -> Result<Option<SnippetRecord>, StoreError>;

    /// Drop every label edge and create the new set in one statement.
    async fn replace_snippet_labels(
        &self,
        name: &SnippetName,
        category: Category,
        labels: &[LabelName],
    ) -> Result<Option<SnippetRecord>, StoreError>;

    /// Detach and delete. Returns `false` if the snippet is absent.
    async fn delete_snippet(&self, name: &SnippetName) -> Result<bool, StoreError>;

    /// Every snippet with at least one edge to `labels` under `category`.
    async fn snippets_tagged_any(
        &self,
        category: Category,
        labels: &[LabelName],
    ) -> Result<Vec<SnippetRecord>, StoreError>;

    // =========================================================================
    // Translations
    // =========================================================================

    /// Fails with `ConstraintViolation` on a duplicate pair and
    /// `MissingNode` if the snippet is absent.
    async fn insert_translation(&self, record: TranslationRecord) -> Result<(), StoreError>;

    async fn update_translation(
        &self,
        snippet: &SnippetName,
        extension: &Extension,
        content: &str,
    ) -> Result<Option<TranslationRecord>, StoreError>;

    async fn delete_translation(
        &self,
        snippet: &SnippetName,
        extension: &Extension,
    ) -> Result<bool, StoreError>;

    /// Delete every translation of `snippet`, returning how many went.
    async fn delete_translations(&self, snippet: &SnippetName) -> Result<usize, StoreError>;

    /// Translations of `snippet`, optionally one extension, ordered by extension.
    async fn translations(
        &self,
        snippet: &SnippetName,
        extension: Option<&Extension>,
    ) -> Result<Vec<TranslationRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        assert_eq!(
            StoreError::ConstraintViolation("label python (concept)".into()).to_string(),
            "constraint violation: label python (concept)"
        );
        assert_eq!(
            StoreError::AlreadyParented {
                child: "oop".into(),
                existing: "paradigms".into()
            }
            .to_string(),
            "oop already has parent paradigms"
        );
        assert_eq!(
            StoreError::Unavailable("connection refused".into()).to_string(),
            "store unavailable: connection refused"
        );
    }

    #[test]
    fn label_record_omits_missing_parent() {
        let record = LabelRecord {
            name: LabelName::new("rust").unwrap(),
            category: Category::Language,
            parent_name: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"name": "rust", "category": "language"}));
    }
}
