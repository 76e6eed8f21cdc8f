//! store::memory
//!
//! In-process graph store.
//!
//! # Design
//!
//! Labels live in an arena keyed by a private `LabelId`; a `(name,
//! category)` index points into it, and a [`ForestGraph`] over the ids holds
//! the ParentOf edges. Snippets link to label ids, so renaming a label never
//! changes which snippets carry it.
//!
//! Every trait method locks the whole state once, which makes each call one
//! atomic statement the way a graph database runs a single query. For
//! tests, the store can be told to fail a given operation, and a
//! [`MemoryStore::recording`] store keeps the list of operations it ran.
//!
//! # Example
//!
//! ```
//! use msm::store::memory::{MemoryStore, StoreOp};
//! use msm::store::{GraphStore, StoreError};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::recording()
//!     .fail_on(StoreOp::Ping, StoreError::Unavailable("down".into()));
//!
//! assert!(store.ping().await.is_err());
//! assert_eq!(store.operations(), vec![StoreOp::Ping]);
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::traits::{
    ClearReport, ForestExport, GraphStore, LabelRecord, NewSnippet, SnippetRecord, StoreError,
    TranslationRecord,
};
use crate::core::graph::{AttachError, ForestGraph};
use crate::core::tree::{FlatNode, TraversalRow};
use crate::core::types::{
    Category, Extension, LabelKey, LabelName, MaxDepth, SnippetName, UtcTimestamp,
};

/// Identity of a stored label, stable across renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct LabelId(u64);

#[derive(Debug, Clone)]
struct LabelEntry {
    name: LabelName,
    category: Category,
}

#[derive(Debug, Clone)]
struct StoredSnippet {
    content: String,
    extension: Extension,
    created_at: UtcTimestamp,
    category: Category,
    labels: BTreeSet<LabelId>,
}

/// One `GraphStore` method, for fault injection and call recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Ping,
    EnsureConstraints,
    Clear,
    LabelCategories,
    ExistingLabels,
    InsertLabels,
    RenameLabel,
    DeleteLabel,
    ParentOf,
    ChildrenOf,
    AttachChild,
    DetachChild,
    Traverse,
    RootPaths,
    Roots,
    AllLabels,
    ExportForest,
    SnippetExists,
    InsertSnippet,
    GetSnippet,
    AllSnippets,
    SetSnippetContent,
    ReplaceSnippetLabels,
    DeleteSnippet,
    SnippetsTaggedAny,
    InsertTranslation,
    UpdateTranslation,
    DeleteTranslation,
    DeleteTranslations,
    Translations,
}

#[derive(Debug, Default)]
struct MemoryState {
    labels: BTreeMap<LabelId, LabelEntry>,
    index: BTreeMap<LabelKey, LabelId>,
    forest: ForestGraph<LabelId>,
    next_id: u64,
    snippets: BTreeMap<SnippetName, StoredSnippet>,
    translations: BTreeMap<(SnippetName, Extension), TranslationRecord>,
    constraints_declared: bool,
    fail_on: HashMap<StoreOp, StoreError>,
    /// `None` unless the store was built with [`MemoryStore::recording`]
    operations: Option<Vec<StoreOp>>,
}

/// In-memory `GraphStore`.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that records every operation it runs.
    pub fn recording() -> Self {
        let store = Self::default();
        store.state().operations = Some(Vec::new());
        store
    }

    /// Make every call of `op` fail with `error` until cleared.
    pub fn fail_on(self, op: StoreOp, error: StoreError) -> Self {
        self.state().fail_on.insert(op, error);
        self
    }

    /// Clear every configured failure.
    pub fn clear_fail_on(&self) {
        self.state().fail_on.clear();
    }

    /// Every operation received so far, in order. Always empty unless the
    /// store is [`recording`](Self::recording).
    pub fn operations(&self) -> Vec<StoreOp> {
        self.state().operations.clone().unwrap_or_default()
    }

    /// Whether `ensure_constraints` has run.
    pub fn constraints_declared(&self) -> bool {
        self.state().constraints_declared
    }

    /// Number of stored labels.
    pub fn label_count(&self) -> usize {
        self.state().labels.len()
    }

    /// Number of stored translations across all snippets.
    pub fn translation_count(&self) -> usize {
        self.state().translations.len()
    }

    /// Write a ParentOf edge without any checks, replacing an existing one.
    ///
    /// Simulates an out-of-band edit to the store; returns `false` if either
    /// label is absent.
    pub fn force_edge(&self, parent: &LabelKey, child: &LabelKey) -> bool {
        let mut state = self.state();
        let (Some(&parent), Some(&child)) = (state.index.get(parent), state.index.get(child))
        else {
            return false;
        };
        state.forest.insert_edge_unchecked(child, parent);
        true
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock, record `op`, and fail if configured to.
    fn begin(&self, op: StoreOp) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        let mut state = self.state();
        if let Some(operations) = state.operations.as_mut() {
            operations.push(op);
        }
        if let Some(error) = state.fail_on.get(&op).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

impl MemoryState {
    fn id_of(&self, name: &LabelName, category: Category) -> Option<LabelId> {
        self.index.get(&LabelKey::new(name.clone(), category)).copied()
    }

    fn require_id(&self, name: &LabelName, category: Category) -> Result<LabelId, StoreError> {
        self.id_of(name, category).ok_or_else(|| {
            StoreError::MissingNode(format!("label {}", LabelKey::new(name.clone(), category)))
        })
    }

    fn name_of(&self, id: LabelId) -> Option<&LabelName> {
        self.labels.get(&id).map(|entry| &entry.name)
    }

    fn key_of(&self, id: LabelId) -> Option<LabelKey> {
        self.labels
            .get(&id)
            .map(|entry| LabelKey::new(entry.name.clone(), entry.category))
    }

    fn resolve_all(
        &self,
        category: Category,
        names: &[LabelName],
    ) -> Result<BTreeSet<LabelId>, StoreError> {
        names
            .iter()
            .map(|name| self.require_id(name, category))
            .collect()
    }

    fn snippet_record(&self, name: &SnippetName, stored: &StoredSnippet) -> SnippetRecord {
        SnippetRecord {
            name: name.clone(),
            content: stored.content.clone(),
            extension: stored.extension.clone(),
            size: stored.content.chars().count(),
            created_at: stored.created_at.clone(),
            category: stored.category,
            metadata_names: stored
                .labels
                .iter()
                .filter_map(|id| self.name_of(*id).cloned())
                .collect(),
        }
    }

    fn label_record(&self, id: LabelId, entry: &LabelEntry) -> LabelRecord {
        LabelRecord {
            name: entry.name.clone(),
            category: entry.category,
            parent_name: self
                .forest
                .parent(&id)
                .and_then(|p| self.name_of(*p).cloned()),
        }
    }
}

fn by_category_then_name(a: &LabelKey, b: &LabelKey) -> std::cmp::Ordering {
    (a.category, &a.name).cmp(&(b.category, &b.name))
}

#[async_trait]
impl GraphStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.begin(StoreOp::Ping).map(|_| ())
    }

    async fn ensure_constraints(&self) -> Result<(), StoreError> {
        let mut state = self.begin(StoreOp::EnsureConstraints)?;
        state.constraints_declared = true;
        Ok(())
    }

    async fn clear(&self) -> Result<ClearReport, StoreError> {
        let mut state = self.begin(StoreOp::Clear)?;
        let report = ClearReport {
            labels: state.labels.len(),
            snippets: state.snippets.len(),
            translations: state.translations.len(),
        };
        state.labels.clear();
        state.index.clear();
        state.forest = ForestGraph::new();
        state.snippets.clear();
        state.translations.clear();
        Ok(report)
    }

    async fn label_categories(&self, name: &LabelName) -> Result<Vec<Category>, StoreError> {
        let state = self.begin(StoreOp::LabelCategories)?;
        Ok(Category::ALL
            .iter()
            .copied()
            .filter(|category| state.id_of(name, *category).is_some())
            .collect())
    }

    async fn existing_labels(
        &self,
        category: Category,
        names: &[LabelName],
    ) -> Result<Vec<LabelName>, StoreError> {
        let state = self.begin(StoreOp::ExistingLabels)?;
        Ok(names
            .iter()
            .filter(|name| state.id_of(name, category).is_some())
            .cloned()
            .collect())
    }

    async fn insert_labels(
        &self,
        category: Category,
        nodes: &[FlatNode],
    ) -> Result<(), StoreError> {
        let mut guard = self.begin(StoreOp::InsertLabels)?;
        let state = &mut *guard;

        // Check everything that can be checked before writing.
        let mut staged: HashMap<&LabelName, LabelId> = HashMap::with_capacity(nodes.len());
        for (offset, node) in nodes.iter().enumerate() {
            let key = LabelKey::new(node.name.clone(), category);
            if state.index.contains_key(&key) || staged.contains_key(&node.name) {
                return Err(StoreError::ConstraintViolation(format!("label {key} exists")));
            }
            staged.insert(&node.name, LabelId(state.next_id + offset as u64));
        }
        let mut edges = Vec::new();
        for node in nodes {
            let Some(parent) = &node.parent_name else {
                continue;
            };
            let parent_id = match staged.get(parent) {
                Some(id) => *id,
                None => state.require_id(parent, category)?,
            };
            edges.push((staged[&node.name], parent_id, parent, &node.name));
        }

        for id in staged.values() {
            state.forest.insert(*id);
        }
        for (child_id, parent_id, parent, child) in edges {
            if let Err(e) = state.forest.attach(child_id, parent_id) {
                // Only staged nodes were touched; removing them restores the forest.
                for id in staged.values() {
                    state.forest.remove(id);
                }
                return Err(StoreError::ConstraintViolation(format!(
                    "edge {parent} -> {child}: {e}"
                )));
            }
        }

        state.next_id += nodes.len() as u64;
        for node in nodes {
            let id = staged[&node.name];
            state.labels.insert(
                id,
                LabelEntry {
                    name: node.name.clone(),
                    category,
                },
            );
            state
                .index
                .insert(LabelKey::new(node.name.clone(), category), id);
        }
        Ok(())
    }

    async fn rename_label(
        &self,
        category: Category,
        old: &LabelName,
        new: &LabelName,
    ) -> Result<bool, StoreError> {
        let mut state = self.begin(StoreOp::RenameLabel)?;
        let Some(id) = state.id_of(old, category) else {
            return Ok(false);
        };
        let new_key = LabelKey::new(new.clone(), category);
        if old != new && state.index.contains_key(&new_key) {
            return Err(StoreError::ConstraintViolation(format!("label {new_key} exists")));
        }

        state.index.remove(&LabelKey::new(old.clone(), category));
        state.index.insert(new_key, id);
        if let Some(entry) = state.labels.get_mut(&id) {
            entry.name = new.clone();
        }
        Ok(true)
    }

    async fn delete_label(&self, key: &LabelKey) -> Result<bool, StoreError> {
        let mut state = self.begin(StoreOp::DeleteLabel)?;
        let Some(id) = state.index.remove(key) else {
            return Ok(false);
        };
        state.labels.remove(&id);
        state.forest.remove(&id);
        for snippet in state.snippets.values_mut() {
            snippet.labels.remove(&id);
        }
        Ok(true)
    }

    async fn parent_of(&self, key: &LabelKey) -> Result<Option<LabelName>, StoreError> {
        let state = self.begin(StoreOp::ParentOf)?;
        Ok(state
            .index
            .get(key)
            .and_then(|id| state.forest.parent(id))
            .and_then(|parent| state.name_of(*parent).cloned()))
    }

    async fn children_of(&self, key: &LabelKey) -> Result<Vec<LabelName>, StoreError> {
        let state = self.begin(StoreOp::ChildrenOf)?;
        let Some(id) = state.index.get(key) else {
            return Ok(Vec::new());
        };
        let mut names: Vec<LabelName> = state
            .forest
            .children(id)
            .filter_map(|child| state.name_of(*child).cloned())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn attach_child(
        &self,
        category: Category,
        parent: &LabelName,
        child: &LabelName,
    ) -> Result<(), StoreError> {
        let mut guard = self.begin(StoreOp::AttachChild)?;
        let state = &mut *guard;
        let parent_id = state.require_id(parent, category)?;
        let child_id = state.require_id(child, category)?;

        match state.forest.attach(child_id, parent_id) {
            Ok(()) => Ok(()),
            Err(AttachError::AlreadyParented { existing, .. }) => {
                Err(StoreError::AlreadyParented {
                    child: child.to_string(),
                    existing: state
                        .name_of(existing)
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                })
            }
            Err(AttachError::WouldCycle { .. }) => Err(StoreError::WouldCycle {
                parent: parent.to_string(),
                child: child.to_string(),
            }),
            Err(AttachError::UnknownNode(_)) => {
                Err(StoreError::MissingNode(format!("label {child} or {parent}")))
            }
        }
    }

    async fn detach_child(
        &self,
        category: Category,
        parent: &LabelName,
        child: &LabelName,
    ) -> Result<bool, StoreError> {
        let mut state = self.begin(StoreOp::DetachChild)?;
        let (Some(parent_id), Some(child_id)) =
            (state.id_of(parent, category), state.id_of(child, category))
        else {
            return Ok(false);
        };
        Ok(state.forest.detach(&parent_id, &child_id))
    }

    async fn traverse(
        &self,
        root: &LabelKey,
        max_depth: MaxDepth,
    ) -> Result<Vec<TraversalRow>, StoreError> {
        let state = self.begin(StoreOp::Traverse)?;
        let Some(root_id) = state.index.get(root) else {
            return Ok(Vec::new());
        };

        Ok(state
            .forest
            .walk(root_id, max_depth)
            .into_iter()
            .filter_map(|row| {
                let name = state.name_of(row.node)?.clone();
                let parent_name = row.parent.and_then(|p| state.name_of(p).cloned());
                Some(TraversalRow::new(name, row.depth, parent_name))
            })
            .collect())
    }

    async fn root_paths(&self, key: &LabelKey) -> Result<Vec<Vec<LabelName>>, StoreError> {
        let state = self.begin(StoreOp::RootPaths)?;
        let Some(id) = state.index.get(key) else {
            return Ok(Vec::new());
        };

        let chain = state.forest.path_from_root(id);
        let Some(top) = chain.first() else {
            return Ok(Vec::new());
        };
        // A chain whose top still has a parent is a cycle, not a root path.
        if state.forest.parent(top).is_some() {
            return Ok(Vec::new());
        }
        Ok(vec![chain
            .iter()
            .filter_map(|id| state.name_of(*id).cloned())
            .collect()])
    }

    async fn roots(&self) -> Result<Vec<LabelKey>, StoreError> {
        let state = self.begin(StoreOp::Roots)?;
        let mut roots: Vec<LabelKey> = state
            .forest
            .roots()
            .filter_map(|id| state.key_of(*id))
            .collect();
        roots.sort_by(by_category_then_name);
        Ok(roots)
    }

    async fn all_labels(&self) -> Result<Vec<LabelRecord>, StoreError> {
        let state = self.begin(StoreOp::AllLabels)?;
        let mut records: Vec<LabelRecord> = state
            .labels
            .iter()
            .map(|(id, entry)| state.label_record(*id, entry))
            .collect();
        records.sort_by(|a, b| (a.category, &a.name).cmp(&(b.category, &b.name)));
        Ok(records)
    }

    async fn export_forest(&self) -> Result<ForestExport, StoreError> {
        let state = self.begin(StoreOp::ExportForest)?;
        let labels = state.labels.keys().filter_map(|id| state.key_of(*id)).collect();
        let edges = state
            .forest
            .nodes()
            .filter_map(|child| {
                let parent = state.forest.parent(child)?;
                Some((state.key_of(*parent)?, state.key_of(*child)?))
            })
            .collect();
        Ok(ForestExport { labels, edges })
    }

    async fn snippet_exists(&self, name: &SnippetName) -> Result<bool, StoreError> {
        let state = self.begin(StoreOp::SnippetExists)?;
        Ok(state.snippets.contains_key(name))
    }

    async fn insert_snippet(&self, snippet: NewSnippet) -> Result<SnippetRecord, StoreError> {
        let mut state = self.begin(StoreOp::InsertSnippet)?;
        if state.snippets.contains_key(&snippet.name) {
            return Err(StoreError::ConstraintViolation(format!(
                "snippet {} exists",
                snippet.name
            )));
        }
        let labels = state.resolve_all(snippet.category, &snippet.labels)?;

        let stored = StoredSnippet {
            content: snippet.content,
            extension: snippet.extension,
            created_at: snippet.created_at,
            category: snippet.category,
            labels,
        };
        let record = state.snippet_record(&snippet.name, &stored);
        state.snippets.insert(snippet.name, stored);
        Ok(record)
    }

    async fn get_snippet(&self, name: &SnippetName) -> Result<Option<SnippetRecord>, StoreError> {
        let state = self.begin(StoreOp::GetSnippet)?;
        Ok(state
            .snippets
            .get(name)
            .map(|stored| state.snippet_record(name, stored)))
    }

    async fn all_snippets(&self) -> Result<Vec<SnippetRecord>, StoreError> {
        let state = self.begin(StoreOp::AllSnippets)?;
        Ok(state
            .snippets
            .iter()
            .map(|(name, stored)| state.snippet_record(name, stored))
            .collect())
    }

    async fn set_snippet_content(
        &self,
        name: &SnippetName,
        content: &str,
    ) -> Result<Option<SnippetRecord>, StoreError> {
        let mut state = self.begin(StoreOp::SetSnippetContent)?;
        let Some(stored) = state.snippets.get_mut(name) else {
            return Ok(None);
        };
        stored.content = content.to_string();
        let stored = stored.clone();
        Ok(Some(state.snippet_record(name, &stored)))
    }

    async fn replace_snippet_labels(
        &self,
        name: &SnippetName,
        category: Category,
        labels: &[LabelName],
    ) -> Result<Option<SnippetRecord>, StoreError> {
        let mut state = self.begin(StoreOp::ReplaceSnippetLabels)?;
        if !state.snippets.contains_key(name) {
            return Ok(None);
        }
        let ids = state.resolve_all(category, labels)?;

        let Some(stored) = state.snippets.get_mut(name) else {
            return Ok(None);
        };
        stored.labels = ids;
        stored.category = category;
        let stored = stored.clone();
        Ok(Some(state.snippet_record(name, &stored)))
    }

    async fn delete_snippet(&self, name: &SnippetName) -> Result<bool, StoreError> {
        let mut state = self.begin(StoreOp::DeleteSnippet)?;
        Ok(state.snippets.remove(name).is_some())
    }

    async fn snippets_tagged_any(
        &self,
        category: Category,
        labels: &[LabelName],
    ) -> Result<Vec<SnippetRecord>, StoreError> {
        let state = self.begin(StoreOp::SnippetsTaggedAny)?;
        let wanted: BTreeSet<LabelId> = labels
            .iter()
            .filter_map(|name| state.id_of(name, category))
            .collect();

        Ok(state
            .snippets
            .iter()
            .filter(|(_, stored)| !stored.labels.is_disjoint(&wanted))
            .map(|(name, stored)| state.snippet_record(name, stored))
            .collect())
    }

    async fn insert_translation(&self, record: TranslationRecord) -> Result<(), StoreError> {
        let mut state = self.begin(StoreOp::InsertTranslation)?;
        if !state.snippets.contains_key(&record.snippet_name) {
            return Err(StoreError::MissingNode(format!(
                "snippet {}",
                record.snippet_name
            )));
        }
        let key = (record.snippet_name.clone(), record.extension.clone());
        if state.translations.contains_key(&key) {
            return Err(StoreError::ConstraintViolation(format!(
                "translation {} .{} exists",
                key.0, key.1
            )));
        }
        state.translations.insert(key, record);
        Ok(())
    }

    async fn update_translation(
        &self,
        snippet: &SnippetName,
        extension: &Extension,
        content: &str,
    ) -> Result<Option<TranslationRecord>, StoreError> {
        let mut state = self.begin(StoreOp::UpdateTranslation)?;
        let key = (snippet.clone(), extension.clone());
        Ok(state.translations.get_mut(&key).map(|record| {
            record.content = content.to_string();
            record.translated_at = UtcTimestamp::now();
            record.clone()
        }))
    }

    async fn delete_translation(
        &self,
        snippet: &SnippetName,
        extension: &Extension,
    ) -> Result<bool, StoreError> {
        let mut state = self.begin(StoreOp::DeleteTranslation)?;
        let key = (snippet.clone(), extension.clone());
        Ok(state.translations.remove(&key).is_some())
    }

    async fn delete_translations(&self, snippet: &SnippetName) -> Result<usize, StoreError> {
        let mut state = self.begin(StoreOp::DeleteTranslations)?;
        let before = state.translations.len();
        state.translations.retain(|(owner, _), _| owner != snippet);
        Ok(before - state.translations.len())
    }

    async fn translations(
        &self,
        snippet: &SnippetName,
        extension: Option<&Extension>,
    ) -> Result<Vec<TranslationRecord>, StoreError> {
        let state = self.begin(StoreOp::Translations)?;
        Ok(state
            .translations
            .iter()
            .filter(|((owner, ext), _)| owner == snippet && extension.map_or(true, |e| e == ext))
            .map(|(_, record)| record.clone())
            .collect())
    }
}
