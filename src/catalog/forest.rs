//! catalog::forest
//!
//! Structural mutations of the label forest.
//!
//! # Invariants
//!
//! - A label has at most one parent, of its own category
//! - `(name, category)` is unique
//! - Tree input is validated in full before anything is written, and each
//!   tree is written as one batch
//!
//! Bulk operations (`create_forest`, `add_parents`) run one item per
//! session. An item's failure is reported in its outcome and the batch
//! carries on; nothing already written is rolled back.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::batch::{BatchReport, ParentOutcome, TreeOutcome};
use super::error::{CatalogError, CatalogResult};
use super::reader::{containing_tree_in, tree_in};
use super::resolver::resolve_in;
use crate::core::tree::{
    first_duplicate, flatten, flatten_under, FlatNode, MetadataTree, TreeNode, MAX_INPUT_LEVELS,
};
use crate::core::types::{Category, LabelKey, LabelName, MaxDepth};
use crate::store::{GraphStore, LabelRecord, SessionPool, StoreError};

/// Result of adding children under an existing label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtreeReport {
    pub root_name: LabelName,
    pub category: Category,
    pub children_count: usize,
}

/// The two trees left after cutting an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub category: Category,
    pub parent_tree: TreeNode,
    pub child_tree: TreeNode,
}

/// A requested ParentOf edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParentLink {
    pub parent_name: LabelName,
    pub child_name: LabelName,
}

impl ParentLink {
    pub fn new(parent_name: LabelName, child_name: LabelName) -> Self {
        Self {
            parent_name,
            child_name,
        }
    }
}

/// Creates, renames, deletes and relinks labels.
#[derive(Debug, Clone)]
pub struct ForestMutator {
    pool: SessionPool,
}

impl ForestMutator {
    /// Create a mutator over `pool`.
    pub fn new(pool: SessionPool) -> Self {
        Self { pool }
    }

    /// Create one label, optionally under a parent of the same category.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Conflict`] if `(name, category)` exists
    /// - [`CatalogError::NotFound`] if the parent is not in `category`
    pub async fn create_label(
        &self,
        name: &LabelName,
        category: Category,
        parent: Option<&LabelName>,
    ) -> CatalogResult<LabelRecord> {
        debug!(%name, %category, ?parent, "create label");
        let session = self.pool.acquire().await?;

        if exists(&*session, category, name).await? {
            return Err(CatalogError::Conflict(format!(
                "label {} already exists",
                LabelKey::new(name.clone(), category)
            )));
        }
        if let Some(parent) = parent {
            if !exists(&*session, category, parent).await? {
                return Err(CatalogError::NotFound(format!(
                    "parent label {}",
                    LabelKey::new(parent.clone(), category)
                )));
            }
        }

        let node = FlatNode {
            name: name.clone(),
            parent_name: parent.cloned(),
        };
        session.insert_labels(category, &[node]).await?;
        info!(%name, %category, "label created");

        Ok(LabelRecord {
            name: name.clone(),
            category,
            parent_name: parent.cloned(),
        })
    }

    /// Rename a label in place. Its edges and snippet links are unchanged.
    pub async fn rename_label(
        &self,
        old: &LabelName,
        new: &LabelName,
        category: Category,
    ) -> CatalogResult<LabelRecord> {
        let session = self.pool.acquire().await?;
        let old_key = LabelKey::new(old.clone(), category);

        if !exists(&*session, category, old).await? {
            return Err(CatalogError::NotFound(format!("label {old_key}")));
        }
        if old != new && exists(&*session, category, new).await? {
            return Err(CatalogError::Conflict(format!(
                "label {} already exists",
                LabelKey::new(new.clone(), category)
            )));
        }
        if !session.rename_label(category, old, new).await? {
            return Err(CatalogError::NotFound(format!("label {old_key}")));
        }
        info!(%old, %new, %category, "label renamed");

        let new_key = LabelKey::new(new.clone(), category);
        Ok(LabelRecord {
            name: new.clone(),
            category,
            parent_name: session.parent_of(&new_key).await?,
        })
    }

    /// Delete labels, skipping absent ones. Children become roots.
    ///
    /// Returns how many labels were deleted.
    pub async fn delete_labels(&self, keys: &[LabelKey]) -> CatalogResult<usize> {
        let session = self.pool.acquire().await?;
        let mut deleted = 0;
        for key in keys {
            if session.delete_label(key).await? {
                deleted += 1;
            } else {
                debug!(label = %key, "delete skipped absent label");
            }
        }
        info!(requested = keys.len(), deleted, "labels deleted");
        Ok(deleted)
    }

    /// Create a whole tree of new labels.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] if a name repeats within `root` or it
    ///   is nested deeper than [`MAX_INPUT_LEVELS`]
    /// - [`CatalogError::Conflict`] if the root or any other name exists
    pub async fn create_tree(&self, category: Category, root: &TreeNode) -> CatalogResult<MetadataTree> {
        check_input_levels(std::slice::from_ref(root))?;
        let flat = flatten(root);
        if let Some(dup) = first_duplicate(&flat) {
            return Err(CatalogError::Validation(format!(
                "duplicate name '{dup}' in tree"
            )));
        }

        let session = self.pool.acquire().await?;
        if exists(&*session, category, &root.name).await? {
            return Err(CatalogError::Conflict(format!(
                "root label {} already exists",
                LabelKey::new(root.name.clone(), category)
            )));
        }
        reject_existing(&*session, category, &flat).await?;

        session.insert_labels(category, &flat).await?;
        info!(root = %root.name, %category, nodes = flat.len(), "tree created");
        Ok(MetadataTree {
            category,
            root: root.clone(),
        })
    }

    /// Create new labels below an existing label.
    ///
    /// The category is taken from `root_name`, which must resolve
    /// unambiguously.
    pub async fn create_subtree(
        &self,
        root_name: &LabelName,
        children: &[TreeNode],
    ) -> CatalogResult<SubtreeReport> {
        check_input_levels(children)?;
        let flat = flatten_under(root_name, children);
        if let Some(dup) = first_duplicate(&flat) {
            return Err(CatalogError::Validation(format!(
                "duplicate name '{dup}' in subtree"
            )));
        }

        let session = self.pool.acquire().await?;
        let root = resolve_in(&*session, root_name).await?;
        reject_existing(&*session, root.category, &flat).await?;

        if !flat.is_empty() {
            session.insert_labels(root.category, &flat).await?;
        }
        info!(root = %root, nodes = flat.len(), "subtree created");
        Ok(SubtreeReport {
            root_name: root_name.clone(),
            category: root.category,
            children_count: flat.len(),
        })
    }

    /// Create each tree independently.
    pub async fn create_forest(&self, trees: &[MetadataTree]) -> BatchReport<TreeOutcome> {
        let mut results = Vec::with_capacity(trees.len());
        for tree in trees {
            let outcome = match self.create_tree(tree.category, &tree.root).await {
                Ok(_) => TreeOutcome::created(tree.root.name.clone()),
                Err(e) => {
                    warn!(root = %tree.root.name, error = %e, "forest entry failed");
                    TreeOutcome::failed(tree.root.name.clone(), &e)
                }
            };
            results.push(outcome);
        }
        BatchReport::from_results(results)
    }

    /// Link each pair independently.
    pub async fn add_parents(&self, links: &[ParentLink]) -> BatchReport<ParentOutcome> {
        let mut results = Vec::with_capacity(links.len());
        for link in links {
            let outcome = match self.add_parent(&link.parent_name, &link.child_name).await {
                Ok(tree) => {
                    ParentOutcome::linked(link.parent_name.clone(), link.child_name.clone(), tree)
                }
                Err(e) => {
                    warn!(parent = %link.parent_name, child = %link.child_name, error = %e, "link failed");
                    ParentOutcome::failed(link.parent_name.clone(), link.child_name.clone(), &e)
                }
            };
            results.push(outcome);
        }
        BatchReport::from_results(results)
    }

    /// Make `parent` the parent of `child`, returning the parent's whole
    /// tree afterwards.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] / [`CatalogError::AmbiguousName`] from
    ///   resolving either name
    /// - [`CatalogError::CategoryMismatch`] if the categories differ
    /// - [`CatalogError::Conflict`] if the child already has a parent or
    ///   the link would close a cycle
    pub async fn add_parent(&self, parent: &LabelName, child: &LabelName) -> CatalogResult<TreeNode> {
        let session = self.pool.acquire().await?;
        let parent_key = resolve_in(&*session, parent).await?;
        let child_key = resolve_in(&*session, child).await?;
        same_category(&parent_key, &child_key)?;

        if let Some(existing) = session.parent_of(&child_key).await? {
            return Err(CatalogError::Conflict(format!(
                "'{child}' already has parent '{existing}'"
            )));
        }
        session
            .attach_child(parent_key.category, parent, child)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyParented { .. } | StoreError::WouldCycle { .. } => {
                    CatalogError::Conflict(e.to_string())
                }
                other => CatalogError::Store(other),
            })?;
        info!(%parent, %child, category = %parent_key.category, "parent linked");

        containing_tree_in(&*session, &parent_key).await
    }

    /// Cut the `parent -> child` edge; the child becomes a root.
    ///
    /// The two returned trees together hold exactly the nodes of the tree
    /// that contained the edge.
    pub async fn prune_branch(&self, parent: &LabelName, child: &LabelName) -> CatalogResult<PruneReport> {
        let session = self.pool.acquire().await?;
        let parent_key = resolve_in(&*session, parent).await?;
        let child_key = resolve_in(&*session, child).await?;
        same_category(&parent_key, &child_key)?;

        if !session.detach_child(parent_key.category, parent, child).await? {
            return Err(CatalogError::NotFound(format!(
                "no edge from '{parent}' to '{child}'"
            )));
        }
        info!(%parent, %child, category = %parent_key.category, "branch pruned");

        let parent_tree = containing_tree_in(&*session, &parent_key).await?;
        let child_tree = tree_in(&*session, &child_key, MaxDepth::Unbounded).await?;
        Ok(PruneReport {
            category: parent_key.category,
            parent_tree,
            child_tree,
        })
    }
}

async fn exists(store: &dyn GraphStore, category: Category, name: &LabelName) -> CatalogResult<bool> {
    let found = store
        .existing_labels(category, std::slice::from_ref(name))
        .await?;
    Ok(!found.is_empty())
}

async fn reject_existing(store: &dyn GraphStore, category: Category, flat: &[FlatNode]) -> CatalogResult<()> {
    let names: Vec<LabelName> = flat.iter().map(|node| node.name.clone()).collect();
    let taken = store.existing_labels(category, &names).await?;
    if taken.is_empty() {
        return Ok(());
    }
    let list = taken
        .iter()
        .map(LabelName::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(CatalogError::Conflict(format!(
        "labels already exist in {category}: {list}"
    )))
}

fn check_input_levels(trees: &[TreeNode]) -> CatalogResult<()> {
    let levels = trees.iter().map(|tree| tree.depth() + 1).max().unwrap_or(0);
    if levels > MAX_INPUT_LEVELS {
        return Err(CatalogError::Validation(format!(
            "tree input has {levels} levels, at most {MAX_INPUT_LEVELS} are accepted per request; \
             add deeper levels with create_metadata_subtree"
        )));
    }
    Ok(())
}

fn same_category(parent: &LabelKey, child: &LabelKey) -> CatalogResult<()> {
    if parent.category == child.category {
        return Ok(());
    }
    Err(CatalogError::CategoryMismatch(format!(
        "parent '{}' is {}, child '{}' is {}",
        parent.name, parent.category, child.name, child.category
    )))
}
