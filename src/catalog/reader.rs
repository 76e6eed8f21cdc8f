//! catalog::reader
//!
//! Tree reads: one tree, several trees, or the whole forest.
//!
//! The depth bound is passed down to the store's traversal, so it limits
//! how much is fetched and not just how much is shown. Rows that do not
//! form exactly one tree surface as [`CatalogError::Structural`], which is
//! kept distinct from a missing label.

use tracing::{debug, warn};

use super::error::{CatalogError, CatalogResult};
use super::resolver::resolve_or;
use crate::core::tree::{assemble, MetadataTree, TreeNode};
use crate::core::types::{Category, LabelKey, LabelName, MaxDepth};
use crate::store::{GraphStore, LabelRecord, SessionPool};

/// Reads label trees.
#[derive(Debug, Clone)]
pub struct TreeReader {
    pool: SessionPool,
    default_depth: MaxDepth,
}

impl TreeReader {
    /// Create a reader; `default_depth` applies when a call gives no bound.
    pub fn new(pool: SessionPool, default_depth: MaxDepth) -> Self {
        Self {
            pool,
            default_depth,
        }
    }

    /// The tree rooted at `name`.
    ///
    /// `name` need not be a forest root; any label can root a read.
    pub async fn tree(
        &self,
        name: &LabelName,
        category: Option<Category>,
        max_depth: Option<MaxDepth>,
    ) -> CatalogResult<MetadataTree> {
        let depth = max_depth.unwrap_or(self.default_depth);
        debug!(%name, %depth, "reading tree");
        let session = self.pool.acquire().await?;
        let key = resolve_or(&*session, name, category).await?;
        let root = tree_in(&*session, &key, depth).await?;
        Ok(MetadataTree {
            category: key.category,
            root,
        })
    }

    /// One tree per name, each read on its own session.
    ///
    /// The first failure is returned.
    pub async fn forest(
        &self,
        names: &[LabelName],
        max_depth: Option<MaxDepth>,
    ) -> CatalogResult<Vec<MetadataTree>> {
        let mut trees = Vec::with_capacity(names.len());
        for name in names {
            trees.push(self.tree(name, None, max_depth).await?);
        }
        Ok(trees)
    }

    /// The tree of every root, ordered by category then name.
    pub async fn whole_forest(&self, max_depth: Option<MaxDepth>) -> CatalogResult<Vec<MetadataTree>> {
        let roots = {
            let session = self.pool.acquire().await?;
            session.roots().await?
        };
        debug!(count = roots.len(), "reading whole forest");

        let mut trees = Vec::with_capacity(roots.len());
        for root in roots {
            trees.push(self.tree(&root.name, Some(root.category), max_depth).await?);
        }
        Ok(trees)
    }

    /// Every label with its parent, ordered by category then name.
    pub async fn all_labels(&self) -> CatalogResult<Vec<LabelRecord>> {
        let session = self.pool.acquire().await?;
        Ok(session.all_labels().await?)
    }
}

/// Read and assemble the tree rooted at `key`.
pub(crate) async fn tree_in(
    store: &dyn GraphStore,
    key: &LabelKey,
    max_depth: MaxDepth,
) -> CatalogResult<TreeNode> {
    let rows = store.traverse(key, max_depth).await?;
    if rows.is_empty() {
        return Err(CatalogError::NotFound(format!("label {key}")));
    }
    assemble(rows).map_err(|e| {
        warn!(label = %key, error = %e, "traversal did not form a tree");
        CatalogError::from(e)
    })
}

/// Pick the single root-to-label chain out of what the store reported.
///
/// In a valid forest there is exactly one chain. No chain, or several
/// different chains of the greatest length, means the stored edges are
/// broken and nothing trustworthy can be returned.
pub fn select_root_path(
    label: &LabelKey,
    mut chains: Vec<Vec<LabelName>>,
) -> CatalogResult<Vec<LabelName>> {
    let Some(longest) = chains.iter().map(Vec::len).max() else {
        return Err(CatalogError::Structural(format!(
            "no chain from a root reaches {label}"
        )));
    };
    chains.retain(|chain| chain.len() == longest);
    chains.sort();
    chains.dedup();
    if chains.len() > 1 {
        warn!(%label, candidates = chains.len(), "several longest root paths");
        return Err(CatalogError::Structural(format!(
            "{} different root paths reach {label}",
            chains.len()
        )));
    }
    chains
        .pop()
        .ok_or_else(|| CatalogError::Structural(format!("no chain from a root reaches {label}")))
}

/// The whole tree `key` belongs to, read from its root.
pub(crate) async fn containing_tree_in(
    store: &dyn GraphStore,
    key: &LabelKey,
) -> CatalogResult<TreeNode> {
    let chains = store.root_paths(key).await?;
    let path = select_root_path(key, chains)?;
    let root = match path.first() {
        Some(root) => LabelKey::new(root.clone(), key.category),
        None => return Err(CatalogError::Structural(format!("empty root path for {key}"))),
    };
    tree_in(store, &root, MaxDepth::Unbounded).await
}
