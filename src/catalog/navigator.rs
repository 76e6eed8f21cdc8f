//! catalog::navigator
//!
//! Sibling and path queries around one label.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{CatalogError, CatalogResult};
use super::reader::{select_root_path, TreeReader};
use super::resolver::resolve_or;
use crate::core::tree::TreeNode;
use crate::core::types::{Category, LabelKey, LabelName, MaxDepth};
use crate::store::SessionPool;

/// Labels sharing a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Siblings {
    pub category: Category,
    pub siblings: Vec<LabelName>,
}

/// Chain of names from a root down to a label, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootPath {
    pub category: Category,
    pub path: Vec<LabelName>,
}

/// The trees of a label and all of its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingsForest {
    pub category: Category,
    pub forest: Vec<TreeNode>,
}

/// Answers sibling and path queries.
#[derive(Debug, Clone)]
pub struct Navigator {
    pool: SessionPool,
    reader: TreeReader,
}

impl Navigator {
    /// Create a navigator; sibling forests are read through `reader`.
    pub fn new(pool: SessionPool, reader: TreeReader) -> Self {
        Self { pool, reader }
    }

    /// Every label with the same parent as `name`, itself included.
    ///
    /// A root has no parent, so its only sibling is itself.
    pub async fn siblings(
        &self,
        name: &LabelName,
        category: Option<Category>,
    ) -> CatalogResult<Siblings> {
        let session = self.pool.acquire().await?;
        let key = resolve_or(&*session, name, category).await?;
        // Resolution with an explicit category does not prove existence.
        if session.existing_labels(key.category, std::slice::from_ref(name)).await?.is_empty() {
            return Err(CatalogError::NotFound(format!("label {key}")));
        }

        let siblings = match session.parent_of(&key).await? {
            None => vec![name.clone()],
            Some(parent) => {
                session
                    .children_of(&LabelKey::new(parent, key.category))
                    .await?
            }
        };
        debug!(label = %key, count = siblings.len(), "siblings");
        Ok(Siblings {
            category: key.category,
            siblings,
        })
    }

    /// The names from the root of `name`'s tree down to `name`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if the label is absent
    /// - [`CatalogError::Structural`] if the store reports no chain or
    ///   several conflicting ones
    pub async fn path_to_root(
        &self,
        name: &LabelName,
        category: Option<Category>,
    ) -> CatalogResult<RootPath> {
        let session = self.pool.acquire().await?;
        let key = resolve_or(&*session, name, category).await?;
        if session.existing_labels(key.category, std::slice::from_ref(name)).await?.is_empty() {
            return Err(CatalogError::NotFound(format!("label {key}")));
        }
        let chains = session.root_paths(&key).await?;
        let path = select_root_path(&key, chains)?;
        Ok(RootPath {
            category: key.category,
            path,
        })
    }

    /// The tree of `name` and of each of its siblings, each read on its
    /// own session.
    pub async fn siblings_forest(
        &self,
        name: &LabelName,
        category: Option<Category>,
        max_depth: Option<MaxDepth>,
    ) -> CatalogResult<SiblingsForest> {
        let Siblings { category, siblings } = self.siblings(name, category).await?;

        let mut forest = Vec::with_capacity(siblings.len());
        for sibling in &siblings {
            let tree = self.reader.tree(sibling, Some(category), max_depth).await?;
            forest.push(tree.root);
        }
        Ok(SiblingsForest { category, forest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::error::ErrorKind;
    use crate::core::tree::FlatNode;
    use crate::store::{GraphStore, MemoryStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn n(s: &str) -> LabelName {
        LabelName::new(s).unwrap()
    }

    async fn navigator() -> Navigator {
        // paradigms
        // ├── oop
        // │   └── classes
        // ├── functional
        // └── logic
        let store = MemoryStore::new();
        store
            .insert_labels(
                Category::Concept,
                &[
                    FlatNode::root(n("paradigms")),
                    FlatNode::child(n("oop"), n("paradigms")),
                    FlatNode::child(n("classes"), n("oop")),
                    FlatNode::child(n("functional"), n("paradigms")),
                    FlatNode::child(n("logic"), n("paradigms")),
                ],
            )
            .await
            .unwrap();
        let pool = SessionPool::new(Arc::new(store), 4, Duration::from_secs(1));
        Navigator::new(pool.clone(), TreeReader::new(pool, MaxDepth::Unbounded))
    }

    #[tokio::test]
    async fn siblings_share_parent() {
        let nav = navigator().await;
        let result = nav.siblings(&n("oop"), None).await.unwrap();
        assert_eq!(result.category, Category::Concept);
        assert_eq!(result.siblings, vec![n("functional"), n("logic"), n("oop")]);
    }

    #[tokio::test]
    async fn root_is_its_own_sibling() {
        let nav = navigator().await;
        let result = nav.siblings(&n("paradigms"), None).await.unwrap();
        assert_eq!(result.siblings, vec![n("paradigms")]);
    }

    #[tokio::test]
    async fn siblings_of_missing_label() {
        let nav = navigator().await;
        let err = nav
            .siblings(&n("ghost"), Some(Category::Concept))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn path_is_root_first() {
        let nav = navigator().await;
        let result = nav.path_to_root(&n("classes"), None).await.unwrap();
        assert_eq!(result.path, vec![n("paradigms"), n("oop"), n("classes")]);

        let result = nav.path_to_root(&n("paradigms"), None).await.unwrap();
        assert_eq!(result.path, vec![n("paradigms")]);
    }

    #[tokio::test]
    async fn siblings_forest_holds_full_subtrees() {
        let nav = navigator().await;
        let result = nav.siblings_forest(&n("logic"), None, None).await.unwrap();
        let names: Vec<&str> = result.forest.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["functional", "logic", "oop"]);
        let oop = &result.forest[2];
        assert_eq!(oop.children, vec![TreeNode::leaf(n("classes"))]);
    }

    #[tokio::test]
    async fn siblings_forest_respects_depth() {
        let nav = navigator().await;
        let result = nav
            .siblings_forest(&n("oop"), None, Some(MaxDepth::Limited(0)))
            .await
            .unwrap();
        assert!(result.forest.iter().all(|t| t.children.is_empty()));
    }

    #[tokio::test]
    async fn cycle_makes_path_structural() {
        let store = MemoryStore::new();
        store
            .insert_labels(
                Category::Concept,
                &[FlatNode::root(n("a")), FlatNode::child(n("b"), n("a"))],
            )
            .await
            .unwrap();
        let a = LabelKey::new(n("a"), Category::Concept);
        let b = LabelKey::new(n("b"), Category::Concept);
        assert!(store.force_edge(&b, &a));
        assert!(store.roots().await.unwrap().is_empty());

        let pool = SessionPool::new(Arc::new(store), 1, Duration::from_secs(1));
        let nav = Navigator::new(pool.clone(), TreeReader::new(pool, MaxDepth::Unbounded));
        let err = nav.path_to_root(&n("b"), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }
}
