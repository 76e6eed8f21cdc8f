//! catalog::resolver
//!
//! Resolve a bare label name to its category.
//!
//! Same-named labels may exist under different categories. Every operation
//! that accepts a bare name resolves it here first, so a query never mixes
//! categories by accident: an ambiguous name is an error, never a guess.

use tracing::debug;

use super::error::{CatalogError, CatalogResult};
use crate::core::types::{Category, LabelKey, LabelName};
use crate::store::{GraphStore, SessionPool};

/// Resolves label names to `(name, category)` identities.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    pool: SessionPool,
}

impl IdentityResolver {
    /// Create a resolver over `pool`.
    pub fn new(pool: SessionPool) -> Self {
        Self { pool }
    }

    /// Resolve `name`, trusting `category` when one is given.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no label has this name
    /// - [`CatalogError::AmbiguousName`] if several categories have it
    pub async fn resolve(
        &self,
        name: &LabelName,
        category: Option<Category>,
    ) -> CatalogResult<LabelKey> {
        if let Some(category) = category {
            return Ok(LabelKey::new(name.clone(), category));
        }
        let session = self.pool.acquire().await?;
        resolve_in(&*session, name).await
    }
}

/// Resolve `name` using an already-acquired store session.
pub(crate) async fn resolve_in(store: &dyn GraphStore, name: &LabelName) -> CatalogResult<LabelKey> {
    let categories = store.label_categories(name).await?;
    match categories.as_slice() {
        [] => Err(CatalogError::NotFound(format!("label '{name}'"))),
        [category] => Ok(LabelKey::new(name.clone(), *category)),
        _ => {
            debug!(%name, ?categories, "ambiguous label name");
            Err(CatalogError::AmbiguousName {
                name: name.clone(),
                categories,
            })
        }
    }
}

/// Resolve `name`, or take `category` as given.
pub(crate) async fn resolve_or(
    store: &dyn GraphStore,
    name: &LabelName,
    category: Option<Category>,
) -> CatalogResult<LabelKey> {
    match category {
        Some(category) => Ok(LabelKey::new(name.clone(), category)),
        None => resolve_in(store, name).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::error::ErrorKind;
    use crate::core::tree::FlatNode;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn n(s: &str) -> LabelName {
        LabelName::new(s).unwrap()
    }

    async fn resolver() -> IdentityResolver {
        let store = MemoryStore::new();
        store
            .insert_labels(Category::Concept, &[FlatNode::root(n("oop")), FlatNode::root(n("rust"))])
            .await
            .unwrap();
        store
            .insert_labels(Category::Language, &[FlatNode::root(n("rust"))])
            .await
            .unwrap();
        IdentityResolver::new(SessionPool::new(Arc::new(store), 4, Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn unique_name_resolves() {
        let key = resolver().await.resolve(&n("oop"), None).await.unwrap();
        assert_eq!(key.category, Category::Concept);
    }

    #[tokio::test]
    async fn missing_name_not_found() {
        let err = resolver().await.resolve(&n("cobol"), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn shared_name_is_ambiguous() {
        let err = resolver().await.resolve(&n("rust"), None).await.unwrap_err();
        match err {
            CatalogError::AmbiguousName { categories, .. } => {
                assert_eq!(categories, vec![Category::Concept, Category::Language]);
            }
            other => panic!("expected AmbiguousName, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn explicit_category_is_trusted() {
        let key = resolver()
            .await
            .resolve(&n("cobol"), Some(Category::Language))
            .await
            .unwrap();
        assert_eq!(key.category, Category::Language);
    }
}
