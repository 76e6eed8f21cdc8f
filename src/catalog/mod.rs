//! catalog
//!
//! The label forest engine and the snippet index, running against a
//! [`GraphStore`] through a [`SessionPool`].
//!
//! # Components
//!
//! - [`resolver`] - Bare name to `(name, category)` resolution
//! - [`forest`] - Label creation, renaming, deletion, relinking and pruning
//! - [`reader`] - Tree reads with a depth bound
//! - [`navigator`] - Siblings, root paths and sibling forests
//! - [`snippets`] - Snippets, their label sets and the label-set queries
//! - [`translations`] - Per-extension renditions of snippets
//! - [`batch`] - Per-item outcomes of bulk operations
//! - [`error`] - The failure taxonomy
//!
//! # Units of work
//!
//! Every public operation acquires one session from the pool and holds it
//! until it returns, whatever the outcome. Bulk operations acquire one
//! session per item.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use msm::catalog::Catalog;
//! use msm::core::config::Config;
//! use msm::core::types::{Category, LabelName};
//! use msm::store::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let catalog = Catalog::open(Arc::new(MemoryStore::new()), &Config::default())
//!     .await
//!     .unwrap();
//! let name = LabelName::new("algorithms").unwrap();
//! catalog.forest().create_label(&name, Category::Concept, None).await.unwrap();
//!
//! let tree = catalog.reader().tree(&name, None, None).await.unwrap();
//! assert_eq!(tree.category, Category::Concept);
//! assert!(catalog.verify_forest().await.unwrap().ok);
//! # });
//! ```

pub mod batch;
pub mod error;
pub mod forest;
pub mod navigator;
pub mod reader;
pub mod resolver;
pub mod snippets;
pub mod translations;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use batch::{BatchReport, BatchStatus, ItemStatus, ParentOutcome, TreeOutcome};
pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use forest::{ForestMutator, ParentLink, PruneReport, SubtreeReport};
pub use navigator::{Navigator, RootPath, Siblings, SiblingsForest};
pub use reader::TreeReader;
pub use resolver::IdentityResolver;
pub use snippets::{RankedSnippet, SnippetDraft, SnippetIndex};
pub use translations::{SnippetWithTranslations, TranslationLedger};

use crate::core::config::Config;
use crate::core::verify::verify_forest;
use crate::store::{ClearReport, GraphStore, SessionPool};

/// Outcome of checking the stored forest against its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestReport {
    pub ok: bool,
    pub errors: Vec<String>,
}

/// Every catalog component over one shared pool.
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SessionPool,
    resolver: IdentityResolver,
    forest: ForestMutator,
    reader: TreeReader,
    navigator: Navigator,
    snippets: SnippetIndex,
    translations: TranslationLedger,
}

impl Catalog {
    /// Build a catalog over `pool` without touching the store.
    pub fn new(pool: SessionPool, config: &Config) -> Self {
        let reader = TreeReader::new(pool.clone(), config.default_max_depth());
        Self {
            resolver: IdentityResolver::new(pool.clone()),
            forest: ForestMutator::new(pool.clone()),
            navigator: Navigator::new(pool.clone(), reader.clone()),
            snippets: SnippetIndex::new(pool.clone()),
            translations: TranslationLedger::new(pool.clone()),
            reader,
            pool,
        }
    }

    /// Pool `store` per `config`, declare its uniqueness constraints and
    /// build a catalog over it.
    pub async fn open(store: Arc<dyn GraphStore>, config: &Config) -> CatalogResult<Self> {
        let pool = SessionPool::new(store, config.max_connections(), config.acquisition_timeout());
        {
            let session = pool.acquire().await?;
            session.ensure_constraints().await?;
        }
        info!(
            store = pool.store_name(),
            max_connections = pool.max_connections(),
            "catalog opened"
        );
        Ok(Self::new(pool, config))
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn forest(&self) -> &ForestMutator {
        &self.forest
    }

    pub fn reader(&self) -> &TreeReader {
        &self.reader
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn snippets(&self) -> &SnippetIndex {
        &self.snippets
    }

    pub fn translations(&self) -> &TranslationLedger {
        &self.translations
    }

    /// Round-trip to the store through a session.
    pub async fn ping(&self) -> CatalogResult<()> {
        let session = self.pool.acquire().await?;
        session.ping().await?;
        debug!(store = self.pool.store_name(), "ping ok");
        Ok(())
    }

    /// Delete every label, snippet and translation in one statement.
    pub async fn clear(&self) -> CatalogResult<ClearReport> {
        let session = self.pool.acquire().await?;
        let report = session.clear().await?;
        info!(
            labels = report.labels,
            snippets = report.snippets,
            translations = report.translations,
            "catalog cleared"
        );
        Ok(report)
    }

    /// Check the stored labels and edges for duplicate identities, extra
    /// parents, cross-category edges and cycles.
    pub async fn verify_forest(&self) -> CatalogResult<ForestReport> {
        let export = {
            let session = self.pool.acquire().await?;
            session.export_forest().await?
        };
        let result = verify_forest(&export.labels, &export.edges);
        if !result.ok {
            warn!(errors = result.errors.len(), "forest verification failed");
        }
        Ok(ForestReport {
            ok: result.ok,
            errors: result.errors.iter().map(ToString::to_string).collect(),
        })
    }
}
