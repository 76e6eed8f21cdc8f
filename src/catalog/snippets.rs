//! catalog::snippets
//!
//! Snippets tagged with category-homogeneous label sets, and the two
//! label-set queries over them.
//!
//! # Label sets
//!
//! Every write and query takes a category plus a non-empty list of label
//! names. Each name must resolve in that category; a request whose
//! resolved count falls short of its length is rejected before anything is
//! written or matched.
//!
//! # Queries
//!
//! - [`SnippetIndex::subset_match`]: snippets carrying every requested
//!   label, fewest total labels first
//! - [`SnippetIndex::intersection_match`]: snippets carrying any requested
//!   label, most overlap first

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{CatalogError, CatalogResult};
use crate::core::types::{Category, Extension, LabelName, SnippetName, UtcTimestamp};
use crate::store::{GraphStore, NewSnippet, SessionPool, SnippetRecord};

/// A snippet with how many of the requested labels it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSnippet {
    #[serde(flatten)]
    pub snippet: SnippetRecord,
    pub match_count: usize,
}

/// Fields of a snippet to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetDraft {
    pub name: SnippetName,
    pub content: String,
    pub extension: Extension,
    pub category: Category,
    pub labels: Vec<LabelName>,
}

/// Creates, updates, deletes and queries snippets.
#[derive(Debug, Clone)]
pub struct SnippetIndex {
    pool: SessionPool,
}

impl SnippetIndex {
    /// Create an index over `pool`.
    pub fn new(pool: SessionPool) -> Self {
        Self { pool }
    }

    /// Create a snippet and its label edges in one write.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] if the label list is empty, repeats a
    ///   name, or names a label absent from the category
    /// - [`CatalogError::Conflict`] if the snippet name is taken
    pub async fn create(&self, draft: SnippetDraft) -> CatalogResult<SnippetRecord> {
        check_label_list(&draft.labels)?;
        debug!(snippet = %draft.name, category = %draft.category, "create snippet");
        let session = self.pool.acquire().await?;

        if session.snippet_exists(&draft.name).await? {
            return Err(CatalogError::Conflict(format!(
                "snippet '{}' already exists",
                draft.name
            )));
        }
        require_resolved(&*session, draft.category, &draft.labels).await?;

        let record = session
            .insert_snippet(NewSnippet {
                name: draft.name,
                content: draft.content,
                extension: draft.extension,
                category: draft.category,
                labels: draft.labels,
                created_at: UtcTimestamp::now(),
            })
            .await?;
        info!(snippet = %record.name, labels = record.metadata_names.len(), "snippet created");
        Ok(record)
    }

    /// Look a snippet up by name.
    pub async fn get(&self, name: &SnippetName) -> CatalogResult<SnippetRecord> {
        let session = self.pool.acquire().await?;
        session
            .get_snippet(name)
            .await?
            .ok_or_else(|| snippet_not_found(name))
    }

    /// Replace a snippet's content; its size follows.
    pub async fn update_content(&self, name: &SnippetName, content: &str) -> CatalogResult<SnippetRecord> {
        let session = self.pool.acquire().await?;
        let record = session
            .set_snippet_content(name, content)
            .await?
            .ok_or_else(|| snippet_not_found(name))?;
        info!(snippet = %name, size = record.size, "snippet content updated");
        Ok(record)
    }

    /// Replace a snippet's whole label set, possibly moving it to another
    /// category.
    pub async fn update_labels(
        &self,
        name: &SnippetName,
        category: Category,
        labels: &[LabelName],
    ) -> CatalogResult<SnippetRecord> {
        check_label_list(labels)?;
        let session = self.pool.acquire().await?;

        if !session.snippet_exists(name).await? {
            return Err(snippet_not_found(name));
        }
        require_resolved(&*session, category, labels).await?;

        let record = session
            .replace_snippet_labels(name, category, labels)
            .await?
            .ok_or_else(|| snippet_not_found(name))?;
        info!(snippet = %name, %category, labels = labels.len(), "snippet labels replaced");
        Ok(record)
    }

    /// Delete snippets and their translations, skipping absent names.
    ///
    /// Returns how many snippets were deleted.
    pub async fn delete(&self, names: &[SnippetName]) -> CatalogResult<usize> {
        let session = self.pool.acquire().await?;
        let mut deleted = 0;
        for name in names {
            if !session.snippet_exists(name).await? {
                debug!(snippet = %name, "delete skipped absent snippet");
                continue;
            }
            let wiped = session.delete_translations(name).await?;
            if session.delete_snippet(name).await? {
                deleted += 1;
                debug!(snippet = %name, translations = wiped, "snippet deleted");
            }
        }
        info!(requested = names.len(), deleted, "snippets deleted");
        Ok(deleted)
    }

    /// Every snippet, ordered by name.
    pub async fn all(&self) -> CatalogResult<Vec<SnippetRecord>> {
        let session = self.pool.acquire().await?;
        Ok(session.all_snippets().await?)
    }

    /// Snippets whose labels include every requested label.
    ///
    /// Sorted ascending by total label count, so the most specific matches
    /// come first.
    pub async fn subset_match(
        &self,
        labels: &[LabelName],
        category: Category,
    ) -> CatalogResult<Vec<SnippetRecord>> {
        check_label_list(labels)?;
        let session = self.pool.acquire().await?;
        require_resolved(&*session, category, labels).await?;

        let wanted: BTreeSet<&LabelName> = labels.iter().collect();
        let mut matches: Vec<SnippetRecord> = session
            .snippets_tagged_any(category, labels)
            .await?
            .into_iter()
            .filter(|snippet| wanted.iter().all(|label| snippet.metadata_names.contains(*label)))
            .collect();
        matches.sort_by_key(|snippet| snippet.metadata_names.len());
        debug!(%category, requested = labels.len(), matched = matches.len(), "subset match");
        Ok(matches)
    }

    /// Snippets sharing at least one requested label, most overlap first.
    pub async fn intersection_match(
        &self,
        labels: &[LabelName],
        category: Category,
    ) -> CatalogResult<Vec<RankedSnippet>> {
        check_label_list(labels)?;
        let session = self.pool.acquire().await?;
        require_resolved(&*session, category, labels).await?;

        let mut ranked: Vec<RankedSnippet> = session
            .snippets_tagged_any(category, labels)
            .await?
            .into_iter()
            .filter_map(|snippet| {
                let match_count = labels
                    .iter()
                    .filter(|label| snippet.metadata_names.contains(*label))
                    .count();
                (match_count > 0).then_some(RankedSnippet {
                    snippet,
                    match_count,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.match_count.cmp(&a.match_count));
        debug!(%category, requested = labels.len(), matched = ranked.len(), "intersection match");
        Ok(ranked)
    }
}

fn snippet_not_found(name: &SnippetName) -> CatalogError {
    CatalogError::NotFound(format!("snippet '{name}'"))
}

/// Reject empty label lists and repeated names.
fn check_label_list(labels: &[LabelName]) -> CatalogResult<()> {
    if labels.is_empty() {
        return Err(CatalogError::Validation(
            "at least one label name is required".into(),
        ));
    }
    let mut seen = HashSet::with_capacity(labels.len());
    if let Some(dup) = labels.iter().find(|name| !seen.insert(*name)) {
        return Err(CatalogError::Validation(format!(
            "label '{dup}' is listed more than once"
        )));
    }
    Ok(())
}

/// Every name in `labels` must exist in `category`.
async fn require_resolved(store: &dyn GraphStore, category: Category, labels: &[LabelName]) -> CatalogResult<()> {
    let found = store.existing_labels(category, labels).await?;
    if found.len() == labels.len() {
        return Ok(());
    }
    let found: HashSet<&LabelName> = found.iter().collect();
    let missing = labels
        .iter()
        .filter(|name| !found.contains(name))
        .map(LabelName::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(CatalogError::Validation(format!(
        "labels not found in {category}: {missing}"
    )))
}
