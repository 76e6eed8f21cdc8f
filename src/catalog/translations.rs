//! catalog::translations
//!
//! Alternate renditions of a snippet, one per extension.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{CatalogError, CatalogResult};
use crate::core::types::{Extension, SnippetName, UtcTimestamp};
use crate::store::{SessionPool, SnippetRecord, StoreError, TranslationRecord};

/// A snippet together with its translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetWithTranslations {
    pub snippet: SnippetRecord,
    pub translations: Vec<TranslationRecord>,
}

/// CRUD over translations keyed by `(snippet, extension)`.
#[derive(Debug, Clone)]
pub struct TranslationLedger {
    pool: SessionPool,
}

impl TranslationLedger {
    pub fn new(pool: SessionPool) -> Self {
        Self { pool }
    }

    /// Add a translation.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if the snippet is absent
    /// - [`CatalogError::Conflict`] if the snippet already has this extension
    pub async fn create(
        &self,
        snippet: &SnippetName,
        extension: &Extension,
        content: &str,
    ) -> CatalogResult<TranslationRecord> {
        let session = self.pool.acquire().await?;
        if !session.snippet_exists(snippet).await? {
            return Err(snippet_not_found(snippet));
        }
        if !session.translations(snippet, Some(extension)).await?.is_empty() {
            return Err(CatalogError::Conflict(format!(
                "snippet '{snippet}' already has a '{extension}' translation"
            )));
        }

        let record = TranslationRecord {
            snippet_name: snippet.clone(),
            extension: extension.clone(),
            content: content.to_string(),
            translated_at: UtcTimestamp::now(),
        };
        session
            .insert_translation(record.clone())
            .await
            .map_err(|e| match e {
                StoreError::MissingNode(_) => snippet_not_found(snippet),
                StoreError::ConstraintViolation(msg) => CatalogError::Conflict(msg),
                other => CatalogError::Store(other),
            })?;
        info!(%snippet, %extension, "translation created");
        Ok(record)
    }

    /// Replace a translation's content.
    pub async fn update(
        &self,
        snippet: &SnippetName,
        extension: &Extension,
        content: &str,
    ) -> CatalogResult<TranslationRecord> {
        let session = self.pool.acquire().await?;
        let record = session
            .update_translation(snippet, extension, content)
            .await?
            .ok_or_else(|| translation_not_found(snippet, extension))?;
        info!(%snippet, %extension, "translation updated");
        Ok(record)
    }

    pub async fn delete(&self, snippet: &SnippetName, extension: &Extension) -> CatalogResult<()> {
        let session = self.pool.acquire().await?;
        if !session.delete_translation(snippet, extension).await? {
            return Err(translation_not_found(snippet, extension));
        }
        info!(%snippet, %extension, "translation deleted");
        Ok(())
    }

    /// Translations of a snippet, optionally only one extension.
    ///
    /// An absent snippet is [`CatalogError::NotFound`]; a present snippet
    /// without matching translations gives an empty list.
    pub async fn list(
        &self,
        snippet: &SnippetName,
        extension: Option<&Extension>,
    ) -> CatalogResult<Vec<TranslationRecord>> {
        let session = self.pool.acquire().await?;
        if !session.snippet_exists(snippet).await? {
            return Err(snippet_not_found(snippet));
        }
        Ok(session.translations(snippet, extension).await?)
    }

    /// The snippet view plus its translations, read on one session.
    pub async fn snippet_with_translations(
        &self,
        snippet: &SnippetName,
        extension: Option<&Extension>,
    ) -> CatalogResult<SnippetWithTranslations> {
        let session = self.pool.acquire().await?;
        let record = session
            .get_snippet(snippet)
            .await?
            .ok_or_else(|| snippet_not_found(snippet))?;
        let translations = session.translations(snippet, extension).await?;
        Ok(SnippetWithTranslations {
            snippet: record,
            translations,
        })
    }
}

fn snippet_not_found(name: &SnippetName) -> CatalogError {
    CatalogError::NotFound(format!("snippet '{name}'"))
}

fn translation_not_found(snippet: &SnippetName, extension: &Extension) -> CatalogError {
    CatalogError::NotFound(format!("translation '{extension}' of snippet '{snippet}'"))
}
