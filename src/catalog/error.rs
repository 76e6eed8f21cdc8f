//! catalog::error
//!
//! The failure taxonomy every catalog operation reports.
//!
//! Business failures (`Validation` through `Structural`) are produced by the
//! catalog itself. Store and pool failures pass through unchanged, but
//! [`CatalogError::kind`] classifies store constraint rejections the same way
//! as the catalog's own pre-checks, so a caller that loses a race still sees
//! a conflict rather than a transport error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::tree::TreeError;
use crate::core::types::{Category, LabelName, TypeError};
use crate::store::{PoolError, StoreError};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed or incomplete input; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced label, snippet, translation or edge is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate identity, existing parent, or duplicate translation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A bare label name exists under more than one category.
    #[error(
        "label '{name}' exists in several categories ({}); specify a category",
        join_categories(.categories)
    )]
    AmbiguousName {
        name: LabelName,
        categories: Vec<Category>,
    },

    /// Parent/child or label-set categories disagree.
    #[error("category mismatch: {0}")]
    CategoryMismatch(String),

    /// The stored forest does not describe a single tree where it must.
    #[error("structural error: {0}")]
    Structural(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

fn join_categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<TypeError> for CatalogError {
    fn from(e: TypeError) -> Self {
        CatalogError::Validation(e.to_string())
    }
}

impl From<TreeError> for CatalogError {
    fn from(e: TreeError) -> Self {
        CatalogError::Structural(e.to_string())
    }
}

/// Stable classification of a [`CatalogError`], used in envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    AmbiguousName,
    CategoryMismatch,
    Structural,
    Unavailable,
}

impl ErrorKind {
    /// Get the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::AmbiguousName => "ambiguous_name",
            ErrorKind::CategoryMismatch => "category_mismatch",
            ErrorKind::Structural => "structural",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl CatalogError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Conflict(_) => ErrorKind::Conflict,
            CatalogError::AmbiguousName { .. } => ErrorKind::AmbiguousName,
            CatalogError::CategoryMismatch(_) => ErrorKind::CategoryMismatch,
            CatalogError::Structural(_) => ErrorKind::Structural,
            CatalogError::Store(StoreError::ConstraintViolation(_))
            | CatalogError::Store(StoreError::AlreadyParented { .. })
            | CatalogError::Store(StoreError::WouldCycle { .. }) => ErrorKind::Conflict,
            CatalogError::Store(StoreError::MissingNode(_)) => ErrorKind::NotFound,
            CatalogError::Store(StoreError::Unavailable(_)) | CatalogError::Pool(_) => {
                ErrorKind::Unavailable
            }
        }
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
