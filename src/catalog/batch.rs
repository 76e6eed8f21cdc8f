//! catalog::batch
//!
//! Per-item outcomes and the aggregate classification returned by bulk
//! operations.
//!
//! Bulk operations run each item as its own operation. A failed item is
//! recorded and the batch moves on; earlier items stay committed.

use serde::{Deserialize, Serialize};

use super::error::{CatalogError, ErrorKind};
use crate::core::tree::TreeNode;
use crate::core::types::LabelName;

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    /// Every item succeeded (also the status of an empty batch).
    #[serde(rename = "success")]
    Success,
    /// Some items succeeded and some failed.
    #[serde(rename = "partial success")]
    PartialSuccess,
    /// Every item failed.
    #[serde(rename = "error")]
    Error,
}

impl BatchStatus {
    /// Classify a batch from its item statuses.
    ///
    /// # Example
    ///
    /// ```
    /// use msm::catalog::batch::{BatchStatus, ItemStatus};
    ///
    /// let statuses = [ItemStatus::Created, ItemStatus::Error];
    /// assert_eq!(BatchStatus::classify(statuses), BatchStatus::PartialSuccess);
    /// assert_eq!(BatchStatus::classify([]), BatchStatus::Success);
    /// ```
    pub fn classify(statuses: impl IntoIterator<Item = ItemStatus>) -> Self {
        let (mut created, mut failed) = (0usize, 0usize);
        for status in statuses {
            match status {
                ItemStatus::Created => created += 1,
                ItemStatus::Error => failed += 1,
            }
        }
        match (created, failed) {
            (_, 0) => BatchStatus::Success,
            (0, _) => BatchStatus::Error,
            _ => BatchStatus::PartialSuccess,
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Success => write!(f, "success"),
            BatchStatus::PartialSuccess => write!(f, "partial success"),
            BatchStatus::Error => write!(f, "error"),
        }
    }
}

/// Outcome of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Created,
    Error,
}

/// Something a batch produces one of per item.
pub trait Outcome {
    fn status(&self) -> ItemStatus;
}

/// Aggregate report of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport<T> {
    pub success: BatchStatus,
    pub results: Vec<T>,
}

impl<T: Outcome> BatchReport<T> {
    /// Classify `results` and wrap them.
    pub fn from_results(results: Vec<T>) -> Self {
        let success = BatchStatus::classify(results.iter().map(Outcome::status));
        Self { success, results }
    }

    /// Number of failed items.
    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status() == ItemStatus::Error)
            .count()
    }
}

/// Failure details carried by a failed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&CatalogError> for ItemFailure {
    fn from(e: &CatalogError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind(),
        }
    }
}

/// Outcome of creating one tree in a forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeOutcome {
    pub name: LabelName,
    pub status: ItemStatus,
    #[serde(flatten)]
    pub failure: Option<ItemFailure>,
}

impl TreeOutcome {
    pub fn created(name: LabelName) -> Self {
        Self {
            name,
            status: ItemStatus::Created,
            failure: None,
        }
    }

    pub fn failed(name: LabelName, error: &CatalogError) -> Self {
        Self {
            name,
            status: ItemStatus::Error,
            failure: Some(error.into()),
        }
    }
}

impl Outcome for TreeOutcome {
    fn status(&self) -> ItemStatus {
        self.status
    }
}

/// Outcome of linking one parent/child pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentOutcome {
    pub parent_name: LabelName,
    pub child_name: LabelName,
    pub status: ItemStatus,
    /// The parent's whole tree after linking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeNode>,
    #[serde(flatten)]
    pub failure: Option<ItemFailure>,
}

impl ParentOutcome {
    pub fn linked(parent_name: LabelName, child_name: LabelName, tree: TreeNode) -> Self {
        Self {
            parent_name,
            child_name,
            status: ItemStatus::Created,
            tree: Some(tree),
            failure: None,
        }
    }

    pub fn failed(parent_name: LabelName, child_name: LabelName, error: &CatalogError) -> Self {
        Self {
            parent_name,
            child_name,
            status: ItemStatus::Error,
            tree: None,
            failure: Some(error.into()),
        }
    }
}

impl Outcome for ParentOutcome {
    fn status(&self) -> ItemStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> LabelName {
        LabelName::new(s).unwrap()
    }

    #[test]
    fn classify_all_cases() {
        use ItemStatus::*;
        assert_eq!(BatchStatus::classify([Created, Created]), BatchStatus::Success);
        assert_eq!(BatchStatus::classify([Error, Error]), BatchStatus::Error);
        assert_eq!(
            BatchStatus::classify([Error, Created]),
            BatchStatus::PartialSuccess
        );
        assert_eq!(BatchStatus::classify([]), BatchStatus::Success);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_value(BatchStatus::PartialSuccess).unwrap(),
            serde_json::json!("partial success")
        );
        assert_eq!(BatchStatus::Error.to_string(), "error");
        assert_eq!(
            serde_json::to_value(ItemStatus::Created).unwrap(),
            serde_json::json!("created")
        );
    }

    #[test]
    fn failed_item_serializes_error_and_kind() {
        let err = CatalogError::Conflict("root 'lang' already exists".into());
        let outcome = TreeOutcome::failed(n("lang"), &err);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "lang",
                "status": "error",
                "error": "conflict: root 'lang' already exists",
                "kind": "conflict"
            })
        );
    }

    #[test]
    fn created_item_omits_error() {
        let json = serde_json::to_value(TreeOutcome::created(n("lang"))).unwrap();
        assert_eq!(json, serde_json::json!({"name": "lang", "status": "created"}));
    }

    #[test]
    fn report_counts_failures() {
        let err = CatalogError::NotFound("x".into());
        let report = BatchReport::from_results(vec![
            ParentOutcome::linked(n("a"), n("b"), crate::core::tree::TreeNode::leaf(n("a"))),
            ParentOutcome::failed(n("a"), n("x"), &err),
        ]);
        assert_eq!(report.success, BatchStatus::PartialSuccess);
        assert_eq!(report.failures(), 1);
    }
}
