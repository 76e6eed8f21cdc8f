//! core::verify
//!
//! Forest invariant verification.
//!
//! # Checks
//!
//! - I1: no `(name, category)` pair appears twice
//! - I2: every label has at most one parent, of its own category
//! - I4: following parent pointers always reaches a root (no cycles)
//! - Every edge endpoint is a known label
//!
//! # Invariants
//!
//! - Never mutates anything
//! - Must be deterministic: errors are reported in label order

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::graph::ForestGraph;
use super::types::LabelKey;

/// Errors from verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("label declared more than once: {0}")]
    DuplicateLabel(LabelKey),

    #[error("label {child} has {count} parents")]
    MultipleParents { child: LabelKey, count: usize },

    #[error("edge {parent} -> {child} crosses categories")]
    CategoryMismatch { parent: LabelKey, child: LabelKey },

    #[error("edge references unknown label: {0}")]
    DanglingEdge(LabelKey),

    #[error("cycle detected in label forest at: {0}")]
    CycleDetected(LabelKey),
}

/// Result of verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }
}

/// Verify a flat dump of labels and `(parent, child)` edges.
///
/// # Example
///
/// ```
/// use msm::core::types::{Category, LabelKey, LabelName};
/// use msm::core::verify::verify_forest;
///
/// let key = |s: &str| LabelKey::new(LabelName::new(s).unwrap(), Category::Concept);
/// let labels = vec![key("a"), key("b")];
/// let edges = vec![(key("a"), key("b"))];
///
/// assert!(verify_forest(&labels, &edges).ok);
/// ```
pub fn verify_forest(labels: &[LabelKey], edges: &[(LabelKey, LabelKey)]) -> VerifyResult {
    let mut errors = Vec::new();

    let mut known = BTreeSet::new();
    for label in labels {
        if !known.insert(label) {
            errors.push(VerifyError::DuplicateLabel(label.clone()));
        }
    }

    let mut parent_counts: BTreeMap<&LabelKey, usize> = BTreeMap::new();
    let mut graph = ForestGraph::new();
    for label in &known {
        graph.insert((*label).clone());
    }

    for (parent, child) in edges {
        for endpoint in [parent, child] {
            if !known.contains(endpoint) {
                errors.push(VerifyError::DanglingEdge(endpoint.clone()));
            }
        }
        if parent.category != child.category {
            errors.push(VerifyError::CategoryMismatch {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
        *parent_counts.entry(child).or_default() += 1;
        graph.insert_edge_unchecked(child.clone(), parent.clone());
    }

    for (child, count) in parent_counts {
        if count > 1 {
            errors.push(VerifyError::MultipleParents {
                child: child.clone(),
                count,
            });
        }
    }

    if let Some(label) = graph.find_cycle() {
        errors.push(VerifyError::CycleDetected(label));
    }

    if errors.is_empty() {
        VerifyResult::success()
    } else {
        VerifyResult::failure(errors)
    }
}
