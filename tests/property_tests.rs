//! Property-based tests for the forest engine.
//!
//! These tests use proptest to verify the forest invariants hold across
//! randomly generated trees and operation sequences.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use msm::catalog::Catalog;
use msm::core::config::Config;
use msm::core::tree::{assemble, flatten, TraversalRow, TreeNode};
use msm::core::types::{Category, LabelKey, LabelName};
use msm::store::MemoryStore;

fn n(s: &str) -> LabelName {
    LabelName::new(s).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Strategy for parent indices: node `i > 0` hangs under some node `< i`.
fn parent_indices() -> impl Strategy<Value = Vec<usize>> {
    (1usize..24).prop_flat_map(|len| {
        (1..len)
            .map(|i| (0..i).boxed())
            .collect::<Vec<_>>()
    })
}

/// Build the tree `n0` described by `parents` (entry `j` is the parent of `n{j+1}`).
fn tree_from_parents(parents: &[usize]) -> TreeNode {
    fn build(index: usize, parents: &[usize]) -> TreeNode {
        let children = parents
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == index)
            .map(|(j, _)| build(j + 1, parents))
            .collect();
        TreeNode::with_children(n(&format!("n{index}")), children)
    }
    build(0, parents)
}

#[derive(Debug, Clone)]
enum Op {
    Create {
        name: usize,
        language: bool,
        parent: Option<usize>,
    },
    Link {
        parent: usize,
        child: usize,
    },
    Prune {
        parent: usize,
        child: usize,
    },
    Delete {
        name: usize,
        language: bool,
    },
    Rename {
        from: usize,
        to: usize,
        language: bool,
    },
}

const POOL: usize = 6;

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..POOL, any::<bool>(), proptest::option::of(0..POOL))
            .prop_map(|(name, language, parent)| Op::Create { name, language, parent }),
        3 => (0..POOL, 0..POOL).prop_map(|(parent, child)| Op::Link { parent, child }),
        1 => (0..POOL, 0..POOL).prop_map(|(parent, child)| Op::Prune { parent, child }),
        1 => (0..POOL, any::<bool>()).prop_map(|(name, language)| Op::Delete { name, language }),
        1 => (0..POOL, 0..POOL, any::<bool>())
            .prop_map(|(from, to, language)| Op::Rename { from, to, language }),
    ]
}

fn label(i: usize) -> LabelName {
    n(&format!("l{i}"))
}

fn category(language: bool) -> Category {
    if language {
        Category::Language
    } else {
        Category::Concept
    }
}

async fn apply(catalog: &Catalog, op: &Op) {
    let forest = catalog.forest();
    // Individual operations may fail; only the invariants afterwards matter.
    let _ = match op {
        Op::Create {
            name,
            language,
            parent,
        } => forest
            .create_label(&label(*name), category(*language), parent.map(label).as_ref())
            .await
            .map(|_| ()),
        Op::Link { parent, child } => forest
            .add_parent(&label(*parent), &label(*child))
            .await
            .map(|_| ()),
        Op::Prune { parent, child } => forest
            .prune_branch(&label(*parent), &label(*child))
            .await
            .map(|_| ()),
        Op::Delete { name, language } => forest
            .delete_labels(&[LabelKey::new(label(*name), category(*language))])
            .await
            .map(|_| ()),
        Op::Rename { from, to, language } => forest
            .rename_label(&label(*from), &label(*to), category(*language))
            .await
            .map(|_| ()),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Flattening a tree and reassembling the rows gives the same tree.
    #[test]
    fn flatten_assemble_agree(parents in parent_indices()) {
        let tree = tree_from_parents(&parents);
        let flat = flatten(&tree);
        prop_assert_eq!(flat.len(), tree.len());

        let rows: Vec<TraversalRow> = flat
            .into_iter()
            .map(|f| TraversalRow::new(f.name, 0, f.parent_name))
            .collect();
        prop_assert_eq!(assemble(rows).unwrap(), tree);
    }

    /// Pruning any edge splits the tree into two disjoint halves covering it.
    #[test]
    fn prune_partitions_tree(parents in parent_indices(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!parents.is_empty());
        let tree = tree_from_parents(&parents);
        let child_index = pick.index(parents.len()) + 1;
        let child = n(&format!("n{child_index}"));
        let parent = n(&format!("n{}", parents[child_index - 1]));

        let report = runtime().block_on(async {
            let catalog = Catalog::open(Arc::new(MemoryStore::new()), &Config::default())
                .await
                .unwrap();
            catalog.forest().create_tree(Category::Concept, &tree).await.unwrap();
            catalog.forest().prune_branch(&parent, &child).await.unwrap()
        });

        let left = report.parent_tree.names();
        let right = report.child_tree.names();
        prop_assert!(left.is_disjoint(&right));
        let union: BTreeSet<LabelName> = left.union(&right).cloned().collect();
        prop_assert_eq!(union, tree.names());
        prop_assert_eq!(&report.child_tree.name, &child);
    }

    /// No sequence of operations leaves a duplicate identity, a second
    /// parent, a cross-category edge or a cycle.
    #[test]
    fn invariants_survive_random_operations(ops in prop::collection::vec(op(), 1..40)) {
        let (report, labels) = runtime().block_on(async {
            let catalog = Catalog::open(Arc::new(MemoryStore::new()), &Config::default())
                .await
                .unwrap();
            for op in &ops {
                apply(&catalog, op).await;
            }
            (
                catalog.verify_forest().await.unwrap(),
                catalog.reader().all_labels().await.unwrap(),
            )
        });
        prop_assert!(report.ok, "{:?}", report.errors);

        let identities: BTreeSet<(Category, &LabelName)> =
            labels.iter().map(|l| (l.category, &l.name)).collect();
        prop_assert_eq!(identities.len(), labels.len());
        for record in &labels {
            if let Some(parent) = &record.parent_name {
                prop_assert!(identities.contains(&(record.category, parent)));
            }
        }
    }
}
