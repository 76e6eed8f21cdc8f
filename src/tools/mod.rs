//! tools
//!
//! Named tools over the catalog: each public operation is one tool taking
//! a JSON argument object and returning an [`Envelope`].
//!
//! # Dispatch
//!
//! [`dispatch`] never fails. An unknown tool name or malformed arguments
//! become a `validation` envelope; catalog failures become an envelope
//! carrying their [`ErrorKind`](crate::catalog::ErrorKind).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use msm::catalog::Catalog;
//! use msm::core::config::Config;
//! use msm::store::MemoryStore;
//! use msm::tools::dispatch;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let catalog = Catalog::open(Arc::new(MemoryStore::new()), &Config::default())
//!     .await
//!     .unwrap();
//! let created = dispatch(&catalog, "create_metadata", json!({"name": "oop", "category": "concept"})).await;
//! assert!(created.success);
//!
//! let missing = dispatch(&catalog, "get_metadata_tree", json!({"name": "fp"})).await;
//! assert_eq!(missing.kind.unwrap().as_str(), "not_found");
//! # });
//! ```

pub mod args;
pub mod envelope;

pub use envelope::Envelope;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, CatalogError, ErrorKind, SnippetDraft};
use crate::core::types::{LabelKey, MaxDepth};
use args::*;

/// Every tool the catalog exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateMetadata,
    RenameMetadata,
    DeleteMetadata,
    CreateMetadataTree,
    CreateMetadataSubtree,
    CreateMetadataForest,
    AddMetadataParent,
    PruneMetadataBranch,
    GetMetadataTree,
    GetMetadataForest,
    GetWholeMetadataForest,
    GetMetadataSiblings,
    GetMetadataPath,
    GetMetadataSiblingsForest,
    GetAllMetadata,
    CreateSnippet,
    SearchSnippetByName,
    UpdateSnippetContent,
    UpdateSnippetMetadata,
    DeleteSnippets,
    GetAllSnippets,
    GetSnippetsByMetadataSubset,
    GetSnippetsByMetadataIntersection,
    CreateSnippetTranslation,
    UpdateSnippetTranslation,
    DeleteSnippetTranslation,
    GetSnippetTranslations,
    GetSnippetWithTranslations,
    Ping,
    VerifyForest,
    Clear,
}

impl ToolName {
    pub const ALL: [ToolName; 31] = [
        ToolName::CreateMetadata,
        ToolName::RenameMetadata,
        ToolName::DeleteMetadata,
        ToolName::CreateMetadataTree,
        ToolName::CreateMetadataSubtree,
        ToolName::CreateMetadataForest,
        ToolName::AddMetadataParent,
        ToolName::PruneMetadataBranch,
        ToolName::GetMetadataTree,
        ToolName::GetMetadataForest,
        ToolName::GetWholeMetadataForest,
        ToolName::GetMetadataSiblings,
        ToolName::GetMetadataPath,
        ToolName::GetMetadataSiblingsForest,
        ToolName::GetAllMetadata,
        ToolName::CreateSnippet,
        ToolName::SearchSnippetByName,
        ToolName::UpdateSnippetContent,
        ToolName::UpdateSnippetMetadata,
        ToolName::DeleteSnippets,
        ToolName::GetAllSnippets,
        ToolName::GetSnippetsByMetadataSubset,
        ToolName::GetSnippetsByMetadataIntersection,
        ToolName::CreateSnippetTranslation,
        ToolName::UpdateSnippetTranslation,
        ToolName::DeleteSnippetTranslation,
        ToolName::GetSnippetTranslations,
        ToolName::GetSnippetWithTranslations,
        ToolName::Ping,
        ToolName::VerifyForest,
        ToolName::Clear,
    ];

    /// Get the wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateMetadata => "create_metadata",
            ToolName::RenameMetadata => "rename_metadata",
            ToolName::DeleteMetadata => "delete_metadata",
            ToolName::CreateMetadataTree => "create_metadata_tree",
            ToolName::CreateMetadataSubtree => "create_metadata_subtree",
            ToolName::CreateMetadataForest => "create_metadata_forest",
            ToolName::AddMetadataParent => "add_metadata_parent",
            ToolName::PruneMetadataBranch => "prune_metadata_branch",
            ToolName::GetMetadataTree => "get_metadata_tree",
            ToolName::GetMetadataForest => "get_metadata_forest",
            ToolName::GetWholeMetadataForest => "get_whole_metadata_forest",
            ToolName::GetMetadataSiblings => "get_metadata_siblings",
            ToolName::GetMetadataPath => "get_metadata_path",
            ToolName::GetMetadataSiblingsForest => "get_metadata_siblings_forest",
            ToolName::GetAllMetadata => "get_all_metadata",
            ToolName::CreateSnippet => "create_snippet",
            ToolName::SearchSnippetByName => "search_snippet_by_name",
            ToolName::UpdateSnippetContent => "update_snippet_content",
            ToolName::UpdateSnippetMetadata => "update_snippet_metadata",
            ToolName::DeleteSnippets => "delete_snippets",
            ToolName::GetAllSnippets => "get_all_snippets",
            ToolName::GetSnippetsByMetadataSubset => "get_snippets_by_metadata_subset",
            ToolName::GetSnippetsByMetadataIntersection => "get_snippets_by_metadata_intersection",
            ToolName::CreateSnippetTranslation => "create_snippet_translation",
            ToolName::UpdateSnippetTranslation => "update_snippet_translation",
            ToolName::DeleteSnippetTranslation => "delete_snippet_translation",
            ToolName::GetSnippetTranslations => "get_snippet_translations",
            ToolName::GetSnippetWithTranslations => "get_snippet_with_translations",
            ToolName::Ping => "ping",
            ToolName::VerifyForest => "verify_forest",
            ToolName::Clear => "clear",
        }
    }

    /// One-line description, shown by `msm tools`.
    pub fn summary(&self) -> &'static str {
        match self {
            ToolName::CreateMetadata => "Create a label, optionally under a parent",
            ToolName::RenameMetadata => "Rename a label within its category",
            ToolName::DeleteMetadata => "Delete labels; children become roots",
            ToolName::CreateMetadataTree => "Create a tree of new labels",
            ToolName::CreateMetadataSubtree => "Create new labels below an existing label",
            ToolName::CreateMetadataForest => "Create several trees independently",
            ToolName::AddMetadataParent => "Link child labels under parents",
            ToolName::PruneMetadataBranch => "Cut a parent-child edge",
            ToolName::GetMetadataTree => "Read the tree rooted at a label",
            ToolName::GetMetadataForest => "Read the trees rooted at several labels",
            ToolName::GetWholeMetadataForest => "Read the tree of every root",
            ToolName::GetMetadataSiblings => "List labels sharing a parent",
            ToolName::GetMetadataPath => "Path from the root down to a label",
            ToolName::GetMetadataSiblingsForest => "Trees of a label and its siblings",
            ToolName::GetAllMetadata => "List every label with its parent",
            ToolName::CreateSnippet => "Create a snippet tagged with labels",
            ToolName::SearchSnippetByName => "Look up a snippet by name",
            ToolName::UpdateSnippetContent => "Replace a snippet's content",
            ToolName::UpdateSnippetMetadata => "Replace a snippet's labels",
            ToolName::DeleteSnippets => "Delete snippets and their translations",
            ToolName::GetAllSnippets => "List every snippet",
            ToolName::GetSnippetsByMetadataSubset => "Snippets carrying all given labels",
            ToolName::GetSnippetsByMetadataIntersection => "Snippets ranked by shared labels",
            ToolName::CreateSnippetTranslation => "Add a translation of a snippet",
            ToolName::UpdateSnippetTranslation => "Replace a translation's content",
            ToolName::DeleteSnippetTranslation => "Delete a translation",
            ToolName::GetSnippetTranslations => "List a snippet's translations",
            ToolName::GetSnippetWithTranslations => "A snippet together with its translations",
            ToolName::Ping => "Check the store is reachable",
            ToolName::VerifyForest => "Check the forest invariants",
            ToolName::Clear => "Delete every label, snippet and translation",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Errors from one tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: ToolName,
        source: serde_json::Error,
    },

    #[error("failed to encode result: {0}")]
    Encode(serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool(_) | ToolError::InvalidArguments { .. } => ErrorKind::Validation,
            ToolError::Encode(_) => ErrorKind::Structural,
            ToolError::Catalog(e) => e.kind(),
        }
    }
}

/// Run one tool call and wrap its outcome.
pub async fn dispatch(catalog: &Catalog, tool: &str, arguments: Value) -> Envelope {
    let result = match tool.parse::<ToolName>() {
        Ok(name) => call(catalog, name, arguments).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(content) => Envelope::ok(content),
        Err(e) => {
            debug!(%tool, kind = %e.kind(), error = %e, "tool call failed");
            Envelope::failure(e.kind(), e.to_string())
        }
    }
}

/// Run one tool call.
pub async fn call(catalog: &Catalog, tool: ToolName, arguments: Value) -> Result<Value, ToolError> {
    debug!(%tool, "tool call");
    match tool {
        ToolName::CreateMetadata => {
            let a: CreateMetadataArgs = parse(tool, arguments)?;
            let record = catalog
                .forest()
                .create_label(&a.name, a.category, a.parent_name.as_ref())
                .await?;
            encode(&record)
        }
        ToolName::RenameMetadata => {
            let a: RenameMetadataArgs = parse(tool, arguments)?;
            let record = catalog
                .forest()
                .rename_label(&a.old_name, &a.new_name, a.category)
                .await?;
            encode(&record)
        }
        ToolName::DeleteMetadata => {
            let a: DeleteMetadataArgs = parse(tool, arguments)?;
            let keys: Vec<LabelKey> = a.labels.into_iter().map(LabelKey::from).collect();
            let deleted = catalog.forest().delete_labels(&keys).await?;
            Ok(json!({ "deleted": deleted }))
        }
        ToolName::CreateMetadataTree => {
            let a: CreateTreeArgs = parse(tool, arguments)?;
            encode(&catalog.forest().create_tree(a.category, &a.root).await?)
        }
        ToolName::CreateMetadataSubtree => {
            let a: CreateSubtreeArgs = parse(tool, arguments)?;
            encode(&catalog.forest().create_subtree(&a.root_name, &a.children).await?)
        }
        ToolName::CreateMetadataForest => {
            let a: CreateForestArgs = parse(tool, arguments)?;
            encode(&catalog.forest().create_forest(&a.forest).await)
        }
        ToolName::AddMetadataParent => {
            let a: AddParentArgs = parse(tool, arguments)?;
            encode(&catalog.forest().add_parents(&a.pairs).await)
        }
        ToolName::PruneMetadataBranch => {
            let a: PruneArgs = parse(tool, arguments)?;
            encode(&catalog.forest().prune_branch(&a.parent_name, &a.child_name).await?)
        }
        ToolName::GetMetadataTree => {
            let a: TreeArgs = parse(tool, arguments)?;
            encode(&catalog.reader().tree(&a.name, a.category, a.depth()).await?)
        }
        ToolName::GetMetadataForest => {
            let a: ForestArgs = parse(tool, arguments)?;
            let depth = a.max_depth.map(MaxDepth::Limited);
            encode(&catalog.reader().forest(&a.names, depth).await?)
        }
        ToolName::GetWholeMetadataForest => {
            let a: WholeForestArgs = parse(tool, arguments)?;
            let depth = a.max_depth.map(MaxDepth::Limited);
            encode(&catalog.reader().whole_forest(depth).await?)
        }
        ToolName::GetMetadataSiblings => {
            let a: LabelLookupArgs = parse(tool, arguments)?;
            encode(&catalog.navigator().siblings(&a.name, a.category).await?)
        }
        ToolName::GetMetadataPath => {
            let a: LabelLookupArgs = parse(tool, arguments)?;
            encode(&catalog.navigator().path_to_root(&a.name, a.category).await?)
        }
        ToolName::GetMetadataSiblingsForest => {
            let a: TreeArgs = parse(tool, arguments)?;
            let forest = catalog
                .navigator()
                .siblings_forest(&a.name, a.category, a.depth())
                .await?;
            encode(&forest)
        }
        ToolName::GetAllMetadata => {
            let _: NoArgs = parse(tool, arguments)?;
            encode(&catalog.reader().all_labels().await?)
        }
        ToolName::CreateSnippet => {
            let a: CreateSnippetArgs = parse(tool, arguments)?;
            let record = catalog
                .snippets()
                .create(SnippetDraft {
                    name: a.name,
                    content: a.content,
                    extension: a.extension,
                    category: a.category,
                    labels: a.metadata_names,
                })
                .await?;
            encode(&record)
        }
        ToolName::SearchSnippetByName => {
            let a: SnippetLookupArgs = parse(tool, arguments)?;
            encode(&catalog.snippets().get(&a.name).await?)
        }
        ToolName::UpdateSnippetContent => {
            let a: UpdateContentArgs = parse(tool, arguments)?;
            encode(&catalog.snippets().update_content(&a.name, &a.content).await?)
        }
        ToolName::UpdateSnippetMetadata => {
            let a: UpdateSnippetMetadataArgs = parse(tool, arguments)?;
            let record = catalog
                .snippets()
                .update_labels(&a.name, a.category, &a.metadata_names)
                .await?;
            encode(&record)
        }
        ToolName::DeleteSnippets => {
            let a: DeleteSnippetsArgs = parse(tool, arguments)?;
            let deleted = catalog.snippets().delete(&a.names).await?;
            Ok(json!({ "deleted": deleted }))
        }
        ToolName::GetAllSnippets => {
            let _: NoArgs = parse(tool, arguments)?;
            encode(&catalog.snippets().all().await?)
        }
        ToolName::GetSnippetsByMetadataSubset => {
            let a: LabelSetQueryArgs = parse(tool, arguments)?;
            encode(&catalog.snippets().subset_match(&a.metadata_names, a.category).await?)
        }
        ToolName::GetSnippetsByMetadataIntersection => {
            let a: LabelSetQueryArgs = parse(tool, arguments)?;
            let ranked = catalog
                .snippets()
                .intersection_match(&a.metadata_names, a.category)
                .await?;
            encode(&ranked)
        }
        ToolName::CreateSnippetTranslation => {
            let a: TranslationArgs = parse(tool, arguments)?;
            let record = catalog
                .translations()
                .create(&a.snippet_name, &a.extension, &a.content)
                .await?;
            encode(&record)
        }
        ToolName::UpdateSnippetTranslation => {
            let a: TranslationArgs = parse(tool, arguments)?;
            let record = catalog
                .translations()
                .update(&a.snippet_name, &a.extension, &a.content)
                .await?;
            encode(&record)
        }
        ToolName::DeleteSnippetTranslation => {
            let a: TranslationKeyArgs = parse(tool, arguments)?;
            catalog.translations().delete(&a.snippet_name, &a.extension).await?;
            Ok(json!({ "snippetName": a.snippet_name, "extension": a.extension }))
        }
        ToolName::GetSnippetTranslations => {
            let a: TranslationQueryArgs = parse(tool, arguments)?;
            let list = catalog
                .translations()
                .list(&a.snippet_name, a.extension.as_ref())
                .await?;
            encode(&list)
        }
        ToolName::GetSnippetWithTranslations => {
            let a: TranslationQueryArgs = parse(tool, arguments)?;
            let bundle = catalog
                .translations()
                .snippet_with_translations(&a.snippet_name, a.extension.as_ref())
                .await?;
            encode(&bundle)
        }
        ToolName::Ping => {
            let _: NoArgs = parse(tool, arguments)?;
            catalog.ping().await?;
            Ok(json!({ "store": catalog.pool().store_name() }))
        }
        ToolName::VerifyForest => {
            let _: NoArgs = parse(tool, arguments)?;
            encode(&catalog.verify_forest().await?)
        }
        ToolName::Clear => {
            let _: NoArgs = parse(tool, arguments)?;
            encode(&catalog.clear().await?)
        }
    }
}

/// Missing arguments are read as an empty object.
fn parse<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments { tool, source })
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(ToolError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::store::MemoryStore;
    use std::collections::HashSet;
    use std::sync::Arc;

    async fn catalog() -> Catalog {
        Catalog::open(Arc::new(MemoryStore::new()), &Config::default())
            .await
            .unwrap()
    }

    #[test]
    fn names_roundtrip_and_are_unique() {
        let mut seen = HashSet::new();
        for tool in ToolName::ALL {
            assert!(seen.insert(tool.as_str()));
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!("drop_everything".parse::<ToolName>().is_err());
    }

    #[tokio::test]
    async fn unknown_tool_is_validation() {
        let env = dispatch(&catalog().await, "nope", Value::Null).await;
        assert!(!env.success);
        assert_eq!(env.kind, Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn bad_arguments_are_validation() {
        let catalog = catalog().await;
        let env = dispatch(&catalog, "create_metadata", json!({"name": "x"})).await;
        assert_eq!(env.kind, Some(ErrorKind::Validation));

        let env = dispatch(&catalog, "ping", json!({"extra": 1})).await;
        assert_eq!(env.kind, Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn tree_roundtrip_through_tools() {
        let catalog = catalog().await;
        let env = dispatch(
            &catalog,
            "create_metadata_tree",
            json!({"category": "language", "root": {"name": "lang", "children": [
                {"name": "python", "children": [{"name": "django"}]},
                {"name": "rust"}
            ]}}),
        )
        .await;
        assert!(env.success, "{env:?}");

        let env = dispatch(&catalog, "get_metadata_tree", json!({"name": "lang", "maxDepth": 1})).await;
        let content = env.content.unwrap();
        assert_eq!(content["category"], "language");
        let children = content["root"]["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c["children"].as_array().unwrap().is_empty()));

        let env = dispatch(&catalog, "get_metadata_path", json!({"name": "django"})).await;
        assert_eq!(env.content.unwrap()["path"], json!(["lang", "python", "django"]));
    }

    #[tokio::test]
    async fn bulk_reports_partial_success() {
        let catalog = catalog().await;
        dispatch(&catalog, "create_metadata", json!({"name": "p", "category": "concept"})).await;
        dispatch(&catalog, "create_metadata", json!({"name": "c", "category": "concept"})).await;
        let env = dispatch(
            &catalog,
            "add_metadata_parent",
            json!({"pairs": [
                {"parentName": "p", "childName": "c"},
                {"parentName": "p", "childName": "ghost"}
            ]}),
        )
        .await;
        let content = env.content.unwrap();
        assert_eq!(content["success"], "partial success");
        assert_eq!(content["results"][0]["status"], "created");
        assert_eq!(content["results"][1]["kind"], "not_found");
    }

    #[tokio::test]
    async fn snippet_flow() {
        let catalog = catalog().await;
        dispatch(&catalog, "create_metadata", json!({"name": "oop", "category": "concept"})).await;
        let env = dispatch(
            &catalog,
            "create_snippet",
            json!({"name": "point", "content": "class P: pass", "extension": "py",
                   "category": "concept", "metadataNames": ["oop"]}),
        )
        .await;
        assert!(env.success, "{env:?}");
        let env = dispatch(
            &catalog,
            "create_snippet_translation",
            json!({"snippetName": "point", "extension": "rs", "content": "struct P;"}),
        )
        .await;
        assert!(env.success, "{env:?}");

        let env = dispatch(&catalog, "get_snippet_with_translations", json!({"snippetName": "point"})).await;
        let content = env.content.unwrap();
        assert_eq!(content["snippet"]["size"], 13);
        assert_eq!(content["translations"][0]["extension"], "rs");

        let env = dispatch(&catalog, "delete_snippets", json!({"names": ["point", "ghost"]})).await;
        assert_eq!(env.content.unwrap()["deleted"], 1);
    }

    #[tokio::test]
    async fn clear_resets_between_scenarios() {
        let catalog = catalog().await;
        dispatch(&catalog, "create_metadata", json!({"name": "oop", "category": "concept"})).await;
        dispatch(
            &catalog,
            "create_snippet",
            json!({"name": "point", "content": "x", "extension": "py",
                   "category": "concept", "metadataNames": ["oop"]}),
        )
        .await;

        let env = dispatch(&catalog, "clear", Value::Null).await;
        assert_eq!(
            env.content.unwrap(),
            json!({"labels": 1, "snippets": 1, "translations": 0})
        );
        let env = dispatch(&catalog, "get_all_metadata", Value::Null).await;
        assert_eq!(env.content.unwrap(), json!([]));

        let env = dispatch(&catalog, "create_metadata", json!({"name": "oop", "category": "concept"})).await;
        assert!(env.success, "{env:?}");

        let env = dispatch(&catalog, "clear", json!({"force": true})).await;
        assert_eq!(env.kind, Some(ErrorKind::Validation));
    }
}
