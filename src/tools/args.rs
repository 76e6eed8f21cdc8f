//! tools::args
//!
//! Argument records, one per tool. Field names are camelCase on the wire
//! and unknown fields are rejected. Names, extensions and categories are
//! validated while deserializing, through their strong types.

use serde::Deserialize;

use crate::catalog::ParentLink;
use crate::core::tree::{MetadataTree, TreeNode};
use crate::core::types::{Category, Extension, LabelKey, LabelName, MaxDepth, SnippetName};

/// Tools that take no arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMetadataArgs {
    pub name: LabelName,
    pub category: Category,
    #[serde(default)]
    pub parent_name: Option<LabelName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameMetadataArgs {
    pub old_name: LabelName,
    pub new_name: LabelName,
    pub category: Category,
}

/// One label named with its category.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelRef {
    pub name: LabelName,
    pub category: Category,
}

impl From<LabelRef> for LabelKey {
    fn from(r: LabelRef) -> Self {
        LabelKey::new(r.name, r.category)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteMetadataArgs {
    pub labels: Vec<LabelRef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTreeArgs {
    pub category: Category,
    pub root: TreeNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSubtreeArgs {
    pub root_name: LabelName,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateForestArgs {
    pub forest: Vec<MetadataTree>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddParentArgs {
    pub pairs: Vec<ParentLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PruneArgs {
    pub parent_name: LabelName,
    pub child_name: LabelName,
}

/// A bare label name, optionally pinned to a category.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelLookupArgs {
    pub name: LabelName,
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TreeArgs {
    pub name: LabelName,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

impl TreeArgs {
    pub fn depth(&self) -> Option<MaxDepth> {
        self.max_depth.map(MaxDepth::Limited)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForestArgs {
    pub names: Vec<LabelName>,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WholeForestArgs {
    #[serde(default)]
    pub max_depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSnippetArgs {
    pub name: SnippetName,
    pub content: String,
    pub extension: Extension,
    pub category: Category,
    pub metadata_names: Vec<LabelName>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetLookupArgs {
    pub name: SnippetName,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateContentArgs {
    pub name: SnippetName,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSnippetMetadataArgs {
    pub name: SnippetName,
    pub category: Category,
    pub metadata_names: Vec<LabelName>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteSnippetsArgs {
    pub names: Vec<SnippetName>,
}

/// Label-set query: subset or intersection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LabelSetQueryArgs {
    pub metadata_names: Vec<LabelName>,
    pub category: Category,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TranslationArgs {
    pub snippet_name: SnippetName,
    pub extension: Extension,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TranslationKeyArgs {
    pub snippet_name: SnippetName,
    pub extension: Extension,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TranslationQueryArgs {
    pub snippet_name: SnippetName,
    #[serde(default)]
    pub extension: Option<Extension>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<CreateMetadataArgs, _> = serde_json::from_value(json!({
            "name": "oop",
            "category": "concept",
            "colour": "blue"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        let blank: Result<CreateMetadataArgs, _> =
            serde_json::from_value(json!({"name": " ", "category": "concept"}));
        assert!(blank.is_err());

        let category: Result<CreateMetadataArgs, _> =
            serde_json::from_value(json!({"name": "oop", "category": "music"}));
        assert!(category.is_err());
    }

    #[test]
    fn nested_tree_input() {
        let args: CreateForestArgs = serde_json::from_value(json!({
            "forest": [
                {"category": "language", "root": {"name": "lang", "children": [
                    {"name": "python", "children": [{"name": "django"}]}
                ]}}
            ]
        }))
        .unwrap();
        assert_eq!(args.forest[0].root.len(), 3);
    }

    #[test]
    fn pairs_are_camel_case() {
        let args: AddParentArgs = serde_json::from_value(json!({
            "pairs": [{"parentName": "a", "childName": "b"}]
        }))
        .unwrap();
        assert_eq!(args.pairs[0].child_name.as_str(), "b");
    }

    #[test]
    fn max_depth_maps_to_bound() {
        let args: TreeArgs = serde_json::from_value(json!({"name": "a", "maxDepth": 1})).unwrap();
        assert_eq!(args.depth(), Some(MaxDepth::Limited(1)));
        let args: TreeArgs = serde_json::from_value(json!({"name": "a"})).unwrap();
        assert_eq!(args.depth(), None);
    }
}
