//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Category`] - Partition tag shared by a label forest and a snippet's label set
//! - [`LabelName`] - Validated taxonomy label name
//! - [`LabelKey`] - Label identity: `(name, category)`
//! - [`SnippetName`] - Validated snippet name (globally unique)
//! - [`Extension`] - Validated file extension for snippets and translations
//! - [`MaxDepth`] - Traversal bound for tree reads
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so every record that reaches the store has
//! already passed the input limits.
//!
//! # Examples
//!
//! ```
//! use msm::core::types::{Category, LabelKey, LabelName, SnippetName};
//!
//! let label = LabelName::new("python").unwrap();
//! let key = LabelKey::new(label, Category::Language);
//! assert_eq!(key.to_string(), "python (language)");
//!
//! // Invalid constructions fail at creation time
//! assert!(LabelName::new("").is_err());
//! assert!(SnippetName::new("x".repeat(256)).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid label name: {0}")]
    InvalidLabelName(String),

    #[error("invalid snippet name: {0}")]
    InvalidSnippetName(String),

    #[error("invalid extension: {0}")]
    InvalidExtension(String),

    #[error("invalid category '{0}', must be one of: concept, language")]
    InvalidCategory(String),
}

/// Check the rules shared by every free-text identifier.
fn check_identifier(value: &str, what: &str, max_chars: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{what} cannot be empty"));
    }

    let len = value.chars().count();
    if len > max_chars {
        return Err(format!(
            "{what} cannot be longer than {max_chars} characters (got {len})"
        ));
    }

    if value.chars().any(|c| c.is_control()) {
        return Err(format!("{what} cannot contain control characters"));
    }

    Ok(())
}

/// Partition tag for labels.
///
/// Every label forest lives inside exactly one category, and a snippet's
/// label set never mixes categories.
///
/// # Example
///
/// ```
/// use msm::core::types::Category;
///
/// let category: Category = "concept".parse().unwrap();
/// assert_eq!(category, Category::Concept);
/// assert_eq!(category.to_string(), "concept");
/// assert!("music".parse::<Category>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Abstract concepts (paradigms, algorithms, patterns)
    Concept,
    /// Programming languages and dialects
    Language,
}

impl Category {
    /// Every category, in a stable order.
    pub const ALL: [Category; 2] = [Category::Concept, Category::Language];

    /// Get the wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Concept => "concept",
            Category::Language => "language",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concept" => Ok(Category::Concept),
            "language" => Ok(Category::Language),
            other => Err(TypeError::InvalidCategory(other.to_string())),
        }
    }
}

/// A validated label name.
///
/// Label names must:
/// - Contain at least one non-whitespace character
/// - Be at most 100 characters long
/// - Not contain control characters
///
/// A name alone does not identify a label: the same name may exist once per
/// category. Use [`LabelKey`] for identity.
///
/// # Example
///
/// ```
/// use msm::core::types::LabelName;
///
/// let name = LabelName::new("object-oriented").unwrap();
/// assert_eq!(name.as_str(), "object-oriented");
///
/// assert!(LabelName::new("   ").is_err());
/// assert!(LabelName::new("tab\there").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelName(String);

impl LabelName {
    /// Maximum label name length, in characters.
    pub const MAX_CHARS: usize = 100;

    /// Create a new validated label name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLabelName` if the name violates the rules above.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_identifier(&name, "label name", Self::MAX_CHARS)
            .map_err(TypeError::InvalidLabelName)?;
        Ok(Self(name))
    }

    /// Get the label name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LabelName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LabelName> for String {
    fn from(name: LabelName) -> Self {
        name.0
    }
}

impl AsRef<str> for LabelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for LabelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LabelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity of a label: its name within a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelKey {
    pub name: LabelName,
    pub category: Category,
}

impl LabelKey {
    /// Create a label identity.
    pub fn new(name: LabelName, category: Category) -> Self {
        Self { name, category }
    }
}

impl std::fmt::Display for LabelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}

/// A validated snippet name.
///
/// Snippet names are unique across the whole catalog, independent of
/// category. They follow the same rules as label names with a 255
/// character limit.
///
/// # Example
///
/// ```
/// use msm::core::types::SnippetName;
///
/// let name = SnippetName::new("quicksort.py").unwrap();
/// assert_eq!(name.as_str(), "quicksort.py");
/// assert!(SnippetName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnippetName(String);

impl SnippetName {
    /// Maximum snippet name length, in characters.
    pub const MAX_CHARS: usize = 255;

    /// Create a new validated snippet name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSnippetName` if the name is blank, too long
    /// or contains control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_identifier(&name, "snippet name", Self::MAX_CHARS)
            .map_err(TypeError::InvalidSnippetName)?;
        Ok(Self(name))
    }

    /// Get the snippet name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SnippetName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SnippetName> for String {
    fn from(name: SnippetName) -> Self {
        name.0
    }
}

impl AsRef<str> for SnippetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SnippetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated file extension (for example `py` or `.rs`).
///
/// Extensions are 1 to 10 characters with no whitespace. The value is kept
/// verbatim; `py` and `.py` are different extensions.
///
/// # Example
///
/// ```
/// use msm::core::types::Extension;
///
/// assert!(Extension::new("py").is_ok());
/// assert!(Extension::new("").is_err());
/// assert!(Extension::new("has space").is_err());
/// assert!(Extension::new("waytoolongext").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Extension(String);

impl Extension {
    /// Maximum extension length, in characters.
    pub const MAX_CHARS: usize = 10;

    /// Create a new validated extension.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidExtension` if the extension is empty,
    /// longer than 10 characters, or contains whitespace.
    pub fn new(ext: impl Into<String>) -> Result<Self, TypeError> {
        let ext = ext.into();
        check_identifier(&ext, "extension", Self::MAX_CHARS)
            .map_err(TypeError::InvalidExtension)?;
        if ext.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidExtension(
                "extension cannot contain whitespace".into(),
            ));
        }
        Ok(Self(ext))
    }

    /// Get the extension as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Extension {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Extension> for String {
    fn from(ext: Extension) -> Self {
        ext.0
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How deep a tree read may descend below its root.
///
/// The bound is applied by the store's traversal, so it limits the size of
/// the result as well as its shape. Depth 0 is the root alone.
///
/// # Example
///
/// ```
/// use msm::core::types::MaxDepth;
///
/// assert!(MaxDepth::Unbounded.allows(1_000));
/// assert!(MaxDepth::Limited(1).allows(1));
/// assert!(!MaxDepth::Limited(1).allows(2));
/// assert_eq!(MaxDepth::from(None), MaxDepth::Unbounded);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxDepth {
    /// Follow every descendant.
    #[default]
    Unbounded,
    /// Stop after this many edges.
    Limited(u32),
}

impl MaxDepth {
    /// Check whether a node at `depth` is within the bound.
    pub fn allows(&self, depth: u32) -> bool {
        match self {
            MaxDepth::Unbounded => true,
            MaxDepth::Limited(max) => depth <= *max,
        }
    }
}

impl From<Option<u32>> for MaxDepth {
    fn from(depth: Option<u32>) -> Self {
        depth.map(MaxDepth::Limited).unwrap_or_default()
    }
}

impl std::fmt::Display for MaxDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxDepth::Unbounded => write!(f, "unbounded"),
            MaxDepth::Limited(depth) => write!(f, "{depth}"),
        }
    }
}

/// A UTC timestamp in RFC3339 format.
///
/// # Example
///
/// ```
/// use msm::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// assert!(now.to_string().contains('T'));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod category {
        use super::*;

        #[test]
        fn parses_wire_names() {
            assert_eq!("concept".parse::<Category>().unwrap(), Category::Concept);
            assert_eq!("language".parse::<Category>().unwrap(), Category::Language);
        }

        #[test]
        fn rejects_unknown_and_wrong_case() {
            assert!("Concept".parse::<Category>().is_err());
            assert!("".parse::<Category>().is_err());
        }

        #[test]
        fn serializes_lowercase() {
            let json = serde_json::to_string(&Category::Language).unwrap();
            assert_eq!(json, "\"language\"");
            let parsed: Category = serde_json::from_str("\"concept\"").unwrap();
            assert_eq!(parsed, Category::Concept);
        }
    }

    mod label_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(LabelName::new("python").is_ok());
            assert!(LabelName::new("object oriented").is_ok());
            assert!(LabelName::new("c++").is_ok());
            assert!(LabelName::new("x".repeat(100)).is_ok());
        }

        #[test]
        fn blank_rejected() {
            assert!(LabelName::new("").is_err());
            assert!(LabelName::new("  ").is_err());
        }

        #[test]
        fn too_long_rejected() {
            assert!(LabelName::new("x".repeat(101)).is_err());
        }

        #[test]
        fn length_counts_chars_not_bytes() {
            assert!(LabelName::new("é".repeat(100)).is_ok());
        }

        #[test]
        fn control_chars_rejected() {
            assert!(LabelName::new("new\nline").is_err());
            assert!(LabelName::new("del\x7f").is_err());
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<LabelName, _> = serde_json::from_str("\"\"");
            assert!(result.is_err());
        }
    }

    mod snippet_name {
        use super::*;

        #[test]
        fn limit_is_255() {
            assert!(SnippetName::new("s".repeat(255)).is_ok());
            assert!(SnippetName::new("s".repeat(256)).is_err());
        }
    }

    mod extension {
        use super::*;

        #[test]
        fn keeps_value_verbatim() {
            assert_eq!(Extension::new(".py").unwrap().as_str(), ".py");
        }

        #[test]
        fn limit_is_10() {
            assert!(Extension::new("abcdefghij").is_ok());
            assert!(Extension::new("abcdefghijk").is_err());
        }
    }

    mod max_depth {
        use super::*;

        #[test]
        fn zero_allows_only_root() {
            assert!(MaxDepth::Limited(0).allows(0));
            assert!(!MaxDepth::Limited(0).allows(1));
        }

        #[test]
        fn display() {
            assert_eq!(MaxDepth::Unbounded.to_string(), "unbounded");
            assert_eq!(MaxDepth::Limited(3).to_string(), "3");
        }
    }

    #[test]
    fn timestamp_serde_roundtrip() {
        let ts = UtcTimestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: UtcTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}
