//! tools::envelope
//!
//! The uniform result wrapper every tool call returns.
//!
//! ```text
//! {"success": true, "content": ...}
//! {"success": false, "kind": "not_found", "error": "not found: label 'x'"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CatalogError, ErrorKind};

/// Success or failure of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok(content: Value) -> Self {
        Self {
            success: true,
            content: Some(content),
            kind: None,
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            kind: Some(kind),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl From<&CatalogError> for Envelope {
    fn from(e: &CatalogError) -> Self {
        Envelope::failure(e.kind(), e.to_string())
    }
}
