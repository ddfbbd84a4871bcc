//! Common metadata for all documents
//!
//! Flattened into each document as `createdAt` / `updatedAt` / `isDeleted`.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Whether this document has been soft-deleted (by other subsystems)
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Metadata {
    /// Metadata with an explicit creation time; `updated_at` is stamped on insert
    pub fn created_at(created_at: DateTime) -> Self {
        Self {
            is_deleted: false,
            created_at: Some(created_at),
            updated_at: None,
        }
    }
}
