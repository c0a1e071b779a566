//! Core types shared across components

use serde::Serialize;

/// Identifier and canonical URL of a newly created post
///
/// Returned to the caller and printed; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostResult {
    pub id: String,
    pub url: String,
}

impl PostResult {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}
