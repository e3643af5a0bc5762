//! # Resource Paths
//!
//! A resource family is addressed by a template such as `/api/users/:id`. The part before
//! the `:id` placeholder is the collection URL; substituting an identifier gives the
//! member URL. A template without a placeholder is treated as a collection path and
//! members are addressed as `<collection>/<id>`.

use crate::error::ServiceError;
use std::fmt;

const ID_PLACEHOLDER: &str = ":id";

/// Path template for one resource family, optionally rooted at a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    base: String,
    collection: String,
}

impl ResourcePath {
    /// Parses a template. Trailing slashes and a trailing `:id` segment are stripped.
    pub fn new(template: &str) -> Self {
        let trimmed = template.trim_end_matches('/');
        let collection = trimmed
            .strip_suffix(ID_PLACEHOLDER)
            .unwrap_or(trimmed)
            .trim_end_matches('/');
        Self {
            base: String::new(),
            collection: collection.to_string(),
        }
    }

    /// Roots the path at `base`, e.g. `http://localhost:8080`.
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }

    /// Last path segment, used as the resource name in logs.
    pub fn name(&self) -> &str {
        self.collection.rsplit('/').next().unwrap_or_default()
    }

    pub fn collection_url(&self) -> String {
        format!("{}{}", self.base, self.collection)
    }

    pub fn member_url(&self, id: &str) -> String {
        format!("{}{}/{}", self.base, self.collection, id)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", self.base, self.collection, ID_PLACEHOLDER)
    }
}

/// Checks that an identifier can be placed in a single path segment.
pub fn validate_id(id: &str) -> Result<(), ServiceError> {
    if id.is_empty() {
        return Err(ServiceError::Validation("identifier must not be empty".into()));
    }
    if let Some(c) = id.chars().find(|c| matches!(c, '/' | '?' | '#')) {
        return Err(ServiceError::Validation(format!(
            "identifier {id:?} contains reserved character {c:?}"
        )));
    }
    Ok(())
}
