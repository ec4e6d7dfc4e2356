//! Collection and document addressing

use std::fmt;

use crate::{Error, Result};

/// Object name of a document's own fields inside its directory. A
/// sub-collection lives beside it as `{collection}/{id}/{name}/`, and
/// collection names never equal this, so the two can never share a key.
pub(crate) const DOCUMENT_FILE: &str = "_doc.json";

/// Path of a collection, e.g. `Teams` or `Teams/Lions/Lists`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

/// Path of a single document, e.g. `Teams/Lions`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl CollectionPath {
    /// A top-level collection
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Address a document in this collection
    pub fn doc(&self, id: &str) -> Result<DocumentPath> {
        validate_id(id)?;
        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    /// Storage prefix under which this collection's documents live
    pub(crate) fn prefix(&self) -> String {
        format!("{}/", self.0)
    }

    /// Extract a direct child id from a storage key under this collection.
    /// Keys belonging to nested sub-collections yield `None`.
    pub(crate) fn child_id<'a>(&self, key: &'a str) -> Option<&'a str> {
        let rest = key.strip_prefix(self.0.as_str())?.strip_prefix('/')?;
        let id = rest.strip_suffix(DOCUMENT_FILE)?.strip_suffix('/')?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(id)
    }
}

impl DocumentPath {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    /// A sub-collection nested under this document
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{}", self.collection.0, self.id, name))
    }

    /// Storage key of this document
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.collection.0, self.id, DOCUMENT_FILE)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Document ids become path segments, so they must be non-empty, free of
/// `/`, not `.` or `..`, and not of the reserved `__name__` form.
fn validate_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        "must not be empty"
    } else if id.contains('/') {
        "must not contain '/'"
    } else if id == "." || id == ".." {
        "must not be '.' or '..'"
    } else if id.len() > 4 && id.starts_with("__") && id.ends_with("__") {
        "names of the form __name__ are reserved"
    } else {
        return Ok(());
    };

    Err(Error::InvalidDocumentId(format!("'{}' {}", id, reason)))
}
