//! Presence-tracking partial fields for create and update operations.
//!
//! A [`Patch`] is the explicit set of fields a caller assigns in a write.
//! Unlike a shallow merge onto a default instance, a patch distinguishes a
//! field that was never assigned from a field explicitly set to null: the
//! former is absent from the patch entirely, the latter is present with a
//! `Bson::Null` value. Write defaults (creation time, status) apply only to
//! absent fields.

use bson::{Bson, Document, ser::serialize_to_bson};
use serde::Serialize;

use crate::{
    entity::fields,
    error::{Error, Result},
};

/// An ordered set of explicitly assigned fields for a write operation.
///
/// Built field by field, or converted from any serializable value whose
/// serialized form is a document. Identity is storage-owned, so a patch
/// never carries `_id`: it is stripped on entry.
///
/// # Example
///
/// ```ignore
/// use entitylayer_core::patch::Patch;
///
/// let patch = Patch::new()
///     .set("name", "x")
///     .set_null("description");
///
/// assert!(patch.contains("name"));
/// assert!(patch.contains("description"));   // explicitly null, still present
/// assert!(!patch.contains("status"));       // absent, defaults may apply
/// ```
#[derive(Debug, Clone, Default)]
pub struct Patch {
    fields: Document,
}

impl Patch {
    /// Creates an empty patch assigning no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a patch from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the value fails to serialize or does
    /// not serialize to a document.
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        let bson = serialize_to_bson(value)
            .map_err(|e| Error::Internal(format!("failed to serialize patch value: {e}")))?;
        match bson {
            Bson::Document(doc) => Ok(Self::from(doc)),
            other => Err(Error::Internal(format!(
                "patch value must serialize to a document, got {:?}",
                other.element_type(),
            ))),
        }
    }

    /// Assigns a field.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        let field = field.into();
        if field != fields::ID {
            self.fields.insert(field, value.into());
        }
        self
    }

    /// Assigns a field to explicit null.
    ///
    /// An explicitly null field counts as present: write defaults will not
    /// overwrite it.
    pub fn set_null(self, field: impl Into<String>) -> Self {
        self.set(field, Bson::Null)
    }

    /// Returns whether a field was assigned, including assignment to null.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns whether no fields were assigned.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of assigned fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Consumes the patch and returns the assigned fields as a document.
    pub fn into_document(self) -> Document {
        self.fields
    }
}

impl From<Document> for Patch {
    fn from(mut doc: Document) -> Self {
        doc.remove(fields::ID);
        Self { fields: doc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn tracks_field_presence() {
        let patch = Patch::new().set("name", "x");
        assert!(patch.contains("name"));
        assert!(!patch.contains("status"));
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn explicit_null_is_present_but_distinguishable() {
        let patch = Patch::new().set_null("description");
        assert!(patch.contains("description"));
        let doc = patch.into_document();
        assert_eq!(doc.get("description"), Some(&Bson::Null));
        assert_eq!(doc.get("name"), None);
    }

    #[test]
    fn strips_identity_field() {
        let patch = Patch::new()
            .set("_id", bson::oid::ObjectId::new())
            .set("name", "x");
        assert!(!patch.contains("_id"));

        let from_doc = Patch::from(doc! { "_id": 1, "name": "y" });
        assert!(!from_doc.contains("_id"));
        assert!(from_doc.contains("name"));
    }

    #[test]
    fn builds_from_serializable_values() {
        #[derive(serde::Serialize)]
        struct Fields<'a> {
            name: &'a str,
            count: i32,
        }

        let patch = Patch::from_value(&Fields { name: "x", count: 3 }).unwrap();
        assert!(patch.contains("name"));
        assert!(patch.contains("count"));
        assert_eq!(patch.len(), 2);
    }

    #[test]
    fn rejects_non_document_values() {
        let err = Patch::from_value(&42i32).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
