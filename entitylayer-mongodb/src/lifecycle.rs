//! Lifecycle-default document construction for write operations.
//!
//! Every write path applies the same defaults to the caller's patch:
//! `createdAt` is set once when absent, `updatedAt` is always refreshed,
//! and `status` defaults to ACTIVE when absent. For upserts the on-insert
//! defaults go into `$setOnInsert` so existing documents keep their
//! creation time and status.

use bson::{DateTime, Document, doc};

use entitylayer_core::{entity::fields, patch::Patch, status::EntityStatus};

/// Builds the full candidate document for an insert.
pub(crate) fn insert_document(patch: Patch, now: DateTime) -> Document {
    let mut document = patch.into_document();
    if !document.contains_key(fields::CREATED_AT) {
        document.insert(fields::CREATED_AT, now);
    }
    document.insert(fields::UPDATED_AT, now);
    if !document.contains_key(fields::STATUS) {
        document.insert(fields::STATUS, EntityStatus::Active);
    }
    document
}

/// Builds the `$set`/`$setOnInsert` update document for an upsert.
pub(crate) fn update_document(patch: Patch, now: DateTime) -> Document {
    let mut set = patch.into_document();
    let mut on_insert = Document::new();
    if !set.contains_key(fields::CREATED_AT) {
        on_insert.insert(fields::CREATED_AT, now);
    }
    if !set.contains_key(fields::STATUS) {
        on_insert.insert(fields::STATUS, EntityStatus::Active);
    }
    set.insert(fields::UPDATED_AT, now);

    let mut update = doc! { "$set": set };
    if !on_insert.is_empty() {
        update.insert("$setOnInsert", on_insert);
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;

    #[test]
    fn insert_applies_defaults_to_absent_fields() {
        let now = DateTime::now();
        let document = insert_document(Patch::new().set("name", "x"), now);

        assert_eq!(document.get_str("name").unwrap(), "x");
        assert_eq!(document.get_datetime(fields::CREATED_AT).unwrap(), &now);
        assert_eq!(document.get_datetime(fields::UPDATED_AT).unwrap(), &now);
        assert_eq!(document.get_str(fields::STATUS).unwrap(), "A");
        assert!(!document.contains_key(fields::ID));
    }

    #[test]
    fn insert_preserves_caller_supplied_lifecycle_fields() {
        let earlier = DateTime::from_millis(1_000);
        let now = DateTime::now();
        let document = insert_document(
            Patch::new()
                .set(fields::CREATED_AT, earlier)
                .set(fields::STATUS, EntityStatus::Pending),
            now,
        );

        assert_eq!(document.get_datetime(fields::CREATED_AT).unwrap(), &earlier);
        assert_eq!(document.get_str(fields::STATUS).unwrap(), "P");
        // updatedAt is refreshed regardless of caller input.
        assert_eq!(document.get_datetime(fields::UPDATED_AT).unwrap(), &now);
    }

    #[test]
    fn update_splits_set_and_set_on_insert() {
        let now = DateTime::now();
        let update = update_document(Patch::new().set("name", "y"), now);

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("name").unwrap(), "y");
        assert_eq!(set.get_datetime(fields::UPDATED_AT).unwrap(), &now);
        assert!(!set.contains_key(fields::CREATED_AT));

        let on_insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(on_insert.get_datetime(fields::CREATED_AT).unwrap(), &now);
        assert_eq!(on_insert.get_str(fields::STATUS).unwrap(), "A");
    }

    #[test]
    fn update_omits_on_insert_when_patch_covers_defaults() {
        let now = DateTime::now();
        let update = update_document(
            Patch::new()
                .set(fields::CREATED_AT, DateTime::from_millis(1_000))
                .set(fields::STATUS, EntityStatus::Deleted),
            now,
        );

        assert!(!update.contains_key("$setOnInsert"));
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str(fields::STATUS).unwrap(), "D");
    }

    #[test]
    fn explicit_null_status_is_not_defaulted() {
        let now = DateTime::now();
        let document = insert_document(Patch::new().set_null(fields::STATUS), now);
        assert_eq!(document.get(fields::STATUS), Some(&Bson::Null));
    }
}
