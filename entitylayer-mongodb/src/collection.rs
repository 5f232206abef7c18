//! The generic query operator layer.
//!
//! [`EntityCollection`] binds an entity type to its storage collection and
//! exposes the full set of typed operations. Every operation resolves the
//! collection name before touching storage, wraps any driver failure into a
//! classified error after logging its context, and (for single-document
//! writes) reloads the canonical stored document before returning it.
//!
//! Each operation has a `*_with_session` variant that executes on a caller
//! session, so calls made inside a transaction's unit of work participate in
//! the same atomic unit.

use std::{fmt, marker::PhantomData, sync::Arc};

use bson::{Bson, DateTime, Document, de::deserialize_from_bson, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    ClientSession, Collection,
    options::{AggregateOptions, FindOneOptions, FindOptions, UpdateOptions},
};
use serde::Deserialize;
use tracing::error;

use entitylayer_core::{
    entity::{Entity, fields},
    error::{Error, Result},
    patch::Patch,
};

use crate::{connector::MongoConnector, lifecycle};

/// Typed operator handle for one entity type's collection.
///
/// Cheap to clone; holds only the shared connector. Collection handles are
/// resolved fresh per operation, so each call is independently retryable by
/// the caller.
pub struct EntityCollection<E: Entity> {
    connector: Arc<MongoConnector>,
    _entity: PhantomData<E>,
}

impl<E: Entity> EntityCollection<E> {
    /// Creates an operator handle bound to the given connector.
    pub fn new(connector: Arc<MongoConnector>) -> Self {
        Self {
            connector,
            _entity: PhantomData,
        }
    }

    /// Returns the collection name this entity type is stored in.
    pub fn name(&self) -> &'static str {
        E::collection_name()
    }

    fn resolve_name() -> Result<&'static str> {
        let name = E::collection_name();
        if name.is_empty() {
            return Err(Error::Internal(format!(
                "entity type `{}` resolved an empty collection name",
                std::any::type_name::<E>(),
            )));
        }
        Ok(name)
    }

    async fn handle(&self) -> Result<(Collection<Document>, &'static str)> {
        let name = Self::resolve_name()?;
        Ok((self.connector.collection(name).await?, name))
    }

    /// Inserts a new entity built from the supplied fields and returns the
    /// canonical stored copy.
    pub async fn create(&self, fields: Patch) -> Result<E> {
        self.create_inner(fields, None).await
    }

    /// [`create`](Self::create) executing on a caller session.
    pub async fn create_with_session(&self, fields: Patch, session: &mut ClientSession) -> Result<E> {
        self.create_inner(fields, Some(session)).await
    }

    async fn create_inner(&self, fields: Patch, session: Option<&mut ClientSession>) -> Result<E> {
        let (collection, name) = self.handle().await?;
        let document = lifecycle::insert_document(fields, DateTime::now());

        match session {
            Some(session) => {
                let inserted = collection
                    .insert_one(&document)
                    .session(&mut *session)
                    .await
                    .map_err(|e| storage_error(name, "insertOne", &document, &e))?;
                let id = inserted_id(name, &document, inserted.inserted_id)?;
                self.reload(&collection, name, id, Some(session)).await
            }
            None => {
                let inserted = collection
                    .insert_one(&document)
                    .await
                    .map_err(|e| storage_error(name, "insertOne", &document, &e))?;
                let id = inserted_id(name, &document, inserted.inserted_id)?;
                self.reload(&collection, name, id, None).await
            }
        }
    }

    /// Upserts the entity with the given identifier by merging the supplied
    /// updates, then returns the canonical stored copy.
    ///
    /// Caller-supplied options are preserved, but upsert is always forced on.
    pub async fn update_one(
        &self,
        id: ObjectId,
        updates: Patch,
        options: Option<UpdateOptions>,
    ) -> Result<E> {
        self.update_one_inner(id, updates, options, None).await
    }

    /// [`update_one`](Self::update_one) executing on a caller session.
    pub async fn update_one_with_session(
        &self,
        id: ObjectId,
        updates: Patch,
        options: Option<UpdateOptions>,
        session: &mut ClientSession,
    ) -> Result<E> {
        self.update_one_inner(id, updates, options, Some(session)).await
    }

    async fn update_one_inner(
        &self,
        id: ObjectId,
        updates: Patch,
        options: Option<UpdateOptions>,
        session: Option<&mut ClientSession>,
    ) -> Result<E> {
        let (collection, name) = self.handle().await?;
        let update = lifecycle::update_document(updates, DateTime::now());
        let filter = doc! { fields::ID: id };

        match session {
            Some(session) => {
                let result = collection
                    .update_one(filter, update.clone())
                    .with_options(options)
                    .upsert(true)
                    .session(&mut *session)
                    .await
                    .map_err(|e| storage_error(name, "updateOne", &update, &e))?;
                let reload_id = result.upserted_id.unwrap_or(Bson::ObjectId(id));
                self.reload(&collection, name, reload_id, Some(session)).await
            }
            None => {
                let result = collection
                    .update_one(filter, update.clone())
                    .with_options(options)
                    .upsert(true)
                    .await
                    .map_err(|e| storage_error(name, "updateOne", &update, &e))?;
                let reload_id = result.upserted_id.unwrap_or(Bson::ObjectId(id));
                self.reload(&collection, name, reload_id, None).await
            }
        }
    }

    /// Applies the supplied updates to every document matching the filter.
    ///
    /// Upsert is always forced on. No document is reloaded: multiple
    /// documents may have changed.
    pub async fn update_many(
        &self,
        filter: Document,
        updates: Patch,
        options: Option<UpdateOptions>,
    ) -> Result<()> {
        self.update_many_inner(filter, updates, options, None).await
    }

    /// [`update_many`](Self::update_many) executing on a caller session.
    pub async fn update_many_with_session(
        &self,
        filter: Document,
        updates: Patch,
        options: Option<UpdateOptions>,
        session: &mut ClientSession,
    ) -> Result<()> {
        self.update_many_inner(filter, updates, options, Some(session)).await
    }

    async fn update_many_inner(
        &self,
        filter: Document,
        updates: Patch,
        options: Option<UpdateOptions>,
        session: Option<&mut ClientSession>,
    ) -> Result<()> {
        let (collection, name) = self.handle().await?;
        let update = lifecycle::update_document(updates, DateTime::now());

        match session {
            Some(session) => collection
                .update_many(filter, update.clone())
                .with_options(options)
                .upsert(true)
                .session(session)
                .await
                .map_err(|e| storage_error(name, "updateMany", &update, &e))?,
            None => collection
                .update_many(filter, update.clone())
                .with_options(options)
                .upsert(true)
                .await
                .map_err(|e| storage_error(name, "updateMany", &update, &e))?,
        };

        Ok(())
    }

    /// Returns all documents matching the filter, in the storage's natural
    /// cursor order unless the options specify a sort.
    pub async fn find(&self, filter: Document, options: Option<FindOptions>) -> Result<Vec<E>> {
        self.find_inner(filter, options, None).await
    }

    /// [`find`](Self::find) executing on a caller session.
    pub async fn find_with_session(
        &self,
        filter: Document,
        options: Option<FindOptions>,
        session: &mut ClientSession,
    ) -> Result<Vec<E>> {
        self.find_inner(filter, options, Some(session)).await
    }

    async fn find_inner(
        &self,
        filter: Document,
        options: Option<FindOptions>,
        session: Option<&mut ClientSession>,
    ) -> Result<Vec<E>> {
        let (collection, name) = self.handle().await?;

        let documents: Vec<Document> = match session {
            Some(session) => {
                let mut cursor = collection
                    .find(filter.clone())
                    .with_options(options)
                    .session(&mut *session)
                    .await
                    .map_err(|e| storage_error(name, "find", &filter, &e))?;
                cursor
                    .stream(session)
                    .try_collect()
                    .await
                    .map_err(|e| storage_error(name, "find", &filter, &e))?
            }
            None => collection
                .find(filter.clone())
                .with_options(options)
                .await
                .map_err(|e| storage_error(name, "find", &filter, &e))?
                .try_collect()
                .await
                .map_err(|e| storage_error(name, "find", &filter, &e))?,
        };

        documents
            .into_iter()
            .map(|document| decode(name, document))
            .collect()
    }

    /// Returns the first document matching the filter, or `None` when
    /// nothing matches.
    pub async fn find_one(
        &self,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> Result<Option<E>> {
        self.find_one_inner(filter, options, None).await
    }

    /// [`find_one`](Self::find_one) executing on a caller session.
    pub async fn find_one_with_session(
        &self,
        filter: Document,
        options: Option<FindOneOptions>,
        session: &mut ClientSession,
    ) -> Result<Option<E>> {
        self.find_one_inner(filter, options, Some(session)).await
    }

    async fn find_one_inner(
        &self,
        filter: Document,
        options: Option<FindOneOptions>,
        session: Option<&mut ClientSession>,
    ) -> Result<Option<E>> {
        let (collection, name) = self.handle().await?;

        let document = match session {
            Some(session) => collection
                .find_one(filter.clone())
                .with_options(options)
                .session(session)
                .await
                .map_err(|e| storage_error(name, "findOne", &filter, &e))?,
            None => collection
                .find_one(filter.clone())
                .with_options(options)
                .await
                .map_err(|e| storage_error(name, "findOne", &filter, &e))?,
        };

        document.map(|document| decode(name, document)).transpose()
    }

    /// Looks up an entity by identifier, failing when it is absent.
    ///
    /// This is the fail-fast variant of [`find_one`](Self::find_one), for
    /// callers to whom absence is itself an error condition.
    pub async fn get_by_id_or_fail(
        &self,
        id: ObjectId,
        options: Option<FindOneOptions>,
    ) -> Result<E> {
        self.get_by_id_or_fail_inner(id, options, None).await
    }

    /// [`get_by_id_or_fail`](Self::get_by_id_or_fail) executing on a caller session.
    pub async fn get_by_id_or_fail_with_session(
        &self,
        id: ObjectId,
        options: Option<FindOneOptions>,
        session: &mut ClientSession,
    ) -> Result<E> {
        self.get_by_id_or_fail_inner(id, options, Some(session)).await
    }

    async fn get_by_id_or_fail_inner(
        &self,
        id: ObjectId,
        options: Option<FindOneOptions>,
        session: Option<&mut ClientSession>,
    ) -> Result<E> {
        let name = Self::resolve_name()?;
        self.find_one_inner(doc! { fields::ID: id }, options, session)
            .await?
            .ok_or_else(|| Error::NotFound(format!("document {id} in collection `{name}`")))
    }

    /// Counts the documents matching the filter.
    pub async fn count_documents(&self, filter: Document) -> Result<u64> {
        self.count_documents_inner(filter, None).await
    }

    /// [`count_documents`](Self::count_documents) executing on a caller session.
    pub async fn count_documents_with_session(
        &self,
        filter: Document,
        session: &mut ClientSession,
    ) -> Result<u64> {
        self.count_documents_inner(filter, Some(session)).await
    }

    async fn count_documents_inner(
        &self,
        filter: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<u64> {
        let (collection, name) = self.handle().await?;

        match session {
            Some(session) => collection
                .count_documents(filter.clone())
                .session(session)
                .await
                .map_err(|e| storage_error(name, "countDocuments", &filter, &e)),
            None => collection
                .count_documents(filter.clone())
                .await
                .map_err(|e| storage_error(name, "countDocuments", &filter, &e)),
        }
    }

    /// Removes at most one document matching the filter.
    ///
    /// The absence of a match is a no-op, not an error.
    pub async fn delete(&self, filter: Document) -> Result<()> {
        self.delete_inner(filter, None).await
    }

    /// [`delete`](Self::delete) executing on a caller session.
    pub async fn delete_with_session(
        &self,
        filter: Document,
        session: &mut ClientSession,
    ) -> Result<()> {
        self.delete_inner(filter, Some(session)).await
    }

    async fn delete_inner(
        &self,
        filter: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<()> {
        let (collection, name) = self.handle().await?;

        match session {
            Some(session) => collection
                .delete_one(filter.clone())
                .session(session)
                .await
                .map_err(|e| storage_error(name, "deleteOne", &filter, &e))?,
            None => collection
                .delete_one(filter.clone())
                .await
                .map_err(|e| storage_error(name, "deleteOne", &filter, &e))?,
        };

        Ok(())
    }

    /// Runs a multi-stage aggregation pipeline against the collection.
    ///
    /// The output type is chosen by the caller: pipelines may reshape
    /// documents, so pass `E` for passthrough pipelines and a projection
    /// type (or [`Document`]) otherwise.
    pub async fn search<R>(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> Result<Vec<R>>
    where
        R: for<'de> Deserialize<'de>,
    {
        self.search_inner(pipeline, options, None).await
    }

    /// [`search`](Self::search) executing on a caller session.
    pub async fn search_with_session<R>(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
        session: &mut ClientSession,
    ) -> Result<Vec<R>>
    where
        R: for<'de> Deserialize<'de>,
    {
        self.search_inner(pipeline, options, Some(session)).await
    }

    async fn search_inner<R>(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
        session: Option<&mut ClientSession>,
    ) -> Result<Vec<R>>
    where
        R: for<'de> Deserialize<'de>,
    {
        let (collection, name) = self.handle().await?;

        let documents: Vec<Document> = match session {
            Some(session) => {
                let mut cursor = collection
                    .aggregate(pipeline.clone())
                    .with_options(options)
                    .session(&mut *session)
                    .await
                    .map_err(|e| storage_error(name, "aggregate", &pipeline, &e))?;
                cursor
                    .stream(session)
                    .try_collect()
                    .await
                    .map_err(|e| storage_error(name, "aggregate", &pipeline, &e))?
            }
            None => collection
                .aggregate(pipeline.clone())
                .with_options(options)
                .await
                .map_err(|e| storage_error(name, "aggregate", &pipeline, &e))?
                .try_collect()
                .await
                .map_err(|e| storage_error(name, "aggregate", &pipeline, &e))?,
        };

        documents
            .into_iter()
            .map(|document| decode(name, document))
            .collect()
    }

    async fn reload(
        &self,
        collection: &Collection<Document>,
        name: &'static str,
        id: Bson,
        session: Option<&mut ClientSession>,
    ) -> Result<E> {
        let filter = doc! { fields::ID: id.clone() };
        let document = match session {
            Some(session) => collection
                .find_one(filter.clone())
                .session(session)
                .await
                .map_err(|e| storage_error(name, "findOne", &filter, &e))?,
            None => collection
                .find_one(filter.clone())
                .await
                .map_err(|e| storage_error(name, "findOne", &filter, &e))?,
        };

        match document {
            Some(document) => decode(name, document),
            // The write was acknowledged, so a missing reload signals a
            // storage-layer inconsistency.
            None => Err(Error::NotFound(format!(
                "failed to reload document {id} from collection `{name}`",
            ))),
        }
    }
}

impl<E: Entity> Clone for EntityCollection<E> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for EntityCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollection")
            .field("collection", &E::collection_name())
            .field("connector", &self.connector)
            .finish()
    }
}

fn inserted_id(name: &str, document: &Document, inserted_id: Bson) -> Result<Bson> {
    if matches!(inserted_id, Bson::Null) {
        error!(
            collection = name,
            parameters = ?document,
            "insert returned no identifier"
        );
        return Err(Error::persistence(
            name,
            "insert was not acknowledged or returned no identifier",
        ));
    }
    Ok(inserted_id)
}

fn decode<T>(name: &str, document: Document) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    deserialize_from_bson(Bson::Document(document))
        .map_err(|e| Error::persistence(name, format!("failed to decode stored document: {e}")))
}

fn storage_error<P: fmt::Debug>(
    collection: &str,
    operation: &str,
    parameters: &P,
    cause: &mongodb::error::Error,
) -> Error {
    error!(
        collection,
        operation,
        parameters = ?parameters,
        error = %cause,
        "storage operation failed"
    );
    Error::persistence(collection, cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entitylayer_core::status::EntityStatus;
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Unnamed {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        #[serde(rename = "createdAt")]
        created_at: DateTime,
        #[serde(rename = "updatedAt")]
        updated_at: DateTime,
        status: EntityStatus,
    }

    impl Entity for Unnamed {
        fn collection_name() -> &'static str {
            ""
        }

        fn id(&self) -> Option<&ObjectId> {
            self.id.as_ref()
        }

        fn created_at(&self) -> DateTime {
            self.created_at
        }

        fn updated_at(&self) -> DateTime {
            self.updated_at
        }

        fn status(&self) -> EntityStatus {
            self.status
        }
    }

    #[test]
    fn empty_collection_name_is_an_internal_error() {
        let err = EntityCollection::<Unnamed>::resolve_name().unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn empty_collection_name_fails_before_any_storage_call() {
        // An unreachable URI proves the name check runs first.
        let connector = Arc::new(MongoConnector::new("mongodb://localhost:1", "testdb"));
        let err = connector
            .entities::<Unnamed>()
            .count_documents(doc! {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn missing_inserted_id_is_a_persistence_error() {
        let err = inserted_id("widget", &doc! { "name": "x" }, Bson::Null).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));

        let id = ObjectId::new();
        let ok = inserted_id("widget", &doc! {}, Bson::ObjectId(id)).unwrap();
        assert_eq!(ok, Bson::ObjectId(id));
    }

    #[test]
    fn decode_failure_is_a_persistence_error() {
        // Missing lifecycle fields make the stored document malformed.
        let err = decode::<Unnamed>("widget", doc! { "name": "x" }).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }
}
