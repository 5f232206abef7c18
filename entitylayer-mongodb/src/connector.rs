//! Store connector: lazy, idempotent access to a MongoDB deployment.

use std::sync::Arc;

use bson::Document;
use mea::rwlock::RwLock;
use mongodb::{Client, Collection, options::ClientOptions};

use entitylayer_core::{
    entity::Entity,
    error::{Error, Result},
};

use crate::collection::EntityCollection;

/// Owns the database connection and resolves collection handles by name.
///
/// Construction performs no I/O. The underlying client is built on first
/// use and reused by every later call; concurrent first calls cannot build
/// duplicate clients. The connector is the single shared resource of this
/// layer: pass it explicitly (wrapped in [`Arc`]) to whatever owns the
/// entity collections, and let the host application own its lifecycle.
pub struct MongoConnector {
    uri: String,
    database: String,
    client: RwLock<Option<Client>>,
}

impl MongoConnector {
    /// Creates a connector from a connection descriptor.
    ///
    /// No connection is established until the first operation needs one.
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            client: RwLock::new(None),
        }
    }

    /// Returns the name of the database this connector targets.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Returns the shared client, establishing it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the connection descriptor cannot be
    /// parsed or the client cannot be built.
    pub async fn client(&self) -> Result<Client> {
        {
            let guard = self.client.read().await;
            if let Some(client) = guard.as_ref() {
                return Ok(client.clone());
            }
        }

        let mut guard = self.client.write().await;
        // A concurrent caller may have won the race while we waited.
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        let client = Client::with_options(options).map_err(|e| Error::Connection(e.to_string()))?;
        *guard = Some(client.clone());

        Ok(client)
    }

    /// Resolves a handle to the named collection.
    ///
    /// Handles are resolved fresh per call and carry no release obligation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if no client can be produced.
    pub async fn collection(&self, name: &str) -> Result<Collection<Document>> {
        let client = self.client().await?;
        Ok(client.database(&self.database).collection(name))
    }

    /// Hands out the typed operator layer for an entity type, bound to this
    /// connector.
    pub fn entities<E: Entity>(self: &Arc<Self>) -> EntityCollection<E> {
        EntityCollection::new(Arc::clone(self))
    }
}

impl std::fmt::Debug for MongoConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConnector")
            .field("uri", &self.uri)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn construction_performs_no_io() {
        // An unreachable host is fine: nothing dials until first use.
        let connector = MongoConnector::new("mongodb://unreachable:27017", "testdb");
        assert_eq!(connector.database_name(), "testdb");
    }

    #[tokio::test]
    async fn client_is_built_once_and_reused() {
        let connector = MongoConnector::new("mongodb://localhost:27017", "testdb");
        assert!(connector.client.read().await.is_none());

        // The driver itself connects lazily, so building the client does not
        // require a reachable server.
        connector.client().await.unwrap();
        assert!(connector.client.read().await.is_some());

        // Repeated calls reuse the cached client.
        connector.client().await.unwrap();
        assert!(connector.client.read().await.is_some());
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_client() {
        let connector = Arc::new(MongoConnector::new("mongodb://localhost:27017", "testdb"));

        let a = Arc::clone(&connector);
        let b = Arc::clone(&connector);
        let (ra, rb) = tokio::join!(
            async move { a.client().await },
            async move { b.client().await },
        );
        assert!(ra.is_ok());
        assert!(rb.is_ok());
    }

    #[tokio::test]
    async fn invalid_descriptor_is_a_connection_error() {
        let connector = MongoConnector::new("not a uri", "testdb");
        let err = connector.client().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
