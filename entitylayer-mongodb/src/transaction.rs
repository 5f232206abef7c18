//! Transaction coordinator: atomic units of work over a shared connector.

use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{
    ClientSession,
    options::{ReadConcern, ReadPreference, SelectionCriteria, WriteConcern},
};
use tracing::error;

use entitylayer_core::error::Error;

use crate::connector::MongoConnector;

/// Wraps a unit of work in an atomic session on the shared connection.
///
/// Transactions run with fixed settings: primary-only reads, local read
/// concern, and majority write acknowledgment. One coordinator serves one
/// connector; nested or concurrent transactions against the same connector
/// are not supported and must serialize or use independent connectors.
pub struct TransactionCoordinator {
    connector: Arc<MongoConnector>,
}

impl TransactionCoordinator {
    /// Creates a coordinator bound to the given connector.
    pub fn new(connector: Arc<MongoConnector>) -> Self {
        Self { connector }
    }

    /// Executes the unit of work inside a transaction.
    ///
    /// The unit of work receives the session; operator calls made through
    /// the `*_with_session` variants participate in the same atomic unit.
    /// On success the transaction is committed and the unit of work's value
    /// returned. On failure the transaction is aborted and the original
    /// error is re-raised unmodified, so callers can distinguish business
    /// failures from persistence failures. The session is released on every
    /// exit path when it leaves scope.
    ///
    /// # Errors
    ///
    /// Session setup and commit failures surface as
    /// [`Error::Persistence`]; anything the unit of work returns passes
    /// through untouched.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use entitylayer_core::{error::Error, patch::Patch};
    /// use futures::FutureExt;
    ///
    /// let coordinator = TransactionCoordinator::new(Arc::clone(&connector));
    /// let widgets = connector.entities::<Widget>();
    ///
    /// coordinator
    ///     .run(move |session| {
    ///         async move {
    ///             let widget = widgets
    ///                 .create_with_session(Patch::new().set("name", "x"), session)
    ///                 .await?;
    ///             widgets
    ///                 .update_one_with_session(
    ///                     *widget.id().unwrap(),
    ///                     Patch::new().set("status", EntityStatus::Verified),
    ///                     None,
    ///                     session,
    ///                 )
    ///                 .await?;
    ///             Ok::<_, Error>(())
    ///         }
    ///         .boxed()
    ///     })
    ///     .await?;
    /// ```
    pub async fn run<T, E, F>(&self, unit_of_work: F) -> Result<T, E>
    where
        E: From<Error>,
        F: for<'s> FnOnce(&'s mut ClientSession) -> BoxFuture<'s, Result<T, E>>,
    {
        let client = self.connector.client().await?;
        let mut session = client
            .start_session()
            .await
            .map_err(|e| Error::persistence("transaction", e))?;

        session
            .start_transaction()
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .read_concern(ReadConcern::local())
            .write_concern(WriteConcern::majority())
            .await
            .map_err(|e| Error::persistence("transaction", e))?;

        match unit_of_work(&mut session).await {
            Ok(value) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| Error::persistence("transaction", e))?;
                Ok(value)
            }
            Err(err) => {
                // The unit of work's error is what the caller must see;
                // an abort failure is logged, not surfaced.
                if let Err(abort_err) = session.abort_transaction().await {
                    error!(error = %abort_err, "failed to abort transaction");
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("connector", &self.connector)
            .finish()
    }
}
