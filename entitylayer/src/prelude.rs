//! Convenient re-exports of commonly used types from entitylayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without importing from multiple sub-modules:
//!
//! ```ignore
//! use entitylayer::prelude::*;
//! ```

pub use entitylayer_core::{
    entity::{Entity, fields},
    error::{Error, Result},
    patch::Patch,
    status::EntityStatus,
};
pub use entitylayer_mongodb::{
    collection::EntityCollection,
    connector::MongoConnector,
    transaction::TransactionCoordinator,
};
