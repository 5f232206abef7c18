//! MongoDB realization of the entitylayer contract.
//!
//! This crate binds the storage-agnostic entity contract from
//! `entitylayer-core` to the MongoDB driver:
//!
//! - [`MongoConnector`] owns the connection descriptor, establishes the
//!   client lazily on first use, and resolves collection handles by name
//! - [`EntityCollection`] is the generic query operator layer: typed CRUD
//!   and aggregation operations for any entity type, with lifecycle
//!   defaults and reload-after-write semantics
//! - [`TransactionCoordinator`] wraps a unit of work in an atomic session
//!   with fixed isolation and durability settings
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use entitylayer_mongodb::MongoConnector;
//! use entitylayer_core::patch::Patch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = Arc::new(MongoConnector::new(
//!         "mongodb://localhost:27017",
//!         "my_database",
//!     ));
//!
//!     let widgets = connector.entities::<Widget>();
//!     let widget = widgets.create(Patch::new().set("name", "x")).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as entitylayer_mongodb;

pub mod collection;
pub mod connector;
pub mod transaction;

mod lifecycle;

pub use collection::EntityCollection;
pub use connector::MongoConnector;
pub use transaction::TransactionCoordinator;
