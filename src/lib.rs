//! Mongo rewrite lib, which pipes an existing mongodb collection into a new collection through a
//! user specified transform, and rebuilds the source indexes on the new collection.
//!
//! Provides two operations: [copy] and [reindex].
//!
//! [copy] reads every document of the source collection, drops the `_id` attribute, passes the
//! document through a [Transform] and writes the result in batches to a collection which must not
//! exist yet.  When it's done it calls [reindex] which re-creates source indexes in lex order.
//!
//! Both operations go through the [Storage] trait, [MongoStorage] talks to a real mongodb database
//! and [MemoryStorage] keeps everything in memory.
//!
//! # Example:
//! ```no_run
//! use bson::Document;
//! use mongo_rewrite::{copy, MongoStorage, RewriteOptions};
//! use mongodb::sync::Client;
//!
//! let db = Client::with_uri_str("mongodb://localhost:27017").unwrap().database("catalog");
//! let storage = MongoStorage::new(db);
//! let mut add_version = |mut doc: Document| {
//!     doc.insert("version", 2);
//!     Ok::<_, std::convert::Infallible>(doc)
//! };
//! copy(&storage, "old_stuff", "new_stuff", &mut add_version, &RewriteOptions::default()).unwrap();
//! ```
//!
//! # Memory example:
//! ```
//! use bson::doc;
//! use mongo_rewrite::{copy, Identity, MemoryStorage, RewriteOptions};
//!
//! let storage = MemoryStorage::new();
//! storage.insert_collection("a", vec![doc! {"x": 1}, doc! {"x": 2}]);
//! let report = copy(&storage, "a", "b", &mut Identity, &RewriteOptions::default()).unwrap();
//! assert_eq!(report.inserted, 2);
//! ```

#![warn(missing_docs)]

#[doc(hidden)]
pub mod blocking;
mod config;
mod error;
pub mod transform;

/// mongodb document identifier key.
const ID_KEY: &str = "_id";
/// name of the index which mongodb builds on `_id` for every collection.
const ID_INDEX_NAME: &str = "_id_";

/// how many documents are inserted by one bulk insert by default.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// default write acknowledgment timeout of the target collection, in milliseconds.
pub const DEFAULT_W_TIMEOUT_MS: u64 = 60000;

pub use blocking::rewriter::{copy, reindex, CopyReport, RewriteOptions};
pub use blocking::storage::{CollectionConfig, IndexDefinition, MongoStorage, Storage};
pub use blocking::{Connection, MemoryStorage, StorageOp};
pub use config::RewriteConfig;
pub use error::{BoxError, Result, RewriteError};
pub use transform::{FieldOp, Identity, Pipeline, Transform};
