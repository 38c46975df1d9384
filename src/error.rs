use bson::document::ValueAccessError;
use mongodb::error::Error as MongoError;
use std::error::Error as StdError;
use std::result::Result as StdResult;
use thiserror::Error;

/// Error raised by a [Transform](crate::Transform).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors which can happen during a collection rewrite.
#[derive(Error, Debug)]
pub enum RewriteError {
    /// underlying mongodb failure, it's never retried.
    #[error("Mongodb connection error")]
    MongoError(#[from] MongoError),
    /// a metadata document doesn't have the expected shape.
    #[error("Bson value access error")]
    BsonError(#[from] ValueAccessError),
    /// the connection pre-check failed.
    #[error("Check permission for database {db:?} failed, connection string: {uri:?}, detailed: {detail:?}")]
    PermissionError {
        /// connection string.
        uri: String,
        /// database name.
        db: String,
        /// mongodb error.
        detail: MongoError,
    },
    /// target collection is already there, nothing is written.
    #[error("Collection {coll:?} already exists, unable to write")]
    CollectionExists {
        /// collection name.
        coll: String,
    },
    /// target collection doesn't contain every source document after copy.
    #[error("Rewrite {source_coll:?} to {target_coll:?} failed, expect {expected} records but found {actual}")]
    CountMismatch {
        /// source collection name.
        source_coll: String,
        /// target collection name.
        target_coll: String,
        /// source document count.
        expected: u64,
        /// target document count.
        actual: u64,
    },
    /// the transform rejected a document.
    #[error("Transform failed on record {position}")]
    TransformError {
        /// zero based position of the document in source cursor order.
        position: u64,
        /// error returned by the transform.
        source: BoxError,
    },
    /// index key direction is neither a number nor an index type name.
    #[error("Index {index:?} has an invalid direction for field {field:?}")]
    InvalidIndexKey {
        /// index name.
        index: String,
        /// field name.
        field: String,
    },
    /// batch size must be greater than zero.
    #[error("Invalid batch size {0}, it must be greater than 0")]
    InvalidBatchSize(usize),
    /// failed to read configuration file.
    #[error("Read configuration file failed")]
    IoError(#[from] std::io::Error),
    /// failed to parse configuration file.
    #[error("Parse configuration file failed")]
    ConfigError(#[from] toml::de::Error),
    /// a value can't be converted to bson.
    #[error("Convert value to bson failed")]
    BsonSerError(#[from] bson::ser::Error),
    /// a bson document can't be converted to the expected type.
    #[error("Convert bson to value failed")]
    BsonDeError(#[from] bson::de::Error),
    /// a configured datetime has no utc offset.
    #[error("Invalid datetime {0:?}, it must be a rfc3339 datetime with offset")]
    InvalidDatetime(String),
}

/// Result type of mongo rewrite.
pub type Result<T> = StdResult<T, RewriteError>;
