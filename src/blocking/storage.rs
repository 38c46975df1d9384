//! Storage abstraction which the rewriter runs against.
use crate::error::{Result, RewriteError};
use crate::ID_INDEX_NAME;
use bson::document::ValueAccessError;
use bson::Document;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{CollectionOptions, CreateCollectionOptions, IndexOptions, WriteConcern};
use mongodb::sync::{Collection, Database};
use mongodb::IndexModel;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

/// A full-scan cursor over a collection.
pub type RecordCursor<'a> = Box<dyn Iterator<Item = Result<Document>> + 'a>;

/// Collection level configuration applied when a collection is created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionConfig {
    /// how long a write waits for acknowledgment before it's considered as failed.
    pub w_timeout: Option<Duration>,
}

/// Index option fields which identify an index rather than describe it, they are never carried
/// to another collection.
const INDEX_IDENTITY_OPTIONS: [&str; 3] = ["name", "v", "ns"];

/// mongodb error code of "namespace not found".
const NS_NOT_FOUND_CODE: i32 = 26;

/// A named index definition.
///
/// `keys` keeps the key order of the index, e.g: `{"name": 1, "age": -1}`.  `options` holds the
/// other index fields as mongodb lists them, e.g: `{"unique": true, "partialFilterExpression":
/// {"email": {"$exists": true}}}`, except `name`, `v` and `ns`.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexDefinition {
    /// index name.
    pub name: String,
    /// index keys, value is the direction or the index type.
    pub keys: Document,
    /// index options.
    pub options: Document,
}

impl IndexDefinition {
    /// create an index definition without options.
    pub fn new(name: impl Into<String>, keys: Document) -> Self {
        IndexDefinition {
            name: name.into(),
            keys,
            options: Document::new(),
        }
    }

    /// set index options, `name`, `v` and `ns` are dropped from `options`.
    pub fn with_options(mut self, mut options: Document) -> Self {
        for key in INDEX_IDENTITY_OPTIONS {
            options.remove(key);
        }
        self.options = options;
        self
    }

    /// is it the index which mongodb builds for `_id` automatically?
    pub fn is_id_index(&self) -> bool {
        self.name == ID_INDEX_NAME
    }
}

/// Everything the rewriter needs from a database.
pub trait Storage {
    /// names of collections in the database.
    fn list_collections(&self) -> Result<Vec<String>>;

    /// create collection `name` with given `config`.
    fn create_collection(&self, name: &str, config: &CollectionConfig) -> Result<()>;

    /// iterate over all documents of collection `name`.
    fn scan(&self, name: &str) -> Result<RecordCursor<'_>>;

    /// document count of collection `name`.
    fn count(&self, name: &str) -> Result<u64>;

    /// insert `records` into collection `name` with one write operation.
    fn bulk_insert(&self, name: &str, records: Vec<Document>) -> Result<()>;

    /// index definitions of collection `name`, including `_id_`.
    fn list_indexes(&self, name: &str) -> Result<Vec<IndexDefinition>>;

    /// create `index` on collection `name`, return the name of created index.
    fn create_index(&self, name: &str, index: &IndexDefinition) -> Result<String>;
}

/// [Storage] over a mongodb database.
pub struct MongoStorage {
    db: Database,
    configs: RefCell<HashMap<String, CollectionConfig>>,
}

impl MongoStorage {
    /// create a storage which works on given `db`.
    pub fn new(db: Database) -> Self {
        MongoStorage {
            db,
            configs: RefCell::new(HashMap::new()),
        }
    }

    /// collection handle, with write concern configured at creation time if any.
    fn collection(&self, name: &str) -> Collection<Document> {
        match self.configs.borrow().get(name).and_then(|c| c.w_timeout) {
            Some(w_timeout) => self.db.collection_with_options(
                name,
                CollectionOptions::builder()
                    .write_concern(WriteConcern::builder().w_timeout(w_timeout).build())
                    .build(),
            ),
            None => self.db.collection(name),
        }
    }
}

impl Storage for MongoStorage {
    fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.db.list_collection_names(None)?)
    }

    fn create_collection(&self, name: &str, config: &CollectionConfig) -> Result<()> {
        let options = config.w_timeout.map(|w_timeout| {
            CreateCollectionOptions::builder()
                .write_concern(WriteConcern::builder().w_timeout(w_timeout).build())
                .build()
        });
        self.db.create_collection(name, options)?;
        self.configs
            .borrow_mut()
            .insert(name.to_string(), config.clone());
        Ok(())
    }

    fn scan(&self, name: &str) -> Result<RecordCursor<'_>> {
        let cursor = self.collection(name).find(None, None)?;
        Ok(Box::new(cursor.map(|doc| doc.map_err(RewriteError::from))))
    }

    fn count(&self, name: &str) -> Result<u64> {
        Ok(self.collection(name).count_documents(None, None)?)
    }

    fn bulk_insert(&self, name: &str, records: Vec<Document>) -> Result<()> {
        self.collection(name).insert_many(records, None)?;
        Ok(())
    }

    fn list_indexes(&self, name: &str) -> Result<Vec<IndexDefinition>> {
        let cursor = match self.collection(name).list_indexes(None) {
            Ok(cursor) => cursor,
            // a missing collection has no index, same as an empty one.
            Err(e) if is_ns_not_found(&e) => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        let mut result = vec![];
        for model in cursor {
            let model = model?;
            let options = model.options.unwrap_or_default();
            // server always returns index name, treat it as malformed index info if missing.
            let index_name = options
                .name
                .clone()
                .ok_or(ValueAccessError::NotPresent)?;
            result.push(
                IndexDefinition::new(index_name, model.keys)
                    .with_options(bson::to_document(&options)?),
            );
        }
        Ok(result)
    }

    fn create_index(&self, name: &str, index: &IndexDefinition) -> Result<String> {
        // index name is left to mongodb, it's generated from keys.
        let options: IndexOptions = bson::from_document(index.options.clone())?;
        let model = IndexModel::builder()
            .keys(index.keys.clone())
            .options(options)
            .build();
        let created = self.collection(name).create_index(model, None)?;
        Ok(created.index_name)
    }
}

fn is_ns_not_found(error: &MongoError) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Command(err) => err.code == NS_NOT_FOUND_CODE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_index_definition_drops_identity_options() {
        let index = IndexDefinition::new("email_1", doc! {"email": 1}).with_options(doc! {
            "name": "email_1",
            "v": 2,
            "ns": "db.coll",
            "unique": true,
            "partialFilterExpression": {"email": {"$exists": true}},
        });
        assert_eq!(index.name, "email_1");
        assert_eq!(
            index.options,
            doc! {"unique": true, "partialFilterExpression": {"email": {"$exists": true}}}
        );
    }

    #[test]
    fn test_index_options_convert_to_driver_options() {
        let index = IndexDefinition::new("ts_1", doc! {"ts": 1}).with_options(doc! {
            "expireAfterSeconds": 3600,
            "sparse": true,
        });
        let options: IndexOptions = bson::from_document(index.options).unwrap();
        assert_eq!(options.expire_after, Some(Duration::from_secs(3600)));
        assert_eq!(options.sparse, Some(true));
        assert_eq!(options.name, None);
    }
}
