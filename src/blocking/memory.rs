//! In-memory [Storage], which keeps collections in a map and records every write operation.
use super::storage::{CollectionConfig, IndexDefinition, RecordCursor, Storage};
use crate::error::{Result, RewriteError};
use crate::{ID_INDEX_NAME, ID_KEY};
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Write operation which is executed against a [MemoryStorage].
#[derive(Clone, Debug, PartialEq)]
pub enum StorageOp {
    /// create collection.
    CreateCollection {
        /// collection name.
        coll: String,
        /// collection config.
        config: CollectionConfig,
    },
    /// bulk insert.
    BulkInsert {
        /// collection name.
        coll: String,
        /// how many records are inserted.
        len: usize,
    },
    /// create index.
    CreateIndex {
        /// collection name.
        coll: String,
        /// index keys.
        keys: Document,
    },
}

#[derive(Default)]
struct MemoryCollection {
    docs: Vec<Document>,
    indexes: Vec<IndexDefinition>,
}

impl MemoryCollection {
    fn new() -> Self {
        MemoryCollection {
            docs: vec![],
            indexes: vec![IndexDefinition::new(ID_INDEX_NAME, doc! {ID_KEY: 1})],
        }
    }
}

/// A [Storage] which keeps everything in memory.
///
/// Like mongodb, it assigns `_id` to inserted documents which don't have one, and creates the `_id_`
/// index for every new collection.
#[derive(Default)]
pub struct MemoryStorage {
    colls: RefCell<BTreeMap<String, MemoryCollection>>,
    ops: RefCell<Vec<StorageOp>>,
}

impl MemoryStorage {
    /// create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// put a collection with given `docs` into storage, replace existing one.
    ///
    /// It's a setup helper, so it's not recorded as a [StorageOp].
    pub fn insert_collection(&self, name: &str, docs: Vec<Document>) {
        let mut coll = MemoryCollection::new();
        coll.docs = docs.into_iter().map(with_object_id).collect();
        self.colls.borrow_mut().insert(name.to_string(), coll);
    }

    /// add an index definition to collection `name` as it is, without any validation.
    ///
    /// It's a setup helper, so it's not recorded as a [StorageOp].
    pub fn add_index(&self, name: &str, index: IndexDefinition) {
        self.colls
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(MemoryCollection::new)
            .indexes
            .push(index);
    }

    /// all documents of collection `name`, in insertion order.
    pub fn documents(&self, name: &str) -> Vec<Document> {
        self.colls
            .borrow()
            .get(name)
            .map(|c| c.docs.clone())
            .unwrap_or_default()
    }

    /// write operations executed so far.
    pub fn ops(&self) -> Vec<StorageOp> {
        self.ops.borrow().clone()
    }
}

fn with_object_id(mut doc: Document) -> Document {
    if !doc.contains_key(ID_KEY) {
        doc.insert(ID_KEY, ObjectId::new());
    }
    doc
}

/// generate index name the way mongodb does, e.g: `{"a": 1, "b": -1}` => `a_1_b_-1`.
fn default_index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(field, direction)| match direction {
            Bson::String(kind) => format!("{}_{}", field, kind),
            other => format!("{}_{}", field, other),
        })
        .collect::<Vec<_>>()
        .join("_")
}

impl Storage for MemoryStorage {
    fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.colls.borrow().keys().cloned().collect())
    }

    fn create_collection(&self, name: &str, config: &CollectionConfig) -> Result<()> {
        let mut colls = self.colls.borrow_mut();
        if colls.contains_key(name) {
            return Err(RewriteError::CollectionExists {
                coll: name.to_string(),
            });
        }
        colls.insert(name.to_string(), MemoryCollection::new());
        self.ops.borrow_mut().push(StorageOp::CreateCollection {
            coll: name.to_string(),
            config: config.clone(),
        });
        Ok(())
    }

    fn scan(&self, name: &str) -> Result<RecordCursor<'_>> {
        // scanning a missing collection gives nothing, same as mongodb.
        let docs = self.documents(name);
        Ok(Box::new(docs.into_iter().map(Ok)))
    }

    fn count(&self, name: &str) -> Result<u64> {
        Ok(self
            .colls
            .borrow()
            .get(name)
            .map_or(0, |c| c.docs.len() as u64))
    }

    fn bulk_insert(&self, name: &str, records: Vec<Document>) -> Result<()> {
        let len = records.len();
        self.colls
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(MemoryCollection::new)
            .docs
            .extend(records.into_iter().map(with_object_id));
        self.ops.borrow_mut().push(StorageOp::BulkInsert {
            coll: name.to_string(),
            len,
        });
        Ok(())
    }

    fn list_indexes(&self, name: &str) -> Result<Vec<IndexDefinition>> {
        Ok(self
            .colls
            .borrow()
            .get(name)
            .map(|c| c.indexes.clone())
            .unwrap_or_default())
    }

    fn create_index(&self, name: &str, index: &IndexDefinition) -> Result<String> {
        let index_name = default_index_name(&index.keys);
        let mut colls = self.colls.borrow_mut();
        let coll = colls
            .entry(name.to_string())
            .or_insert_with(MemoryCollection::new);
        // creating an identical index again is a no-op in mongodb.
        if !coll.indexes.iter().any(|i| i.name == index_name) {
            coll.indexes.push(IndexDefinition {
                name: index_name.clone(),
                keys: index.keys.clone(),
                options: index.options.clone(),
            });
        }
        self.ops.borrow_mut().push(StorageOp::CreateIndex {
            coll: name.to_string(),
            keys: index.keys.clone(),
        });
        Ok(index_name)
    }
}
