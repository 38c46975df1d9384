//! Record transforms which are applied to every document during a rewrite.
//!
//! Any `FnMut(Document) -> Result<Document, E>` closure is a [Transform], for rewrites which are
//! driven by configuration file, [Pipeline] applies a list of [FieldOp] in order.
//!
//! # Example
//! ```
//! use bson::{doc, Bson};
//! use mongo_rewrite::{FieldOp, Pipeline, Transform};
//!
//! let mut pipeline = Pipeline::new(vec![
//!     FieldOp::Rename { from: "nm".to_string(), to: "name".to_string() },
//!     FieldOp::Unset { field: "tmp".to_string() },
//!     FieldOp::Set { field: "meta.version".to_string(), value: Bson::Int32(2) },
//! ]);
//! let doc = pipeline.apply(doc! {"nm": "a", "tmp": 1}).unwrap();
//! assert_eq!(doc, doc! {"name": "a", "meta": {"version": 2}});
//! ```
use crate::error::BoxError;
use bson::{Bson, Document};
use std::result::Result as StdResult;

/// Turn one record into another one.
pub trait Transform {
    /// transform `record`, the returned error aborts the rewrite.
    fn apply(&mut self, record: Document) -> StdResult<Document, BoxError>;
}

impl<F, E> Transform for F
where
    F: FnMut(Document) -> StdResult<Document, E>,
    E: Into<BoxError>,
{
    fn apply(&mut self, record: Document) -> StdResult<Document, BoxError> {
        self(record).map_err(Into::into)
    }
}

/// Transform which returns records unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Transform for Identity {
    fn apply(&mut self, record: Document) -> StdResult<Document, BoxError> {
        Ok(record)
    }
}

/// One field operation of a [Pipeline].
///
/// Field names may be dotted paths like `a.b.c` to reach into embedded documents.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldOp {
    /// move value of `from` to `to`, nothing happens when `from` is missing.
    Rename {
        /// field to rename.
        from: String,
        /// new field name.
        to: String,
    },
    /// remove `field`.
    Unset {
        /// field to remove.
        field: String,
    },
    /// set `field` to `value`, overwrite existing value.
    Set {
        /// field to set.
        field: String,
        /// new value.
        value: Bson,
    },
}

/// Apply [FieldOp]s to a record in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    ops: Vec<FieldOp>,
}

impl Pipeline {
    /// create a pipeline from `ops`.
    pub fn new(ops: Vec<FieldOp>) -> Self {
        Pipeline { ops }
    }

    /// field operations of the pipeline.
    pub fn ops(&self) -> &[FieldOp] {
        &self.ops
    }

    /// pipeline without any operation returns records unchanged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Transform for Pipeline {
    fn apply(&mut self, mut record: Document) -> StdResult<Document, BoxError> {
        for op in self.ops.iter() {
            match op {
                FieldOp::Rename { from, to } => {
                    if let Some(value) = remove_path(&mut record, from) {
                        insert_path(&mut record, to, value)?;
                    }
                }
                FieldOp::Unset { field } => {
                    remove_path(&mut record, field);
                }
                FieldOp::Set { field, value } => insert_path(&mut record, field, value.clone())?,
            }
        }
        Ok(record)
    }
}

fn remove_path(doc: &mut Document, path: &str) -> Option<Bson> {
    match path.split_once('.') {
        None => doc.remove(path),
        Some((head, rest)) => match doc.get_mut(head) {
            Some(Bson::Document(inner)) => remove_path(inner, rest),
            _ => None,
        },
    }
}

fn insert_path(doc: &mut Document, path: &str, value: Bson) -> StdResult<(), BoxError> {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !doc.contains_key(head) {
                doc.insert(head, Document::new());
            }
            match doc.get_mut(head) {
                Some(Bson::Document(inner)) => insert_path(inner, rest, value),
                _ => Err(format!("field {:?} is not an embedded document", head).into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_identity() {
        let doc = doc! {"a": 1, "b": {"c": [1, 2]}};
        assert_eq!(Identity.apply(doc.clone()).unwrap(), doc);
    }

    #[test]
    fn test_closure_transform() {
        let mut calls = 0;
        let mut double = |mut doc: Document| {
            calls += 1;
            let x = doc.get_i32("x")?;
            doc.insert("x", x * 2);
            Ok::<_, bson::document::ValueAccessError>(doc)
        };
        assert_eq!(double.apply(doc! {"x": 2}).unwrap(), doc! {"x": 4});
        assert!(double.apply(doc! {"y": 2}).is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_pipeline_rename() {
        let mut pipeline = Pipeline::new(vec![FieldOp::Rename {
            from: "a".to_string(),
            to: "b".to_string(),
        }]);
        assert_eq!(pipeline.apply(doc! {"a": 1}).unwrap(), doc! {"b": 1});
        // missing field.
        assert_eq!(pipeline.apply(doc! {"c": 1}).unwrap(), doc! {"c": 1});
    }

    #[test]
    fn test_pipeline_nested_path() {
        let mut pipeline = Pipeline::new(vec![
            FieldOp::Rename {
                from: "addr.zip".to_string(),
                to: "zip".to_string(),
            },
            FieldOp::Unset {
                field: "addr.tmp".to_string(),
            },
        ]);
        let res = pipeline
            .apply(doc! {"addr": {"zip": "100", "tmp": true, "city": "x"}})
            .unwrap();
        assert_eq!(res, doc! {"addr": {"city": "x"}, "zip": "100"});
    }

    #[test]
    fn test_pipeline_set_into_non_document() {
        let mut pipeline = Pipeline::new(vec![FieldOp::Set {
            field: "a.b".to_string(),
            value: Bson::Int32(1),
        }]);
        assert!(pipeline.apply(doc! {"a": 3}).is_err());
        assert_eq!(pipeline.apply(doc! {}).unwrap(), doc! {"a": {"b": 1}});
    }
}
