use super::progress;
use crate::blocking::storage::{IndexDefinition, Storage};
use crate::error::{Result, RewriteError};
use bson::{Bson, Document};
use std::time::Instant;
use tracing::info;

/// Take indexes from `source` and create them in `target`, in lex order of index names.
///
/// The `_id_` index is skipped because every collection has it already.  Return names of created
/// indexes, in creation order.
pub fn reindex<S>(storage: &S, source: &str, target: &str) -> Result<Vec<String>>
where
    S: Storage + ?Sized,
{
    let mut indexes: Vec<IndexDefinition> = storage
        .list_indexes(source)?
        .into_iter()
        .filter(|index| !index.is_id_index())
        .collect();
    // sort indexes by name so (attr1) < (attr1, attr2) < (attr1, attr2, attr3) < ...
    indexes.sort_by(|a, b| a.name.cmp(&b.name));

    let mut created = Vec::with_capacity(indexes.len());
    for index in indexes {
        let now = Instant::now();
        let index = normalize_index(index)?;
        let name = storage.create_index(target, &index)?;
        info!(
            %target,
            created = %name,
            "{}",
            progress::index_message(&index.name, progress::secs_since(now))
        );
        created.push(name);
    }
    Ok(created)
}

/// Normalize numeric directions of `index` keys to 1 or -1.
///
/// Legacy indexes may save direction as a float (`1.0` rather than `1`).  Index type names like
/// `"text"` or `"2dsphere"` are kept as they are.
pub fn normalize_index(index: IndexDefinition) -> Result<IndexDefinition> {
    let mut keys = Document::new();
    for (field, direction) in index.keys.iter() {
        match normalize_direction(direction) {
            Some(d) => {
                keys.insert(field.clone(), d);
            }
            None => {
                return Err(RewriteError::InvalidIndexKey {
                    index: index.name,
                    field: field.clone(),
                })
            }
        }
    }
    Ok(IndexDefinition { keys, ..index })
}

fn normalize_direction(direction: &Bson) -> Option<Bson> {
    let ascending = match direction {
        Bson::Int32(v) => *v > 0,
        Bson::Int64(v) => *v > 0,
        Bson::Double(v) => *v > 0.0,
        Bson::String(_) => return Some(direction.clone()),
        _ => return None,
    };
    Some(Bson::Int32(if ascending { 1 } else { -1 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_normalize_direction() {
        assert_eq!(normalize_direction(&Bson::Int32(1)), Some(Bson::Int32(1)));
        assert_eq!(normalize_direction(&Bson::Int64(-1)), Some(Bson::Int32(-1)));
        assert_eq!(normalize_direction(&Bson::Double(1.0)), Some(Bson::Int32(1)));
        assert_eq!(normalize_direction(&Bson::Double(-1.0)), Some(Bson::Int32(-1)));
        assert_eq!(normalize_direction(&Bson::Int32(0)), Some(Bson::Int32(-1)));
        assert_eq!(
            normalize_direction(&Bson::String("2dsphere".to_string())),
            Some(Bson::String("2dsphere".to_string()))
        );
        assert_eq!(normalize_direction(&Bson::Boolean(true)), None);
    }

    #[test]
    fn test_normalize_index_keeps_key_order() {
        let index = IndexDefinition::new("b_1_a_-1", doc! {"b": 1.0, "a": -1.0});
        let normalized = normalize_index(index).unwrap();
        assert_eq!(normalized.keys, doc! {"b": 1, "a": -1});
        let fields: Vec<&String> = normalized.keys.keys().collect();
        assert_eq!(fields, vec!["b", "a"]);
        assert_eq!(normalized.name, "b_1_a_-1");
    }

    #[test]
    fn test_normalize_index_invalid_key() {
        let index = IndexDefinition::new("bad", doc! {"a": {"x": 1}});
        let res = normalize_index(index);
        assert!(matches!(
            res,
            Err(RewriteError::InvalidIndexKey { ref index, ref field }) if index == "bad" && field == "a"
        ));
    }
}
