use super::{progress, reindex};
use crate::blocking::storage::{CollectionConfig, Storage};
use crate::error::{Result, RewriteError};
use crate::transform::Transform;
use crate::{DEFAULT_BATCH_SIZE, DEFAULT_W_TIMEOUT_MS, ID_KEY};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Options of a [copy].
#[derive(Clone, Debug, PartialEq)]
pub struct RewriteOptions {
    /// how many records are inserted by one bulk insert.
    pub batch_size: usize,
    /// rebuild source indexes on target collection after copy.
    pub reindex: bool,
    /// write acknowledgment timeout of target collection.
    pub w_timeout: Duration,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        RewriteOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            reindex: true,
            w_timeout: Duration::from_millis(DEFAULT_W_TIMEOUT_MS),
        }
    }
}

impl RewriteOptions {
    /// configuration of the target collection.
    pub fn collection_config(&self) -> CollectionConfig {
        CollectionConfig {
            w_timeout: Some(self.w_timeout),
        }
    }
}

/// What a [copy] did.
#[derive(Clone, Debug, PartialEq)]
pub struct CopyReport {
    /// source collection name.
    pub source: String,
    /// target collection name.
    pub target: String,
    /// source document count before copy.
    pub total: u64,
    /// how many documents are inserted into target.
    pub inserted: u64,
    /// how many bulk inserts are executed.
    pub batches: usize,
    /// names of indexes created on target, in creation order.
    pub indexes: Vec<String>,
    /// total time cost.
    pub elapsed: Duration,
}

/// Pipe collection `source` to a new collection `target` through `transform`.
///
/// `target` must not exist, or [RewriteError::CollectionExists] is returned without touching
/// anything.  Every source document loses its `_id` attribute before it's passed to `transform`,
/// so target documents get new ids.  Documents are inserted `options.batch_size` at a time, and
/// when `options.reindex` is set, source indexes are re-created by [reindex](super::reindex) once
/// all documents are there.
///
/// Errors are never retried, when something goes wrong after `target` is created, the partially
/// written `target` is left as it is.
pub fn copy<S, T>(
    storage: &S,
    source: &str,
    target: &str,
    transform: &mut T,
    options: &RewriteOptions,
) -> Result<CopyReport>
where
    S: Storage + ?Sized,
    T: Transform + ?Sized,
{
    if options.batch_size == 0 {
        return Err(RewriteError::InvalidBatchSize(options.batch_size));
    }
    if storage.list_collections()?.iter().any(|c| c == target) {
        warn!(%target, "Collection {} already exists, unable to write", target);
        return Err(RewriteError::CollectionExists {
            coll: target.to_string(),
        });
    }

    let start = Instant::now();
    let start_time = progress::now();
    info!(%source, %target, %start_time, "Begin to rewrite collection. ");
    let total = storage.count(source)?;
    let cursor = storage.scan(source)?;
    storage.create_collection(target, &options.collection_config())?;

    let batch_size = options.batch_size;
    let mut buffer = Vec::with_capacity(batch_size);
    let mut cnt: u64 = 0;
    let mut batches = 0;
    for doc in cursor {
        let mut doc = doc?;
        doc.remove(ID_KEY);
        let doc = transform
            .apply(doc)
            .map_err(|source| RewriteError::TransformError {
                position: cnt,
                source,
            })?;
        buffer.push(doc);
        cnt += 1;

        if buffer.len() >= batch_size {
            let data_to_write = std::mem::replace(&mut buffer, Vec::with_capacity(batch_size));
            storage.bulk_insert(target, data_to_write)?;
            batches += 1;
            info!(
                cnt,
                total,
                "{}",
                progress::batch_message(cnt, total, progress::secs_since(start))
            );
        }
    }
    if !buffer.is_empty() {
        storage.bulk_insert(target, buffer)?;
        batches += 1;
    }

    let actual = storage.count(target)?;
    if actual != total {
        error!(%source, %target, expected = total, actual, "Record count mismatch after copy. ");
        return Err(RewriteError::CountMismatch {
            source_coll: source.to_string(),
            target_coll: target.to_string(),
            expected: total,
            actual,
        });
    }
    info!(
        "{}",
        progress::inserted_message(cnt, progress::secs_since(start))
    );

    let indexes = if options.reindex {
        reindex(storage, source, target)?
    } else {
        vec![]
    };

    let elapsed = start.elapsed();
    info!(
        "{}",
        progress::summary_message(source, target, elapsed.as_secs_f64())
    );
    Ok(CopyReport {
        source: source.to_string(),
        target: target.to_string(),
        total,
        inserted: cnt,
        batches,
        indexes,
        elapsed,
    })
}
