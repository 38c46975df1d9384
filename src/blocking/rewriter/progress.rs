use chrono::{DateTime, Local};
use std::time::Instant;

/// wall clock time, just use for log..
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// seconds elapsed since `start`.
pub fn secs_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64()
}

/// percentage of `cnt` in `total`, an empty total is always complete.
pub fn percent(cnt: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        100.0 * cnt as f64 / total as f64
    }
}

/// progress line after a batch is flushed.
pub fn batch_message(cnt: u64, total: u64, secs: f64) -> String {
    format!(
        "{} of {} records ({:.1} percent) inserted in {:.3} secs",
        cnt,
        total,
        percent(cnt, total),
        secs
    )
}

/// line after every record is inserted and verified.
pub fn inserted_message(cnt: u64, secs: f64) -> String {
    format!("inserted {} records in {:.3} secs", cnt, secs)
}

/// line after an index is created on target.
pub fn index_message(name: &str, secs: f64) -> String {
    format!("created index {} in {:.3} secs", name, secs)
}

/// final line of a rewrite.
pub fn summary_message(source: &str, target: &str, secs: f64) -> String {
    format!("Rewrote {} to {}, total time {:.3} secs", source, target, secs)
}
