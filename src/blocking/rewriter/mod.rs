#[doc(hidden)]
pub mod copier;
mod progress;
#[doc(hidden)]
pub mod reindex;

pub use copier::{copy, CopyReport, RewriteOptions};
pub use reindex::reindex;
