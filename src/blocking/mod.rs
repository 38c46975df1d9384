/// provide mongo rewrite blocking apis.
mod connection;
mod memory;
#[doc(hidden)]
pub mod rewriter;
#[doc(hidden)]
pub mod storage;

pub use connection::Connection;
pub use memory::{MemoryStorage, StorageOp};
