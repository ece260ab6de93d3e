//! Durable storage for generated record pools.
//!
//! Pools live under a conventional layout rooted at a configured
//! directory:
//!
//! ```text
//! <root>/<project_key>/main.json            index: entity -> file list
//! <root>/<project_key>/data/<entity>_1.json JSON array of records
//! ```
//!
//! Reads tolerate damage (malformed files are skipped, a corrupt index is
//! treated as empty); writes are serialized per target file through an
//! in-process lock registry and land atomically via temp-file + rename.

mod atomic;
mod error;
mod index;
mod layout;
mod locks;
mod pool;

pub use error::{StoreError, StoreResult};
pub use index::PoolIndex;
pub use layout::PoolLayout;
pub use pool::{DatasetStore, PoolInfo, WriteOutcome};
