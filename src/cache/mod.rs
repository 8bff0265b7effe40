//! Per-workspace file cache.
//!
//! Stores, for every scanned file, its modification time and the hits found
//! at that time, so unchanged files can be skipped on the next scan.
//!
//! # Architecture
//!
//! * [`entry`]: the data model ([`CacheData`], [`CacheEntry`], [`CachedHit`]).
//! * [`store`]: JSON persistence and schema normalization.
//!
//! # Cache Invalidation
//!
//! An entry is valid only while the file's mtime, in milliseconds, is
//! exactly the recorded one. Any change triggers a full rescan of that file
//! and the entry is replaced wholesale.

pub mod entry;
pub mod store;

pub use entry::{mtime_millis, CacheData, CacheEntry, CachedHit, CACHE_VERSION};
pub use store::{
    cache_path, clear, normalize, read, try_read, try_write, write, CacheError, CacheResult,
    CACHE_FILE, STATE_DIR,
};
