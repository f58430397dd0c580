//! Query cache: structural keys, storage backends and the fetch layer.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Addresses slots by structural `QueryKey`s
//! - Serves fresh entries without a request (stale time)
//! - Marks slots stale by key prefix and signals subscribed queries
//! - Optionally serves stale data when the network is unavailable

mod key;
mod layer;
mod storage;
mod traits;

pub use key::{KeyPart, QueryKey};
pub use layer::CacheLayer;
pub use storage::{MemoryStorage, SqliteStorage};
pub use traits::{CacheEntry, CacheResult, CacheSource, CacheStorage};
