//! On-disk list metadata cache.
//!
//! Sits in front of a [`todoat_core::Backend`] for commands that primarily
//! enumerate lists. A single JSON file, backend-scoped, TTL-bounded, and
//! written with a temp-then-rename discipline so a concurrent reader never
//! observes a partially-written file.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cache;

pub use cache::{CacheError, CachedList, ListCache};
