//! Session cache for data that outlives a single request.
//!
//! Visit lists are cached per patient so reopening a patient costs no network
//! round trip; pull-to-refresh bypasses the lookup and overwrites the entry.

mod layer;
mod traits;

pub use layer::{CacheLookup, ChildCache, FetchTicket};
pub use traits::{CacheResult, CacheSource};
