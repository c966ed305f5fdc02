//! In-process implementations of the topicbus sync seams.
//!
//! - [`MemoryBlobStore`] / [`DiskBlobStore`]: persistence backends for
//!   the `BlobStore` contract (a shared map, and one file per key).
//! - [`LocalBus`] / [`LocalTransport`]: an in-process broadcast channel
//!   implementing `Transport`, for wiring several hubs together inside
//!   one process (or one test).

mod blob;
mod bus;

pub use blob::{DiskBlobStore, MemoryBlobStore};
pub use bus::{LocalBus, LocalTransport};
