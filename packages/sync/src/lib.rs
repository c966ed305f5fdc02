//! Cross-context sync for topicbus: persistence plus peer broadcast.
//!
//! Wraps a [`topicbus_core::TopicHub`] so that every committed mutation
//! is persisted to a [`BlobStore`] and broadcast over a [`Transport`]
//! as an [`Envelope`], and so that accepted inbound frames replace the
//! local snapshot (last writer wins, no merging, no re-broadcast).
//!
//! Side effects never fail the originating operation; failures are
//! reported through `tracing` diagnostics instead.
//!
//! # Example
//!
//! ```rust
//! use topicbus_core::CreateOptions;
//! use topicbus_sync::{CrossContextConfig, SyncedHub, SyncedHubOptions};
//!
//! let hub = SyncedHub::new(
//!     Default::default(),
//!     SyncedHubOptions {
//!         cross_context: CrossContextConfig::new("window-a").accept("window-b"),
//!         ..Default::default()
//!     },
//! );
//! hub.create("cart", None, CreateOptions::default()).unwrap();
//! assert_eq!(hub.peer_id(), "window-a");
//! ```

mod config;
mod envelope;
mod error;
mod synced;
mod traits;

pub use config::{ConfigureOptions, CrossContextConfig};
pub use envelope::Envelope;
pub use error::{BlobError, Error, SyncResult};
pub use synced::{SyncedHub, SyncedHubOptions, PERSIST_KEY};
pub use traits::{BlobStore, MessageHandler, Transport};
