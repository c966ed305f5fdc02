//! Topicbus: a lightweight in-memory publish/subscribe topic store.
//!
//! State lives in named topics holding object-shaped values. Every
//! mutation commits a fresh immutable snapshot (copy-on-write), then
//! notifies per-topic listeners and store-wide listeners. A sync layer
//! persists snapshots and broadcasts them to peer contexts, which adopt
//! them wholesale (last writer wins).
//!
//! The layers are usable separately:
//! - [`core`]: the store, lifecycle, and listener engine
//! - [`sync`]: persistence and cross-context broadcast around a hub
//! - [`local`]: in-process blob stores and a message bus
//!
//! The most common entry points are re-exported at the top level.

pub use topicbus_core as core;
pub use topicbus_local as local;
pub use topicbus_sync as sync;

pub use topicbus_core::{
    CreateOptions, DeleteOptions, Error, GetOptions, ListenOptions, ListenerOptions, OpResult,
    ResetOptions, Snapshot, StoreMap, TopicHub, TopicValue, UpdateOptions,
};
pub use topicbus_local::{DiskBlobStore, LocalBus, MemoryBlobStore};
pub use topicbus_sync::{CrossContextConfig, SyncedHub, SyncedHubOptions};
