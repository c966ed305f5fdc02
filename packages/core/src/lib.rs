//! Core topicbus: the in-memory publish/subscribe topic store.
//!
//! This layer is the store-and-notification engine:
//! - `TopicValue`: object-shaped topic state, checked at the boundary
//! - `Snapshot` / `StoreCore`: immutable snapshots with copy-on-write
//!   commits
//! - `ListenerRegistry`: two-tier listener bookkeeping and fan-out
//! - `TopicHub`: the create/update/delete/reset lifecycle over both
//!
//! Persistence and cross-context bridging live above this layer (the
//! `topicbus-sync` crate); everything here is synchronous and local.
//!
//! # Example
//!
//! ```rust
//! use topicbus_core::{CreateOptions, TopicHub, TopicValue};
//! use serde_json::json;
//!
//! let mut hub = TopicHub::new(Default::default());
//! let cart = TopicValue::try_from(json!({ "items": [] })).unwrap();
//! hub.create("cart", Some(cart), CreateOptions::default()).unwrap();
//! assert!(hub.store().contains("cart"));
//! ```

mod cloner;
mod error;
mod hub;
mod listeners;
mod snapshot;
mod value;

pub use cloner::{Cloner, DeepCloner};
pub use error::{Error, OpResult};
pub use hub::{
    CreateOptions, DeleteOptions, GetOptions, ListenOptions, ListenerOptions, ResetOptions,
    TopicHub, UpdateOptions,
};
pub use listeners::{ListenerRegistry, StoreListener, TopicListener};
pub use snapshot::{Snapshot, StoreCore, StoreMap};
pub use value::{ObjectMap, TopicValue};
