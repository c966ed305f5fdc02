//! The synced hub: a topic hub with persistence and cross-context
//! broadcast wrapped around every mutation.
//!
//! Local mutations stay authoritative and synchronous; the two side
//! effects (persisting the new snapshot, broadcasting it to peers) are
//! best-effort and never fail the caller - failures go to the
//! diagnostic log. Inbound frames from accepted peers replace the
//! snapshot reference wholesale, a last-writer-wins model with no
//! conflict resolution.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;
use tracing::{debug, warn};

use topicbus_core::{
    CreateOptions, DeleteOptions, GetOptions, ListenOptions, ListenerOptions, OpResult,
    ResetOptions, Snapshot, StoreListener, StoreMap, TopicHub, TopicListener, TopicValue,
    UpdateOptions,
};

use crate::config::{ConfigureOptions, CrossContextConfig};
use crate::envelope::Envelope;
use crate::error::{Error, SyncResult};
use crate::traits::{BlobStore, MessageHandler, Transport};

/// The fixed key the whole snapshot is persisted under.
pub const PERSIST_KEY: &str = "topicbus-store";

/// Services and configuration for a [`SyncedHub`].
#[derive(Default)]
pub struct SyncedHubOptions {
    /// Where snapshots are persisted; `None` disables persistence.
    pub persistence: Option<Box<dyn BlobStore>>,
    /// The peer channel; `None` disables cross-context traffic.
    pub transport: Option<Box<dyn Transport>>,
    /// Inbound/outbound policy. Disabled by default.
    pub cross_context: CrossContextConfig,
}

struct SyncInner {
    hub: TopicHub,
    persistence: Option<Box<dyn BlobStore>>,
    transport: Option<Box<dyn Transport>>,
    cross: CrossContextConfig,
}

impl SyncInner {
    /// Persist and broadcast a freshly committed snapshot. Both side
    /// effects are best-effort: failures are logged, the committed
    /// local mutation never rolls back.
    fn after_commit(&mut self, snapshot: &Snapshot) {
        if let Some(store) = self.persistence.as_mut() {
            match serde_json::to_vec(snapshot) {
                Ok(blob) => {
                    if let Err(error) = store.set(PERSIST_KEY, Bytes::from(blob)) {
                        warn!(%error, "failed to persist store snapshot");
                    }
                }
                Err(error) => warn!(%error, "failed to serialize store snapshot"),
            }
        }

        if self.cross.enabled {
            if let Some(transport) = self.transport.as_mut() {
                let envelope = Envelope {
                    id: self.cross.id.clone(),
                    payload: snapshot.as_map().clone(),
                };
                match envelope.encode() {
                    Ok(frame) => transport.send(&frame, self.cross.target_origin.as_deref()),
                    Err(error) => warn!(%error, "failed to encode outbound snapshot"),
                }
            }
        }
    }

    /// Replace the local snapshot with a peer's payload.
    ///
    /// Deliberately bypasses the lifecycle: no listener notification,
    /// no persistence, no re-broadcast. A future "notify on inbound"
    /// opts in by changing only this function.
    fn adopt_remote_store(&mut self, sender: &str, payload: StoreMap) {
        debug!(sender, topics = payload.len(), "adopting remote store");
        self.hub.adopt_snapshot(Snapshot::from(payload));
    }

    fn handle_inbound(&mut self, frame: &str) {
        if !self.cross.enabled {
            return;
        }
        match Envelope::decode(frame) {
            // Broken frames are consumed, but worth a diagnostic.
            Err(error) => warn!(%error, "discarding undecodable cross-context frame"),
            // Not one of ours; silently irrelevant.
            Ok(None) => {}
            Ok(Some(envelope)) => {
                if !self.cross.acceptable_ids.contains(&envelope.id) {
                    return;
                }
                self.adopt_remote_store(&envelope.id, envelope.payload);
            }
        }
    }
}

/// Map a raised sync-layer error to the silent no-op sentinel.
fn silenced<T>(result: Result<T, Error>, silent_errors: bool) -> SyncResult<T> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(_) if silent_errors => Ok(None),
        Err(error) => Err(error),
    }
}

/// A [`TopicHub`] wrapped with persistence and cross-context sync.
///
/// Every mutating operation behaves exactly like its core counterpart,
/// then - if it actually published a new snapshot - persists the
/// snapshot under [`PERSIST_KEY`] and broadcasts it to peers.
///
/// # Example
///
/// ```rust
/// use topicbus_sync::{SyncedHub, SyncedHubOptions};
/// use topicbus_core::CreateOptions;
///
/// // No persistence, no transport: behaves like a plain hub.
/// let hub = SyncedHub::new(Default::default(), SyncedHubOptions::default());
/// hub.create("cart", None, CreateOptions::default()).unwrap();
/// assert!(hub.store().contains("cart"));
/// ```
pub struct SyncedHub {
    inner: Rc<RefCell<SyncInner>>,
}

impl SyncedHub {
    /// Build a synced hub over an initial store.
    ///
    /// When persistence is supplied, any previously persisted snapshot
    /// is loaded immediately and replaces the initial store (defaults
    /// for `reset` still come from `initial`). Load failures are
    /// logged; the provisional store then stays authoritative. When a
    /// transport is supplied, the inbound handler is attached before
    /// this returns.
    pub fn new(initial: StoreMap, options: SyncedHubOptions) -> SyncedHub {
        let SyncedHubOptions {
            persistence,
            transport,
            cross_context,
        } = options;

        let mut hub = TopicHub::new(initial);
        let mut persistence = persistence;
        if let Some(store) = persistence.as_mut() {
            match store.get(PERSIST_KEY) {
                Ok(Some(blob)) => match serde_json::from_slice::<StoreMap>(&blob) {
                    Ok(map) => hub.restore(map),
                    Err(error) => warn!(%error, "ignoring corrupt persisted store"),
                },
                Ok(None) => {}
                Err(error) => warn!(%error, "failed to load persisted store"),
            }
        }

        let inner = Rc::new(RefCell::new(SyncInner {
            hub,
            persistence,
            transport,
            cross: cross_context,
        }));

        let weak = Rc::downgrade(&inner);
        if let Some(transport) = inner.borrow_mut().transport.as_mut() {
            let handler: MessageHandler = Rc::new(move |frame: &str| {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().handle_inbound(frame);
                }
            });
            transport.subscribe(handler);
        }

        SyncedHub { inner }
    }

    /// Run a hub operation; if it published a new snapshot, fire the
    /// persistence and broadcast side effects.
    fn with_sync<T>(&self, op: impl FnOnce(&mut TopicHub) -> OpResult<T>) -> OpResult<T> {
        let mut inner = self.inner.borrow_mut();
        let before = inner.hub.store();
        let out = op(&mut inner.hub);
        let after = inner.hub.store();
        if !Snapshot::ptr_eq(&before, &after) {
            inner.after_commit(&after);
        }
        out
    }

    // Store surface (see TopicHub for the semantics).

    /// The current committed snapshot.
    pub fn store(&self) -> Snapshot {
        self.inner.borrow().hub.store()
    }

    /// Ids of the topics currently present.
    pub fn topic_ids(&self) -> Vec<String> {
        self.inner.borrow().hub.topic_ids().iter().cloned().collect()
    }

    /// Read one topic's value.
    pub fn topic(&self, id: &str, options: GetOptions) -> OpResult<TopicValue> {
        self.inner.borrow().hub.topic(id, options)
    }

    /// Create a topic, then persist and broadcast.
    pub fn create(
        &self,
        id: &str,
        initial: Option<TopicValue>,
        options: CreateOptions,
    ) -> OpResult<TopicValue> {
        self.with_sync(|hub| hub.create(id, initial, options))
    }

    /// Update a topic, then persist and broadcast.
    pub fn update<M>(&self, id: &str, mutator: M, options: UpdateOptions) -> OpResult<TopicValue>
    where
        M: FnOnce(TopicValue) -> Option<TopicValue>,
    {
        self.with_sync(|hub| hub.update(id, mutator, options))
    }

    /// Delete a topic, then persist and broadcast.
    pub fn delete(&self, id: &str, options: DeleteOptions) -> OpResult<()> {
        self.with_sync(|hub| hub.delete(id, options))
    }

    /// Reset a topic, then persist and broadcast.
    pub fn reset(&self, id: &str, options: ResetOptions) -> OpResult<TopicValue> {
        self.with_sync(|hub| hub.reset(id, options))
    }

    /// Register a store-level listener.
    pub fn add_store_listener(
        &self,
        callback: StoreListener,
        options: ListenerOptions,
    ) -> OpResult<()> {
        self.inner.borrow_mut().hub.add_store_listener(callback, options)
    }

    /// Remove a store-level listener.
    pub fn remove_store_listener(
        &self,
        callback: &StoreListener,
        options: ListenerOptions,
    ) -> OpResult<()> {
        self.inner
            .borrow_mut()
            .hub
            .remove_store_listener(callback, options)
    }

    /// Register a per-topic listener. With `ensure` this can create the
    /// topic, which persists and broadcasts like any other creation.
    pub fn add_topic_listener(
        &self,
        id: &str,
        callback: TopicListener,
        options: ListenOptions,
    ) -> OpResult<()> {
        self.with_sync(|hub| hub.add_topic_listener(id, callback, options))
    }

    /// Remove a per-topic listener.
    pub fn remove_topic_listener(
        &self,
        id: &str,
        callback: &TopicListener,
        options: ListenerOptions,
    ) -> OpResult<()> {
        self.inner
            .borrow_mut()
            .hub
            .remove_topic_listener(id, callback, options)
    }

    // Cross-context configuration surface.

    /// This instance's sender id.
    pub fn peer_id(&self) -> String {
        self.inner.borrow().cross.id.clone()
    }

    /// Change the sender id stamped on outbound frames.
    pub fn set_peer_id(&self, id: &str, options: ConfigureOptions) -> SyncResult<String> {
        let result = if id.is_empty() {
            Err(Error::InvalidPeerId)
        } else {
            self.inner.borrow_mut().cross.id = id.to_string();
            Ok(id.to_string())
        };
        silenced(result, options.silent_errors)
    }

    /// Turn cross-context traffic on. Returns the new state.
    pub fn enable_cross_context(&self) -> bool {
        self.inner.borrow_mut().cross.enabled = true;
        true
    }

    /// Turn cross-context traffic off. Returns the new state.
    pub fn disable_cross_context(&self) -> bool {
        self.inner.borrow_mut().cross.enabled = false;
        false
    }

    /// The configured outbound target origin.
    pub fn target_origin(&self) -> Option<String> {
        self.inner.borrow().cross.target_origin.clone()
    }

    /// Address outbound frames to `origin`.
    pub fn set_target_origin(&self, origin: &str, options: ConfigureOptions) -> SyncResult<String> {
        let result = if origin.is_empty() {
            Err(Error::InvalidTargetOrigin)
        } else {
            self.inner.borrow_mut().cross.target_origin = Some(origin.to_string());
            Ok(origin.to_string())
        };
        silenced(result, options.silent_errors)
    }

    /// The sender ids currently accepted.
    pub fn acceptable_ids(&self) -> std::collections::BTreeSet<String> {
        self.inner.borrow().cross.acceptable_ids.clone()
    }

    /// Replace the accepted-sender set wholesale.
    pub fn replace_acceptable_ids(
        &self,
        ids: std::collections::BTreeSet<String>,
        options: ConfigureOptions,
    ) -> SyncResult<std::collections::BTreeSet<String>> {
        let result = if ids.iter().any(String::is_empty) {
            Err(Error::InvalidAcceptableId)
        } else {
            self.inner.borrow_mut().cross.acceptable_ids = ids.clone();
            Ok(ids)
        };
        silenced(result, options.silent_errors)
    }

    /// Accept frames from one more sender. Returns the updated set.
    pub fn add_acceptable_id(
        &self,
        id: &str,
        options: ConfigureOptions,
    ) -> SyncResult<std::collections::BTreeSet<String>> {
        let result = if id.is_empty() {
            Err(Error::InvalidAcceptableId)
        } else {
            let mut inner = self.inner.borrow_mut();
            inner.cross.acceptable_ids.insert(id.to_string());
            Ok(inner.cross.acceptable_ids.clone())
        };
        silenced(result, options.silent_errors)
    }

    /// Stop accepting frames from a sender. Removing an unknown id is
    /// a no-op. Returns the updated set.
    pub fn remove_acceptable_id(
        &self,
        id: &str,
        options: ConfigureOptions,
    ) -> SyncResult<std::collections::BTreeSet<String>> {
        let result = if id.is_empty() {
            Err(Error::InvalidAcceptableId)
        } else {
            let mut inner = self.inner.borrow_mut();
            inner.cross.acceptable_ids.remove(id);
            Ok(inner.cross.acceptable_ids.clone())
        };
        silenced(result, options.silent_errors)
    }

    /// Detach the inbound handler from the transport. Does not cancel
    /// anything already in flight, and outbound broadcast keeps working.
    pub fn unsubscribe(&self) {
        if let Some(transport) = self.inner.borrow_mut().transport.as_mut() {
            transport.unsubscribe();
        }
    }
}
