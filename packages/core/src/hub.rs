//! The topic lifecycle hub.
//!
//! [`TopicHub`] ties the copy-on-write store core, the listener
//! registry and the default store together into the public engine:
//! create/update/delete/reset topics, read snapshots, and register
//! listeners. Every mutation commits a new snapshot and then notifies
//! per-topic listeners before store-level listeners, each tier in
//! registration order, always with the fully-formed new state.
//!
//! # Example
//!
//! ```rust
//! use topicbus_core::{CreateOptions, TopicHub, UpdateOptions};
//! use serde_json::json;
//!
//! let mut hub = TopicHub::new(Default::default());
//! hub.create("cart", None, CreateOptions::default()).unwrap();
//! hub.update(
//!     "cart",
//!     |mut cart| {
//!         cart.insert("items", json!(["x"]));
//!         Some(cart)
//!     },
//!     UpdateOptions::default(),
//! )
//! .unwrap();
//!
//! let cart = hub.topic("cart", Default::default()).unwrap().unwrap();
//! assert_eq!(cart.get("items"), Some(&json!(["x"])));
//! ```

use std::collections::BTreeSet;

use crate::cloner::{Cloner, DeepCloner};
use crate::error::{Error, OpResult};
use crate::listeners::{ListenerRegistry, StoreListener, TopicListener};
use crate::snapshot::{Snapshot, StoreCore, StoreMap};
use crate::value::TopicValue;

/// Options for [`TopicHub::topic`].
#[derive(Clone, Copy, Debug, Default)]
pub struct GetOptions {
    pub silent_errors: bool,
}

/// Options for [`TopicHub::create`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateOptions {
    /// Treat creation of an existing topic as a wholesale replacement
    /// (delegates to update) instead of failing.
    pub overwrite: bool,
    pub silent_errors: bool,
}

/// Options for [`TopicHub::update`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateOptions {
    /// Auto-create the topic (as the empty object) if it is absent.
    pub ensure: bool,
    pub silent_errors: bool,
}

/// Options for [`TopicHub::delete`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteOptions {
    pub silent_errors: bool,
}

/// Options for [`TopicHub::reset`].
#[derive(Clone, Debug, Default)]
pub struct ResetOptions {
    /// Allow resetting an absent topic (bringing it into existence).
    pub ensure: bool,
    /// Reset to this value instead of the recorded default.
    pub override_default: Option<TopicValue>,
    pub silent_errors: bool,
}

/// Options for adding listeners.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListenOptions {
    /// Auto-create the topic before listening to it.
    pub ensure: bool,
    pub silent_errors: bool,
}

/// Options for removing listeners.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListenerOptions {
    pub silent_errors: bool,
}

/// Map a raised error to the silent no-op sentinel when requested.
fn silenced<T>(result: Result<T, Error>, silent_errors: bool) -> OpResult<T> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(_) if silent_errors => Ok(None),
        Err(error) => Err(error),
    }
}

/// The in-memory publish/subscribe topic store.
///
/// Construction fixes the default store (what `reset` reverts to) from
/// the initial map. The hub exclusively owns its committed snapshot;
/// callers only ever see cheap immutable snapshot handles or cloned
/// topic values.
pub struct TopicHub {
    core: StoreCore,
    registry: ListenerRegistry,
    defaults: StoreMap,
    topic_ids: BTreeSet<String>,
    cloner: Box<dyn Cloner>,
}

impl TopicHub {
    /// Create a hub over an initial store, which also becomes the
    /// default store for `reset`.
    pub fn new(initial: StoreMap) -> Self {
        Self::with_cloner(initial, Box::new(DeepCloner))
    }

    /// Create a hub with a custom copy strategy.
    pub fn with_cloner(initial: StoreMap, cloner: Box<dyn Cloner>) -> Self {
        let topic_ids = initial.keys().cloned().collect();
        TopicHub {
            core: StoreCore::new(cloner.clone_store(&initial)),
            registry: ListenerRegistry::new(),
            defaults: initial,
            topic_ids,
            cloner,
        }
    }

    /// The current committed snapshot.
    pub fn store(&self) -> Snapshot {
        self.core.snapshot()
    }

    /// Ids of the topics currently present, in order.
    pub fn topic_ids(&self) -> &BTreeSet<String> {
        &self.topic_ids
    }

    /// Read one topic's value (a clone; never an alias of the store).
    pub fn topic(&self, id: &str, options: GetOptions) -> OpResult<TopicValue> {
        silenced(self.topic_inner(id), options.silent_errors)
    }

    fn topic_inner(&self, id: &str) -> Result<TopicValue, Error> {
        if id.is_empty() {
            return Err(Error::EmptyTopicId);
        }
        self.core
            .snapshot()
            .topic(id)
            .map(|value| self.cloner.clone_topic(value))
            .ok_or_else(|| Error::TopicNotFound { id: id.to_string() })
    }

    /// Create a topic.
    ///
    /// Without `overwrite` an existing topic is a
    /// [`Error::TopicAlreadyExists`]; with it, creation delegates to an
    /// update that replaces the value wholesale (so topic listeners do
    /// fire). Plain creation notifies store-level listeners only - a
    /// fresh topic cannot have listeners yet.
    pub fn create(
        &mut self,
        id: &str,
        initial: Option<TopicValue>,
        options: CreateOptions,
    ) -> OpResult<TopicValue> {
        silenced(
            self.create_inner(id, initial, options.overwrite),
            options.silent_errors,
        )
    }

    fn create_inner(
        &mut self,
        id: &str,
        initial: Option<TopicValue>,
        overwrite: bool,
    ) -> Result<TopicValue, Error> {
        if id.is_empty() {
            return Err(Error::EmptyTopicId);
        }
        if self.core.snapshot().contains(id) {
            if overwrite {
                return self.update_inner(id, move |_| Some(initial.unwrap_or_default()), false);
            }
            return Err(Error::TopicAlreadyExists { id: id.to_string() });
        }

        let value = initial.unwrap_or_default();
        let cloner = self.cloner.as_ref();
        let committed = self.core.commit(cloner, |working| {
            working.insert(id.to_string(), value.clone());
            Ok(value)
        })?;
        self.registry.notify_store(&self.core.snapshot());
        self.topic_ids.insert(id.to_string());
        Ok(committed)
    }

    /// Update a topic through a mutator.
    ///
    /// The mutator receives an isolated deep clone of the current value
    /// and returns the replacement, or `None` to abort - in which case
    /// the whole commit is discarded ([`Error::MutatorAborted`]) and
    /// the store is unchanged. On success, the topic's listeners are
    /// notified with the new value, then store-level listeners with the
    /// new snapshot.
    pub fn update<M>(&mut self, id: &str, mutator: M, options: UpdateOptions) -> OpResult<TopicValue>
    where
        M: FnOnce(TopicValue) -> Option<TopicValue>,
    {
        silenced(
            self.update_inner(id, mutator, options.ensure),
            options.silent_errors,
        )
    }

    fn update_inner<M>(&mut self, id: &str, mutator: M, ensure: bool) -> Result<TopicValue, Error>
    where
        M: FnOnce(TopicValue) -> Option<TopicValue>,
    {
        if id.is_empty() {
            return Err(Error::EmptyTopicId);
        }
        if !self.core.snapshot().contains(id) {
            if ensure {
                self.create_inner(id, None, false)?;
            } else {
                return Err(Error::TopicNotFound { id: id.to_string() });
            }
        }

        let cloner = self.cloner.as_ref();
        let committed = self.core.commit(cloner, |working| {
            let seed = working
                .get(id)
                .map(|current| cloner.clone_topic(current))
                .unwrap_or_default();
            let next = mutator(seed).ok_or_else(|| Error::MutatorAborted {
                id: id.to_string(),
            })?;
            working.insert(id.to_string(), next.clone());
            Ok(next)
        })?;

        let snapshot = self.core.snapshot();
        self.registry.notify_topic(id, Some(&committed));
        self.registry.notify_store(&snapshot);
        Ok(committed)
    }

    /// Delete a topic.
    ///
    /// The topic's listeners are notified with `None` before the value
    /// is removed and before their list is dropped; store-level
    /// listeners then see the shrunken snapshot.
    pub fn delete(&mut self, id: &str, options: DeleteOptions) -> OpResult<()> {
        silenced(self.delete_inner(id), options.silent_errors)
    }

    fn delete_inner(&mut self, id: &str) -> Result<(), Error> {
        if id.is_empty() {
            return Err(Error::EmptyTopicId);
        }
        if !self.core.snapshot().contains(id) {
            return Err(Error::TopicNotFound { id: id.to_string() });
        }

        self.registry.notify_topic(id, None);
        self.registry.drop_topic(id);

        let cloner = self.cloner.as_ref();
        self.core.commit(cloner, |working| {
            working.remove(id);
            Ok(())
        })?;
        self.registry.notify_store(&self.core.snapshot());
        self.topic_ids.remove(id);
        Ok(())
    }

    /// Reset a topic to its default value.
    ///
    /// Resolution order: the explicit `override_default` if given, then
    /// the default recorded at construction, then (with `ensure`) the
    /// empty object; otherwise [`Error::NoDefaultState`]. An absent
    /// topic is only brought into existence with `ensure`.
    pub fn reset(&mut self, id: &str, options: ResetOptions) -> OpResult<TopicValue> {
        let ResetOptions {
            ensure,
            override_default,
            silent_errors,
        } = options;
        silenced(self.reset_inner(id, ensure, override_default), silent_errors)
    }

    fn reset_inner(
        &mut self,
        id: &str,
        ensure: bool,
        override_default: Option<TopicValue>,
    ) -> Result<TopicValue, Error> {
        if id.is_empty() {
            return Err(Error::EmptyTopicId);
        }
        if !self.core.snapshot().contains(id) && !ensure {
            return Err(Error::TopicNotFound { id: id.to_string() });
        }

        let target = match override_default {
            Some(value) => value,
            None => match self.defaults.get(id) {
                Some(default) => self.cloner.clone_topic(default),
                None if ensure => TopicValue::Empty,
                None => {
                    return Err(Error::NoDefaultState { id: id.to_string() });
                }
            },
        };

        let cloner = self.cloner.as_ref();
        let committed = self.core.commit(cloner, |working| {
            working.insert(id.to_string(), target.clone());
            Ok(target)
        })?;
        self.topic_ids.insert(id.to_string());

        let snapshot = self.core.snapshot();
        self.registry.notify_topic(id, Some(&committed));
        self.registry.notify_store(&snapshot);
        Ok(committed)
    }

    /// Register a store-level listener.
    pub fn add_store_listener(
        &mut self,
        callback: StoreListener,
        options: ListenerOptions,
    ) -> OpResult<()> {
        silenced(
            self.registry.add_store_listener(callback),
            options.silent_errors,
        )
    }

    /// Remove a store-level listener (all occurrences of the handle).
    pub fn remove_store_listener(
        &mut self,
        callback: &StoreListener,
        options: ListenerOptions,
    ) -> OpResult<()> {
        silenced(
            self.registry.remove_store_listener(callback),
            options.silent_errors,
        )
    }

    /// Register a per-topic listener. With `ensure`, an absent topic is
    /// auto-created (as the empty object) before registration - the
    /// creation itself notifies store-level listeners.
    pub fn add_topic_listener(
        &mut self,
        id: &str,
        callback: TopicListener,
        options: ListenOptions,
    ) -> OpResult<()> {
        silenced(
            self.add_topic_listener_inner(id, callback, options.ensure),
            options.silent_errors,
        )
    }

    fn add_topic_listener_inner(
        &mut self,
        id: &str,
        callback: TopicListener,
        ensure: bool,
    ) -> Result<(), Error> {
        if id.is_empty() {
            return Err(Error::EmptyTopicId);
        }
        if !self.core.snapshot().contains(id) {
            if ensure {
                self.create_inner(id, None, false)?;
            } else {
                return Err(Error::TopicNotFound { id: id.to_string() });
            }
        }
        self.registry.add_topic_listener(id, callback)
    }

    /// Remove a per-topic listener (all occurrences of the handle).
    pub fn remove_topic_listener(
        &mut self,
        id: &str,
        callback: &TopicListener,
        options: ListenerOptions,
    ) -> OpResult<()> {
        silenced(
            self.remove_topic_listener_inner(id, callback),
            options.silent_errors,
        )
    }

    fn remove_topic_listener_inner(
        &mut self,
        id: &str,
        callback: &TopicListener,
    ) -> Result<(), Error> {
        if id.is_empty() {
            return Err(Error::EmptyTopicId);
        }
        if !self.core.snapshot().contains(id) {
            return Err(Error::TopicNotFound { id: id.to_string() });
        }
        self.registry.remove_topic_listener(id, callback)
    }

    /// Replace the whole store from authoritative external state
    /// (a persisted blob loaded at construction). Rebuilds the
    /// presence set; the default store is untouched.
    pub fn restore(&mut self, map: StoreMap) {
        self.topic_ids = map.keys().cloned().collect();
        self.core.replace(Snapshot::from(map));
    }

    /// Swap the committed snapshot reference with one produced in
    /// another context.
    ///
    /// This bypasses the lifecycle entirely: no listener notification
    /// and no presence-set maintenance. The cross-context sync layer is
    /// the only intended caller.
    pub fn adopt_snapshot(&mut self, snapshot: Snapshot) {
        self.core.replace(snapshot);
    }
}
