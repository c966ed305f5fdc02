//! Two-tier listener registry.
//!
//! Listeners come in two tiers: per-topic callbacks (notified only when
//! their topic changes, receiving the new value or `None` on deletion)
//! and store-level callbacks (notified on every store change, receiving
//! the new snapshot). Within a tier, callbacks run in registration
//! order; the per-topic tier always runs before the store tier.
//!
//! Listener identity is the `Rc` handle itself: registering the same
//! handle twice on one list is rejected, and removal requires the same
//! handle back. Removal drops every occurrence of the handle (filter
//! semantics); since duplicates are rejected at registration this is
//! equivalent to single removal, but it is the defined behavior.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::Error;
use crate::snapshot::Snapshot;
use crate::value::TopicValue;

/// A store-level callback handle. Receives each new snapshot.
pub type StoreListener = Rc<dyn Fn(&Snapshot)>;

/// A per-topic callback handle. Receives the topic's new value, or
/// `None` when the topic is being deleted.
pub type TopicListener = Rc<dyn Fn(Option<&TopicValue>)>;

/// Compare callback handles by the address of their referent.
fn same_handle<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Tracks store-level and per-topic listener lists.
#[derive(Default)]
pub struct ListenerRegistry {
    store: Vec<StoreListener>,
    topics: BTreeMap<String, Vec<TopicListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store-level listener.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateListener`] if the handle is already registered.
    pub fn add_store_listener(&mut self, callback: StoreListener) -> Result<(), Error> {
        if self.store.iter().any(|known| same_handle(known, &callback)) {
            return Err(Error::DuplicateListener);
        }
        self.store.push(callback);
        Ok(())
    }

    /// Remove a store-level listener, dropping every occurrence of the
    /// handle.
    ///
    /// # Errors
    ///
    /// [`Error::ListenerNotFound`] if the handle is not registered.
    pub fn remove_store_listener(&mut self, callback: &StoreListener) -> Result<(), Error> {
        if !self.store.iter().any(|known| same_handle(known, callback)) {
            return Err(Error::ListenerNotFound);
        }
        self.store.retain(|known| !same_handle(known, callback));
        Ok(())
    }

    /// Register a per-topic listener. The topic's existence is the
    /// hub's concern; the registry only guards against duplicates.
    pub fn add_topic_listener(&mut self, id: &str, callback: TopicListener) -> Result<(), Error> {
        let listeners = self.topics.entry(id.to_string()).or_default();
        if listeners.iter().any(|known| same_handle(known, &callback)) {
            return Err(Error::DuplicateListener);
        }
        listeners.push(callback);
        Ok(())
    }

    /// Remove a per-topic listener, dropping every occurrence of the
    /// handle.
    pub fn remove_topic_listener(
        &mut self,
        id: &str,
        callback: &TopicListener,
    ) -> Result<(), Error> {
        let listeners = self.topics.get_mut(id).ok_or(Error::ListenerNotFound)?;
        if !listeners.iter().any(|known| same_handle(known, callback)) {
            return Err(Error::ListenerNotFound);
        }
        listeners.retain(|known| !same_handle(known, callback));
        Ok(())
    }

    /// Drop a topic's whole listener list (topic deletion).
    pub fn drop_topic(&mut self, id: &str) {
        self.topics.remove(id);
    }

    /// Notify a topic's listeners in registration order.
    pub fn notify_topic(&self, id: &str, value: Option<&TopicValue>) {
        if let Some(listeners) = self.topics.get(id) {
            for listener in listeners {
                listener(value);
            }
        }
    }

    /// Notify store-level listeners in registration order.
    pub fn notify_store(&self, snapshot: &Snapshot) {
        for listener in &self.store {
            listener(snapshot);
        }
    }

    /// Number of listeners registered on a topic.
    pub fn topic_listener_count(&self, id: &str) -> usize {
        self.topics.get(id).map_or(0, Vec::len)
    }

    /// Number of store-level listeners.
    pub fn store_listener_count(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn noop_store_listener() -> StoreListener {
        Rc::new(|_: &Snapshot| {})
    }

    fn noop_topic_listener() -> TopicListener {
        Rc::new(|_: Option<&TopicValue>| {})
    }

    #[test]
    fn duplicate_store_listener_is_rejected() {
        let mut registry = ListenerRegistry::new();
        let listener = noop_store_listener();

        registry.add_store_listener(listener.clone()).unwrap();
        assert_eq!(
            registry.add_store_listener(listener.clone()),
            Err(Error::DuplicateListener)
        );
        assert_eq!(registry.store_listener_count(), 1);
    }

    #[test]
    fn distinct_handles_with_identical_bodies_both_register() {
        let mut registry = ListenerRegistry::new();
        registry.add_store_listener(noop_store_listener()).unwrap();
        registry.add_store_listener(noop_store_listener()).unwrap();
        assert_eq!(registry.store_listener_count(), 2);
    }

    #[test]
    fn removing_unknown_store_listener_fails() {
        let mut registry = ListenerRegistry::new();
        let listener = noop_store_listener();
        assert_eq!(
            registry.remove_store_listener(&listener),
            Err(Error::ListenerNotFound)
        );
    }

    #[test]
    fn store_listener_removal_is_idempotent_failure() {
        let mut registry = ListenerRegistry::new();
        let listener = noop_store_listener();

        registry.add_store_listener(listener.clone()).unwrap();
        registry.remove_store_listener(&listener).unwrap();
        assert_eq!(
            registry.remove_store_listener(&listener),
            Err(Error::ListenerNotFound)
        );
    }

    #[test]
    fn topic_listeners_are_scoped_by_id() {
        let mut registry = ListenerRegistry::new();
        let listener = noop_topic_listener();

        registry.add_topic_listener("a", listener.clone()).unwrap();
        registry.add_topic_listener("b", listener.clone()).unwrap();

        assert_eq!(registry.topic_listener_count("a"), 1);
        assert_eq!(registry.topic_listener_count("b"), 1);

        registry.remove_topic_listener("a", &listener).unwrap();
        assert_eq!(registry.topic_listener_count("a"), 0);
        assert_eq!(registry.topic_listener_count("b"), 1);
    }

    #[test]
    fn drop_topic_discards_the_whole_list() {
        let mut registry = ListenerRegistry::new();
        let listener = noop_topic_listener();

        registry.add_topic_listener("gone", listener.clone()).unwrap();
        registry.drop_topic("gone");

        assert_eq!(registry.topic_listener_count("gone"), 0);
        assert_eq!(
            registry.remove_topic_listener("gone", &listener),
            Err(Error::ListenerNotFound)
        );
    }

    #[test]
    fn notification_runs_in_registration_order() {
        let mut registry = ListenerRegistry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            registry
                .add_store_listener(Rc::new(move |_: &Snapshot| {
                    order.borrow_mut().push(tag);
                }))
                .unwrap();
        }

        registry.notify_store(&Snapshot::default());
        assert_eq!(*order.borrow(), ["first", "second", "third"]);
    }

    #[test]
    fn topic_notification_carries_none_for_deletion() {
        let mut registry = ListenerRegistry::new();
        let saw_none = Rc::new(RefCell::new(false));
        let saw = saw_none.clone();

        registry
            .add_topic_listener(
                "cart",
                Rc::new(move |value: Option<&TopicValue>| {
                    *saw.borrow_mut() = value.is_none();
                }),
            )
            .unwrap();

        registry.notify_topic("cart", None);
        assert!(*saw_none.borrow());
    }
}
