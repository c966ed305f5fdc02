//! The Cloner seam - deep structural copies of store state.
//!
//! Every commit works on an isolated copy of the current snapshot, and
//! every mutator receives an isolated copy of its topic, so consumer
//! code can never alias the committed store. The copy strategy is
//! pluggable; [`DeepCloner`] is the default and almost always what you
//! want.

use crate::snapshot::StoreMap;
use crate::value::TopicValue;

/// Produces independent copies of store state.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Cloner>`.
pub trait Cloner {
    /// Copy a whole store map. Mutating the copy must not affect the
    /// original.
    fn clone_store(&self, store: &StoreMap) -> StoreMap;

    /// Copy a single topic value.
    fn clone_topic(&self, topic: &TopicValue) -> TopicValue;
}

/// The default cloner: structural `Clone` of the owned value tree.
pub struct DeepCloner;

impl Cloner for DeepCloner {
    fn clone_store(&self, store: &StoreMap) -> StoreMap {
        store.clone()
    }

    fn clone_topic(&self, topic: &TopicValue) -> TopicValue {
        topic.clone()
    }
}

impl<T: Cloner + ?Sized> Cloner for Box<T> {
    fn clone_store(&self, store: &StoreMap) -> StoreMap {
        self.as_ref().clone_store(store)
    }

    fn clone_topic(&self, topic: &TopicValue) -> TopicValue {
        self.as_ref().clone_topic(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cloned_store_is_independent() {
        let cloner = DeepCloner;

        let mut topic = TopicValue::Empty;
        topic.insert("items", json!(["x"]));
        let mut store = StoreMap::new();
        store.insert("cart".to_string(), topic);

        let mut copy = cloner.clone_store(&store);
        copy.get_mut("cart")
            .unwrap()
            .insert("items", json!(["x", "y"]));

        assert_eq!(store["cart"].get("items"), Some(&json!(["x"])));
        assert_eq!(copy["cart"].get("items"), Some(&json!(["x", "y"])));
    }

    #[test]
    fn cloned_topic_is_independent() {
        let cloner = DeepCloner;

        let mut topic = TopicValue::Empty;
        topic.insert("count", json!(0));

        let mut copy = cloner.clone_topic(&topic);
        copy.insert("count", json!(1));

        assert_eq!(topic.get("count"), Some(&json!(0)));
    }

    #[test]
    fn boxed_cloner_works() {
        let cloner: Box<dyn Cloner> = Box::new(DeepCloner);
        let topic = TopicValue::Empty;
        assert_eq!(cloner.clone_topic(&topic), TopicValue::Empty);
    }
}
