//! Seam traits: persistence backends and cross-context transports.
//!
//! The sync layer treats both services as pluggable. Implementations
//! live elsewhere (`topicbus-local` provides in-process ones); the
//! layer itself only depends on these contracts.

use std::rc::Rc;

use bytes::Bytes;

use crate::error::BlobError;

/// A named-blob persistence backend.
///
/// The sync layer stores the entire serialized snapshot verbatim under
/// one fixed key. Writes are best-effort: a failing `set` is logged by
/// the caller, never raised to application code.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn BlobStore>`.
pub trait BlobStore {
    /// Read the blob stored under `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - nothing stored under the key (not an error).
    /// * `Ok(Some(bytes))` - the stored blob.
    /// * `Err(BlobError)` - the backend failed.
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, BlobError>;

    /// Store `data` under `key`, replacing any previous blob.
    fn set(&mut self, key: &str, data: Bytes) -> Result<(), BlobError>;
}

/// An inbound-message callback handle.
pub type MessageHandler = Rc<dyn Fn(&str)>;

/// A cross-context message channel.
///
/// `send` is fire-and-forget delivery of one serialized frame to zero
/// or more peers; there is no delivery or ordering guarantee. A single
/// inbound handler can be attached; attaching again replaces it.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Transport>`.
pub trait Transport {
    /// Send a frame to the peers, optionally scoped to a target origin
    /// (transports without origins may ignore it).
    fn send(&mut self, frame: &str, target: Option<&str>);

    /// Attach the inbound handler.
    fn subscribe(&mut self, handler: MessageHandler);

    /// Detach the inbound handler. In-flight sends are not cancelled.
    fn unsubscribe(&mut self);
}

// Blanket implementations for references and boxes

impl<T: BlobStore + ?Sized> BlobStore for &mut T {
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, BlobError> {
        (*self).get(key)
    }

    fn set(&mut self, key: &str, data: Bytes) -> Result<(), BlobError> {
        (*self).set(key, data)
    }
}

impl<T: BlobStore + ?Sized> BlobStore for Box<T> {
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, BlobError> {
        self.as_mut().get(key)
    }

    fn set(&mut self, key: &str, data: Bytes) -> Result<(), BlobError> {
        self.as_mut().set(key, data)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &str, target: Option<&str>) {
        (*self).send(frame, target)
    }

    fn subscribe(&mut self, handler: MessageHandler) {
        (*self).subscribe(handler)
    }

    fn unsubscribe(&mut self) {
        (*self).unsubscribe()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &str, target: Option<&str>) {
        self.as_mut().send(frame, target)
    }

    fn subscribe(&mut self, handler: MessageHandler) {
        self.as_mut().subscribe(handler)
    }

    fn unsubscribe(&mut self) {
        self.as_mut().unsubscribe()
    }
}
