//! An in-process message bus wiring multiple hubs together.
//!
//! The bus plays the role a broadcast channel plays between real
//! execution contexts: every endpoint's frames are delivered to every
//! other endpoint, never echoed back to the sender. Endpoints may carry
//! an origin label; a frame sent with a target origin is only delivered
//! to endpoints labelled with that origin.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;

use topicbus_sync::{MessageHandler, Transport};

#[derive(Default)]
struct Endpoint {
    origin: Option<String>,
    handler: Option<MessageHandler>,
}

#[derive(Default)]
struct BusInner {
    endpoints: BTreeMap<u64, Endpoint>,
    next_id: u64,
}

/// A shared in-process bus. Clones refer to the same bus.
#[derive(Clone, Default)]
pub struct LocalBus {
    inner: Rc<RefCell<BusInner>>,
}

impl LocalBus {
    pub fn new() -> LocalBus {
        LocalBus::default()
    }

    /// Attach a new endpoint with no origin label.
    pub fn endpoint(&self) -> LocalTransport {
        self.labelled_endpoint(None)
    }

    /// Attach a new endpoint labelled with an origin, making it
    /// addressable by targeted sends.
    pub fn endpoint_at(&self, origin: impl Into<String>) -> LocalTransport {
        self.labelled_endpoint(Some(origin.into()))
    }

    fn labelled_endpoint(&self, origin: Option<String>) -> LocalTransport {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.endpoints.insert(
            id,
            Endpoint {
                origin,
                handler: None,
            },
        );
        LocalTransport {
            bus: self.inner.clone(),
            id,
        }
    }

    /// Number of attached endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.inner.borrow().endpoints.len()
    }
}

/// One endpoint on a [`LocalBus`].
pub struct LocalTransport {
    bus: Rc<RefCell<BusInner>>,
    id: u64,
}

impl Transport for LocalTransport {
    fn send(&mut self, frame: &str, target: Option<&str>) {
        // Collect first so no bus borrow is held while handlers run;
        // a handler may itself send.
        let recipients: Vec<MessageHandler> = {
            let inner = self.bus.borrow();
            inner
                .endpoints
                .iter()
                .filter(|(id, _)| **id != self.id)
                .filter(|(_, endpoint)| match target {
                    Some(origin) => endpoint.origin.as_deref() == Some(origin),
                    None => true,
                })
                .filter_map(|(_, endpoint)| endpoint.handler.clone())
                .collect()
        };

        trace!(sender = self.id, recipients = recipients.len(), "delivering frame");
        for handler in recipients {
            handler(frame);
        }
    }

    fn subscribe(&mut self, handler: MessageHandler) {
        if let Some(endpoint) = self.bus.borrow_mut().endpoints.get_mut(&self.id) {
            endpoint.handler = Some(handler);
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(endpoint) = self.bus.borrow_mut().endpoints.get_mut(&self.id) {
            endpoint.handler = None;
        }
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        self.bus.borrow_mut().endpoints.remove(&self.id);
    }
}
