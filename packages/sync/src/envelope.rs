//! The wire envelope: one JSON document per frame.
//!
//! Every outbound broadcast carries the sender's peer id and the full
//! new store snapshot. Decoding distinguishes irrelevant frames (the
//! sender id is not a string, so this cannot be one of ours) from
//! broken ones (JSON or payload that does not parse), because the two
//! are handled differently on arrival.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use topicbus_core::StoreMap;

use crate::error::Error;

/// A cross-context message: `{ "id": sender, "payload": snapshot }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub payload: StoreMap,
}

impl Envelope {
    /// Serialize to a single JSON frame.
    pub fn encode(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an inbound frame.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(envelope))` - a well-formed frame.
    /// * `Ok(None)` - valid JSON whose sender id is not a string;
    ///   irrelevant, to be ignored without noise.
    /// * `Err(Error)` - the frame is not valid JSON, or its payload is
    ///   not an object-shaped store.
    pub fn decode(frame: &str) -> Result<Option<Envelope>, Error> {
        let raw: JsonValue = serde_json::from_str(frame)?;
        let id = match raw.get("id").and_then(JsonValue::as_str) {
            Some(id) => id.to_string(),
            None => return Ok(None),
        };
        let payload: StoreMap =
            serde_json::from_value(raw.get("payload").cloned().unwrap_or(JsonValue::Null))?;
        Ok(Some(Envelope { id, payload }))
    }
}
