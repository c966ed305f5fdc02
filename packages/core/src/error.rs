//! Error types for the core engine.
//!
//! Every fallible operation on the hub takes a `silent_errors` option;
//! when it is set the operation reports `Ok(None)` instead of raising,
//! so callers that treat failures as "nothing happened" never unwind.

/// Errors raised by the core engine.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Topic ids are non-empty strings.
    #[error("topic id must not be empty")]
    EmptyTopicId,

    /// The addressed topic is not present in the store.
    #[error("topic does not exist: {id}")]
    TopicNotFound { id: String },

    /// `create` without `overwrite` hit an existing topic.
    #[error("topic already exists: {id}")]
    TopicAlreadyExists { id: String },

    /// The exact same callback handle is already registered on this
    /// listener list.
    #[error("listener is already registered")]
    DuplicateListener,

    /// The callback handle is not registered on this listener list.
    #[error("listener is not registered")]
    ListenerNotFound,

    /// A value offered at the API boundary was not a JSON object.
    #[error("topic values must be object-shaped")]
    NotAnObject,

    /// An update mutator declined to produce a value; the commit was
    /// discarded and the store is unchanged.
    #[error("mutator did not produce a value for topic: {id}")]
    MutatorAborted { id: String },

    /// `reset` found neither an explicit override nor a recorded
    /// default for the topic.
    #[error("no default state recorded for topic: {id}")]
    NoDefaultState { id: String },
}

/// Result of a hub operation honoring `silent_errors`.
///
/// * `Ok(Some(value))` - the operation applied.
/// * `Ok(None)` - the operation was silently skipped (`silent_errors`).
/// * `Err(error)` - the operation failed and `silent_errors` was off.
pub type OpResult<T> = Result<Option<T>, Error>;
