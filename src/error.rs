//! WAMP protocol error type

use thiserror::Error;

/// Errors raised while validating, parsing, marshaling, or serializing
/// WAMP messages
///
/// Every failure is synchronous and fail-fast: a message either fully
/// validates or no object is produced. The session layer is expected to
/// treat any of these as fatal to the connection.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Wire array length not in the allowed set for the message type
    #[error("invalid message length {length} for {message}")]
    InvalidLength {
        /// Wire name of the message, e.g. `SUBSCRIBE`
        message: &'static str,
        /// Actual wire array length
        length: usize,
    },

    /// A field holds a value of the wrong type
    #[error("invalid type for {field}: expected {expected}")]
    InvalidType {
        /// Position of the offending field, e.g. `'session' in SUBSCRIBE`
        field: String,
        /// Type the protocol requires at that position
        expected: &'static str,
    },

    /// A field holds a well-typed but invalid value
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Position of the offending field
        field: String,
        /// What was wrong with the value
        reason: String,
    },

    /// A mandatory field is absent
    #[error("missing mandatory '{field}' in {message}")]
    MissingField {
        /// Wire name of the message
        message: &'static str,
        /// Name of the absent field
        field: &'static str,
    },

    /// A `HELLO` names a role this implementation does not know
    #[error("unknown role '{role}' in HELLO")]
    UnknownRole {
        /// The offending role name
        role: String,
    },

    /// The leading type code matches no message kind
    #[error("unknown message type code {code}")]
    UnknownMessageType {
        /// The offending code
        code: u64,
    },

    /// Keyword arguments were supplied without positional arguments
    #[error("keyword arguments require positional arguments")]
    KwargsWithoutArgs,

    /// A serializer failed to turn a wire array into bytes
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// A serializer failed to turn bytes into a wire array
    #[error("unserialization failed: {0}")]
    Unserialize(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ProtocolError>;
