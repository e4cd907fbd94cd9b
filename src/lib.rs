//! Message layer codec for the WAMP v2 pub/sub and RPC protocol
//!
//! Every WAMP message travels as a heterogeneous array whose first element
//! is a numeric type code. This library provides one typed struct per
//! message kind with a validating `parse`/`marshal` pair, a [`Message`]
//! tagged union dispatching on the type code, and pluggable [`Serializer`]
//! implementations (JSON, MsgPack) with per-message frame caching.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use wamp_proto::{JsonSerializer, Message, Serializer};
//!
//! // A SUBSCRIBE wire array, as produced by unserializing a frame
//! let wire = vec![json!(32), json!(917), json!(5123), json!({}), json!("com.example.topic")];
//!
//! // Parse into a typed message and serialize it back out
//! let message = Message::parse(&wire)?;
//! let bytes = message.serialize(&JsonSerializer)?;
//! assert_eq!(JsonSerializer.unserialize_message(&bytes)?, message);
//! # Ok::<(), wamp_proto::ProtocolError>(())
//! ```
//!
//! # Scope
//!
//! This is the codec only. Framing, transports, session state machines,
//! and routing logic all live above or below this layer; the boundary in
//! both directions is the wire array and the [`Serializer`] trait.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod message;
pub mod role;
pub mod serializer;
pub mod types;
pub mod validate;

pub use error::{ProtocolError, Result};
pub use message::{
    Call, CallResult, Cancel, CancelMode, Error, Event, Goodbye, Heartbeat, Hello, Interrupt,
    InterruptMode, Invocation, Match, Message, Payload, Publish, Published, Register, Registered,
    Subscribe, Subscribed, Unregister, Unregistered, Unsubscribe, Unsubscribed, WampMessage, Yield,
};
pub use role::{
    BrokerFeatures, CalleeFeatures, CallerFeatures, DealerFeatures, PublisherFeatures, Role,
    SubscriberFeatures,
};
pub use serializer::{JsonSerializer, MsgPackSerializer, SerializationCache, Serializer};
pub use types::MessageType;
pub use validate::{MAX_ID, validate_id, validate_options, validate_uri};

/// WAMP protocol version this codec targets
pub const VERSION: &str = "2.0-draft";
