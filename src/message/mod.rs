//! Typed WAMP messages and their wire codec
//!
//! Every message kind owns a struct with a `parse`/`marshal` pair. Parsing
//! consumes a wire array (the already-unserialized heterogeneous list) and
//! validates every field; marshalling produces the canonical wire array
//! back. [`Message`] is the tagged union over all kinds, dispatching on the
//! type code at index 0.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::serializer::{SerializationCache, Serializer};
use crate::types::MessageType;
use crate::validate::{validate_id, validate_options, validate_uri};
use crate::{ProtocolError, Result};

mod pubsub;
mod rpc;
mod session;

pub use pubsub::{Event, Match, Publish, Published, Subscribe, Subscribed, Unsubscribe, Unsubscribed};
pub use rpc::{
    Call, CallResult, Cancel, CancelMode, Interrupt, InterruptMode, Invocation, Register,
    Registered, Unregister, Unregistered, Yield,
};
pub use session::{Goodbye, Heartbeat, Hello};

/// Application payload of a message: positional args plus keyword kwargs
///
/// The wire encodes kwargs after args, so kwargs can only be present when
/// args is. Construction enforces that; an empty args list is a valid
/// carrier for kwargs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    args: Option<Vec<Value>>,
    kwargs: Option<Map<String, Value>>,
}

impl Payload {
    /// An empty payload: neither args nor kwargs travel on the wire
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a payload, rejecting kwargs without args
    pub fn new(args: Option<Vec<Value>>, kwargs: Option<Map<String, Value>>) -> Result<Self> {
        if kwargs.is_some() && args.is_none() {
            return Err(ProtocolError::KwargsWithoutArgs);
        }
        Ok(Self { args, kwargs })
    }

    /// Create a payload of positional args only
    #[must_use]
    pub fn from_args(args: Vec<Value>) -> Self {
        Self {
            args: Some(args),
            kwargs: None,
        }
    }

    /// Positional arguments, if present on the wire
    #[must_use]
    pub fn args(&self) -> Option<&[Value]> {
        self.args.as_deref()
    }

    /// Keyword arguments, if present on the wire
    #[must_use]
    pub fn kwargs(&self) -> Option<&Map<String, Value>> {
        self.kwargs.as_ref()
    }

    /// Parse the optional `Args|list, Kwargs|dict` tail starting at `index`
    ///
    /// The caller has already bounded the wire length, so kwargs without
    /// args cannot occur here: a dict in the args slot is a type error.
    pub(crate) fn parse_tail(wire: &[Value], index: usize, message: &'static str) -> Result<Self> {
        let args = match wire.get(index) {
            None => None,
            Some(Value::Array(items)) => Some(items.clone()),
            Some(_) => {
                return Err(ProtocolError::InvalidType {
                    field: format!("'args' in {message}"),
                    expected: "list",
                });
            }
        };
        let kwargs = match wire.get(index + 1) {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => {
                return Err(ProtocolError::InvalidType {
                    field: format!("'kwargs' in {message}"),
                    expected: "dict",
                });
            }
        };
        Ok(Self { args, kwargs })
    }

    /// Append the payload tail to a wire array under construction
    ///
    /// Presence, not emptiness, decides emission: `Some(vec![])` travels
    /// as `[]`.
    pub(crate) fn append_to(&self, wire: &mut Vec<Value>) {
        if let Some(args) = &self.args {
            wire.push(Value::Array(args.clone()));
            if let Some(kwargs) = &self.kwargs {
                wire.push(Value::Object(kwargs.clone()));
            }
        }
    }
}

/// Behavior shared by every message kind
pub trait WampMessage: Sized {
    /// Wire type code at index 0 of the marshalled array
    const MESSAGE_TYPE: u64;

    /// Parse a wire array whose type code matches [`Self::MESSAGE_TYPE`]
    fn parse(wire: &[Value]) -> Result<Self>;

    /// Produce the canonical wire array for this message
    fn marshal(&self) -> Vec<Value>;

    /// Per-instance cache of serialized frames
    fn cache(&self) -> &SerializationCache;

    /// Serialize via `serializer`, reusing a previously cached frame
    ///
    /// The first call per serializer identity marshals and serializes;
    /// later calls return the cached bytes.
    fn serialize(&self, serializer: &dyn Serializer) -> Result<Bytes> {
        self.cache()
            .get_or_compute(serializer.id(), || serializer.serialize(&self.marshal()))
    }

    /// Drop all cached frames, forcing the next serialize to recompute
    ///
    /// Call after mutating any field of an already-serialized message.
    fn uncache(&self) {
        self.cache().clear();
    }
}

/// An `ERROR` message: reply to a failed request
///
/// Formats:
/// * `[ERROR, Session|id, RequestType|integer, Request|id, Details|dict, Error|uri]`
/// * `[ERROR, Session|id, RequestType|integer, Request|id, Details|dict, Error|uri, Args|list]`
/// * `[ERROR, Session|id, RequestType|integer, Request|id, Details|dict, Error|uri, Args|list, Kwargs|dict]`
///
/// `request_type` echoes the type code of the failed request and must be
/// one of the request kinds; replies and lifecycle messages never fail
/// with an `ERROR`.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// Session the message is transported for
    pub session: u64,
    /// Type of the request that failed
    pub request_type: MessageType,
    /// Request ID of the request that failed
    pub request: u64,
    /// Error URI naming the failure
    pub error: String,
    /// Application error payload
    pub payload: Payload,
    cache: SerializationCache,
}

impl Error {
    /// Create an `ERROR` message
    #[must_use]
    pub fn new(
        session: u64,
        request_type: MessageType,
        request: u64,
        error: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            session,
            request_type,
            request,
            error: error.into(),
            payload,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Error {
    const MESSAGE_TYPE: u64 = 4;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 6 | 7 | 8) {
            return Err(ProtocolError::InvalidLength {
                message: "ERROR",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in ERROR")?;
        let code = validate_id(&wire[2], "'request_type' in ERROR")?;
        let request_type = MessageType::from_u64(code)
            .filter(|message_type| message_type.is_request())
            .ok_or_else(|| ProtocolError::InvalidValue {
                field: "'request_type' in ERROR".to_owned(),
                reason: format!("{code} is not a request type code"),
            })?;
        let request = validate_id(&wire[3], "'request' in ERROR")?;
        // details carry no recognized keys yet; still must be a dict
        validate_options(&wire[4], "'details' in ERROR")?;
        let error = validate_uri(&wire[5], "'error' in ERROR")?;
        let payload = Payload::parse_tail(wire, 6, "ERROR")?;

        Ok(Self::new(session, request_type, request, error, payload))
    }

    fn marshal(&self) -> Vec<Value> {
        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request_type.as_u64()),
            Value::from(self.request),
            Value::Object(Map::new()),
            Value::from(self.error.clone()),
        ];
        self.payload.append_to(&mut wire);
        wire
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// Delegates an operation to the message struct inside any variant.
macro_rules! for_each_variant {
    ($message:expr, $inner:ident => $body:expr) => {
        match $message {
            Self::Hello($inner) => $body,
            Self::Goodbye($inner) => $body,
            Self::Heartbeat($inner) => $body,
            Self::Error($inner) => $body,
            Self::Publish($inner) => $body,
            Self::Published($inner) => $body,
            Self::Subscribe($inner) => $body,
            Self::Subscribed($inner) => $body,
            Self::Unsubscribe($inner) => $body,
            Self::Unsubscribed($inner) => $body,
            Self::Event($inner) => $body,
            Self::Call($inner) => $body,
            Self::Cancel($inner) => $body,
            Self::Result($inner) => $body,
            Self::Register($inner) => $body,
            Self::Registered($inner) => $body,
            Self::Unregister($inner) => $body,
            Self::Unregistered($inner) => $body,
            Self::Invocation($inner) => $body,
            Self::Interrupt($inner) => $body,
            Self::Yield($inner) => $body,
        }
    };
}

/// A parsed message of any kind
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs, clippy::large_enum_variant)]
pub enum Message {
    Hello(Hello),
    Goodbye(Goodbye),
    Heartbeat(Heartbeat),
    Error(Error),
    Publish(Publish),
    Published(Published),
    Subscribe(Subscribe),
    Subscribed(Subscribed),
    Unsubscribe(Unsubscribe),
    Unsubscribed(Unsubscribed),
    Event(Event),
    Call(Call),
    Cancel(Cancel),
    Result(CallResult),
    Register(Register),
    Registered(Registered),
    Unregister(Unregister),
    Unregistered(Unregistered),
    Invocation(Invocation),
    Interrupt(Interrupt),
    Yield(Yield),
}

impl Message {
    /// Parse a wire array, dispatching on the type code at index 0
    pub fn parse(wire: &[Value]) -> Result<Self> {
        let code = wire
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| ProtocolError::InvalidType {
                field: "message type code".to_owned(),
                expected: "integer",
            })?;
        let message_type =
            MessageType::from_u64(code).ok_or(ProtocolError::UnknownMessageType { code })?;
        tracing::trace!(%message_type, length = wire.len(), "parsing wire array");

        match message_type {
            MessageType::Hello => Hello::parse(wire).map(Self::Hello),
            MessageType::Goodbye => Goodbye::parse(wire).map(Self::Goodbye),
            MessageType::Heartbeat => Heartbeat::parse(wire).map(Self::Heartbeat),
            MessageType::Error => Error::parse(wire).map(Self::Error),
            MessageType::Publish => Publish::parse(wire).map(Self::Publish),
            MessageType::Published => Published::parse(wire).map(Self::Published),
            MessageType::Subscribe => Subscribe::parse(wire).map(Self::Subscribe),
            MessageType::Subscribed => Subscribed::parse(wire).map(Self::Subscribed),
            MessageType::Unsubscribe => Unsubscribe::parse(wire).map(Self::Unsubscribe),
            MessageType::Unsubscribed => Unsubscribed::parse(wire).map(Self::Unsubscribed),
            MessageType::Event => Event::parse(wire).map(Self::Event),
            MessageType::Call => Call::parse(wire).map(Self::Call),
            MessageType::Cancel => Cancel::parse(wire).map(Self::Cancel),
            MessageType::Result => CallResult::parse(wire).map(Self::Result),
            MessageType::Register => Register::parse(wire).map(Self::Register),
            MessageType::Registered => Registered::parse(wire).map(Self::Registered),
            MessageType::Unregister => Unregister::parse(wire).map(Self::Unregister),
            MessageType::Unregistered => Unregistered::parse(wire).map(Self::Unregistered),
            MessageType::Invocation => Invocation::parse(wire).map(Self::Invocation),
            MessageType::Interrupt => Interrupt::parse(wire).map(Self::Interrupt),
            MessageType::Yield => Yield::parse(wire).map(Self::Yield),
        }
    }

    /// Type of the contained message
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Hello(_) => MessageType::Hello,
            Self::Goodbye(_) => MessageType::Goodbye,
            Self::Heartbeat(_) => MessageType::Heartbeat,
            Self::Error(_) => MessageType::Error,
            Self::Publish(_) => MessageType::Publish,
            Self::Published(_) => MessageType::Published,
            Self::Subscribe(_) => MessageType::Subscribe,
            Self::Subscribed(_) => MessageType::Subscribed,
            Self::Unsubscribe(_) => MessageType::Unsubscribe,
            Self::Unsubscribed(_) => MessageType::Unsubscribed,
            Self::Event(_) => MessageType::Event,
            Self::Call(_) => MessageType::Call,
            Self::Cancel(_) => MessageType::Cancel,
            Self::Result(_) => MessageType::Result,
            Self::Register(_) => MessageType::Register,
            Self::Registered(_) => MessageType::Registered,
            Self::Unregister(_) => MessageType::Unregister,
            Self::Unregistered(_) => MessageType::Unregistered,
            Self::Invocation(_) => MessageType::Invocation,
            Self::Interrupt(_) => MessageType::Interrupt,
            Self::Yield(_) => MessageType::Yield,
        }
    }

    /// Produce the canonical wire array for the contained message
    #[must_use]
    pub fn marshal(&self) -> Vec<Value> {
        for_each_variant!(self, inner => inner.marshal())
    }

    /// Serialize the contained message, reusing its cached frame
    pub fn serialize(&self, serializer: &dyn Serializer) -> Result<Bytes> {
        for_each_variant!(self, inner => inner.serialize(serializer))
    }

    /// Drop the contained message's cached frames
    pub fn uncache(&self) {
        for_each_variant!(self, inner => inner.uncache());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::JsonSerializer;
    use serde_json::json;

    fn canonical_wires() -> Vec<Vec<Value>> {
        vec![
            vec![json!(1), json!(1), json!("realm1"), json!({"roles": {"caller": {}}})],
            vec![json!(2), json!(1), json!({"reason": "wamp.error.system_shutdown"})],
            vec![json!(3), json!(1), json!(4), json!(5)],
            vec![json!(4), json!(1), json!(32), json!(10), json!({}), json!("com.example.error")],
            vec![json!(16), json!(1), json!(2), json!({}), json!("com.example.topic")],
            vec![json!(17), json!(1), json!(2), json!(300)],
            vec![json!(32), json!(917), json!(5123), json!({}), json!("com.example.topic")],
            vec![json!(33), json!(1), json!(2), json!(77)],
            vec![json!(34), json!(1), json!(2), json!(77)],
            vec![json!(35), json!(1), json!(2)],
            vec![json!(36), json!(1), json!(10), json!(20), json!({"publisher": 99})],
            vec![json!(48), json!(1), json!(2), json!({}), json!("com.example.add"), json!([2, 3])],
            vec![json!(49), json!(1), json!(2), json!({"mode": "kill"})],
            vec![json!(50), json!(1), json!(2), json!({}), json!([5])],
            vec![json!(64), json!(1), json!(2), json!({}), json!("com.example.add")],
            vec![json!(65), json!(1), json!(2), json!(400)],
            vec![json!(66), json!(1), json!(2), json!(400)],
            vec![json!(67), json!(1), json!(2)],
            vec![json!(68), json!(1), json!(2), json!(400), json!({}), json!([2, 3])],
            vec![json!(69), json!(1), json!(2), json!({"mode": "abort"})],
            vec![json!(70), json!(1), json!(2), json!({"progress": true}), json!([5])],
        ]
    }

    #[test]
    fn test_parse_dispatch_all_types() {
        for wire in canonical_wires() {
            let message = Message::parse(&wire).unwrap();
            assert_eq!(message.message_type().as_u64(), wire[0].as_u64().unwrap());
            assert_eq!(message.marshal(), wire, "re-marshal of {wire:?}");
        }
    }

    #[test]
    fn test_parse_unknown_code() {
        let wire = vec![json!(99), json!(1)];
        assert!(matches!(
            Message::parse(&wire),
            Err(ProtocolError::UnknownMessageType { code: 99 })
        ));
    }

    #[test]
    fn test_parse_bad_code() {
        for wire in [vec![], vec![json!("hello")], vec![json!(1.5)], vec![json!(-4)]] {
            assert!(matches!(
                Message::parse(&wire),
                Err(ProtocolError::InvalidType { .. })
            ));
        }
    }

    /// Longest allowed wire per variant plus its minimum length. Optional
    /// tail fields make every prefix down to the minimum a valid wire.
    fn length_grid() -> Vec<(usize, Vec<Value>)> {
        vec![
            (4, vec![json!(1), json!(1), json!("realm1"), json!({"roles": {"caller": {}}})]),
            (3, vec![json!(2), json!(1), json!({})]),
            (4, vec![json!(3), json!(1), json!(4), json!(5), json!("pad")]),
            (6, vec![
                json!(4), json!(1), json!(32), json!(10), json!({}),
                json!("com.example.error"), json!([1]), json!({"k": 1}),
            ]),
            (5, vec![
                json!(16), json!(1), json!(2), json!({}), json!("com.example.topic"),
                json!([1]), json!({"k": 1}),
            ]),
            (4, vec![json!(17), json!(1), json!(2), json!(300)]),
            (5, vec![json!(32), json!(1), json!(2), json!({}), json!("com.example.topic")]),
            (4, vec![json!(33), json!(1), json!(2), json!(77)]),
            (4, vec![json!(34), json!(1), json!(2), json!(77)]),
            (3, vec![json!(35), json!(1), json!(2)]),
            (5, vec![
                json!(36), json!(1), json!(10), json!(20), json!({}),
                json!([1]), json!({"k": 1}),
            ]),
            (5, vec![
                json!(48), json!(1), json!(2), json!({}), json!("com.example.add"),
                json!([1]), json!({"k": 1}),
            ]),
            (4, vec![json!(49), json!(1), json!(2), json!({})]),
            (4, vec![json!(50), json!(1), json!(2), json!({}), json!([1]), json!({"k": 1})]),
            (5, vec![json!(64), json!(1), json!(2), json!({}), json!("com.example.add")]),
            (4, vec![json!(65), json!(1), json!(2), json!(400)]),
            (4, vec![json!(66), json!(1), json!(2), json!(400)]),
            (3, vec![json!(67), json!(1), json!(2)]),
            (5, vec![
                json!(68), json!(1), json!(2), json!(400), json!({}),
                json!([1]), json!({"k": 1}),
            ]),
            (4, vec![json!(69), json!(1), json!(2), json!({})]),
            (4, vec![json!(70), json!(1), json!(2), json!({}), json!([1]), json!({"k": 1})]),
        ]
    }

    #[test]
    fn test_length_grid_all_variants() {
        for (min_len, wire) in length_grid() {
            let code = wire[0].as_u64().unwrap();

            for len in min_len..=wire.len() {
                let message = Message::parse(&wire[..len]);
                assert!(message.is_ok(), "type {code} at length {len}: {message:?}");
            }
            assert!(
                matches!(
                    Message::parse(&wire[..min_len - 1]),
                    Err(ProtocolError::InvalidLength { .. })
                ),
                "type {code} below minimum length"
            );

            let mut extended = wire;
            extended.push(json!(0));
            assert!(
                matches!(
                    Message::parse(&extended),
                    Err(ProtocolError::InvalidLength { .. })
                ),
                "type {code} above maximum length"
            );
        }
    }

    #[test]
    fn test_empty_uri_rejected_everywhere() {
        // (index of the URI slot, canonical wire)
        let cases: Vec<(usize, Vec<Value>)> = vec![
            (2, vec![json!(1), json!(1), json!("realm1"), json!({"roles": {"caller": {}}})]),
            (5, vec![json!(4), json!(1), json!(32), json!(10), json!({}), json!("com.err")]),
            (4, vec![json!(16), json!(1), json!(2), json!({}), json!("com.example.topic")]),
            (4, vec![json!(32), json!(1), json!(2), json!({}), json!("com.example.topic")]),
            (4, vec![json!(48), json!(1), json!(2), json!({}), json!("com.example.add")]),
            (4, vec![json!(64), json!(1), json!(2), json!({}), json!("com.example.add")]),
        ];

        for (index, mut wire) in cases {
            let code = wire[0].as_u64().unwrap();
            assert!(Message::parse(&wire).is_ok(), "type {code} canonical wire");

            wire[index] = json!("");
            assert!(
                matches!(
                    Message::parse(&wire),
                    Err(ProtocolError::InvalidValue { .. })
                ),
                "type {code} with empty URI at index {index}"
            );
        }
    }

    #[test]
    fn test_error_full_roundtrip() {
        let wire = vec![
            json!(4),
            json!(1),
            json!(32),
            json!(10),
            json!({}),
            json!("com.example.error"),
            json!([1, 2]),
            json!({"k": "v"}),
        ];
        let Message::Error(error) = Message::parse(&wire).unwrap() else {
            panic!("expected an ERROR");
        };

        assert_eq!(error.session, 1);
        assert_eq!(error.request_type, MessageType::Subscribe);
        assert_eq!(error.request, 10);
        assert_eq!(error.error, "com.example.error");
        assert_eq!(error.payload.args(), Some(&[json!(1), json!(2)][..]));
        assert_eq!(error.payload.kwargs().unwrap().get("k"), Some(&json!("v")));
        assert_eq!(error.marshal(), wire);
    }

    #[test]
    fn test_error_rejects_non_request_type() {
        // 50 is RESULT, a reply; replies never fail with an ERROR
        let wire = vec![json!(4), json!(1), json!(50), json!(10), json!({}), json!("com.err")];
        assert!(matches!(
            Message::parse(&wire),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_error_marshals_empty_details() {
        let error = Error::new(1, MessageType::Call, 7, "com.example.failed", Payload::none());
        assert_eq!(error.marshal()[4], json!({}));
    }

    #[test]
    fn test_payload_kwargs_without_args_rejected() {
        let result = Payload::new(None, Some(Map::new()));
        assert!(matches!(result, Err(ProtocolError::KwargsWithoutArgs)));

        // empty args are a valid carrier
        assert!(Payload::new(Some(vec![]), Some(Map::new())).is_ok());
    }

    #[test]
    fn test_serialize_uses_cache() {
        let serializer = JsonSerializer;
        let hello = Hello::new(1, "realm1", vec![crate::role::Role::Caller(Default::default())]);

        let first = hello.serialize(&serializer).unwrap();
        let second = hello.serialize(&serializer).unwrap();
        assert_eq!(first, second);

        hello.uncache();
        let third = hello.serialize(&serializer).unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn test_message_serialize_roundtrip() {
        let serializer = JsonSerializer;
        let wire = vec![json!(33), json!(1), json!(2), json!(77)];
        let message = Message::parse(&wire).unwrap();

        let bytes = message.serialize(&serializer).unwrap();
        let reparsed = serializer.unserialize_message(&bytes).unwrap();
        assert_eq!(reparsed, message);
    }

    mod proptests {
        use super::*;
        use crate::validate::MAX_ID;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn subscribe_marshal_parse_roundtrip(
                session in 0u64..=MAX_ID,
                request in 0u64..=MAX_ID,
                topic in "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}",
            ) {
                let subscribe = Subscribe::new(session, request, topic, Match::Exact);
                let parsed = Subscribe::parse(&subscribe.marshal()).unwrap();
                prop_assert_eq!(parsed, subscribe);
            }

            #[test]
            fn published_marshal_parse_roundtrip(
                session in 0u64..=MAX_ID,
                request in 0u64..=MAX_ID,
                publication in 0u64..=MAX_ID,
            ) {
                let published = Published::new(session, request, publication);
                let parsed = Published::parse(&published.marshal()).unwrap();
                prop_assert_eq!(parsed, published);
            }

            #[test]
            fn wire_serialize_roundtrip(
                session in 0u64..=MAX_ID,
                request in 0u64..=MAX_ID,
                args in proptest::collection::vec(0i64..1000, 0..4),
            ) {
                let payload = Payload::from_args(args.into_iter().map(Value::from).collect());
                let call = Call::new(session, request, "com.example.add", payload);
                let bytes = call.serialize(&JsonSerializer).unwrap();
                let message = JsonSerializer.unserialize_message(&bytes).unwrap();
                prop_assert_eq!(message, Message::Call(call));
            }
        }
    }
}
