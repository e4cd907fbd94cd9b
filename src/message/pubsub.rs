//! Publish & subscribe messages: `PUBLISH` through `EVENT`

use serde_json::{Map, Value};

use crate::serializer::SerializationCache;
use crate::validate::{
    optional_bool, optional_id, optional_id_list, optional_string, validate_id, validate_options,
    validate_uri,
};
use crate::{ProtocolError, Result};

use super::{Payload, WampMessage};

/// Topic/procedure matching policy, carried as the `match` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Match {
    /// Match the URI exactly (the default)
    #[default]
    Exact,
    /// Match any URI starting with the given prefix
    Prefix,
    /// Match against a wildcard pattern
    Wildcard,
}

impl Match {
    /// Wire value of the `match` option
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Wildcard => "wildcard",
        }
    }

    fn from_options(options: &Map<String, Value>, message: &'static str) -> Result<Self> {
        match optional_string(options, "match", message)?.as_deref() {
            None | Some("exact") => Ok(Self::Exact),
            Some("prefix") => Ok(Self::Prefix),
            Some("wildcard") => Ok(Self::Wildcard),
            Some(other) => Err(ProtocolError::InvalidValue {
                field: format!("'match' option in {message}"),
                reason: format!("unknown matching policy '{other}'"),
            }),
        }
    }
}

/// A `PUBLISH` message
///
/// Formats:
/// * `[PUBLISH, Session|id, Request|id, Options|dict, Topic|uri]`
/// * `[PUBLISH, Session|id, Request|id, Options|dict, Topic|uri, Args|list]`
/// * `[PUBLISH, Session|id, Request|id, Options|dict, Topic|uri, Args|list, Kwargs|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Publish {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID chosen by the publisher
    pub request: u64,
    /// Topic to publish to
    pub topic: String,
    /// Application payload
    pub payload: Payload,
    /// Request a `PUBLISHED` acknowledgement
    pub acknowledge: Option<bool>,
    /// Exclude the publisher from receiving its own event
    pub exclude_me: Option<bool>,
    /// Session IDs excluded from receiving the event
    pub exclude: Option<Vec<u64>>,
    /// Session IDs the event is restricted to
    pub eligible: Option<Vec<u64>>,
    /// Disclose the publisher identity to receivers
    pub disclose_me: Option<bool>,
    cache: SerializationCache,
}

impl Publish {
    /// Create a `PUBLISH` message with no options set
    #[must_use]
    pub fn new(session: u64, request: u64, topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            session,
            request,
            topic: topic.into(),
            payload,
            acknowledge: None,
            exclude_me: None,
            exclude: None,
            eligible: None,
            disclose_me: None,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Publish {
    const MESSAGE_TYPE: u64 = 16;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 5 | 6 | 7) {
            return Err(ProtocolError::InvalidLength {
                message: "PUBLISH",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in PUBLISH")?;
        let request = validate_id(&wire[2], "'request' in PUBLISH")?;
        let options = validate_options(&wire[3], "'options' in PUBLISH")?;
        let topic = validate_uri(&wire[4], "'topic' in PUBLISH")?;
        let payload = Payload::parse_tail(wire, 5, "PUBLISH")?;

        let mut publish = Self::new(session, request, topic, payload);
        publish.acknowledge = optional_bool(options, "acknowledge", "PUBLISH")?;
        publish.exclude_me = optional_bool(options, "excludeme", "PUBLISH")?;
        publish.exclude = optional_id_list(options, "exclude", "PUBLISH")?;
        publish.eligible = optional_id_list(options, "eligible", "PUBLISH")?;
        publish.disclose_me = optional_bool(options, "discloseme", "PUBLISH")?;
        Ok(publish)
    }

    fn marshal(&self) -> Vec<Value> {
        let mut options = Map::new();
        if let Some(acknowledge) = self.acknowledge {
            options.insert("acknowledge".to_owned(), Value::from(acknowledge));
        }
        if let Some(exclude_me) = self.exclude_me {
            options.insert("excludeme".to_owned(), Value::from(exclude_me));
        }
        if let Some(exclude) = &self.exclude {
            options.insert("exclude".to_owned(), Value::from(exclude.clone()));
        }
        if let Some(eligible) = &self.eligible {
            options.insert("eligible".to_owned(), Value::from(eligible.clone()));
        }
        if let Some(disclose_me) = self.disclose_me {
            options.insert("discloseme".to_owned(), Value::from(disclose_me));
        }

        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(options),
            Value::from(self.topic.clone()),
        ];
        self.payload.append_to(&mut wire);
        wire
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `PUBLISHED` message: acknowledges a `PUBLISH`
///
/// Format: `[PUBLISHED, Session|id, Request|id, Publication|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the acknowledged `PUBLISH`
    pub request: u64,
    /// Publication ID assigned by the broker
    pub publication: u64,
    cache: SerializationCache,
}

impl Published {
    /// Create a `PUBLISHED` message
    #[must_use]
    pub fn new(session: u64, request: u64, publication: u64) -> Self {
        Self {
            session,
            request,
            publication,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Published {
    const MESSAGE_TYPE: u64 = 17;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "PUBLISHED",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in PUBLISHED")?;
        let request = validate_id(&wire[2], "'request' in PUBLISHED")?;
        let publication = validate_id(&wire[3], "'publication' in PUBLISHED")?;
        Ok(Self::new(session, request, publication))
    }

    fn marshal(&self) -> Vec<Value> {
        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::from(self.publication),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `SUBSCRIBE` message
///
/// Format: `[SUBSCRIBE, Session|id, Request|id, Options|dict, Topic|uri]`
#[derive(Debug, Clone, PartialEq)]
pub struct Subscribe {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID chosen by the subscriber
    pub request: u64,
    /// Topic to subscribe to
    pub topic: String,
    /// Topic matching policy
    pub match_policy: Match,
    cache: SerializationCache,
}

impl Subscribe {
    /// Create a `SUBSCRIBE` message
    #[must_use]
    pub fn new(session: u64, request: u64, topic: impl Into<String>, match_policy: Match) -> Self {
        Self {
            session,
            request,
            topic: topic.into(),
            match_policy,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Subscribe {
    const MESSAGE_TYPE: u64 = 32;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 5 {
            return Err(ProtocolError::InvalidLength {
                message: "SUBSCRIBE",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in SUBSCRIBE")?;
        let request = validate_id(&wire[2], "'request' in SUBSCRIBE")?;
        let options = validate_options(&wire[3], "'options' in SUBSCRIBE")?;
        let topic = validate_uri(&wire[4], "'topic' in SUBSCRIBE")?;
        let match_policy = Match::from_options(options, "SUBSCRIBE")?;

        Ok(Self::new(session, request, topic, match_policy))
    }

    fn marshal(&self) -> Vec<Value> {
        let mut options = Map::new();
        if self.match_policy != Match::Exact {
            options.insert("match".to_owned(), Value::from(self.match_policy.as_str()));
        }

        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(options),
            Value::from(self.topic.clone()),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `SUBSCRIBED` message: acknowledges a `SUBSCRIBE`
///
/// Format: `[SUBSCRIBED, Session|id, Request|id, Subscription|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Subscribed {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the acknowledged `SUBSCRIBE`
    pub request: u64,
    /// Subscription ID assigned by the broker
    pub subscription: u64,
    cache: SerializationCache,
}

impl Subscribed {
    /// Create a `SUBSCRIBED` message
    #[must_use]
    pub fn new(session: u64, request: u64, subscription: u64) -> Self {
        Self {
            session,
            request,
            subscription,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Subscribed {
    const MESSAGE_TYPE: u64 = 33;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "SUBSCRIBED",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in SUBSCRIBED")?;
        let request = validate_id(&wire[2], "'request' in SUBSCRIBED")?;
        let subscription = validate_id(&wire[3], "'subscription' in SUBSCRIBED")?;
        Ok(Self::new(session, request, subscription))
    }

    fn marshal(&self) -> Vec<Value> {
        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::from(self.subscription),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// An `UNSUBSCRIBE` message
///
/// Format: `[UNSUBSCRIBE, Session|id, Request|id, Subscription|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Unsubscribe {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID chosen by the subscriber
    pub request: u64,
    /// Subscription to drop
    pub subscription: u64,
    cache: SerializationCache,
}

impl Unsubscribe {
    /// Create an `UNSUBSCRIBE` message
    #[must_use]
    pub fn new(session: u64, request: u64, subscription: u64) -> Self {
        Self {
            session,
            request,
            subscription,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Unsubscribe {
    const MESSAGE_TYPE: u64 = 34;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "UNSUBSCRIBE",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in UNSUBSCRIBE")?;
        let request = validate_id(&wire[2], "'request' in UNSUBSCRIBE")?;
        let subscription = validate_id(&wire[3], "'subscription' in UNSUBSCRIBE")?;
        Ok(Self::new(session, request, subscription))
    }

    fn marshal(&self) -> Vec<Value> {
        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::from(self.subscription),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// An `UNSUBSCRIBED` message: acknowledges an `UNSUBSCRIBE`
///
/// Format: `[UNSUBSCRIBED, Session|id, Request|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Unsubscribed {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the acknowledged `UNSUBSCRIBE`
    pub request: u64,
    cache: SerializationCache,
}

impl Unsubscribed {
    /// Create an `UNSUBSCRIBED` message
    #[must_use]
    pub fn new(session: u64, request: u64) -> Self {
        Self {
            session,
            request,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Unsubscribed {
    const MESSAGE_TYPE: u64 = 35;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 3 {
            return Err(ProtocolError::InvalidLength {
                message: "UNSUBSCRIBED",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in UNSUBSCRIBED")?;
        let request = validate_id(&wire[2], "'request' in UNSUBSCRIBED")?;
        Ok(Self::new(session, request))
    }

    fn marshal(&self) -> Vec<Value> {
        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// An `EVENT` message: delivers a publication to a subscriber
///
/// Formats:
/// * `[EVENT, Session|id, Subscription|id, Publication|id, Details|dict]`
/// * `[EVENT, Session|id, Subscription|id, Publication|id, Details|dict, Args|list]`
/// * `[EVENT, Session|id, Subscription|id, Publication|id, Details|dict, Args|list, Kwargs|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Session the message is transported for
    pub session: u64,
    /// Subscription the event is delivered under
    pub subscription: u64,
    /// Publication ID of the originating publish
    pub publication: u64,
    /// Disclosed publisher session ID, if any
    pub publisher: Option<u64>,
    /// Application payload
    pub payload: Payload,
    cache: SerializationCache,
}

impl Event {
    /// Create an `EVENT` message
    #[must_use]
    pub fn new(session: u64, subscription: u64, publication: u64, payload: Payload) -> Self {
        Self {
            session,
            subscription,
            publication,
            publisher: None,
            payload,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Event {
    const MESSAGE_TYPE: u64 = 36;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 5 | 6 | 7) {
            return Err(ProtocolError::InvalidLength {
                message: "EVENT",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in EVENT")?;
        let subscription = validate_id(&wire[2], "'subscription' in EVENT")?;
        let publication = validate_id(&wire[3], "'publication' in EVENT")?;
        let details = validate_options(&wire[4], "'details' in EVENT")?;
        let payload = Payload::parse_tail(wire, 5, "EVENT")?;

        let mut event = Self::new(session, subscription, publication, payload);
        event.publisher = optional_id(details, "publisher", "EVENT")?;
        Ok(event)
    }

    fn marshal(&self) -> Vec<Value> {
        let mut details = Map::new();
        if let Some(publisher) = self.publisher {
            details.insert("publisher".to_owned(), Value::from(publisher));
        }

        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.subscription),
            Value::from(self.publication),
            Value::Object(details),
        ];
        self.payload.append_to(&mut wire);
        wire
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_roundtrip() {
        let wire = vec![json!(32), json!(917), json!(5123), json!({}), json!("com.example.topic")];
        let subscribe = Subscribe::parse(&wire).unwrap();

        assert_eq!(subscribe.session, 917);
        assert_eq!(subscribe.request, 5123);
        assert_eq!(subscribe.topic, "com.example.topic");
        assert_eq!(subscribe.match_policy, Match::Exact);
        assert_eq!(subscribe.marshal(), wire);
    }

    #[test]
    fn test_subscribe_match_policy() {
        let wire = vec![
            json!(32),
            json!(1),
            json!(2),
            json!({"match": "prefix"}),
            json!("com.example"),
        ];
        let subscribe = Subscribe::parse(&wire).unwrap();
        assert_eq!(subscribe.match_policy, Match::Prefix);
        assert_eq!(subscribe.marshal(), wire);
    }

    #[test]
    fn test_subscribe_bad_match_policy() {
        let wire = vec![
            json!(32),
            json!(1),
            json!(2),
            json!({"match": "fuzzy"}),
            json!("com.example"),
        ];
        assert!(matches!(
            Subscribe::parse(&wire),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_subscribe_unknown_option_dropped() {
        let wire = vec![
            json!(32),
            json!(1),
            json!(2),
            json!({"nonstandard": [1, {"a": null}]}),
            json!("com.example"),
        ];
        let subscribe = Subscribe::parse(&wire).unwrap();
        // re-marshal emits only recognized options
        assert_eq!(subscribe.marshal()[3], json!({}));
    }

    #[test]
    fn test_subscribe_length_boundaries() {
        for wire in [
            vec![json!(32), json!(1), json!(2), json!({})],
            vec![json!(32), json!(1), json!(2), json!({}), json!("t"), json!(0)],
        ] {
            assert!(matches!(
                Subscribe::parse(&wire),
                Err(ProtocolError::InvalidLength { .. })
            ));
        }
    }

    #[test]
    fn test_subscribed_roundtrip() {
        let wire = vec![json!(33), json!(917), json!(5123), json!(77)];
        let subscribed = Subscribed::parse(&wire).unwrap();
        assert_eq!(subscribed.subscription, 77);
        assert_eq!(subscribed.marshal(), wire);
    }

    #[test]
    fn test_unsubscribe_roundtrip() {
        let wire = vec![json!(34), json!(917), json!(5124), json!(77)];
        let unsubscribe = Unsubscribe::parse(&wire).unwrap();
        assert_eq!(unsubscribe.subscription, 77);
        assert_eq!(unsubscribe.marshal(), wire);
    }

    #[test]
    fn test_unsubscribed_roundtrip() {
        let wire = vec![json!(35), json!(917), json!(5124)];
        let unsubscribed = Unsubscribed::parse(&wire).unwrap();
        assert_eq!(unsubscribed.session, 917);
        assert_eq!(unsubscribed.marshal(), wire);
    }

    #[test]
    fn test_publish_bare() {
        let wire = vec![json!(16), json!(1), json!(2), json!({}), json!("com.example.topic")];
        let publish = Publish::parse(&wire).unwrap();
        assert_eq!(publish.payload, Payload::none());
        assert_eq!(publish.marshal(), wire);
    }

    #[test]
    fn test_publish_with_payload_and_options() {
        let wire = vec![
            json!(16),
            json!(1),
            json!(2),
            json!({"acknowledge": true, "exclude": [300], "discloseme": false}),
            json!("com.example.topic"),
            json!([1, "two"]),
            json!({"k": "v"}),
        ];
        let publish = Publish::parse(&wire).unwrap();

        assert_eq!(publish.acknowledge, Some(true));
        assert_eq!(publish.exclude, Some(vec![300]));
        assert_eq!(publish.disclose_me, Some(false));
        assert_eq!(publish.exclude_me, None);
        assert_eq!(publish.payload.args(), Some(&[json!(1), json!("two")][..]));
        assert_eq!(publish.marshal(), wire);
    }

    #[test]
    fn test_publish_empty_args_roundtrip() {
        // empty args stay on the wire, they are present, just empty
        let wire = vec![json!(16), json!(1), json!(2), json!({}), json!("t"), json!([])];
        let publish = Publish::parse(&wire).unwrap();
        assert_eq!(publish.marshal(), wire);
    }

    #[test]
    fn test_publish_bad_exclude_list() {
        let wire = vec![
            json!(16),
            json!(1),
            json!(2),
            json!({"exclude": [1, "x"]}),
            json!("t"),
        ];
        assert!(Publish::parse(&wire).is_err());
    }

    #[test]
    fn test_published_roundtrip() {
        let wire = vec![json!(17), json!(1), json!(2), json!(9999)];
        let published = Published::parse(&wire).unwrap();
        assert_eq!(published.publication, 9999);
        assert_eq!(published.marshal(), wire);
    }

    #[test]
    fn test_event_with_publisher() {
        let wire = vec![json!(36), json!(1), json!(10), json!(20), json!({"publisher": 99})];
        let event = Event::parse(&wire).unwrap();

        assert_eq!(event.session, 1);
        assert_eq!(event.subscription, 10);
        assert_eq!(event.publication, 20);
        assert_eq!(event.publisher, Some(99));
        assert_eq!(event.marshal(), wire);
    }

    #[test]
    fn test_event_with_payload() {
        let wire = vec![
            json!(36),
            json!(1),
            json!(10),
            json!(20),
            json!({}),
            json!(["hello"]),
            json!({"count": 3}),
        ];
        let event = Event::parse(&wire).unwrap();
        assert_eq!(event.publisher, None);
        assert_eq!(event.marshal(), wire);
    }

    #[test]
    fn test_event_kwargs_without_args_impossible_on_wire() {
        // a 6-element EVENT has args at index 5; a dict there is a type error
        let wire = vec![json!(36), json!(1), json!(10), json!(20), json!({}), json!({"k": 1})];
        assert!(matches!(
            Event::parse(&wire),
            Err(ProtocolError::InvalidType { .. })
        ));
    }
}
