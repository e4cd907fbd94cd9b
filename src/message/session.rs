//! Session lifecycle messages: `HELLO`, `GOODBYE`, `HEARTBEAT`

use serde_json::{Map, Value};

use crate::role::Role;
use crate::serializer::SerializationCache;
use crate::validate::{validate_id, validate_options, validate_uri};
use crate::{ProtocolError, Result};

use super::WampMessage;

/// A `HELLO` message: opens a session on a realm
///
/// Format: `[HELLO, Session|id, Realm|uri, Details|dict]`
///
/// The `roles` detail is mandatory and non-empty; each entry names a role
/// the peer implements, optionally with announced features.
#[derive(Debug, Clone, PartialEq)]
pub struct Hello {
    /// Session ID the peer is assigned
    pub session: u64,
    /// Realm to join
    pub realm: String,
    /// Roles the peer implements, in wire (name) order
    pub roles: Vec<Role>,
    cache: SerializationCache,
}

impl Hello {
    /// Create a `HELLO` message
    ///
    /// Roles are stored in name order, the order the `roles` detail map
    /// puts them on the wire.
    #[must_use]
    pub fn new(session: u64, realm: impl Into<String>, mut roles: Vec<Role>) -> Self {
        roles.sort_by_key(Role::name);
        Self {
            session,
            realm: realm.into(),
            roles,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Hello {
    const MESSAGE_TYPE: u64 = 1;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "HELLO",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in HELLO")?;
        let realm = validate_uri(&wire[2], "'realm' in HELLO")?;
        let details = validate_options(&wire[3], "'details' in HELLO")?;

        let Some(roles_value) = details.get("roles") else {
            return Err(ProtocolError::MissingField {
                message: "HELLO",
                field: "roles",
            });
        };
        let roles_map = validate_options(roles_value, "'roles' detail in HELLO")?;
        if roles_map.is_empty() {
            return Err(ProtocolError::InvalidValue {
                field: "'roles' detail in HELLO".to_owned(),
                reason: "no roles announced".to_owned(),
            });
        }

        let mut roles = Vec::with_capacity(roles_map.len());
        for (name, entry_value) in roles_map {
            let entry = validate_options(entry_value, &format!("role '{name}' in HELLO"))?;
            roles.push(Role::parse(name, entry)?);
        }

        Ok(Self::new(session, realm, roles))
    }

    fn marshal(&self) -> Vec<Value> {
        let mut roles = Map::new();
        for role in &self.roles {
            roles.insert(role.name().to_owned(), role.marshal());
        }
        let mut details = Map::new();
        details.insert("roles".to_owned(), Value::Object(roles));

        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.realm.clone()),
            Value::Object(details),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `GOODBYE` message: closes a session
///
/// Format: `[GOODBYE, Session|id, Details|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Goodbye {
    /// Session the message is transported for
    pub session: u64,
    /// Optional closing reason URI
    pub reason: Option<String>,
    /// Optional human-readable closing message
    pub message: Option<String>,
    cache: SerializationCache,
}

impl Goodbye {
    /// Create a `GOODBYE` message
    #[must_use]
    pub fn new(session: u64, reason: Option<String>, message: Option<String>) -> Self {
        Self {
            session,
            reason,
            message,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Goodbye {
    const MESSAGE_TYPE: u64 = 2;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 3 {
            return Err(ProtocolError::InvalidLength {
                message: "GOODBYE",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in GOODBYE")?;
        let details = validate_options(&wire[2], "'details' in GOODBYE")?;

        let reason = match details.get("reason") {
            None => None,
            Some(value) => Some(validate_uri(value, "'reason' detail in GOODBYE")?),
        };
        let message = match details.get("message") {
            None => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => {
                return Err(ProtocolError::InvalidType {
                    field: "'message' detail in GOODBYE".to_owned(),
                    expected: "string",
                });
            }
        };

        Ok(Self::new(session, reason, message))
    }

    fn marshal(&self) -> Vec<Value> {
        let mut details = Map::new();
        if let Some(reason) = &self.reason {
            details.insert("reason".to_owned(), Value::from(reason.clone()));
        }
        if let Some(message) = &self.message {
            details.insert("message".to_owned(), Value::from(message.clone()));
        }

        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::Object(details),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `HEARTBEAT` message: keep-alive with flow counters
///
/// Formats:
/// * `[HEARTBEAT, Session|id, Incoming|integer, Outgoing|integer]`
/// * `[HEARTBEAT, Session|id, Incoming|integer, Outgoing|integer, Discard|string]`
///
/// `incoming` is the last heartbeat processed from the peer (>= 0);
/// `outgoing` is this peer's heartbeat number (> 0). `discard` is padding
/// the receiver throws away; it travels as a trailing field, not inside
/// an options map.
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    /// Session the message is transported for
    pub session: u64,
    /// Last incoming heartbeat processed
    pub incoming: u64,
    /// Outgoing heartbeat number
    pub outgoing: u64,
    /// Optional discard padding
    pub discard: Option<String>,
    cache: SerializationCache,
}

impl Heartbeat {
    /// Create a `HEARTBEAT` message
    #[must_use]
    pub fn new(session: u64, incoming: u64, outgoing: u64, discard: Option<String>) -> Self {
        Self {
            session,
            incoming,
            outgoing,
            discard,
            cache: SerializationCache::new(),
        }
    }
}

fn validate_counter(value: &Value, field: &str) -> Result<u64> {
    let Value::Number(number) = value else {
        return Err(ProtocolError::InvalidType {
            field: field.to_owned(),
            expected: "integer",
        });
    };
    if let Some(counter) = number.as_u64() {
        Ok(counter)
    } else if number.is_i64() {
        Err(ProtocolError::InvalidValue {
            field: field.to_owned(),
            reason: format!("{number} is negative"),
        })
    } else {
        Err(ProtocolError::InvalidType {
            field: field.to_owned(),
            expected: "integer",
        })
    }
}

impl WampMessage for Heartbeat {
    const MESSAGE_TYPE: u64 = 3;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 4 | 5) {
            return Err(ProtocolError::InvalidLength {
                message: "HEARTBEAT",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in HEARTBEAT")?;
        let incoming = validate_counter(&wire[2], "'incoming' in HEARTBEAT")?;
        let outgoing = validate_counter(&wire[3], "'outgoing' in HEARTBEAT")?;
        if outgoing == 0 {
            return Err(ProtocolError::InvalidValue {
                field: "'outgoing' in HEARTBEAT".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }

        let discard = match wire.get(4) {
            None => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => {
                return Err(ProtocolError::InvalidType {
                    field: "'discard' in HEARTBEAT".to_owned(),
                    expected: "string",
                });
            }
        };

        Ok(Self::new(session, incoming, outgoing, discard))
    }

    fn marshal(&self) -> Vec<Value> {
        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.incoming),
            Value::from(self.outgoing),
        ];
        if let Some(discard) = &self.discard {
            wire.push(Value::from(discard.clone()));
        }
        wire
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}
