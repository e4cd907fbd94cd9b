//! WAMP message type codes

use std::fmt;

/// WAMP message types, one per wire type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Open a session on a realm
    Hello = 1,
    /// Close a session
    Goodbye = 2,
    /// Keep-alive with incoming/outgoing counters
    Heartbeat = 3,
    /// Reply to a failed request
    Error = 4,

    /// Publish an event to a topic
    Publish = 16,
    /// Acknowledge a publication
    Published = 17,
    /// Subscribe to a topic
    Subscribe = 32,
    /// Acknowledge a subscription
    Subscribed = 33,
    /// Drop a subscription
    Unsubscribe = 34,
    /// Acknowledge an unsubscribe
    Unsubscribed = 35,
    /// Event dispatched to a subscriber
    Event = 36,

    /// Call a remote procedure
    Call = 48,
    /// Cancel an outstanding call
    Cancel = 49,
    /// Result of a call
    Result = 50,
    /// Register a procedure endpoint
    Register = 64,
    /// Acknowledge a registration
    Registered = 65,
    /// Drop a registration
    Unregister = 66,
    /// Acknowledge an unregister
    Unregistered = 67,
    /// Invocation dispatched to a callee
    Invocation = 68,
    /// Interrupt an outstanding invocation
    Interrupt = 69,
    /// Yield a result from a callee
    Yield = 70,
}

impl MessageType {
    /// Convert from a wire type code
    #[must_use]
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Hello),
            2 => Some(Self::Goodbye),
            3 => Some(Self::Heartbeat),
            4 => Some(Self::Error),
            16 => Some(Self::Publish),
            17 => Some(Self::Published),
            32 => Some(Self::Subscribe),
            33 => Some(Self::Subscribed),
            34 => Some(Self::Unsubscribe),
            35 => Some(Self::Unsubscribed),
            36 => Some(Self::Event),
            48 => Some(Self::Call),
            49 => Some(Self::Cancel),
            50 => Some(Self::Result),
            64 => Some(Self::Register),
            65 => Some(Self::Registered),
            66 => Some(Self::Unregister),
            67 => Some(Self::Unregistered),
            68 => Some(Self::Invocation),
            69 => Some(Self::Interrupt),
            70 => Some(Self::Yield),
            _ => None,
        }
    }

    /// Convert to a wire type code
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self as u64
    }

    /// Upper-case wire name, as used in protocol error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hello => "HELLO",
            Self::Goodbye => "GOODBYE",
            Self::Heartbeat => "HEARTBEAT",
            Self::Error => "ERROR",
            Self::Publish => "PUBLISH",
            Self::Published => "PUBLISHED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Subscribed => "SUBSCRIBED",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Unsubscribed => "UNSUBSCRIBED",
            Self::Event => "EVENT",
            Self::Call => "CALL",
            Self::Cancel => "CANCEL",
            Self::Result => "RESULT",
            Self::Register => "REGISTER",
            Self::Registered => "REGISTERED",
            Self::Unregister => "UNREGISTER",
            Self::Unregistered => "UNREGISTERED",
            Self::Invocation => "INVOCATION",
            Self::Interrupt => "INTERRUPT",
            Self::Yield => "YIELD",
        }
    }

    /// Check if this type code may appear as `request_type` in an `ERROR`
    ///
    /// Only request messages that expect a reply can fail with an `ERROR`.
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(
            self,
            Self::Subscribe
                | Self::Unsubscribe
                | Self::Publish
                | Self::Register
                | Self::Unregister
                | Self::Call
                | Self::Invocation
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
