//! Remote procedure call messages: `CALL` through `YIELD`

use serde_json::{Map, Value};

use crate::serializer::SerializationCache;
use crate::validate::{
    optional_bool, optional_id, optional_id_list, optional_string, validate_id, validate_options,
    validate_uri,
};
use crate::{ProtocolError, Result};

use super::{Payload, WampMessage};

/// Cancellation mode carried in the `mode` option of a `CANCEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    /// Drop the call locally without touching the callee
    Skip,
    /// Stop waiting and tell the callee to abort
    Abort,
    /// Forcefully terminate the invocation at the callee
    Kill,
}

impl CancelMode {
    /// Wire value of the `mode` option
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
            Self::Kill => "kill",
        }
    }
}

/// Interruption mode carried in the `mode` option of an `INTERRUPT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptMode {
    /// Abort the invocation, discarding any result
    Abort,
    /// Forcefully terminate the invocation
    Kill,
}

impl InterruptMode {
    /// Wire value of the `mode` option
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Kill => "kill",
        }
    }
}

fn optional_timeout(
    options: &Map<String, Value>,
    message: &'static str,
) -> Result<Option<u64>> {
    // a timeout is a non-negative integer of milliseconds, ID-ranged
    optional_id(options, "timeout", message)
}

/// A `CALL` message
///
/// Formats:
/// * `[CALL, Session|id, Request|id, Options|dict, Procedure|uri]`
/// * `[CALL, Session|id, Request|id, Options|dict, Procedure|uri, Args|list]`
/// * `[CALL, Session|id, Request|id, Options|dict, Procedure|uri, Args|list, Kwargs|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID chosen by the caller
    pub request: u64,
    /// Procedure to call
    pub procedure: String,
    /// Application payload
    pub payload: Payload,
    /// Call timeout in milliseconds
    pub timeout: Option<u64>,
    /// Request progressive results
    pub receive_progress: Option<bool>,
    /// Disclose the caller identity to the callee
    pub disclose_me: Option<bool>,
    cache: SerializationCache,
}

impl Call {
    /// Create a `CALL` message with no options set
    #[must_use]
    pub fn new(session: u64, request: u64, procedure: impl Into<String>, payload: Payload) -> Self {
        Self {
            session,
            request,
            procedure: procedure.into(),
            payload,
            timeout: None,
            receive_progress: None,
            disclose_me: None,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Call {
    const MESSAGE_TYPE: u64 = 48;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 5 | 6 | 7) {
            return Err(ProtocolError::InvalidLength {
                message: "CALL",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in CALL")?;
        let request = validate_id(&wire[2], "'request' in CALL")?;
        let options = validate_options(&wire[3], "'options' in CALL")?;
        let procedure = validate_uri(&wire[4], "'procedure' in CALL")?;
        let payload = Payload::parse_tail(wire, 5, "CALL")?;

        let mut call = Self::new(session, request, procedure, payload);
        call.timeout = optional_timeout(options, "CALL")?;
        call.receive_progress = optional_bool(options, "receive_progress", "CALL")?;
        call.disclose_me = optional_bool(options, "discloseme", "CALL")?;
        Ok(call)
    }

    fn marshal(&self) -> Vec<Value> {
        let mut options = Map::new();
        if let Some(timeout) = self.timeout {
            options.insert("timeout".to_owned(), Value::from(timeout));
        }
        if let Some(receive_progress) = self.receive_progress {
            options.insert("receive_progress".to_owned(), Value::from(receive_progress));
        }
        if let Some(disclose_me) = self.disclose_me {
            options.insert("discloseme".to_owned(), Value::from(disclose_me));
        }

        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(options),
            Value::from(self.procedure.clone()),
        ];
        self.payload.append_to(&mut wire);
        wire
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `CANCEL` message: cancels an outstanding call
///
/// Format: `[CANCEL, Session|id, Request|id, Options|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Cancel {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the call to cancel
    pub request: u64,
    /// Cancellation mode
    pub mode: Option<CancelMode>,
    cache: SerializationCache,
}

impl Cancel {
    /// Create a `CANCEL` message
    #[must_use]
    pub fn new(session: u64, request: u64, mode: Option<CancelMode>) -> Self {
        Self {
            session,
            request,
            mode,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Cancel {
    const MESSAGE_TYPE: u64 = 49;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "CANCEL",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in CANCEL")?;
        let request = validate_id(&wire[2], "'request' in CANCEL")?;
        let options = validate_options(&wire[3], "'options' in CANCEL")?;

        let mode = match optional_string(options, "mode", "CANCEL")?.as_deref() {
            None => None,
            Some("skip") => Some(CancelMode::Skip),
            Some("abort") => Some(CancelMode::Abort),
            Some("kill") => Some(CancelMode::Kill),
            Some(other) => {
                return Err(ProtocolError::InvalidValue {
                    field: "'mode' option in CANCEL".to_owned(),
                    reason: format!("unknown cancel mode '{other}'"),
                });
            }
        };

        Ok(Self::new(session, request, mode))
    }

    fn marshal(&self) -> Vec<Value> {
        let mut options = Map::new();
        if let Some(mode) = self.mode {
            options.insert("mode".to_owned(), Value::from(mode.as_str()));
        }

        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(options),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `RESULT` message: delivers the outcome of a call
///
/// Formats:
/// * `[RESULT, Session|id, Request|id, Details|dict]`
/// * `[RESULT, Session|id, Request|id, Details|dict, Args|list]`
/// * `[RESULT, Session|id, Request|id, Details|dict, Args|list, Kwargs|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the originating `CALL`
    pub request: u64,
    /// Marks a progressive partial result
    pub progress: Option<bool>,
    /// Application payload
    pub payload: Payload,
    cache: SerializationCache,
}

impl CallResult {
    /// Create a `RESULT` message
    #[must_use]
    pub fn new(session: u64, request: u64, payload: Payload) -> Self {
        Self {
            session,
            request,
            progress: None,
            payload,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for CallResult {
    const MESSAGE_TYPE: u64 = 50;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 4 | 5 | 6) {
            return Err(ProtocolError::InvalidLength {
                message: "RESULT",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in RESULT")?;
        let request = validate_id(&wire[2], "'request' in RESULT")?;
        let details = validate_options(&wire[3], "'details' in RESULT")?;
        let payload = Payload::parse_tail(wire, 4, "RESULT")?;

        let mut result = Self::new(session, request, payload);
        result.progress = optional_bool(details, "progress", "RESULT")?;
        Ok(result)
    }

    fn marshal(&self) -> Vec<Value> {
        let mut details = Map::new();
        if let Some(progress) = self.progress {
            details.insert("progress".to_owned(), Value::from(progress));
        }

        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(details),
        ];
        self.payload.append_to(&mut wire);
        wire
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `REGISTER` message
///
/// Format: `[REGISTER, Session|id, Request|id, Options|dict, Procedure|uri]`
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID chosen by the callee
    pub request: u64,
    /// Procedure to register
    pub procedure: String,
    /// Partition keys the endpoint serves
    pub pkeys: Option<Vec<u64>>,
    cache: SerializationCache,
}

impl Register {
    /// Create a `REGISTER` message
    #[must_use]
    pub fn new(session: u64, request: u64, procedure: impl Into<String>) -> Self {
        Self {
            session,
            request,
            procedure: procedure.into(),
            pkeys: None,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Register {
    const MESSAGE_TYPE: u64 = 64;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 5 {
            return Err(ProtocolError::InvalidLength {
                message: "REGISTER",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in REGISTER")?;
        let request = validate_id(&wire[2], "'request' in REGISTER")?;
        let options = validate_options(&wire[3], "'options' in REGISTER")?;
        let procedure = validate_uri(&wire[4], "'procedure' in REGISTER")?;

        let mut register = Self::new(session, request, procedure);
        register.pkeys = optional_id_list(options, "pkeys", "REGISTER")?;
        Ok(register)
    }

    fn marshal(&self) -> Vec<Value> {
        let mut options = Map::new();
        if let Some(pkeys) = &self.pkeys {
            options.insert("pkeys".to_owned(), Value::from(pkeys.clone()));
        }

        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(options),
            Value::from(self.procedure.clone()),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `REGISTERED` message: acknowledges a `REGISTER`
///
/// Format: `[REGISTERED, Session|id, Request|id, Registration|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the acknowledged `REGISTER`
    pub request: u64,
    /// Registration ID assigned by the dealer
    pub registration: u64,
    cache: SerializationCache,
}

impl Registered {
    /// Create a `REGISTERED` message
    #[must_use]
    pub fn new(session: u64, request: u64, registration: u64) -> Self {
        Self {
            session,
            request,
            registration,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Registered {
    const MESSAGE_TYPE: u64 = 65;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "REGISTERED",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in REGISTERED")?;
        let request = validate_id(&wire[2], "'request' in REGISTERED")?;
        let registration = validate_id(&wire[3], "'registration' in REGISTERED")?;
        Ok(Self::new(session, request, registration))
    }

    fn marshal(&self) -> Vec<Value> {
        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::from(self.registration),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// An `UNREGISTER` message
///
/// Format: `[UNREGISTER, Session|id, Request|id, Registration|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Unregister {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID chosen by the callee
    pub request: u64,
    /// Registration to drop
    pub registration: u64,
    cache: SerializationCache,
}

impl Unregister {
    /// Create an `UNREGISTER` message
    #[must_use]
    pub fn new(session: u64, request: u64, registration: u64) -> Self {
        Self {
            session,
            request,
            registration,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Unregister {
    const MESSAGE_TYPE: u64 = 66;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "UNREGISTER",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in UNREGISTER")?;
        let request = validate_id(&wire[2], "'request' in UNREGISTER")?;
        let registration = validate_id(&wire[3], "'registration' in UNREGISTER")?;
        Ok(Self::new(session, request, registration))
    }

    fn marshal(&self) -> Vec<Value> {
        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::from(self.registration),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// An `UNREGISTERED` message: acknowledges an `UNREGISTER`
///
/// Format: `[UNREGISTERED, Session|id, Request|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Unregistered {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the acknowledged `UNREGISTER`
    pub request: u64,
    cache: SerializationCache,
}

impl Unregistered {
    /// Create an `UNREGISTERED` message
    #[must_use]
    pub fn new(session: u64, request: u64) -> Self {
        Self {
            session,
            request,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Unregistered {
    const MESSAGE_TYPE: u64 = 67;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 3 {
            return Err(ProtocolError::InvalidLength {
                message: "UNREGISTERED",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in UNREGISTERED")?;
        let request = validate_id(&wire[2], "'request' in UNREGISTERED")?;
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

/// An `INVOCATION` message: dispatches a call to a callee
///
/// Formats:
/// * `[INVOCATION, Session|id, Request|id, Registration|id, Details|dict]`
/// * `[INVOCATION, Session|id, Request|id, Registration|id, Details|dict, Args|list]`
/// * `[INVOCATION, Session|id, Request|id, Registration|id, Details|dict, Args|list, Kwargs|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID chosen by the dealer
    pub request: u64,
    /// Registration the invocation is dispatched under
    pub registration: u64,
    /// Application payload
    pub payload: Payload,
    /// Remaining call timeout in milliseconds
    pub timeout: Option<u64>,
    /// The caller asked for progressive results
    pub receive_progress: Option<bool>,
    /// Disclosed caller session ID, if any
    pub caller: Option<u64>,
    cache: SerializationCache,
}

impl Invocation {
    /// Create an `INVOCATION` message with no details set
    #[must_use]
    pub fn new(session: u64, request: u64, registration: u64, payload: Payload) -> Self {
        Self {
            session,
            request,
            registration,
            payload,
            timeout: None,
            receive_progress: None,
            caller: None,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Invocation {
    const MESSAGE_TYPE: u64 = 68;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 5 | 6 | 7) {
            return Err(ProtocolError::InvalidLength {
                message: "INVOCATION",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in INVOCATION")?;
        let request = validate_id(&wire[2], "'request' in INVOCATION")?;
        let registration = validate_id(&wire[3], "'registration' in INVOCATION")?;
        let details = validate_options(&wire[4], "'details' in INVOCATION")?;
        let payload = Payload::parse_tail(wire, 5, "INVOCATION")?;

        let mut invocation = Self::new(session, request, registration, payload);
        invocation.timeout = optional_timeout(details, "INVOCATION")?;
        invocation.receive_progress = optional_bool(details, "receive_progress", "INVOCATION")?;
        invocation.caller = optional_id(details, "caller", "INVOCATION")?;
        Ok(invocation)
    }

    fn marshal(&self) -> Vec<Value> {
        let mut details = Map::new();
        if let Some(timeout) = self.timeout {
            details.insert("timeout".to_owned(), Value::from(timeout));
        }
        if let Some(receive_progress) = self.receive_progress {
            details.insert("receive_progress".to_owned(), Value::from(receive_progress));
        }
        if let Some(caller) = self.caller {
            details.insert("caller".to_owned(), Value::from(caller));
        }

        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::from(self.registration),
            Value::Object(details),
        ];
        self.payload.append_to(&mut wire);
        wire
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// An `INTERRUPT` message: interrupts an outstanding invocation
///
/// Format: `[INTERRUPT, Session|id, Request|id, Options|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Interrupt {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the invocation to interrupt
    pub request: u64,
    /// Interruption mode
    pub mode: Option<InterruptMode>,
    cache: SerializationCache,
}

impl Interrupt {
    /// Create an `INTERRUPT` message
    #[must_use]
    pub fn new(session: u64, request: u64, mode: Option<InterruptMode>) -> Self {
        Self {
            session,
            request,
            mode,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Interrupt {
    const MESSAGE_TYPE: u64 = 69;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if wire.len() != 4 {
            return Err(ProtocolError::InvalidLength {
                message: "INTERRUPT",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in INTERRUPT")?;
        let request = validate_id(&wire[2], "'request' in INTERRUPT")?;
        let options = validate_options(&wire[3], "'options' in INTERRUPT")?;

        let mode = match optional_string(options, "mode", "INTERRUPT")?.as_deref() {
            None => None,
            Some("abort") => Some(InterruptMode::Abort),
            Some("kill") => Some(InterruptMode::Kill),
            Some(other) => {
                return Err(ProtocolError::InvalidValue {
                    field: "'mode' option in INTERRUPT".to_owned(),
                    reason: format!("unknown interrupt mode '{other}'"),
                });
            }
        };

        Ok(Self::new(session, request, mode))
    }

    fn marshal(&self) -> Vec<Value> {
        let mut options = Map::new();
        if let Some(mode) = self.mode {
            options.insert("mode".to_owned(), Value::from(mode.as_str()));
        }

        vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(options),
        ]
    }

    fn cache(&self) -> &SerializationCache {
        &self.cache
    }
}

/// A `YIELD` message: a callee yields a (possibly partial) result
///
/// Formats:
/// * `[YIELD, Session|id, Request|id, Options|dict]`
/// * `[YIELD, Session|id, Request|id, Options|dict, Args|list]`
/// * `[YIELD, Session|id, Request|id, Options|dict, Args|list, Kwargs|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Yield {
    /// Session the message is transported for
    pub session: u64,
    /// Request ID of the invocation being answered
    pub request: u64,
    /// Marks a progressive partial result
    pub progress: Option<bool>,
    /// Application payload
    pub payload: Payload,
    cache: SerializationCache,
}

impl Yield {
    /// Create a `YIELD` message
    #[must_use]
    pub fn new(session: u64, request: u64, payload: Payload) -> Self {
        Self {
            session,
            request,
            progress: None,
            payload,
            cache: SerializationCache::new(),
        }
    }
}

impl WampMessage for Yield {
    const MESSAGE_TYPE: u64 = 70;

    fn parse(wire: &[Value]) -> Result<Self> {
        debug_assert_eq!(wire.first().and_then(Value::as_u64), Some(Self::MESSAGE_TYPE));

        if !matches!(wire.len(), 4 | 5 | 6) {
            return Err(ProtocolError::InvalidLength {
                message: "YIELD",
                length: wire.len(),
            });
        }

        let session = validate_id(&wire[1], "'session' in YIELD")?;
        let request = validate_id(&wire[2], "'request' in YIELD")?;
        let options = validate_options(&wire[3], "'options' in YIELD")?;
        let payload = Payload::parse_tail(wire, 4, "YIELD")?;

        let mut message = Self::new(session, request, payload);
        message.progress = optional_bool(options, "progress", "YIELD")?;
        Ok(message)
    }

    fn marshal(&self) -> Vec<Value> {
        let mut options = Map::new();
        if let Some(progress) = self.progress {
            options.insert("progress".to_owned(), Value::from(progress));
        }

        let mut wire = vec![
            Value::from(Self::MESSAGE_TYPE),
            Value::from(self.session),
            Value::from(self.request),
            Value::Object(options),
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
    fn test_call_bare() {
        let wire = vec![json!(48), json!(1), json!(2), json!({}), json!("com.example.add")];
        let call = Call::parse(&wire).unwrap();
        assert_eq!(call.procedure, "com.example.add");
        assert_eq!(call.marshal(), wire);
    }

    #[test]
    fn test_call_with_options_and_payload() {
        let wire = vec![
            json!(48),
            json!(1),
            json!(2),
            json!({"timeout": 5000, "receive_progress": true}),
            json!("com.example.add"),
            json!([2, 3]),
        ];
        let call = Call::parse(&wire).unwrap();

        assert_eq!(call.timeout, Some(5000));
        assert_eq!(call.receive_progress, Some(true));
        assert_eq!(call.disclose_me, None);
        assert_eq!(call.marshal(), wire);
    }

    #[test]
    fn test_call_negative_timeout_rejected() {
        let wire = vec![
            json!(48),
            json!(1),
            json!(2),
            json!({"timeout": -1}),
            json!("com.example.add"),
        ];
        assert!(matches!(
            Call::parse(&wire),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_cancel_modes() {
        for (text, mode) in [
            ("skip", CancelMode::Skip),
            ("abort", CancelMode::Abort),
            ("kill", CancelMode::Kill),
        ] {
            let wire = vec![json!(49), json!(1), json!(2), json!({"mode": text})];
            let cancel = Cancel::parse(&wire).unwrap();
            assert_eq!(cancel.mode, Some(mode));
            assert_eq!(cancel.marshal(), wire);
        }
    }

    #[test]
    fn test_cancel_unknown_mode_rejected() {
        let wire = vec![json!(49), json!(1), json!(2), json!({"mode": "pause"})];
        assert!(matches!(
            Cancel::parse(&wire),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_result_progressive() {
        let wire = vec![
            json!(50),
            json!(1),
            json!(2),
            json!({"progress": true}),
            json!([30]),
        ];
        let result = CallResult::parse(&wire).unwrap();
        assert_eq!(result.progress, Some(true));
        assert_eq!(result.payload.args(), Some(&[json!(30)][..]));
        assert_eq!(result.marshal(), wire);
    }

    #[test]
    fn test_result_length_boundaries() {
        for wire in [
            vec![json!(50), json!(1), json!(2)],
            vec![json!(50), json!(1), json!(2), json!({}), json!([]), json!({}), json!(0)],
        ] {
            assert!(matches!(
                CallResult::parse(&wire),
                Err(ProtocolError::InvalidLength { .. })
            ));
        }
    }

    #[test]
    fn test_register_roundtrip() {
        let wire = vec![json!(64), json!(1), json!(2), json!({}), json!("com.example.add")];
        let register = Register::parse(&wire).unwrap();
        assert_eq!(register.pkeys, None);
        assert_eq!(register.marshal(), wire);
    }

    #[test]
    fn test_register_with_pkeys() {
        let wire = vec![
            json!(64),
            json!(1),
            json!(2),
            json!({"pkeys": [10, 20]}),
            json!("com.example.add"),
        ];
        let register = Register::parse(&wire).unwrap();
        assert_eq!(register.pkeys, Some(vec![10, 20]));
        assert_eq!(register.marshal(), wire);
    }

    #[test]
    fn test_registered_roundtrip() {
        let wire = vec![json!(65), json!(1), json!(2), json!(400)];
        let registered = Registered::parse(&wire).unwrap();
        assert_eq!(registered.registration, 400);
        assert_eq!(registered.marshal(), wire);
    }

    #[test]
    fn test_unregister_roundtrip() {
        let wire = vec![json!(66), json!(1), json!(2), json!(400)];
        let unregister = Unregister::parse(&wire).unwrap();
        assert_eq!(unregister.registration, 400);
        assert_eq!(unregister.marshal(), wire);
    }

    #[test]
    fn test_unregistered_keeps_session() {
        let wire = vec![json!(67), json!(917), json!(5125)];
        let unregistered = Unregistered::parse(&wire).unwrap();
        assert_eq!(unregistered.session, 917);
        assert_eq!(unregistered.request, 5125);
        assert_eq!(unregistered.marshal(), wire);
    }

    #[test]
    fn test_invocation_with_details() {
        let wire = vec![
            json!(68),
            json!(1),
            json!(2),
            json!(400),
            json!({"caller": 917, "timeout": 100}),
            json!([2, 3]),
        ];
        let invocation = Invocation::parse(&wire).unwrap();

        assert_eq!(invocation.registration, 400);
        assert_eq!(invocation.caller, Some(917));
        assert_eq!(invocation.timeout, Some(100));
        assert_eq!(invocation.receive_progress, None);
        assert_eq!(invocation.marshal(), wire);
    }

    #[test]
    fn test_interrupt_modes() {
        for (text, mode) in [("abort", InterruptMode::Abort), ("kill", InterruptMode::Kill)] {
            let wire = vec![json!(69), json!(1), json!(2), json!({"mode": text})];
            let interrupt = Interrupt::parse(&wire).unwrap();
            assert_eq!(interrupt.mode, Some(mode));
            assert_eq!(interrupt.marshal(), wire);
        }
    }

    #[test]
    fn test_interrupt_skip_rejected() {
        // skip is a caller-side mode, it never travels in INTERRUPT
        let wire = vec![json!(69), json!(1), json!(2), json!({"mode": "skip"})];
        assert!(matches!(
            Interrupt::parse(&wire),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_yield_roundtrip() {
        let wire = vec![
            json!(70),
            json!(1),
            json!(2),
            json!({"progress": true}),
            json!([5]),
            json!({"unit": "ms"}),
        ];
        let message = Yield::parse(&wire).unwrap();
        assert_eq!(message.progress, Some(true));
        assert_eq!(message.marshal(), wire);
    }

    #[test]
    fn test_yield_bare() {
        let wire = vec![json!(70), json!(1), json!(2), json!({})];
        let message = Yield::parse(&wire).unwrap();
        assert_eq!(message.payload, Payload::none());
        assert_eq!(message.marshal(), wire);
    }
}
