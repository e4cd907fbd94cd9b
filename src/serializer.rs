//! Byte serializers and the per-message serialization cache
//!
//! A serializer is the boundary collaborator that turns a wire array into
//! transport bytes and back. The codec never frames or masks bytes; that
//! is the transport's job.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use serde_json::Value;

use crate::message::Message;
use crate::{ProtocolError, Result};

/// Converts between wire arrays and transport bytes
///
/// Implementations must be exactly symmetric: `unserialize(serialize(x))`
/// yields `x` for every wire array `x` a message marshals to.
pub trait Serializer: Send + Sync {
    /// Stable serializer identity, used as the serialization-cache key
    fn id(&self) -> &'static str;

    /// Serialize a wire array to bytes
    fn serialize(&self, wire: &[Value]) -> Result<Bytes>;

    /// Parse bytes into a wire array
    fn unserialize(&self, data: &[u8]) -> Result<Vec<Value>>;

    /// Parse bytes directly into a typed message
    ///
    /// Unserializes, then dispatches on the type code at index 0.
    fn unserialize_message(&self, data: &[u8]) -> Result<Message> {
        let wire = self.unserialize(data)?;
        Message::parse(&wire)
    }
}

/// A [`Serializer`] producing JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn id(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, wire: &[Value]) -> Result<Bytes> {
        serde_json::to_vec(wire)
            .map(Bytes::from)
            .map_err(|err| ProtocolError::Serialize(err.to_string()))
    }

    fn unserialize(&self, data: &[u8]) -> Result<Vec<Value>> {
        let value: Value = serde_json::from_slice(data)
            .map_err(|err| ProtocolError::Unserialize(err.to_string()))?;
        into_wire_array(value)
    }
}

/// A [`Serializer`] producing MsgPack binary
///
/// Encodes the same value tree as [`JsonSerializer`], so the two are
/// interchangeable per connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackSerializer;

impl Serializer for MsgPackSerializer {
    fn id(&self) -> &'static str {
        "msgpack"
    }

    fn serialize(&self, wire: &[Value]) -> Result<Bytes> {
        rmp_serde::to_vec(wire)
            .map(Bytes::from)
            .map_err(|err| ProtocolError::Serialize(err.to_string()))
    }

    fn unserialize(&self, data: &[u8]) -> Result<Vec<Value>> {
        let value: Value = rmp_serde::from_slice(data)
            .map_err(|err| ProtocolError::Unserialize(err.to_string()))?;
        into_wire_array(value)
    }
}

fn into_wire_array(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ProtocolError::Unserialize(format!(
            "expected a wire array, got {other}"
        ))),
    }
}

/// Per-message cache of serialized frames, keyed by serializer identity
///
/// Lookups and inserts go through a lock scoped to the owning message, so
/// a message fanned out across tasks serializes at most once per
/// serializer. The cache is incidental state: it compares equal to any
/// other cache and clones empty, so message equality and clones ignore it.
#[derive(Default)]
pub struct SerializationCache {
    slots: Mutex<HashMap<&'static str, Bytes>>,
}

impl SerializationCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the frame cached under `key`, computing and storing it at
    /// most once
    ///
    /// A failed computation stores nothing; the next call retries.
    pub fn get_or_compute(
        &self,
        key: &'static str,
        compute: impl FnOnce() -> Result<Bytes>,
    ) -> Result<Bytes> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(frame) = slots.get(key) {
            return Ok(frame.clone());
        }
        tracing::trace!(serializer = key, "serialization cache miss");
        let frame = compute()?;
        slots.insert(key, frame.clone());
        Ok(frame)
    }

    /// Drop every cached frame
    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl PartialEq for SerializationCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for SerializationCache {}

impl Clone for SerializationCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for SerializationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SerializationCache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_wire() -> Vec<Value> {
        vec![json!(32), json!(917), json!(5123), json!({}), json!("com.example.topic")]
    }

    #[test]
    fn test_json_roundtrip() {
        let serializer = JsonSerializer;
        let wire = sample_wire();
        let bytes = serializer.serialize(&wire).unwrap();
        assert_eq!(serializer.unserialize(&bytes).unwrap(), wire);
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let serializer = MsgPackSerializer;
        let wire = sample_wire();
        let bytes = serializer.serialize(&wire).unwrap();
        assert_eq!(serializer.unserialize(&bytes).unwrap(), wire);
    }

    #[test]
    fn test_json_unserialize_garbage() {
        let result = JsonSerializer.unserialize(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Unserialize(_))));
    }

    #[test]
    fn test_unserialize_non_array() {
        let result = JsonSerializer.unserialize(b"{\"a\": 1}");
        assert!(matches!(result, Err(ProtocolError::Unserialize(_))));
    }

    #[test]
    fn test_cache_computes_once_per_key() {
        let cache = SerializationCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            let frame = cache
                .get_or_compute("json", || {
                    calls += 1;
                    Ok(Bytes::from_static(b"frame"))
                })
                .unwrap();
            assert_eq!(frame.as_ref(), b"frame");
        }
        assert_eq!(calls, 1);

        // a different serializer id is a different slot
        cache
            .get_or_compute("msgpack", || {
                calls += 1;
                Ok(Bytes::from_static(b"other"))
            })
            .unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_cache_clear_forces_recompute() {
        let cache = SerializationCache::new();
        let mut calls = 0;
        let mut compute = || {
            calls += 1;
            Ok(Bytes::from_static(b"frame"))
        };

        cache.get_or_compute("json", &mut compute).unwrap();
        cache.clear();
        cache.get_or_compute("json", &mut compute).unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_cache_failed_compute_not_stored() {
        let cache = SerializationCache::new();

        let result = cache.get_or_compute("json", || {
            Err(ProtocolError::Serialize("boom".to_owned()))
        });
        assert!(result.is_err());

        let frame = cache
            .get_or_compute("json", || Ok(Bytes::from_static(b"ok")))
            .unwrap();
        assert_eq!(frame.as_ref(), b"ok");
    }

    #[test]
    fn test_equality_ignores_cache() {
        let first = SerializationCache::new();
        let second = SerializationCache::new();
        first
            .get_or_compute("json", || Ok(Bytes::from_static(b"frame")))
            .unwrap();
        assert_eq!(first, second);
    }
}
