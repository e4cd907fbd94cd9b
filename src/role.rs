//! Role and feature descriptors negotiated in `HELLO`
//!
//! Each peer announces the roles it implements, optionally with a
//! `features` sub-map of boolean capability flags. Feature lists are
//! declared explicitly per role; unknown feature keys are dropped on
//! parse for forward compatibility, and marshal emits only flags that
//! are actually set.

use serde_json::{Map, Value};

use crate::validate::validate_options;
use crate::{ProtocolError, Result};

/// Builds the `features` sub-map key by key; `None` flags are skipped.
macro_rules! feature_map {
    ($features:expr, $($field:ident),+ $(,)?) => {{
        let mut map = Map::new();
        $(
            if let Some(flag) = $features.$field {
                map.insert(stringify!($field).to_owned(), Value::Bool(flag));
            }
        )+
        map
    }};
}

/// Probes the declared feature keys; anything else in `map` is ignored.
macro_rules! features_from_map {
    ($ty:ident, $map:expr, $role:expr, $($field:ident),+ $(,)?) => {{
        let mut features = $ty::default();
        $(
            features.$field = feature_flag($map, stringify!($field), $role)?;
        )+
        features
    }};
}

fn feature_flag(features: &Map<String, Value>, key: &str, role: &str) -> Result<Option<bool>> {
    match features.get(key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(ProtocolError::InvalidType {
            field: format!("feature '{key}' of role '{role}' in HELLO"),
            expected: "bool",
        }),
    }
}

/// Capability flags a broker may announce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrokerFeatures {
    /// Events can disclose the publisher's session
    pub publisher_identification: Option<bool>,
    /// Publications carry trust levels
    pub publication_trustlevels: Option<bool>,
    /// Prefix/wildcard topic matching
    pub pattern_based_subscription: Option<bool>,
    /// Meta-events on subscription lifecycle
    pub subscriber_metaevents: Option<bool>,
    /// Per-publication exclude/eligible lists
    pub subscriber_blackwhite_listing: Option<bool>,
    /// Publishers can exclude themselves
    pub publisher_exclusion: Option<bool>,
    /// Broker-initiated subscription revocation
    pub subscription_revocation: Option<bool>,
    /// Replay of retained events
    pub event_history: Option<bool>,
}

/// Capability flags a subscriber may announce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriberFeatures {
    /// Events can disclose the publisher's session
    pub publisher_identification: Option<bool>,
    /// Publications carry trust levels
    pub publication_trustlevels: Option<bool>,
    /// Prefix/wildcard topic matching
    pub pattern_based_subscription: Option<bool>,
    /// Meta-events on subscription lifecycle
    pub subscriber_metaevents: Option<bool>,
    /// Broker-initiated subscription revocation
    pub subscription_revocation: Option<bool>,
    /// Replay of retained events
    pub event_history: Option<bool>,
}

/// Capability flags a publisher may announce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublisherFeatures {
    /// Publications can disclose the publisher's session
    pub publisher_identification: Option<bool>,
    /// Per-publication exclude/eligible lists
    pub subscriber_blackwhite_listing: Option<bool>,
    /// Publishers can exclude themselves
    pub publisher_exclusion: Option<bool>,
}

/// Capability flags a dealer may announce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DealerFeatures {
    /// Invocations can disclose the caller's session
    pub caller_identification: Option<bool>,
    /// Calls carry trust levels
    pub call_trustlevels: Option<bool>,
    /// Prefix/wildcard procedure matching
    pub pattern_based_registration: Option<bool>,
    /// Dealer-initiated registration revocation
    pub registration_revocation: Option<bool>,
    /// Multiple callees per procedure
    pub shared_registration: Option<bool>,
    /// Automatic call timeout
    pub call_timeout: Option<bool>,
    /// Cancellation of outstanding calls
    pub call_canceling: Option<bool>,
    /// Progressive call results
    pub progressive_call_results: Option<bool>,
}

/// Capability flags a caller may announce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallerFeatures {
    /// Invocations can disclose the caller's session
    pub caller_identification: Option<bool>,
    /// Automatic call timeout
    pub call_timeout: Option<bool>,
    /// Cancellation of outstanding calls
    pub call_canceling: Option<bool>,
    /// Progressive call results
    pub progressive_call_results: Option<bool>,
}

/// Capability flags a callee may announce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalleeFeatures {
    /// Invocations can disclose the caller's session
    pub caller_identification: Option<bool>,
    /// Calls carry trust levels
    pub call_trustlevels: Option<bool>,
    /// Prefix/wildcard procedure matching
    pub pattern_based_registration: Option<bool>,
    /// Dealer-initiated registration revocation
    pub registration_revocation: Option<bool>,
    /// Multiple callees per procedure
    pub shared_registration: Option<bool>,
    /// Automatic call timeout
    pub call_timeout: Option<bool>,
    /// Cancellation of outstanding calls
    pub call_canceling: Option<bool>,
    /// Progressive call results
    pub progressive_call_results: Option<bool>,
}

/// A role held by a peer, with its announced features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Routes publications to subscribers
    Broker(BrokerFeatures),
    /// Receives events for subscribed topics
    Subscriber(SubscriberFeatures),
    /// Publishes events to topics
    Publisher(PublisherFeatures),
    /// Routes calls to registered callees
    Dealer(DealerFeatures),
    /// Issues calls
    Caller(CallerFeatures),
    /// Registers and serves procedures
    Callee(CalleeFeatures),
}

impl Role {
    /// Every role name this implementation knows, in wire order
    pub const NAMES: [&'static str; 6] = [
        "broker",
        "subscriber",
        "publisher",
        "dealer",
        "caller",
        "callee",
    ];

    /// Wire name of this role
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Broker(_) => "broker",
            Self::Subscriber(_) => "subscriber",
            Self::Publisher(_) => "publisher",
            Self::Dealer(_) => "dealer",
            Self::Caller(_) => "caller",
            Self::Callee(_) => "callee",
        }
    }

    /// A role with no features announced
    pub(crate) fn bare(name: &str) -> Option<Self> {
        match name {
            "broker" => Some(Self::Broker(BrokerFeatures::default())),
            "subscriber" => Some(Self::Subscriber(SubscriberFeatures::default())),
            "publisher" => Some(Self::Publisher(PublisherFeatures::default())),
            "dealer" => Some(Self::Dealer(DealerFeatures::default())),
            "caller" => Some(Self::Caller(CallerFeatures::default())),
            "callee" => Some(Self::Callee(CalleeFeatures::default())),
            _ => None,
        }
    }

    /// Parse one entry of the `roles` detail in `HELLO`
    ///
    /// `entry` is the per-role object, holding at most a `features`
    /// sub-map. Unknown role names fail; unknown feature keys are dropped.
    pub(crate) fn parse(name: &str, entry: &Map<String, Value>) -> Result<Self> {
        let Some(features_value) = entry.get("features") else {
            return Self::bare(name).ok_or_else(|| ProtocolError::UnknownRole {
                role: name.to_owned(),
            });
        };
        let features = validate_options(
            features_value,
            &format!("'features' of role '{name}' in HELLO"),
        )?;

        match name {
            "broker" => Ok(Self::Broker(features_from_map!(
                BrokerFeatures,
                features,
                name,
                publisher_identification,
                publication_trustlevels,
                pattern_based_subscription,
                subscriber_metaevents,
                subscriber_blackwhite_listing,
                publisher_exclusion,
                subscription_revocation,
                event_history,
            ))),
            "subscriber" => Ok(Self::Subscriber(features_from_map!(
                SubscriberFeatures,
                features,
                name,
                publisher_identification,
                publication_trustlevels,
                pattern_based_subscription,
                subscriber_metaevents,
                subscription_revocation,
                event_history,
            ))),
            "publisher" => Ok(Self::Publisher(features_from_map!(
                PublisherFeatures,
                features,
                name,
                publisher_identification,
                subscriber_blackwhite_listing,
                publisher_exclusion,
            ))),
            "dealer" => Ok(Self::Dealer(features_from_map!(
                DealerFeatures,
                features,
                name,
                caller_identification,
                call_trustlevels,
                pattern_based_registration,
                registration_revocation,
                shared_registration,
                call_timeout,
                call_canceling,
                progressive_call_results,
            ))),
            "caller" => Ok(Self::Caller(features_from_map!(
                CallerFeatures,
                features,
                name,
                caller_identification,
                call_timeout,
                call_canceling,
                progressive_call_results,
            ))),
            "callee" => Ok(Self::Callee(features_from_map!(
                CalleeFeatures,
                features,
                name,
                caller_identification,
                call_trustlevels,
                pattern_based_registration,
                registration_revocation,
                shared_registration,
                call_timeout,
                call_canceling,
                progressive_call_results,
            ))),
            _ => Err(ProtocolError::UnknownRole {
                role: name.to_owned(),
            }),
        }
    }

    /// Wire form of this role's entry: `{}` or `{"features": {...}}`
    pub(crate) fn marshal(&self) -> Value {
        let features = match self {
            Self::Broker(f) => feature_map!(
                f,
                publisher_identification,
                publication_trustlevels,
                pattern_based_subscription,
                subscriber_metaevents,
                subscriber_blackwhite_listing,
                publisher_exclusion,
                subscription_revocation,
                event_history,
            ),
            Self::Subscriber(f) => feature_map!(
                f,
                publisher_identification,
                publication_trustlevels,
                pattern_based_subscription,
                subscriber_metaevents,
                subscription_revocation,
                event_history,
            ),
            Self::Publisher(f) => feature_map!(
                f,
                publisher_identification,
                subscriber_blackwhite_listing,
                publisher_exclusion,
            ),
            Self::Dealer(f) => feature_map!(
                f,
                caller_identification,
                call_trustlevels,
                pattern_based_registration,
                registration_revocation,
                shared_registration,
                call_timeout,
                call_canceling,
                progressive_call_results,
            ),
            Self::Caller(f) => feature_map!(
                f,
                caller_identification,
                call_timeout,
                call_canceling,
                progressive_call_results,
            ),
            Self::Callee(f) => feature_map!(
                f,
                caller_identification,
                call_trustlevels,
                pattern_based_registration,
                registration_revocation,
                shared_registration,
                call_timeout,
                call_canceling,
                progressive_call_results,
            ),
        };

        let mut entry = Map::new();
        if !features.is_empty() {
            entry.insert("features".to_owned(), Value::Object(features));
        }
        Value::Object(entry)
    }
}
