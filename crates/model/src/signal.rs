//! The signal envelope carried by every Pointerflow stream.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use pointerflow_common::clock::Timestamp;

/// Semantic family of a signal's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// A single tracked pointer update.
    Pointer,
    /// A snapshot of every tracked pointer.
    Pointers,
    Pan,
    Pinch,
    Tap,
}

impl SignalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Pointers => "pointers",
            Self::Pan => "pan",
            Self::Pinch => "pinch",
            Self::Tap => "tap",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the device a signal originated from.
///
/// Cloning never allocates: named devices share one `Rc<str>` and the
/// pointer-type fallback names are `'static`.
#[derive(Clone)]
pub struct DeviceId(Repr);

#[derive(Clone)]
enum Repr {
    Static(&'static str),
    Shared(Rc<str>),
}

impl DeviceId {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Repr::Static(name))
    }

    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Static(name) => name,
            Repr::Shared(name) => name,
        }
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(Repr::Shared(Rc::from(value)))
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(Repr::Shared(Rc::from(value)))
    }
}

impl PartialEq for DeviceId {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for DeviceId {}

impl Hash for DeviceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Immutable event envelope.
///
/// Everything but `updated_at` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal<V> {
    kind: SignalKind,
    value: V,
    device_id: DeviceId,
    created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<Timestamp>,
}

impl<V> Signal<V> {
    pub fn new(kind: SignalKind, value: V, device_id: DeviceId, created_at: Timestamp) -> Self {
        Self {
            kind,
            value,
            device_id,
            created_at,
            updated_at: None,
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    /// Record a later observation time.
    pub fn touch(&mut self, at: Timestamp) {
        self.updated_at = Some(at);
    }

    /// Consume the signal, keeping only its payload.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Transform the payload, keeping the envelope metadata.
    pub fn map_value<R>(self, f: impl FnOnce(V) -> R) -> Signal<R> {
        Signal {
            kind: self.kind,
            value: f(self.value),
            device_id: self.device_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
