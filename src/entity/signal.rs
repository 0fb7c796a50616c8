//! Signal requests and queue records.
//!
//! A [`Signal`] describes who should receive a message: an explicit target,
//! every component carrying one of a set of tags, and (unless disabled) every
//! subscriber of the signal name. [`Entity::signal`](super::Entity::signal)
//! resolves it into one [`QueuedSignal`] per receiver.

use serde_json::{Map, Value};

use crate::events::platform::PlatformEvent;

/// Interactive signal raised for touchdown/touchup/touchmove events.
pub const TOUCHES: &str = "touches";
/// Interactive signal raised for zoomin/zoomout events.
pub const ZOOM: &str = "zoom";
/// Interactive signal raised for scroll events.
pub const SCROLL: &str = "scroll";

/// Payload carried by a signal.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SignalData {
    #[default]
    None,
    Values(Map<String, Value>),
    Event(PlatformEvent),
}

impl SignalData {
    /// Look up a named value; `None` for non-map payloads.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            SignalData::Values(map) => map.get(key),
            _ => None,
        }
    }

    pub fn event(&self) -> Option<&PlatformEvent> {
        match self {
            SignalData::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// A signal waiting in an entity's queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedSignal {
    pub signal: String,
    pub sender: Option<String>,
    pub target: String,
    pub data: SignalData,
}

/// Builder for a queued signal.
///
/// ```
/// use sceneloom::entity::signal::Signal;
/// use serde_json::json;
///
/// let s = Signal::new("hit")
///     .from("sword")
///     .tagged(["enemy"])
///     .with("damage", json!(3));
/// assert_eq!(s.name, "hit");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub sender: Option<String>,
    pub target: Option<String>,
    pub tags: Vec<String>,
    pub subscribers: bool,
    pub data: SignalData,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sender: None,
            target: None,
            tags: Vec::new(),
            subscribers: true,
            data: SignalData::None,
        }
    }

    pub fn from(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Explicit receiver, by component id.
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn tagged<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Do not deliver to the subscribers of the signal name.
    pub fn no_subscribers(mut self) -> Self {
        self.subscribers = false;
        self
    }

    /// Add one named value to the payload.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        match &mut self.data {
            SignalData::Values(map) => {
                map.insert(key.into(), value);
            }
            _ => {
                let mut map = Map::new();
                map.insert(key.into(), value);
                self.data = SignalData::Values(map);
            }
        }
        self
    }

    pub fn data(mut self, data: SignalData) -> Self {
        self.data = data;
        self
    }
}
