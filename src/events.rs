//! Change events for collaborators publishing into a multiplexer.
//!
//! Domain code typically publishes "something was added/removed/modified"
//! notifications (members joining a chat, a role change, a message arriving).
//! [`Event`] is a generic envelope for those; the multiplexer itself attaches
//! no meaning to it.
//!
//! ```ignore
//! let members: Multiplexer<Event<User>> = Multiplexer::new();
//! members.publish(Event::added(alice))?;
//! members.publish(Event::modified(bob))?;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change carried by an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Added,
    Removed,
    Modified,
    /// No change, e.g. an initial snapshot.
    #[default]
    None,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Added => "added",
            EventType::Removed => "removed",
            EventType::Modified => "modified",
            EventType::None => "none",
        };
        f.write_str(name)
    }
}

/// A payload tagged with the kind of change it represents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<T> {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: T,
}

impl<T> Event<T> {
    pub fn new(event_type: EventType, payload: T) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn added(payload: T) -> Self {
        Self::new(EventType::Added, payload)
    }

    pub fn removed(payload: T) -> Self {
        Self::new(EventType::Removed, payload)
    }

    pub fn modified(payload: T) -> Self {
        Self::new(EventType::Modified, payload)
    }

    pub fn none(payload: T) -> Self {
        Self::new(EventType::None, payload)
    }

    pub fn is(&self, event_type: EventType) -> bool {
        self.event_type == event_type
    }

    /// Transform the payload, keeping the event type.
    pub fn map<U, F>(self, f: F) -> Event<U>
    where
        F: FnOnce(T) -> U,
    {
        Event {
            event_type: self.event_type,
            payload: f(self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert!(Event::added(1).is(EventType::Added));
        assert!(Event::removed(1).is(EventType::Removed));
        assert!(Event::modified(1).is(EventType::Modified));
        assert!(Event::none(1).is(EventType::None));
    }

    #[test]
    fn test_map_keeps_type() {
        let event = Event::removed("user-1").map(|id| id.len());
        assert_eq!(event, Event::new(EventType::Removed, 6));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Event::added("user-1")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "added", "payload": "user-1"}));

        let back: Event<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back, Event::added("user-1".to_string()));
    }
}
