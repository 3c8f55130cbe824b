//! Raw pointer events for the Pointerflow input boundary.
//!
//! A host adapter translates its native touch/mouse/pen events into
//! [`PointerEvent`]s. Recorded sessions are stored as JSONL, one event per
//! line, with `#` lines treated as comments.

use serde::{Deserialize, Serialize};

use pointerflow_common::clock::Timestamp;
use pointerflow_common::error::{PointerflowError, PointerflowResult};

use crate::signal::DeviceId;

/// Host-assigned pointer identity, stable from start to end/cancel.
pub type PointerId = i64;

/// Lifecycle phase of a raw pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    /// Pointer went down / made contact.
    Start,
    /// Pointer moved while down.
    Move,
    /// Pointer lifted normally.
    End,
    /// The host lost the pointer (e.g. system gesture, palm rejection).
    Cancel,
}

impl PointerPhase {
    /// Whether this phase removes the pointer from tracking.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End | Self::Cancel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Move => "move",
            Self::End => "end",
            Self::Cancel => "cancel",
        }
    }
}

/// Kind of device behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PointerType {
    Touch,
    Mouse,
    Pen,
    #[default]
    Unknown,
}

impl PointerType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Touch => "touch",
            Self::Mouse => "mouse",
            Self::Pen => "pen",
            Self::Unknown => "unknown",
        }
    }
}

/// A single raw pointer event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Pointer identity.
    pub id: PointerId,

    /// Position in caller-chosen coordinates.
    pub x: f64,
    pub y: f64,

    /// Lifecycle phase.
    pub phase: PointerPhase,

    /// Device kind.
    #[serde(rename = "type", default)]
    pub pointer_type: PointerType,

    /// Button index as reported by the host (0 = primary).
    #[serde(default)]
    pub button: i32,

    /// Host timestamp in milliseconds.
    #[serde(rename = "t")]
    pub timestamp: Timestamp,

    /// Originating device. Signals fall back to the pointer type name
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
}

impl PointerEvent {
    /// Create an event with primary button and no explicit device.
    pub fn new(
        id: PointerId,
        phase: PointerPhase,
        x: f64,
        y: f64,
        pointer_type: PointerType,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            x,
            y,
            phase,
            pointer_type,
            button: 0,
            timestamp,
            device_id: None,
        }
    }

    /// Touch contact went down.
    pub fn start(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> Self {
        Self::new(id, PointerPhase::Start, x, y, PointerType::Touch, timestamp)
    }

    /// Touch contact moved.
    pub fn moved(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> Self {
        Self::new(id, PointerPhase::Move, x, y, PointerType::Touch, timestamp)
    }

    /// Touch contact lifted.
    pub fn end(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> Self {
        Self::new(id, PointerPhase::End, x, y, PointerType::Touch, timestamp)
    }

    /// Touch contact was lost.
    pub fn cancel(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> Self {
        Self::new(id, PointerPhase::Cancel, x, y, PointerType::Touch, timestamp)
    }

    /// Attach a device id.
    pub fn with_device(mut self, device_id: impl Into<DeviceId>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Override the pointer type.
    pub fn with_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }

    /// Device id carried by signals derived from this event.
    pub fn device(&self) -> DeviceId {
        match &self.device_id {
            Some(id) => id.clone(),
            None => DeviceId::from_static(self.pointer_type.as_str()),
        }
    }

    /// Whether the coordinates and timestamp are usable.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.timestamp.is_finite()
    }
}

/// Parse events from JSONL content (one JSON object per line).
///
/// Blank lines and lines starting with `#` are skipped. Errors carry the
/// 1-based line number.
pub fn parse_events(jsonl: &str) -> PointerflowResult<Vec<PointerEvent>> {
    jsonl
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str(line)
                .map_err(|e| PointerflowError::parse(line_no, e.to_string()))
        })
        .collect()
}

/// Serialize events to JSONL format.
pub fn serialize_events(events: &[PointerEvent]) -> PointerflowResult<String> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_format() {
        let event = PointerEvent::start(3, 10.5, 20.0, 16.0);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"id\":3"));
        assert!(json.contains("\"phase\":\"start\""));
        assert!(json.contains("\"type\":\"touch\""));
        assert!(json.contains("\"t\":16.0"));
        assert!(!json.contains("device_id"));
    }

    #[test]
    fn test_minimal_line_uses_defaults() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"id":1,"x":0,"y":0,"phase":"move","t":4.5}"#).unwrap();
        assert_eq!(event.pointer_type, PointerType::Unknown);
        assert_eq!(event.button, 0);
        assert_eq!(event.device_id, None);
        assert_eq!(event.device().as_str(), "unknown");
    }

    #[test]
    fn test_jsonl_roundtrip_with_device() {
        let events = vec![
            PointerEvent::start(1, 0.0, 0.0, 0.0).with_device("pad-0"),
            PointerEvent::moved(1, 4.0, 2.0, 8.0)
                .with_device("pad-0")
                .with_type(PointerType::Pen),
            PointerEvent::end(1, 4.0, 2.0, 16.0).with_device("pad-0"),
        ];
        let jsonl = serialize_events(&events).unwrap();
        let parsed = parse_events(&jsonl).unwrap();
        assert_eq!(events, parsed);
        assert_eq!(parsed[0].device().as_str(), "pad-0");
    }

    #[test]
    fn test_parse_skips_comments_and_reports_line() {
        let jsonl = "# recorded on a tablet\n\n{\"id\":1,\"x\":0,\"y\":0,\"phase\":\"start\",\"t\":0}\n{\"id\":1,\"phase\":\"bogus\"}\n";
        match parse_events(jsonl) {
            Err(PointerflowError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected parse error, got {other:?}"),
        }

        let parsed = parse_events("# only a comment\n{\"id\":2,\"x\":1,\"y\":1,\"phase\":\"cancel\",\"t\":3}").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].phase, PointerPhase::Cancel);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(PointerPhase::End.is_terminal());
        assert!(PointerPhase::Cancel.is_terminal());
        assert!(!PointerPhase::Start.is_terminal());
        assert!(!PointerPhase::Move.is_terminal());
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(PointerEvent::moved(1, 1.0, 2.0, 3.0).is_finite());
        assert!(!PointerEvent::moved(1, f64::NAN, 2.0, 3.0).is_finite());
    }
}
