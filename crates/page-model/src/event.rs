//! Host event types for scripted replays.
//!
//! A replay script is a JSONL file: one timestamped event per line, with
//! blank lines and `#` comment lines ignored. Timestamps are milliseconds
//! since the page was mounted and must not decrease.

use serde::{Deserialize, Serialize};

/// Milliseconds since the host started.
pub type TimestampMs = f64;

/// A single host event with timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    /// Milliseconds since the host started.
    #[serde(rename = "t")]
    pub timestamp_ms: TimestampMs,

    /// The event payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Discriminated union of event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Pointer moved to a viewport position (CSS pixels).
    PointerMove { x: f64, y: f64 },

    /// Page scrolled to a vertical offset (CSS pixels).
    Scroll { y: f64 },

    /// Viewport resized.
    Resize { width: f64, height: f64 },

    /// No input; only lets time pass.
    Wait,
}

impl HostEvent {
    /// Create a pointer-move event.
    pub fn pointer_move(timestamp_ms: TimestampMs, x: f64, y: f64) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::PointerMove { x, y },
        }
    }

    /// Create a scroll event.
    pub fn scroll(timestamp_ms: TimestampMs, y: f64) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::Scroll { y },
        }
    }

    /// Create a resize event.
    pub fn resize(timestamp_ms: TimestampMs, width: f64, height: f64) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::Resize { width, height },
        }
    }

    /// Create a wait marker.
    pub fn wait(timestamp_ms: TimestampMs) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::Wait,
        }
    }
}

/// Failure to parse a replay script.
#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: timestamp {timestamp_ms}ms precedes {previous_ms}ms")]
    OutOfOrder {
        line: usize,
        timestamp_ms: TimestampMs,
        previous_ms: TimestampMs,
    },
}

impl EventParseError {
    /// One-based line number of the offending event.
    pub fn line(&self) -> usize {
        match self {
            Self::Json { line, .. } | Self::OutOfOrder { line, .. } => *line,
        }
    }
}

/// Parse events from JSONL content (one JSON object per line).
pub fn parse_events(jsonl: &str) -> Result<Vec<HostEvent>, EventParseError> {
    let mut events: Vec<HostEvent> = Vec::new();

    for (idx, line) in jsonl.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: HostEvent = serde_json::from_str(line).map_err(|source| {
            EventParseError::Json {
                line: idx + 1,
                source,
            }
        })?;

        if let Some(previous) = events.last() {
            if event.timestamp_ms < previous.timestamp_ms {
                return Err(EventParseError::OutOfOrder {
                    line: idx + 1,
                    timestamp_ms: event.timestamp_ms,
                    previous_ms: previous.timestamp_ms,
                });
            }
        }
        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let script = r#"
# hero hover
{"t": 0, "type": "pointer_move", "x": 720, "y": 450}

{"t": 120.5, "type": "scroll", "y": 300}
{"t": 500, "type": "resize", "width": 390, "height": 844}
{"t": 900, "type": "wait"}
"#;
        let events = parse_events(script).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], HostEvent::pointer_move(0.0, 720.0, 450.0));
        assert_eq!(events[1].kind, EventKind::Scroll { y: 300.0 });
        assert_eq!(events[3].kind, EventKind::Wait);
        assert_eq!(events[1].timestamp_ms, 120.5);
    }

    #[test]
    fn test_parse_reports_line_of_bad_json() {
        let script = "{\"t\": 0, \"type\": \"wait\"}\n{\"t\": 10, \"type\": \"teleport\"}\n";
        let err = parse_events(script).unwrap_err();
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_parse_rejects_time_travel() {
        let script = "{\"t\": 100, \"type\": \"wait\"}\n{\"t\": 50, \"type\": \"wait\"}\n";
        let err = parse_events(script).unwrap_err();
        assert!(matches!(err, EventParseError::OutOfOrder { line: 2, .. }));
    }

    #[test]
    fn test_event_serializes_flat() {
        let json = serde_json::to_string(&HostEvent::scroll(16.0, 42.0)).unwrap();
        assert_eq!(json, r#"{"t":16.0,"type":"scroll","y":42.0}"#);
    }
}
