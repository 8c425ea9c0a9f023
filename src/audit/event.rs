use serde::Serialize;
use serde_json::{Map, Value};

/// Type tag for the alerting path.
pub const EVENT_ALERT: &str = "ALERT";
/// Type tag for the non-alerting path.
pub const EVENT_NO_ALERT: &str = "NO_ALERT";
/// Type tag for a case aborted by a collaborator failure.
pub const EVENT_ERROR: &str = "ERROR";

/// A pipeline action to be appended to the audit trail.
///
/// Transient: built by a node, handed to an [`AuditSink`](super::AuditSink)
/// and dropped. The timestamp is never part of the event; the sink stamps it
/// at write time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditEvent {
    event_type: Option<String>,
    fields: Map<String, Value>,
}

impl AuditEvent {
    /// Event without a type tag (synthesis records).
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn typed(event_type: &str) -> Self {
        Self {
            event_type: Some(event_type.to_string()),
            fields: Map::new(),
        }
    }

    /// Attach a field. `ts` and `type` are reserved and silently skipped.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Serialize) {
        if key == "ts" || key == "type" {
            return;
        }
        // A value that cannot be represented as JSON is recorded as null
        // rather than dropping the whole event.
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Persisted shape of one record: `ts` first, then `type`, then the fields.
#[derive(Serialize)]
pub(crate) struct AuditRecord<'a> {
    pub ts: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<&'a str>,
    #[serde(flatten)]
    pub fields: &'a Map<String, Value>,
}

/// Char-boundary-safe prefix used for excerpt and answer previews.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_are_ignored() {
        let event = AuditEvent::typed(EVENT_ALERT)
            .with("ts", "1999-01-01T00:00:00Z")
            .with("type", "FORGED")
            .with("severity", "high");
        assert_eq!(event.event_type(), Some("ALERT"));
        assert!(!event.fields().contains_key("ts"));
        assert!(!event.fields().contains_key("type"));
        assert_eq!(event.fields()["severity"], "high");
    }

    #[test]
    fn untyped_record_omits_type() {
        let event = AuditEvent::untyped().with("question", "q");
        let record = AuditRecord {
            ts: "2026-01-01T00:00:00Z".into(),
            event_type: event.event_type(),
            fields: event.fields(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"ts":"2026-01-01T00:00:00Z""#));
        assert!(!json.contains("\"type\""));
    }

    #[test]
    fn preview_respects_multibyte_chars() {
        assert_eq!(preview("dispneia é leve", 10), "dispneia é");
        assert_eq!(preview("abc", 10), "abc");
    }
}
