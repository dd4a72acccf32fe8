use chrono::{DateTime, Utc};
use serde_json::{Value, json};

/// Builds the JSON envelopes published on the event bus. Two shapes exist on
/// the wire:
///
/// - base events: `{"event": ..., "detail": ..., "server": ..., "ts": ...}`
/// - typed events: `{"type": ..., "data": {...}, "server": ..., "ts": ...}`
///
/// Both carry `session_id` when a session tag is configured. `ts` is epoch
/// seconds.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    server: String,
    session_id: Option<String>,
}

impl EventEnvelope {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Base event: a named occurrence plus a short human/machine detail.
    pub fn base(&self, now: DateTime<Utc>, event: &str, detail: &str) -> Value {
        let mut obj = json!({
            "event": event,
            "detail": detail,
            "server": self.server,
            "ts": now.timestamp(),
        });
        self.stamp_session(&mut obj);
        obj
    }

    /// Typed event: a structured payload wrapped under `data`.
    pub fn wrap(&self, now: DateTime<Utc>, kind: &str, data: Value) -> Value {
        let mut obj = json!({
            "type": kind,
            "data": data,
            "server": self.server,
            "ts": now.timestamp(),
        });
        self.stamp_session(&mut obj);
        obj
    }

    fn stamp_session(&self, obj: &mut Value) {
        if let (Some(sid), Some(map)) = (&self.session_id, obj.as_object_mut()) {
            map.insert("session_id".into(), Value::String(sid.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_event_shape() {
        let env = EventEnvelope::new("test-server");
        let now = Utc::now();
        let v = env.base(now, "cmd_reject", "bad_cmd");
        assert_eq!(v["event"], "cmd_reject");
        assert_eq!(v["detail"], "bad_cmd");
        assert_eq!(v["server"], "test-server");
        assert_eq!(v["ts"], now.timestamp());
        assert!(v.get("session_id").is_none());
    }

    #[test]
    fn test_wrap_carries_session() {
        let env = EventEnvelope::new("s").with_session("abc");
        let v = env.wrap(Utc::now(), "plan_started", json!({"size": 2}));
        assert_eq!(v["type"], "plan_started");
        assert_eq!(v["data"]["size"], 2);
        assert_eq!(v["session_id"], "abc");
    }
}
