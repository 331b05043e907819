//! Event model and timestamp normalization.
//!
//! Producers describe event payloads with [`EventValue`], which can carry
//! timestamps at any depth. Before an event leaves the process every timestamp
//! is rewritten into its canonical textual form, so clients always decode the
//! same string regardless of where it sits in the payload.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Kinds of events pushed to connected clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    NewEvent,
    ServiceStarted,
    ServiceStopped,
    Heartbeat,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NewEvent => "new_event",
            EventType::ServiceStarted => "service_started",
            EventType::ServiceStopped => "service_stopped",
            EventType::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured event payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Timestamp(DateTime<Utc>),
    List(Vec<EventValue>),
    Map(EventData),
}

/// Top-level event payload.
pub type EventData = BTreeMap<String, EventValue>;

/// Build an [`EventData`] from key/value pairs.
pub fn event_data<K, V, I>(entries: I) -> EventData
where
    K: Into<String>,
    V: Into<EventValue>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Canonical textual form of an instant: RFC 3339 with an explicit `+00:00` offset.
pub fn canonical_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Recursively convert a payload value to JSON, rewriting timestamps.
pub fn normalize_value(value: &EventValue) -> Value {
    match value {
        EventValue::Null => Value::Null,
        EventValue::Bool(b) => Value::Bool(*b),
        EventValue::Number(n) => Value::Number(n.clone()),
        EventValue::String(s) => Value::String(s.clone()),
        EventValue::Timestamp(ts) => Value::String(canonical_timestamp(ts)),
        EventValue::List(items) => Value::Array(items.iter().map(normalize_value).collect()),
        EventValue::Map(map) => Value::Object(normalize(map)),
    }
}

/// Recursively convert a payload to a JSON object, rewriting timestamps.
pub fn normalize(data: &EventData) -> Map<String, Value> {
    data.iter()
        .map(|(k, v)| (k.clone(), normalize_value(v)))
        .collect()
}

/// An immutable event ready for transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_type: EventType,
    pub data: Map<String, Value>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Construct an event stamped with the current time, normalizing `data`.
    pub fn new(event_type: EventType, data: &EventData) -> Self {
        Self::at(event_type, data, Utc::now())
    }

    pub fn at(event_type: EventType, data: &EventData, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type,
            data: normalize(data),
            timestamp,
        }
    }

    /// Wire representation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&canonical_timestamp(ts))
}

impl From<bool> for EventValue {
    fn from(value: bool) -> Self {
        EventValue::Bool(value)
    }
}

impl From<i64> for EventValue {
    fn from(value: i64) -> Self {
        EventValue::Number(value.into())
    }
}

impl From<i32> for EventValue {
    fn from(value: i32) -> Self {
        EventValue::Number(value.into())
    }
}

impl From<u64> for EventValue {
    fn from(value: u64) -> Self {
        EventValue::Number(value.into())
    }
}

impl From<usize> for EventValue {
    fn from(value: usize) -> Self {
        EventValue::Number((value as u64).into())
    }
}

impl From<f64> for EventValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(EventValue::Null, EventValue::Number)
    }
}

impl From<&str> for EventValue {
    fn from(value: &str) -> Self {
        EventValue::String(value.to_string())
    }
}

impl From<String> for EventValue {
    fn from(value: String) -> Self {
        EventValue::String(value)
    }
}

impl From<DateTime<Utc>> for EventValue {
    fn from(value: DateTime<Utc>) -> Self {
        EventValue::Timestamp(value)
    }
}

impl<T: Into<EventValue>> From<Vec<T>> for EventValue {
    fn from(values: Vec<T>) -> Self {
        EventValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<EventValue>> From<Option<T>> for EventValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(EventValue::Null, Into::into)
    }
}

impl From<EventData> for EventValue {
    fn from(value: EventData) -> Self {
        EventValue::Map(value)
    }
}

impl From<Value> for EventValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => EventValue::Null,
            Value::Bool(b) => EventValue::Bool(b),
            Value::Number(n) => EventValue::Number(n),
            Value::String(s) => EventValue::String(s),
            Value::Array(items) => EventValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                EventValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_canonical_timestamp_format() {
        assert_eq!(canonical_timestamp(&ts()), "2024-03-01T12:30:00+00:00");

        let precise = ts() + chrono::Duration::microseconds(1500);
        assert_eq!(canonical_timestamp(&precise), "2024-03-01T12:30:00.001500+00:00");
    }

    #[test]
    fn test_normalizes_timestamps_at_every_depth() {
        let data = event_data([
            ("at", EventValue::from(ts())),
            (
                "nested",
                EventValue::from(event_data([("seen", EventValue::from(ts()))])),
            ),
            (
                "rows",
                EventValue::from(vec![
                    EventValue::from(event_data([("at", ts())])),
                    EventValue::from(event_data([("at", ts())])),
                ]),
            ),
            ("times", EventValue::from(vec![ts(), ts()])),
            ("label", EventValue::from("plain")),
        ]);

        let expected = "2024-03-01T12:30:00+00:00";
        assert_eq!(
            Value::Object(normalize(&data)),
            json!({
                "at": expected,
                "nested": { "seen": expected },
                "rows": [{ "at": expected }, { "at": expected }],
                "times": [expected, expected],
                "label": "plain",
            })
        );
    }

    #[test]
    fn test_event_wire_shape() {
        let event = Event::at(EventType::NewEvent, &event_data([("value", 42)]), ts());
        let wire: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(
            wire,
            json!({
                "event_type": "new_event",
                "data": { "value": 42 },
                "timestamp": "2024-03-01T12:30:00+00:00",
            })
        );
    }

    #[test]
    fn test_json_values_pass_through() {
        let value = EventValue::from(json!({ "a": [1, "two", null], "b": true }));
        assert_eq!(normalize_value(&value), json!({ "a": [1, "two", null], "b": true }));
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(EventValue::from(f64::NAN), EventValue::Null);
    }
}
