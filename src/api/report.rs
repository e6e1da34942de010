//! Purpose: Stable JSON envelopes describing decoded packages and decode failures.
//! Exports: `package_json`, `error_json`.
//! Role: Diagnostics for bindings and logs; never part of the playback path.
//! Invariants: Key names are additive-only once published.

use serde_json::{Map, Value, json};

use crate::core::error::Error;
use crate::core::model::{VibrateEvent, VibratePackage, VibratePattern};

pub fn package_json(package: &VibratePackage) -> Value {
    let patterns: Vec<Value> = package.patterns().iter().map(pattern_json).collect();
    json!({
        "dialect": package.dialect().as_str(),
        "total_duration_ms": package.total_duration_ms(),
        "pattern_count": patterns.len(),
        "event_count": package.event_count(),
        "patterns": patterns,
    })
}

fn pattern_json(pattern: &VibratePattern) -> Value {
    let events: Vec<Value> = pattern.events().iter().map(event_json).collect();
    json!({
        "start_time_ms": pattern.start_time_ms(),
        "duration_ms": pattern.duration_ms(),
        "event_count": events.len(),
        "events": events,
    })
}

fn event_json(event: &VibrateEvent) -> Value {
    json!({
        "tag": event.tag().as_str(),
        "time_ms": event.time_ms(),
        "duration_ms": event.duration_ms(),
        "intensity": event.intensity(),
        "frequency": event.frequency(),
        "index": event.index(),
        "point_count": event.points().len(),
    })
}

pub fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(err.kind().code()));
    inner.insert(
        "message".to_string(),
        json!(err.message().unwrap_or(err.kind().code())),
    );
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = std::error::Error::source(err);
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}
