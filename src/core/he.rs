//! Purpose: Decode the HE dialect (v1 single pattern, v2 absolutely-timed pattern list).
//! Exports: `decode_he`.
//! Role: Patterns are emitted as decoded; the per-pattern event cap bounds their size.
//! Invariants: v2 `AbsoluteTime` values are strictly increasing in input order.
//! Invariants: `RelativeTime` is non-decreasing within a pattern.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::dialect::Dialect;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    CONTINUOUS_DURATION_RANGE, EVENT_TIME_RANGE, HE_MAX_EVENTS_PER_PATTERN,
    HE_SUPPORTED_VERSIONS, INDEX_RANGE, INTENSITY_RANGE, he_version_error,
};
use crate::core::model::{EventTag, VibrateEvent, VibratePackage, VibratePattern, bounded_i32};
use crate::core::wire::{
    EventParamsDoc, PatternItemDoc, deserialize_at, parse_curve, parse_tag, require,
};

#[derive(Debug, Deserialize)]
struct PatternEntryDoc {
    #[serde(rename = "AbsoluteTime")]
    absolute_time: f64,
    #[serde(rename = "Pattern")]
    pattern: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct EventDoc {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "RelativeTime")]
    relative_time: f64,
    #[serde(rename = "Duration", default)]
    duration: Option<f64>,
    #[serde(rename = "Index", default)]
    index: Option<f64>,
    #[serde(rename = "Parameters")]
    parameters: EventParamsDoc,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum HeVersion {
    SinglePattern,
    PatternList,
}

pub(crate) fn decode_he(root: &Value) -> Result<VibratePackage, Error> {
    let meta = root
        .get("Metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            Error::new(ErrorKind::UnsupportedFormat)
                .with_message("resource has neither Channels nor a Metadata object")
                .with_field("Metadata")
        })?;
    let version = schema_version(meta.get("Version"))?;

    let patterns = match version {
        HeVersion::SinglePattern => {
            let pattern = top_level_array(root, "Pattern")?;
            vec![decode_pattern(pattern, 0).map_err(|err| err.within("Pattern"))?]
        }
        HeVersion::PatternList => decode_pattern_list(top_level_array(root, "PatternList")?)?,
    };

    let total_duration_ms = patterns.iter().map(VibratePattern::end_ms).max().unwrap_or(0);
    debug!(
        version = ?version,
        patterns = patterns.len(),
        total_duration_ms,
        "decoded HE resource"
    );
    Ok(VibratePackage::new(Dialect::He, patterns, total_duration_ms))
}

fn schema_version(raw: Option<&Value>) -> Result<HeVersion, Error> {
    let Some(raw) = raw else {
        return Err(he_version_error(None));
    };
    let accepted = raw
        .as_f64()
        .filter(|version| version.fract() == 0.0)
        .map(|version| version as i64)
        .filter(|version| HE_SUPPORTED_VERSIONS.contains(version));
    match accepted {
        Some(1) => Ok(HeVersion::SinglePattern),
        Some(2) => Ok(HeVersion::PatternList),
        _ => Err(he_version_error(Some(raw))),
    }
}

fn top_level_array<'a>(root: &'a Value, key: &str) -> Result<&'a [Value], Error> {
    root.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            Error::new(ErrorKind::UnsupportedFormat)
                .with_message(format!("HE resource has no `{key}` array"))
                .with_field(key)
        })
}

fn decode_pattern_list(entries: &[Value]) -> Result<Vec<VibratePattern>, Error> {
    if entries.is_empty() {
        return Err(Error::new(ErrorKind::OutOfRange)
            .with_message("PatternList must not be empty")
            .with_field("PatternList"));
    }
    let mut patterns: Vec<VibratePattern> = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let pattern = decode_entry(entry, patterns.last().map(VibratePattern::start_time_ms))
            .map_err(|err| err.within(&format!("PatternList[{position}]")))?;
        patterns.push(pattern);
    }
    Ok(patterns)
}

fn decode_entry(entry: &Value, previous_start: Option<i32>) -> Result<VibratePattern, Error> {
    let doc: PatternEntryDoc = deserialize_at(entry)?;
    let start_time_ms = bounded_i32(doc.absolute_time, &EVENT_TIME_RANGE, "AbsoluteTime")?;
    if let Some(previous) = previous_start {
        if start_time_ms <= previous {
            return Err(Error::new(ErrorKind::NonMonotonicTime)
                .with_message(format!(
                    "AbsoluteTime {start_time_ms} does not follow previous {previous}"
                ))
                .with_field("AbsoluteTime"));
        }
    }
    decode_pattern(&doc.pattern, start_time_ms).map_err(|err| err.within("Pattern"))
}

fn decode_pattern(items: &[Value], start_time_ms: i32) -> Result<VibratePattern, Error> {
    if items.len() > HE_MAX_EVENTS_PER_PATTERN {
        return Err(Error::new(ErrorKind::OutOfRange).with_message(format!(
            "pattern has {} events, at most {HE_MAX_EVENTS_PER_PATTERN} allowed",
            items.len()
        )));
    }
    let mut events: Vec<VibrateEvent> = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let event = deserialize_at::<PatternItemDoc<EventDoc>>(item)
            .and_then(|item| {
                decode_event(item.event, events.last().map(VibrateEvent::time_ms))
                    .map_err(|err| err.within("Event"))
            })
            .map_err(|err| err.within(&format!("[{position}]")))?;
        events.push(event);
    }
    Ok(VibratePattern::new(start_time_ms, events))
}

fn decode_event(doc: EventDoc, previous_time: Option<i32>) -> Result<VibrateEvent, Error> {
    let tag = parse_tag(&doc.kind)?;
    let time_ms = bounded_i32(doc.relative_time, &EVENT_TIME_RANGE, "RelativeTime")?;
    if let Some(previous) = previous_time {
        if time_ms < previous {
            return Err(Error::new(ErrorKind::NonMonotonicTime)
                .with_message(format!(
                    "RelativeTime {time_ms} precedes previous event at {previous}"
                ))
                .with_field("RelativeTime"));
        }
    }
    let index = match doc.index {
        Some(raw) => bounded_i32(raw, &INDEX_RANGE, "Index")?,
        None => 0,
    };
    let intensity = bounded_i32(
        doc.parameters.intensity,
        &INTENSITY_RANGE,
        "Parameters.Intensity",
    )?;
    let frequency = bounded_i32(
        doc.parameters.frequency,
        &Dialect::He.frequency_range(tag),
        "Parameters.Frequency",
    )?;
    match tag {
        EventTag::Transient => VibrateEvent::transient(time_ms, intensity, frequency, index),
        EventTag::Continuous => {
            let duration_ms = bounded_i32(
                require(doc.duration, "Duration")?,
                &CONTINUOUS_DURATION_RANGE,
                "Duration",
            )?;
            let points = match &doc.parameters.curve {
                Some(curve) => parse_curve(curve, duration_ms)?,
                None => Vec::new(),
            };
            VibrateEvent::continuous(time_ms, duration_ms, intensity, frequency, index, points)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::decode_he;
    use crate::core::dialect::Dialect;
    use crate::core::error::ErrorKind;
    use crate::core::model::EventTag;
    use serde_json::{Value, json};

    fn transient(time: i32, frequency: i32) -> Value {
        json!({ "Event": {
            "Type": "transient",
            "RelativeTime": time,
            "Parameters": { "Intensity": 70, "Frequency": frequency }
        }})
    }

    fn continuous(time: i32, duration: i32) -> Value {
        json!({ "Event": {
            "Type": "continuous",
            "RelativeTime": time,
            "Duration": duration,
            "Index": 2,
            "Parameters": {
                "Intensity": 60,
                "Frequency": 50,
                "Curve": [
                    { "Time": 0, "Intensity": 0.0, "Frequency": 0 },
                    { "Time": 50, "Intensity": 1.0, "Frequency": 10 },
                    { "Time": 100, "Intensity": 0.5, "Frequency": -10 },
                    { "Time": duration, "Intensity": 0.0, "Frequency": 0 }
                ]
            }
        }})
    }

    fn v1(pattern: Vec<Value>) -> Value {
        json!({ "Metadata": { "Version": 1 }, "Pattern": pattern })
    }

    fn v2(entries: Vec<(i32, Vec<Value>)>) -> Value {
        let list: Vec<Value> = entries
            .into_iter()
            .map(|(at, pattern)| json!({ "AbsoluteTime": at, "Pattern": pattern }))
            .collect();
        json!({ "Metadata": { "Version": 2 }, "PatternList": list })
    }

    #[test]
    fn v1_is_a_single_pattern_at_zero() {
        let package = decode_he(&v1(vec![transient(0, -50), continuous(100, 400)])).expect("decode");
        assert_eq!(package.patterns().len(), 1);
        let pattern = &package.patterns()[0];
        assert_eq!(pattern.start_time_ms(), 0);
        assert_eq!(pattern.events()[0].tag(), EventTag::Transient);
        assert_eq!(pattern.events()[0].index(), 0);
        let curve = &pattern.events()[1];
        assert_eq!(curve.index(), 2);
        assert_eq!(curve.points().len(), 4);
        assert_eq!(curve.points()[1].intensity(), 100);
        assert_eq!(package.total_duration_ms(), 500);
    }

    #[test]
    fn v2_patterns_keep_absolute_times() {
        let root = v2(vec![
            (0, vec![transient(0, 10)]),
            (1000, vec![transient(0, 10), transient(100, 10)]),
        ]);
        let package = decode_he(&root).expect("decode");
        let starts: Vec<i32> = package.patterns().iter().map(|p| p.start_time_ms()).collect();
        assert_eq!(starts, vec![0, 1000]);
        assert_eq!(package.total_duration_ms(), 1148);
    }

    #[test]
    fn v2_rejects_non_increasing_absolute_time() {
        let root = v2(vec![(500, vec![transient(0, 10)]), (500, vec![transient(0, 10)])]);
        let err = decode_he(&root).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonMonotonicTime);
        assert_eq!(err.field(), Some("PatternList[1].AbsoluteTime"));
    }

    #[test]
    fn relative_time_must_not_decrease() {
        let err = decode_he(&v1(vec![transient(100, 10), transient(50, 10)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonMonotonicTime);
        assert_eq!(err.field(), Some("Pattern[1].Event.RelativeTime"));

        assert!(decode_he(&v1(vec![transient(100, 10), transient(100, 10)])).is_ok());
    }

    #[test]
    fn frequency_ranges_depend_on_tag() {
        assert!(decode_he(&v1(vec![transient(0, 150)])).is_ok());
        assert_eq!(
            decode_he(&v1(vec![transient(0, 151)])).unwrap_err().kind(),
            ErrorKind::OutOfRange
        );
        let mut low = continuous(0, 400);
        low["Event"]["Parameters"]["Frequency"] = json!(-1);
        assert_eq!(decode_he(&v1(vec![low])).unwrap_err().kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn optional_index_is_bounded() {
        for (index, accepted) in [(0, true), (2, true), (3, false), (-1, false)] {
            let mut event = transient(0, 10);
            event["Event"]["Index"] = json!(index);
            let result = decode_he(&v1(vec![event]));
            if accepted {
                let package = result.expect("decode");
                assert_eq!(package.patterns()[0].events()[0].index(), index);
            } else {
                let err = result.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::OutOfRange, "index {index}");
                assert_eq!(err.field(), Some("Pattern[0].Event.Index"));
            }
        }
        let package = decode_he(&v1(vec![transient(0, 10)])).expect("decode");
        assert_eq!(package.dialect(), Dialect::He);
    }

    #[test]
    fn version_and_shape_checks() {
        let mut root = v1(vec![transient(0, 0)]);
        root["Metadata"]["Version"] = json!(3);
        assert_eq!(decode_he(&root).unwrap_err().kind(), ErrorKind::UnsupportedVersion);

        let v2_without_list = json!({ "Metadata": { "Version": 2 }, "Pattern": [] });
        assert_eq!(
            decode_he(&v2_without_list).unwrap_err().kind(),
            ErrorKind::UnsupportedFormat
        );

        assert_eq!(
            decode_he(&json!({ "Pattern": [] })).unwrap_err().kind(),
            ErrorKind::UnsupportedFormat
        );
        assert_eq!(
            decode_he(&v2(Vec::new())).unwrap_err().kind(),
            ErrorKind::OutOfRange
        );
    }

    #[test]
    fn pattern_event_cap_is_sixteen() {
        let events = (0..17).map(|i| transient(i * 60, 0)).collect();
        assert_eq!(decode_he(&v1(events)).unwrap_err().kind(), ErrorKind::OutOfRange);
    }
}
