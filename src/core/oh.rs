//! Purpose: Decode the multi-channel OH dialect into a normalized package.
//! Exports: `decode_oh`, `split_patterns`.
//! Role: Validates metadata and channels, merges channel events, then splits them into
//! capacity-bounded patterns with rebased times.
//! Invariants: Every emitted pattern holds at most `PATTERN_EVENT_CAPACITY` events.
//! Invariants: Pattern start + event offset reproduces the merged absolute timeline.
//! Notes: `total_duration_ms` sums per-channel event durations rather than measuring the
//! merged wall-clock span; overlapping channels are therefore counted twice.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::dialect::Dialect;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    CHANNEL_NUMBER_RANGE, CONTINUOUS_DURATION_RANGE, EVENT_TIME_RANGE, INTENSITY_RANGE,
    OH_FORMAT_VERSION, OH_MAX_EVENTS_PER_CHANNEL, PATTERN_EVENT_CAPACITY, oh_version_error,
};
use crate::core::model::{EventTag, VibrateEvent, VibratePackage, VibratePattern, bounded_i32};
use crate::core::wire::{
    EventParamsDoc, PatternItemDoc, deserialize_at, parse_curve, parse_tag, require,
};

#[derive(Debug, Deserialize)]
struct ChannelDoc {
    #[serde(rename = "Parameters")]
    parameters: ChannelParamsDoc,
    #[serde(rename = "Pattern")]
    pattern: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChannelParamsDoc {
    #[serde(rename = "Index")]
    index: f64,
}

#[derive(Debug, Deserialize)]
struct EventDoc {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "StartTime")]
    start_time: f64,
    #[serde(rename = "Duration", default)]
    duration: Option<f64>,
    #[serde(rename = "Parameters")]
    parameters: EventParamsDoc,
}

pub(crate) fn decode_oh(root: &Value) -> Result<VibratePackage, Error> {
    let meta = root
        .get("MetaData")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            Error::new(ErrorKind::UnsupportedFormat)
                .with_message("OH resource has no MetaData object")
                .with_field("MetaData")
        })?;
    let version = meta.get("Version").and_then(Value::as_f64);
    if version != Some(OH_FORMAT_VERSION) {
        return Err(oh_version_error(version));
    }

    let channel_number = channel_number(meta.get("ChannelNumber"))?;
    let channels = root
        .get("Channels")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::new(ErrorKind::UnsupportedFormat)
                .with_message("Channels must be an array")
                .with_field("Channels")
        })?;
    if channels.len() != channel_number as usize {
        return Err(Error::new(ErrorKind::MalformedChannel)
            .with_message(format!(
                "ChannelNumber is {channel_number} but {} channels are present",
                channels.len()
            ))
            .with_field("Channels"));
    }

    let mut merged = Vec::new();
    let mut total_duration_ms = 0i32;
    for (position, channel) in channels.iter().enumerate() {
        let events = decode_channel(channel, channel_number)
            .map_err(|err| err.within(&format!("Channels[{position}]")))?;
        total_duration_ms += events.iter().map(VibrateEvent::duration_ms).sum::<i32>();
        merged.extend(events);
    }
    merged.sort_by_key(VibrateEvent::time_ms);

    let event_count = merged.len();
    let patterns = split_patterns(merged);
    debug!(
        channels = channel_number,
        events = event_count,
        patterns = patterns.len(),
        total_duration_ms,
        "decoded OH resource"
    );
    Ok(VibratePackage::new(Dialect::Oh, patterns, total_duration_ms))
}

fn channel_number(raw: Option<&Value>) -> Result<i32, Error> {
    let raw = raw.and_then(Value::as_f64).ok_or_else(|| {
        Error::new(ErrorKind::MalformedChannel)
            .with_message("ChannelNumber missing or not a number")
            .with_field("MetaData.ChannelNumber")
    })?;
    if raw.fract() != 0.0 {
        return Err(Error::new(ErrorKind::MalformedChannel)
            .with_message(format!("ChannelNumber {raw} is not an integer"))
            .with_field("MetaData.ChannelNumber"));
    }
    bounded_i32(raw, &CHANNEL_NUMBER_RANGE, "MetaData.ChannelNumber").map_err(|err| {
        Error::new(ErrorKind::MalformedChannel)
            .with_message(err.message().unwrap_or("ChannelNumber out of range").to_string())
            .with_field("MetaData.ChannelNumber")
    })
}

fn decode_channel(channel: &Value, channel_number: i32) -> Result<Vec<VibrateEvent>, Error> {
    let doc: ChannelDoc = deserialize_at(channel)?;
    let index = doc.parameters.index;
    if !index.is_finite() || index.fract() != 0.0 || index < 0.0 || index >= f64::from(channel_number)
    {
        return Err(Error::new(ErrorKind::MalformedChannel)
            .with_message(format!(
                "channel index {index} outside [0, {channel_number})"
            ))
            .with_field("Parameters.Index"));
    }
    let index = index as i32;

    if doc.pattern.len() > OH_MAX_EVENTS_PER_CHANNEL {
        return Err(Error::new(ErrorKind::OutOfRange)
            .with_message(format!(
                "channel has {} events, at most {OH_MAX_EVENTS_PER_CHANNEL} allowed",
                doc.pattern.len()
            ))
            .with_field("Pattern"));
    }

    doc.pattern
        .iter()
        .enumerate()
        .map(|(position, item)| {
            deserialize_at::<PatternItemDoc<EventDoc>>(item)
                .and_then(|item| decode_event(item.event, index).map_err(|err| err.within("Event")))
                .map_err(|err| err.within(&format!("Pattern[{position}]")))
        })
        .collect()
}

fn decode_event(doc: EventDoc, index: i32) -> Result<VibrateEvent, Error> {
    let tag = parse_tag(&doc.kind)?;
    let start_ms = bounded_i32(doc.start_time, &EVENT_TIME_RANGE, "StartTime")?;
    let intensity = bounded_i32(
        doc.parameters.intensity,
        &INTENSITY_RANGE,
        "Parameters.Intensity",
    )?;
    let frequency = bounded_i32(
        doc.parameters.frequency,
        &Dialect::Oh.frequency_range(tag),
        "Parameters.Frequency",
    )?;
    match tag {
        EventTag::Transient => VibrateEvent::transient(start_ms, intensity, frequency, index),
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
            VibrateEvent::continuous(start_ms, duration_ms, intensity, frequency, index, points)
        }
    }
}

/// Split a time-sorted list of absolutely-timed events into patterns of at most
/// `PATTERN_EVENT_CAPACITY` events, each rebased to its first event's time.
pub(crate) fn split_patterns(events: Vec<VibrateEvent>) -> Vec<VibratePattern> {
    let mut patterns = Vec::with_capacity(events.len().div_ceil(PATTERN_EVENT_CAPACITY));
    let mut remaining = events.into_iter();
    loop {
        let chunk: Vec<VibrateEvent> = remaining.by_ref().take(PATTERN_EVENT_CAPACITY).collect();
        let Some(start_time_ms) = chunk.first().map(VibrateEvent::time_ms) else {
            break;
        };
        trace!(start_time_ms, events = chunk.len(), "closing sub-pattern");
        let rebased = chunk
            .into_iter()
            .map(|event| event.rebased(start_time_ms))
            .collect();
        patterns.push(VibratePattern::new(start_time_ms, rebased));
    }
    patterns
}
