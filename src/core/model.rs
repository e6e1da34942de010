//! Purpose: Normalized in-memory vibration model shared by both decoders.
//! Exports: `EventTag`, `CurvePoint`, `VibrateEvent`, `VibratePattern`, `VibratePackage`,
//! `WaveformSegment`.
//! Role: Validating constructors are the only way to build events and points.
//! Invariants: Transient events last exactly 48 ms; continuous events last (0, 5000] ms.
//! Invariants: A non-empty curve has 4..=16 points with strictly increasing times in
//! `[0, duration_ms]`.
//! Invariants: Pattern events are ordered by `time_ms` ascending.

use std::ops::RangeInclusive;

use crate::core::dialect::Dialect;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    CONTINUOUS_DURATION_RANGE, CONTINUOUS_FREQUENCY_RANGE, CURVE_FREQUENCY_RANGE,
    CURVE_POINTS_RANGE, EVENT_TIME_RANGE, HE_TRANSIENT_FREQUENCY_RANGE, INDEX_RANGE,
    INTENSITY_RANGE, TRANSIENT_DURATION_MS,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EventTag {
    Continuous,
    Transient,
}

impl EventTag {
    pub fn as_str(self) -> &'static str {
        match self {
            EventTag::Continuous => "continuous",
            EventTag::Transient => "transient",
        }
    }

    /// Widest frequency range any dialect accepts for this tag.
    pub fn frequency_range(self) -> RangeInclusive<i32> {
        match self {
            EventTag::Continuous => CONTINUOUS_FREQUENCY_RANGE,
            EventTag::Transient => HE_TRANSIENT_FREQUENCY_RANGE,
        }
    }
}

/// One sample of an intensity/frequency envelope, timed relative to the owning event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CurvePoint {
    time_ms: i32,
    intensity: i32,
    frequency: i32,
}

impl CurvePoint {
    pub fn new(time_ms: i32, intensity: i32, frequency: i32) -> Result<Self, Error> {
        if time_ms < 0 {
            return Err(out_of_range("Time", time_ms, &(0..=i32::MAX)));
        }
        ensure_within("Intensity", intensity, &INTENSITY_RANGE)?;
        ensure_within("Frequency", frequency, &CURVE_FREQUENCY_RANGE)?;
        Ok(Self {
            time_ms,
            intensity,
            frequency,
        })
    }

    pub fn time_ms(&self) -> i32 {
        self.time_ms
    }

    pub fn intensity(&self) -> i32 {
        self.intensity
    }

    pub fn frequency(&self) -> i32 {
        self.frequency
    }

    pub(crate) fn with_levels(self, intensity: i32, frequency: i32) -> Self {
        Self {
            intensity,
            frequency,
            ..self
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VibrateEvent {
    tag: EventTag,
    time_ms: i32,
    duration_ms: i32,
    intensity: i32,
    frequency: i32,
    index: i32,
    points: Vec<CurvePoint>,
}

impl VibrateEvent {
    pub fn transient(time_ms: i32, intensity: i32, frequency: i32, index: i32) -> Result<Self, Error> {
        ensure_common(time_ms, intensity, index)?;
        ensure_within(
            "Parameters.Frequency",
            frequency,
            &EventTag::Transient.frequency_range(),
        )?;
        Ok(Self {
            tag: EventTag::Transient,
            time_ms,
            duration_ms: TRANSIENT_DURATION_MS,
            intensity,
            frequency,
            index,
            points: Vec::new(),
        })
    }

    /// Build a continuous event; `points` may arrive unordered and are sorted by time.
    pub fn continuous(
        time_ms: i32,
        duration_ms: i32,
        intensity: i32,
        frequency: i32,
        index: i32,
        mut points: Vec<CurvePoint>,
    ) -> Result<Self, Error> {
        ensure_common(time_ms, intensity, index)?;
        ensure_within("Duration", duration_ms, &CONTINUOUS_DURATION_RANGE)?;
        ensure_within(
            "Parameters.Frequency",
            frequency,
            &EventTag::Continuous.frequency_range(),
        )?;
        if !points.is_empty() {
            validate_curve(&mut points, duration_ms)?;
        }
        Ok(Self {
            tag: EventTag::Continuous,
            time_ms,
            duration_ms,
            intensity,
            frequency,
            index,
            points,
        })
    }

    pub fn tag(&self) -> EventTag {
        self.tag
    }

    pub fn time_ms(&self) -> i32 {
        self.time_ms
    }

    pub fn duration_ms(&self) -> i32 {
        self.duration_ms
    }

    pub fn intensity(&self) -> i32 {
        self.intensity
    }

    pub fn frequency(&self) -> i32 {
        self.frequency
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn end_ms(&self) -> i32 {
        self.time_ms + self.duration_ms
    }

    pub(crate) fn rebased(mut self, origin_ms: i32) -> Self {
        self.time_ms -= origin_ms;
        self
    }

    pub(crate) fn with_levels(
        self,
        intensity: i32,
        frequency: i32,
        points: Vec<CurvePoint>,
    ) -> Self {
        Self {
            intensity,
            frequency,
            points,
            ..self
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VibratePattern {
    start_time_ms: i32,
    duration_ms: i32,
    events: Vec<VibrateEvent>,
}

impl VibratePattern {
    /// `events` carry times relative to `start_time_ms` and must already be time-ordered.
    pub(crate) fn new(start_time_ms: i32, events: Vec<VibrateEvent>) -> Self {
        debug_assert!(events.windows(2).all(|w| w[0].time_ms <= w[1].time_ms));
        let duration_ms = events.iter().map(VibrateEvent::end_ms).max().unwrap_or(0);
        Self {
            start_time_ms,
            duration_ms,
            events,
        }
    }

    pub fn start_time_ms(&self) -> i32 {
        self.start_time_ms
    }

    pub fn duration_ms(&self) -> i32 {
        self.duration_ms
    }

    pub fn events(&self) -> &[VibrateEvent] {
        &self.events
    }

    pub fn end_ms(&self) -> i32 {
        self.start_time_ms + self.duration_ms
    }

    pub(crate) fn map_events(self, f: impl FnMut(VibrateEvent) -> VibrateEvent) -> Self {
        Self {
            events: self.events.into_iter().map(f).collect(),
            ..self
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VibratePackage {
    dialect: Dialect,
    patterns: Vec<VibratePattern>,
    total_duration_ms: i32,
}

impl VibratePackage {
    pub(crate) fn new(
        dialect: Dialect,
        patterns: Vec<VibratePattern>,
        total_duration_ms: i32,
    ) -> Self {
        Self {
            dialect,
            patterns,
            total_duration_ms,
        }
    }

    /// Dialect the package was decoded from.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn patterns(&self) -> &[VibratePattern] {
        &self.patterns
    }

    pub fn total_duration_ms(&self) -> i32 {
        self.total_duration_ms
    }

    pub fn event_count(&self) -> usize {
        self.patterns.iter().map(|pattern| pattern.events.len()).sum()
    }

    pub(crate) fn map_patterns(self, f: impl FnMut(VibratePattern) -> VibratePattern) -> Self {
        Self {
            patterns: self.patterns.into_iter().map(f).collect(),
            ..self
        }
    }
}

/// One `(duration, amplitude)` step of a device-ready playback sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaveformSegment {
    pub duration_ms: i64,
    pub amplitude: i32,
}

impl WaveformSegment {
    pub fn new(duration_ms: i64, amplitude: i32) -> Self {
        Self {
            duration_ms,
            amplitude,
        }
    }

    pub fn silence(duration_ms: i64) -> Self {
        Self::new(duration_ms, 0)
    }
}

/// Convert a raw JSON number into an `i32` inside `range`, truncating any fraction.
pub(crate) fn bounded_i32(value: f64, range: &RangeInclusive<i32>, field: &str) -> Result<i32, Error> {
    if !value.is_finite() || value < f64::from(*range.start()) || value > f64::from(*range.end())
    {
        return Err(Error::new(ErrorKind::OutOfRange)
            .with_message(format!(
                "value {value} outside [{}, {}]",
                range.start(),
                range.end()
            ))
            .with_field(field));
    }
    Ok(value as i32)
}

fn ensure_common(time_ms: i32, intensity: i32, index: i32) -> Result<(), Error> {
    ensure_within("Time", time_ms, &EVENT_TIME_RANGE)?;
    ensure_within("Parameters.Intensity", intensity, &INTENSITY_RANGE)?;
    ensure_within("Index", index, &INDEX_RANGE)
}

fn ensure_within(field: &str, value: i32, range: &RangeInclusive<i32>) -> Result<(), Error> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(field, value, range))
    }
}

fn out_of_range(field: &str, value: i32, range: &RangeInclusive<i32>) -> Error {
    Error::new(ErrorKind::OutOfRange)
        .with_message(format!(
            "value {value} outside [{}, {}]",
            range.start(),
            range.end()
        ))
        .with_field(field)
}

fn validate_curve(points: &mut [CurvePoint], duration_ms: i32) -> Result<(), Error> {
    if !CURVE_POINTS_RANGE.contains(&points.len()) {
        return Err(Error::new(ErrorKind::OutOfRange)
            .with_message(format!(
                "curve has {} points, expected {}..={}",
                points.len(),
                CURVE_POINTS_RANGE.start(),
                CURVE_POINTS_RANGE.end()
            ))
            .with_field("Parameters.Curve"));
    }
    for (position, point) in points.iter().enumerate() {
        if point.time_ms > duration_ms {
            return Err(Error::new(ErrorKind::OutOfRange)
                .with_message(format!(
                    "curve point time {} exceeds event duration {duration_ms}",
                    point.time_ms
                ))
                .with_field(format!("Parameters.Curve[{position}].Time")));
        }
    }
    points.sort_by_key(|point| point.time_ms);
    if let Some(pair) = points.windows(2).find(|w| w[0].time_ms >= w[1].time_ms) {
        return Err(Error::new(ErrorKind::NonMonotonicTime)
            .with_message(format!("duplicate curve point time {}", pair[1].time_ms))
            .with_field("Parameters.Curve"));
    }
    Ok(())
}
