//! Purpose: Wire-level document shapes and field parsers shared by the OH and HE decoders.
//! Exports: `PatternItemDoc`, `EventParamsDoc`, `CurvePointDoc`, `deserialize_at`,
//! `parse_tag`, `parse_curve`, `require`.
//! Role: Typed serde documents carry raw `f64` numbers; range checks happen here and in
//! the model constructors, never inside serde.
//! Invariants: Errors carry a field path relative to the value being parsed; callers
//! prefix their own location with `Error::within`.

use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{CURVE_FREQUENCY_RANGE, CURVE_INTENSITY_SOURCE_MAX, CURVE_POINTS_RANGE};
use crate::core::model::{CurvePoint, EventTag, bounded_i32};

/// `{ "Event": { ... } }` wrapper used by every pattern array.
#[derive(Debug, Deserialize)]
pub(crate) struct PatternItemDoc<E> {
    #[serde(rename = "Event")]
    pub event: E,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventParamsDoc {
    #[serde(rename = "Intensity")]
    pub intensity: f64,
    #[serde(rename = "Frequency")]
    pub frequency: f64,
    #[serde(rename = "Curve", default)]
    pub curve: Option<Vec<CurvePointDoc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurvePointDoc {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "Intensity")]
    pub intensity: f64,
    #[serde(rename = "Frequency")]
    pub frequency: f64,
}

/// Deserialize a borrowed JSON value into a typed document; shape errors become `InvalidField`.
pub(crate) fn deserialize_at<'a, T: Deserialize<'a>>(value: &'a Value) -> Result<T, Error> {
    T::deserialize(value).map_err(|err| {
        Error::new(ErrorKind::InvalidField)
            .with_message(err.to_string())
            .with_source(err)
    })
}

pub(crate) fn require<T>(value: Option<T>, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| {
        Error::new(ErrorKind::InvalidField)
            .with_message(format!("missing field `{field}`"))
            .with_field(field)
    })
}

pub(crate) fn parse_tag(raw: &str) -> Result<EventTag, Error> {
    match raw {
        "continuous" => Ok(EventTag::Continuous),
        "transient" => Ok(EventTag::Transient),
        other => Err(Error::new(ErrorKind::UnknownEventType)
            .with_message(format!("unknown event type {other:?}"))
            .with_field("Type")
            .with_hint("Use \"continuous\" or \"transient\".")),
    }
}

/// Parse a continuous event's curve; intensity arrives as 0.0..=1.0 and is scaled to 0..=100.
pub(crate) fn parse_curve(points: &[CurvePointDoc], duration_ms: i32) -> Result<Vec<CurvePoint>, Error> {
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
    points
        .iter()
        .enumerate()
        .map(|(position, doc)| {
            parse_curve_point(doc, duration_ms)
                .map_err(|err| err.within(&format!("Parameters.Curve[{position}]")))
        })
        .collect()
}

fn parse_curve_point(doc: &CurvePointDoc, duration_ms: i32) -> Result<CurvePoint, Error> {
    let time_ms = bounded_i32(doc.time, &(0..=duration_ms), "Time")?;
    if !doc.intensity.is_finite() || !(0.0..=CURVE_INTENSITY_SOURCE_MAX).contains(&doc.intensity) {
        return Err(Error::new(ErrorKind::OutOfRange)
            .with_message(format!(
                "curve intensity {} outside [0.0, {CURVE_INTENSITY_SOURCE_MAX}]",
                doc.intensity
            ))
            .with_field("Intensity"));
    }
    let intensity = ((doc.intensity * 100.0).round() as i32).clamp(0, 100);
    let frequency = bounded_i32(doc.frequency, &CURVE_FREQUENCY_RANGE, "Frequency")?;
    CurvePoint::new(time_ms, intensity, frequency)
}
