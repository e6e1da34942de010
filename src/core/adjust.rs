//! Purpose: Apply a playback-time intensity scale and frequency shift to a decoded package.
//! Exports: `AdjustDelta`, `adjust`.
//! Role: Pure, total transform between decode and synthesis.
//! Invariants: The identity delta returns the package unchanged.
//! Invariants: Adjusted values are re-clamped into the bounds the package's own dialect
//! enforces per tag, so an adjusted package would still pass its decoder.

use tracing::debug;

use crate::core::dialect::Dialect;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    CURVE_FREQUENCY_RANGE, FREQUENCY_SHIFT_RANGE, INTENSITY_RANGE, INTENSITY_SCALE_RANGE,
};
use crate::core::model::{CurvePoint, VibrateEvent, VibratePackage};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AdjustDelta {
    intensity_scale: i32,
    frequency_shift: i32,
}

impl AdjustDelta {
    pub const IDENTITY: Self = Self {
        intensity_scale: 100,
        frequency_shift: 0,
    };

    pub fn new(intensity_scale: i32, frequency_shift: i32) -> Result<Self, Error> {
        if !INTENSITY_SCALE_RANGE.contains(&intensity_scale) {
            return Err(Error::new(ErrorKind::OutOfRange)
                .with_message(format!("intensity scale {intensity_scale} outside [0, 100]"))
                .with_field("intensity_scale"));
        }
        if !FREQUENCY_SHIFT_RANGE.contains(&frequency_shift) {
            return Err(Error::new(ErrorKind::OutOfRange)
                .with_message(format!("frequency shift {frequency_shift} outside [-100, 100]"))
                .with_field("frequency_shift"));
        }
        Ok(Self {
            intensity_scale,
            frequency_shift,
        })
    }

    pub fn intensity_scale(&self) -> i32 {
        self.intensity_scale
    }

    pub fn frequency_shift(&self) -> i32 {
        self.frequency_shift
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn scale_intensity(&self, intensity: i32) -> i32 {
        (intensity * self.intensity_scale / 100).clamp(*INTENSITY_RANGE.start(), *INTENSITY_RANGE.end())
    }
}

impl Default for AdjustDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub fn adjust(package: VibratePackage, delta: AdjustDelta) -> VibratePackage {
    if delta.is_identity() {
        return package;
    }
    debug!(
        intensity_scale = delta.intensity_scale,
        frequency_shift = delta.frequency_shift,
        events = package.event_count(),
        "adjusting package"
    );
    let dialect = package.dialect();
    package.map_patterns(|pattern| {
        pattern.map_events(|event| adjust_event(event, dialect, &delta))
    })
}

fn adjust_event(event: VibrateEvent, dialect: Dialect, delta: &AdjustDelta) -> VibrateEvent {
    let bounds = dialect.frequency_range(event.tag());
    let intensity = delta.scale_intensity(event.intensity());
    let frequency = (event.frequency() + delta.frequency_shift).clamp(*bounds.start(), *bounds.end());
    let points = event
        .points()
        .iter()
        .map(|point| adjust_point(*point, delta))
        .collect();
    event.with_levels(intensity, frequency, points)
}

fn adjust_point(point: CurvePoint, delta: &AdjustDelta) -> CurvePoint {
    let frequency = (point.frequency() + delta.frequency_shift)
        .clamp(*CURVE_FREQUENCY_RANGE.start(), *CURVE_FREQUENCY_RANGE.end());
    point.with_levels(delta.scale_intensity(point.intensity()), frequency)
}
