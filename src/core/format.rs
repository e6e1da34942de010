//! Purpose: Centralize dialect versioning and the numeric limits both decoders enforce.
//! Exports: Version constants, range constants, `oh_version_error`, `he_version_error`.
//! Role: Shared policy so the OH and HE decoders and the adjuster agree on bounds.
//! Invariants: Version lists are additive; a new schema version is a new entry.
//! Invariants: Per-tag frequency bounds are the widest accepted by any dialect.

use std::ops::RangeInclusive;

use crate::core::error::{Error, ErrorKind};

pub const MAX_SOURCE_BYTES: usize = 64 * 1024;

pub const OH_FORMAT_VERSION: f64 = 1.0;
pub const HE_SUPPORTED_VERSIONS: &[i64] = &[1, 2];

pub const CHANNEL_NUMBER_RANGE: RangeInclusive<i32> = 1..=2;
pub const OH_MAX_EVENTS_PER_CHANNEL: usize = 128;
pub const HE_MAX_EVENTS_PER_PATTERN: usize = 16;
pub const PATTERN_EVENT_CAPACITY: usize = 16;

pub const EVENT_TIME_RANGE: RangeInclusive<i32> = 0..=1_800_000;
pub const TRANSIENT_DURATION_MS: i32 = 48;
pub const CONTINUOUS_DURATION_RANGE: RangeInclusive<i32> = 1..=5000;
pub const INTENSITY_RANGE: RangeInclusive<i32> = 0..=100;
pub const INDEX_RANGE: RangeInclusive<i32> = 0..=2;

pub const CONTINUOUS_FREQUENCY_RANGE: RangeInclusive<i32> = 0..=100;
pub const OH_TRANSIENT_FREQUENCY_RANGE: RangeInclusive<i32> = 0..=100;
pub const HE_TRANSIENT_FREQUENCY_RANGE: RangeInclusive<i32> = -50..=150;

pub const CURVE_POINTS_RANGE: RangeInclusive<usize> = 4..=16;
pub const CURVE_FREQUENCY_RANGE: RangeInclusive<i32> = -100..=100;
pub const CURVE_INTENSITY_SOURCE_MAX: f64 = 1.0;

pub const INTENSITY_SCALE_RANGE: RangeInclusive<i32> = 0..=100;
pub const FREQUENCY_SHIFT_RANGE: RangeInclusive<i32> = -100..=100;

pub fn oh_version_error(detected: Option<f64>) -> Error {
    let message = match detected {
        Some(version) => format!("unsupported OH schema version {version} (supported: 1.0)"),
        None => "OH schema version missing".to_string(),
    };
    Error::new(ErrorKind::UnsupportedVersion)
        .with_message(message)
        .with_field("MetaData.Version")
        .with_hint("Set MetaData.Version to 1.0.")
}

pub fn he_version_error(detected: Option<&serde_json::Value>) -> Error {
    let supported = HE_SUPPORTED_VERSIONS
        .iter()
        .map(|version| version.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let message = match detected {
        Some(version) => {
            format!("unsupported HE schema version {version} (supported: {supported})")
        }
        None => "HE schema version missing".to_string(),
    };
    Error::new(ErrorKind::UnsupportedVersion)
        .with_message(message)
        .with_field("Metadata.Version")
        .with_hint("Use Version 1 with `Pattern` or Version 2 with `PatternList`.")
}
