//! Purpose: Define the stable public Rust API boundary for hapticwave.
//! Exports: Decode entry points, the normalized model, adjustment, synthesis, diagnostics.
//! Role: Public, additive-only surface used by platform bindings.
//! Invariants: Bindings go through this module rather than reaching into `core`.

mod decode;
mod report;

pub use crate::core::adjust::{AdjustDelta, adjust};
pub use crate::core::dialect::{Dialect, detect_dialect};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::model::{
    CurvePoint, EventTag, VibrateEvent, VibratePackage, VibratePattern, WaveformSegment,
};
pub use crate::core::source::{ByteSource, DecodeOptions, SourceBytes, read_source};
pub use crate::core::synth::{
    SynthOptions, clamp_amp, coalesce, pulse_count, split_timings, synthesize, synthesize_package,
};
pub use decode::{decode, decode_source, decode_str, decode_with};
pub use report::{error_json, package_json};
