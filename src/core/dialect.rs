//! Purpose: Identify which resource dialect a parsed JSON root uses and dispatch to its decoder.
//! Exports: `Dialect`, `detect_dialect`.
//! Role: Closed dispatch resolved once per resource; the chosen decoder performs its own
//! metadata checks and reports `UnsupportedFormat` when its keys are absent.
//! Invariants: A `"Channels"` key selects OH; anything else is handed to HE.
//! Invariants: A decoded package remembers its dialect so later stages reuse the same
//! per-tag frequency bounds.

use std::ops::RangeInclusive;

use serde_json::Value;
use tracing::debug;

use crate::core::error::Error;
use crate::core::format::{
    CONTINUOUS_FREQUENCY_RANGE, HE_TRANSIENT_FREQUENCY_RANGE, OH_TRANSIENT_FREQUENCY_RANGE,
};
use crate::core::he::decode_he;
use crate::core::model::{EventTag, VibratePackage};
use crate::core::oh::decode_oh;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Dialect {
    Oh,
    He,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Oh => "oh",
            Dialect::He => "he",
        }
    }

    pub fn detect(root: &Value) -> Self {
        let dialect = detect_dialect(root);
        debug!(dialect = dialect.as_str(), "selected decoder");
        dialect
    }

    pub fn decode(self, root: &Value) -> Result<VibratePackage, Error> {
        match self {
            Dialect::Oh => decode_oh(root),
            Dialect::He => decode_he(root),
        }
    }

    /// Event frequency bounds this dialect enforces for `tag`.
    pub fn frequency_range(self, tag: EventTag) -> RangeInclusive<i32> {
        match (self, tag) {
            (_, EventTag::Continuous) => CONTINUOUS_FREQUENCY_RANGE,
            (Dialect::Oh, EventTag::Transient) => OH_TRANSIENT_FREQUENCY_RANGE,
            (Dialect::He, EventTag::Transient) => HE_TRANSIENT_FREQUENCY_RANGE,
        }
    }
}

pub fn detect_dialect(root: &Value) -> Dialect {
    if root.get("Channels").is_some() {
        Dialect::Oh
    } else {
        Dialect::He
    }
}
