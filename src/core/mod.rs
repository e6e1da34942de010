// Core modules implementing the normalized model, both dialect decoders, and synthesis.
pub mod adjust;
pub mod dialect;
pub mod error;
pub mod format;
pub mod he;
pub mod model;
pub mod oh;
pub mod source;
pub mod synth;
pub(crate) mod wire;
