//! Purpose: Haptic effect decoding and waveform synthesis library.
//! Exports: `api` (decode, adjust, synthesize, model types, errors).
//! Role: Pure pipeline called by platform glue with raw bytes; glue owns actuation.
//! Invariants: Every operation is a pure function of its inputs; no global state.
//! Invariants: `api` is the supported surface; `core` is exposed for tooling and tests.
pub mod api;
pub mod core;
mod json;
