//! Purpose: Internal JSON parsing boundary shared by both dialect decoders.
//! Exports: `parse` module with decode and failure-category helpers.
//! Role: Single seam for parser details so decoders only see `serde_json::Value`.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
