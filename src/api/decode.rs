//! Purpose: Wire source reading, JSON parsing, and dialect dispatch into one decode call.
//! Exports: `decode`, `decode_str`, `decode_with`, `decode_source`.
//! Role: The single entry point platform glue calls with a raw resource.
//! Invariants: Size limits are checked before parsing; a failure yields no package.

use tracing::debug;

use crate::core::dialect::Dialect;
use crate::core::error::{Error, ErrorKind};
use crate::core::model::VibratePackage;
use crate::core::source::{ByteSource, DecodeOptions, read_source};
use crate::json::parse;

pub fn decode(bytes: &[u8]) -> Result<VibratePackage, Error> {
    decode_source(ByteSource::Slice(bytes), &DecodeOptions::default())
}

pub fn decode_str(text: &str) -> Result<VibratePackage, Error> {
    decode_source(ByteSource::Str(text), &DecodeOptions::default())
}

pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<VibratePackage, Error> {
    decode_source(ByteSource::Slice(bytes), options)
}

pub fn decode_source(source: ByteSource<'_>, options: &DecodeOptions) -> Result<VibratePackage, Error> {
    let bytes = read_source(source, options)?;
    debug!(len = bytes.len(), "decoding effect resource");
    let root = parse::from_slice(&bytes).map_err(|err| {
        Error::new(ErrorKind::MalformedJson)
            .with_message("resource is not valid JSON")
            .with_hint(parse::hint_for_error(&err, "effect resource"))
            .with_source(err)
    })?;
    Dialect::detect(&root).decode(&root)
}
