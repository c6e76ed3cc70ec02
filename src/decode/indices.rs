//! Decoding for WebAssembly indices.
//!
//! Indices are zero-based, positional, and encoded as `u32`; they are
//! validated for encoding only, never resolved.
//!
//! <https://www.w3.org/TR/wasm-core-2/#binary-index>
use super::{DecodeError, Decoder};
use std::io::Read;

macro_rules! define_index_parsers {
    ($($name:ident),* $(,)?) => {
        impl<R: Read> Decoder<R> {
            $(
                pub(super) fn $name(&mut self) -> Result<u32, DecodeError> {
                    self.parse_u32()
                }
            )*
        }
    };
}

define_index_parsers!(
    parse_typeidx,
    parse_funcidx,
    parse_tableidx,
    parse_memidx,
    parse_tagidx,
    parse_globalidx,
    parse_dataidx,
    parse_localidx,
    parse_labelidx,
);
