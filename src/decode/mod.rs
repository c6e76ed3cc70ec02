//! Decoding of WebAssembly modules in the binary format.
//!
//! The decoder is a position-tracking cursor over an [`io::Read`] stream,
//! holding one byte of lookahead. It consumes the stream strictly forward;
//! every failure is fatal to the decode and reports the byte offset it
//! occurred at.
mod indices;
mod instructions;
mod integer;
mod module;
mod types;
mod values;

use crate::Module;
use std::io::{self, Read};
use thiserror::Error;

/// The error produced when decoding a WebAssembly binary fails.
///
/// Offsets count bytes from the start of the input stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input ended in the middle of a construct.
    #[error("unexpected end of file at offset {offset}")]
    UnexpectedEof { offset: u64 },

    #[error("expected byte {expected:#04x} at offset {offset}, found {actual:#04x} instead")]
    ExpectedByte { expected: u8, actual: u8, offset: u64 },

    /// Overlong encoding, or a value out of range for the target width.
    #[error("invalid encoding of {}{width} at offset {offset}", sign_prefix(.signed))]
    InvalidLeb128 { width: u32, signed: bool, offset: u64 },

    /// A name whose bytes are not well-formed UTF-8.
    #[error("malformed UTF-8 in name at offset {offset}")]
    MalformedUtf8 { offset: u64 },

    /// An unrecognized discriminator byte for a tagged construct
    /// (value types, limits, mutability, descriptors, segments, ...).
    #[error("unrecognized {what} {tag:#04x} at offset {offset}")]
    UnknownTag {
        what: &'static str,
        tag: u32,
        offset: u64,
    },

    #[error("unrecognized instruction opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: u64 },

    #[error("unrecognized secondary opcode {opcode} after {prefix:#04x} prefix at offset {offset}")]
    UnknownPrefixedOpcode { prefix: u8, opcode: u32, offset: u64 },

    /// A section whose declared size does not match the bytes its contents
    /// actually take.
    #[error("section id {id} declared {declared} bytes but its contents take {actual}")]
    SectionSizeMismatch { id: u8, declared: u32, actual: u64 },

    /// Bytes remaining after the last section.
    #[error("expected end of file at offset {offset}, but the data continues")]
    TrailingBytes { offset: u64 },

    #[error("I/O error at offset {offset}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },
}

fn sign_prefix(signed: &bool) -> char {
    if *signed { 's' } else { 'u' }
}

/// The bound of the section currently being decoded. Reads past the
/// declared end fail with [`DecodeError::SectionSizeMismatch`] instead of
/// consuming bytes that belong to the next section.
#[derive(Debug, Clone, Copy)]
struct SectionBound {
    id: u8,
    declared: u32,
    start: u64,
}

/// A position-tracking cursor over the input byte stream.
///
/// `lookahead` is the next unconsumed byte and is `None` exactly when the
/// stream is exhausted; `offset` is the position of that byte.
#[derive(Debug)]
pub(crate) struct Decoder<R> {
    reader: R,
    lookahead: Option<u8>,
    offset: u64,
    section: Option<SectionBound>,
}

impl<R: Read> Decoder<R> {
    pub(crate) fn new(reader: R) -> Result<Self, DecodeError> {
        let mut decoder = Decoder {
            reader,
            lookahead: None,
            offset: 0,
            section: None,
        };
        decoder.lookahead = decoder.fill()?;
        Ok(decoder)
    }

    fn fill(&mut self) -> Result<Option<u8>, DecodeError> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(DecodeError::Io {
                        offset: self.offset,
                        source: e,
                    });
                }
            }
        }
    }

    /// The next byte, without consuming it.
    fn peek(&self) -> Option<u8> {
        self.lookahead
    }

    fn at_eof(&self) -> bool {
        self.lookahead.is_none()
    }

    /// Consume and return the next byte.
    fn parse_byte(&mut self) -> Result<u8, DecodeError> {
        if let Some(bound) = self.section
            && self.offset >= bound.start + u64::from(bound.declared)
        {
            return Err(DecodeError::SectionSizeMismatch {
                id: bound.id,
                declared: bound.declared,
                actual: self.offset - bound.start + 1,
            });
        }
        let byte = self.lookahead.ok_or(DecodeError::UnexpectedEof {
            offset: self.offset,
        })?;
        self.lookahead = self.fill()?;
        self.offset += 1;
        Ok(byte)
    }

    /// Consume one byte, failing unless it is `expected`.
    fn match_byte(&mut self, expected: u8) -> Result<(), DecodeError> {
        let offset = self.offset;
        let actual = self.parse_byte()?;
        if actual != expected {
            return Err(DecodeError::ExpectedByte {
                expected,
                actual,
                offset,
            });
        }
        Ok(())
    }

    /// Consume one byte if it is `probe`; otherwise consume nothing.
    fn maybe_match_byte(&mut self, probe: u8) -> Result<bool, DecodeError> {
        if self.lookahead == Some(probe) {
            self.parse_byte()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn skip_bytes(&mut self, count: u64) -> Result<(), DecodeError> {
        for _ in 0..count {
            self.parse_byte()?;
        }
        Ok(())
    }
}

/// Decode `input` into a WebAssembly [`Module`].
pub fn decode_module(input: impl Read) -> Result<Module, DecodeError> {
    Decoder::new(input)?.parse_module()
}
