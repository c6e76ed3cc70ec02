//! Decoding of WebAssembly types.
//!
//! <https://www.w3.org/TR/wasm-core-2/#binary-types>
use super::{DecodeError, Decoder};
use crate::core::types::{FuncType, Limits, ResultType, ValType};
use phf::phf_map;
use std::io::Read;

// Valid marker bytes for [ValType].
static VALTYPE_MARKERS: phf::Map<u8, ValType> = phf_map! {
    0x7Fu8 => ValType::I32,
    0x7Eu8 => ValType::I64,
    0x7Du8 => ValType::F32,
    0x7Cu8 => ValType::F64,
    0x7Bu8 => ValType::V128,
    0x70u8 => ValType::FuncRef,
    0x6Fu8 => ValType::ExternRef,
};

impl<R: Read> Decoder<R> {
    fn parse_numtype(&mut self) -> Result<ValType, DecodeError> {
        let offset = self.offset;
        match self.parse_byte()? {
            0x7F => Ok(ValType::I32),
            0x7E => Ok(ValType::I64),
            0x7D => Ok(ValType::F32),
            0x7C => Ok(ValType::F64),
            b => Err(DecodeError::UnknownTag {
                what: "numtype",
                tag: b.into(),
                offset,
            }),
        }
    }

    fn parse_vectype(&mut self) -> Result<ValType, DecodeError> {
        let offset = self.offset;
        match self.parse_byte()? {
            0x7B => Ok(ValType::V128),
            b => Err(DecodeError::UnknownTag {
                what: "vectype",
                tag: b.into(),
                offset,
            }),
        }
    }

    pub(super) fn parse_reftype(&mut self) -> Result<ValType, DecodeError> {
        let offset = self.offset;
        match self.parse_byte()? {
            0x70 => Ok(ValType::FuncRef),
            0x6F => Ok(ValType::ExternRef),
            b => Err(DecodeError::UnknownTag {
                what: "reftype",
                tag: b.into(),
                offset,
            }),
        }
    }

    /// Whether the lookahead byte starts a value type. Needed in the
    /// block-type context, where a value type must be told apart from a
    /// type index without consuming input.
    pub(super) fn can_parse_valtype(&self) -> bool {
        self.peek().is_some_and(|b| VALTYPE_MARKERS.contains_key(&b))
    }

    pub(super) fn parse_valtype(&mut self) -> Result<ValType, DecodeError> {
        match self.peek() {
            Some(0x7C..=0x7F) => self.parse_numtype(),
            Some(0x7B) => self.parse_vectype(),
            Some(0x6F | 0x70) => self.parse_reftype(),
            _ => {
                let offset = self.offset;
                let b = self.parse_byte()?;
                Err(DecodeError::UnknownTag {
                    what: "valtype",
                    tag: b.into(),
                    offset,
                })
            }
        }
    }

    pub(super) fn parse_resulttype(&mut self) -> Result<ResultType, DecodeError> {
        self.parse_vec(Self::parse_valtype)
    }

    /// `functype`: a 0x60 tag, the parameter types, the result types.
    pub(super) fn parse_functype(&mut self) -> Result<FuncType, DecodeError> {
        self.match_byte(0x60)?;
        let params = self.parse_resulttype()?;
        let results = self.parse_resulttype()?;
        Ok(FuncType { params, results })
    }

    /// The flag byte distinguishes {unshared, shared} x {min-only, min-max};
    /// the shared variants come from the threads extension.
    pub(super) fn parse_limits(&mut self) -> Result<Limits, DecodeError> {
        let offset = self.offset;
        let (has_max, shared) = match self.parse_byte()? {
            0x00 => (false, false),
            0x01 => (true, false),
            0x02 => (false, true),
            0x03 => (true, true),
            b => {
                return Err(DecodeError::UnknownTag {
                    what: "limits flag",
                    tag: b.into(),
                    offset,
                });
            }
        };
        let min = self.parse_u32()?;
        let max = if has_max {
            Some(self.parse_u32()?)
        } else {
            None
        };
        Ok(Limits { shared, min, max })
    }

    pub(super) fn parse_memtype(&mut self) -> Result<(), DecodeError> {
        self.parse_limits()?;
        Ok(())
    }

    pub(super) fn parse_tabletype(&mut self) -> Result<(), DecodeError> {
        self.parse_reftype()?;
        self.parse_limits()?;
        Ok(())
    }

    pub(super) fn parse_globaltype(&mut self) -> Result<(), DecodeError> {
        self.parse_valtype()?;
        self.parse_mut()
    }

    fn parse_mut(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        match self.parse_byte()? {
            0x00 | 0x01 => Ok(()), // const / var
            b => Err(DecodeError::UnknownTag {
                what: "mutability",
                tag: b.into(),
                offset,
            }),
        }
    }

    /// Tags from the exception-handling extension: a zero attribute byte
    /// and the index of a function type.
    pub(super) fn parse_tagtype(&mut self) -> Result<(), DecodeError> {
        self.match_byte(0x00)?;
        self.parse_typeidx()?;
        Ok(())
    }
}
