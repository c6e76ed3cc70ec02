//! Decoding of WebAssembly instructions.
//!
//! Instruction bodies are parsed to check well-formedness; no instruction
//! AST is retained. The accepted opcodes are the core set below plus the
//! saturating/bulk-memory family behind the 0xFC prefix and the atomic
//! memory family of the threads extension behind 0xFE. Anything else is an
//! error: an unknown opcode has unknown immediates, so the decoder cannot
//! resynchronize past it.
//!
//! <https://www.w3.org/TR/wasm-core-2/#binary-instr>
use super::{DecodeError, Decoder};
use phf::{phf_map, phf_set};
use std::io::Read;

// Control opcodes that shape the instruction tree.
const OPCODE_BLOCK: u8 = 0x02;
const OPCODE_LOOP: u8 = 0x03;
const OPCODE_IF: u8 = 0x04;
const OPCODE_ELSE: u8 = 0x05;
const OPCODE_TRY: u8 = 0x06;
const OPCODE_CATCH: u8 = 0x07;
const OPCODE_END: u8 = 0x0B;
const OPCODE_DELEGATE: u8 = 0x18;
const OPCODE_CATCH_ALL: u8 = 0x19;

// Prefixes of the multi-byte opcode families.
const OPCODE_EXT_PREFIX: u8 = 0xFC;
const OPCODE_ATOMIC_PREFIX: u8 = 0xFE;

/// The immediates that follow a plain (non-control, non-prefixed) opcode.
#[derive(Debug, Copy, Clone)]
enum Immediates {
    None,
    LabelIdx,
    /// `br_table`: a vector of label indices and a default label.
    LabelTable,
    FuncIdx,
    /// `call_indirect`: a type index and a table index.
    TypeThenTable,
    LocalIdx,
    GlobalIdx,
    TagIdx,
    Memarg,
    /// A mandatory zero memory-index byte.
    ZeroByte,
    ConstI32,
    ConstI64,
    ConstF32,
    ConstF64,
}

// Every recognized plain opcode and the immediates it takes.
static OPCODES: phf::Map<u8, Immediates> = phf_map! {
    // Control
    0x00u8 => Immediates::None,          // unreachable
    0x01u8 => Immediates::None,          // nop
    0x08u8 => Immediates::TagIdx,        // throw
    0x09u8 => Immediates::LabelIdx,      // rethrow
    0x0Cu8 => Immediates::LabelIdx,      // br
    0x0Du8 => Immediates::LabelIdx,      // br_if
    0x0Eu8 => Immediates::LabelTable,    // br_table
    0x0Fu8 => Immediates::None,          // return
    0x10u8 => Immediates::FuncIdx,       // call
    0x11u8 => Immediates::TypeThenTable, // call_indirect

    // Parametric
    0x1Au8 => Immediates::None,          // drop
    0x1Bu8 => Immediates::None,          // select

    // Variable
    0x20u8 => Immediates::LocalIdx,      // local.get
    0x21u8 => Immediates::LocalIdx,      // local.set
    0x22u8 => Immediates::LocalIdx,      // local.tee
    0x23u8 => Immediates::GlobalIdx,     // global.get
    0x24u8 => Immediates::GlobalIdx,     // global.set

    // Memory
    0x28u8 => Immediates::Memarg,        // i32.load
    0x29u8 => Immediates::Memarg,        // i64.load
    0x2Au8 => Immediates::Memarg,        // f32.load
    0x2Bu8 => Immediates::Memarg,        // f64.load
    0x2Cu8 => Immediates::Memarg,        // i32.load8_s
    0x2Du8 => Immediates::Memarg,        // i32.load8_u
    0x2Eu8 => Immediates::Memarg,        // i32.load16_s
    0x2Fu8 => Immediates::Memarg,        // i32.load16_u
    0x30u8 => Immediates::Memarg,        // i64.load8_s
    0x31u8 => Immediates::Memarg,        // i64.load8_u
    0x32u8 => Immediates::Memarg,        // i64.load16_s
    0x33u8 => Immediates::Memarg,        // i64.load16_u
    0x34u8 => Immediates::Memarg,        // i64.load32_s
    0x35u8 => Immediates::Memarg,        // i64.load32_u
    0x36u8 => Immediates::Memarg,        // i32.store
    0x37u8 => Immediates::Memarg,        // i64.store
    0x38u8 => Immediates::Memarg,        // f32.store
    0x39u8 => Immediates::Memarg,        // f64.store
    0x3Au8 => Immediates::Memarg,        // i32.store8
    0x3Bu8 => Immediates::Memarg,        // i32.store16
    0x3Cu8 => Immediates::Memarg,        // i64.store8
    0x3Du8 => Immediates::Memarg,        // i64.store16
    0x3Eu8 => Immediates::Memarg,        // i64.store32
    0x3Fu8 => Immediates::ZeroByte,      // memory.size

    // Numeric constants
    0x41u8 => Immediates::ConstI32,      // i32.const
    0x42u8 => Immediates::ConstI64,      // i64.const
    0x43u8 => Immediates::ConstF32,      // f32.const
    0x44u8 => Immediates::ConstF64,      // f64.const

    // i32 comparisons
    0x45u8 => Immediates::None,          // i32.eqz
    0x46u8 => Immediates::None,          // i32.eq
    0x47u8 => Immediates::None,          // i32.ne
    0x48u8 => Immediates::None,          // i32.lt_s
    0x49u8 => Immediates::None,          // i32.lt_u
    0x4Au8 => Immediates::None,          // i32.gt_s
    0x4Bu8 => Immediates::None,          // i32.gt_u
    0x4Cu8 => Immediates::None,          // i32.le_s
    0x4Du8 => Immediates::None,          // i32.le_u
    0x4Eu8 => Immediates::None,          // i32.ge_s
    0x4Fu8 => Immediates::None,          // i32.ge_u

    // i64 comparisons
    0x50u8 => Immediates::None,          // i64.eqz
    0x51u8 => Immediates::None,          // i64.eq
    0x52u8 => Immediates::None,          // i64.ne
    0x53u8 => Immediates::None,          // i64.lt_s
    0x54u8 => Immediates::None,          // i64.lt_u
    0x55u8 => Immediates::None,          // i64.gt_s
    0x56u8 => Immediates::None,          // i64.gt_u
    0x57u8 => Immediates::None,          // i64.le_s
    0x58u8 => Immediates::None,          // i64.le_u
    0x59u8 => Immediates::None,          // i64.ge_s
    0x5Au8 => Immediates::None,          // i64.ge_u

    // f64 comparisons
    0x61u8 => Immediates::None,          // f64.eq
    0x62u8 => Immediates::None,          // f64.ne
    0x63u8 => Immediates::None,          // f64.lt
    0x64u8 => Immediates::None,          // f64.gt
    0x65u8 => Immediates::None,          // f64.le
    0x66u8 => Immediates::None,          // f64.ge

    // i32 arithmetic
    0x67u8 => Immediates::None,          // i32.clz
    0x68u8 => Immediates::None,          // i32.ctz
    0x6Au8 => Immediates::None,          // i32.add
    0x6Bu8 => Immediates::None,          // i32.sub
    0x6Cu8 => Immediates::None,          // i32.mul
    0x6Du8 => Immediates::None,          // i32.div_s
    0x6Eu8 => Immediates::None,          // i32.div_u
    0x6Fu8 => Immediates::None,          // i32.rem_s
    0x70u8 => Immediates::None,          // i32.rem_u
    0x71u8 => Immediates::None,          // i32.and
    0x72u8 => Immediates::None,          // i32.or
    0x73u8 => Immediates::None,          // i32.xor
    0x74u8 => Immediates::None,          // i32.shl
    0x75u8 => Immediates::None,          // i32.shr_s
    0x76u8 => Immediates::None,          // i32.shr_u
    0x77u8 => Immediates::None,          // i32.rotl

    // i64 arithmetic
    0x79u8 => Immediates::None,          // i64.clz
    0x7Au8 => Immediates::None,          // i64.ctz
    0x7Cu8 => Immediates::None,          // i64.add
    0x7Du8 => Immediates::None,          // i64.sub
    0x7Eu8 => Immediates::None,          // i64.mul
    0x7Fu8 => Immediates::None,          // i64.div_s
    0x80u8 => Immediates::None,          // i64.div_u
    0x81u8 => Immediates::None,          // i64.rem_s
    0x82u8 => Immediates::None,          // i64.rem_u
    0x83u8 => Immediates::None,          // i64.and
    0x84u8 => Immediates::None,          // i64.or
    0x85u8 => Immediates::None,          // i64.xor
    0x86u8 => Immediates::None,          // i64.shl
    0x87u8 => Immediates::None,          // i64.shr_s
    0x88u8 => Immediates::None,          // i64.shr_u

    // f32 arithmetic
    0x94u8 => Immediates::None,          // f32.mul

    // f64 arithmetic
    0x99u8 => Immediates::None,          // f64.abs
    0x9Au8 => Immediates::None,          // f64.neg
    0x9Bu8 => Immediates::None,          // f64.ceil
    0x9Cu8 => Immediates::None,          // f64.floor
    0x9Fu8 => Immediates::None,          // f64.sqrt
    0xA0u8 => Immediates::None,          // f64.add
    0xA1u8 => Immediates::None,          // f64.sub
    0xA2u8 => Immediates::None,          // f64.mul
    0xA3u8 => Immediates::None,          // f64.div

    // Conversions
    0xA7u8 => Immediates::None,          // i32.wrap_i64
    0xAAu8 => Immediates::None,          // i32.trunc_f64_s
    0xABu8 => Immediates::None,          // i32.trunc_f64_u
    0xACu8 => Immediates::None,          // i64.extend_i32_s
    0xADu8 => Immediates::None,          // i64.extend_i32_u
    0xB0u8 => Immediates::None,          // i64.trunc_f64_s
    0xB1u8 => Immediates::None,          // i64.trunc_f64_u
    0xB2u8 => Immediates::None,          // f32.convert_i32_s
    0xB6u8 => Immediates::None,          // f32.demote_f64
    0xB7u8 => Immediates::None,          // f64.convert_i32_s
    0xB8u8 => Immediates::None,          // f64.convert_i32_u
    0xB9u8 => Immediates::None,          // f64.convert_i64_s
    0xBAu8 => Immediates::None,          // f64.convert_i64_u
    0xBBu8 => Immediates::None,          // f64.promote_f32
    0xBCu8 => Immediates::None,          // i32.reinterpret_f32
    0xBDu8 => Immediates::None,          // i64.reinterpret_f64
    0xBEu8 => Immediates::None,          // f32.reinterpret_i32
    0xBFu8 => Immediates::None,          // f64.reinterpret_i64

    // Sign extensions
    0xC0u8 => Immediates::None,          // i32.extend8_s
    0xC1u8 => Immediates::None,          // i32.extend16_s
    0xC2u8 => Immediates::None,          // i64.extend8_s
    0xC3u8 => Immediates::None,          // i64.extend16_s
};

// Secondary opcodes of the atomic memory instructions (threads extension),
// behind the 0xFE prefix. Every one of them takes a memarg.
static ATOMIC_OPCODES: phf::Set<u32> = phf_set! {
    0x00u32, // memory.atomic.notify
    0x01u32, // memory.atomic.wait32
    0x10u32, // i32.atomic.load
    0x11u32, // i64.atomic.load
    0x12u32, // i32.atomic.load8_u
    0x17u32, // i32.atomic.store
    0x18u32, // i64.atomic.store
    0x19u32, // i32.atomic.store8
    0x1Eu32, // i32.atomic.rmw.add
    0x25u32, // i32.atomic.rmw.sub
    0x33u32, // i32.atomic.rmw.or
    0x41u32, // i32.atomic.rmw.xchg
    0x43u32, // i32.atomic.rmw8.xchg_u
    0x48u32, // i32.atomic.rmw.cmpxchg
    0x4Au32, // i32.atomic.rmw8.cmpxchg_u
};

impl<R: Read> Decoder<R> {
    /// Parse one instruction, including the nested bodies of structured
    /// control instructions.
    fn parse_instr(&mut self) -> Result<(), DecodeError> {
        let opcode_offset = self.offset;
        let opcode = self.parse_byte()?;
        match opcode {
            OPCODE_BLOCK | OPCODE_LOOP => {
                self.parse_blocktype()?;
                while self.peek() != Some(OPCODE_END) {
                    self.parse_instr()?;
                }
                self.match_byte(OPCODE_END)?;
            }
            OPCODE_IF => {
                self.parse_blocktype()?;
                while !matches!(self.peek(), Some(OPCODE_ELSE | OPCODE_END)) {
                    self.parse_instr()?;
                }
                if self.maybe_match_byte(OPCODE_ELSE)? {
                    while self.peek() != Some(OPCODE_END) {
                        self.parse_instr()?;
                    }
                }
                self.match_byte(OPCODE_END)?;
            }
            OPCODE_TRY => self.parse_try_body()?,
            OPCODE_EXT_PREFIX => {
                let opcode2_offset = self.offset;
                match self.parse_u32()? {
                    8 => {
                        // memory.init
                        self.parse_dataidx()?;
                        self.match_byte(0x00)?;
                    }
                    9 => {
                        // data.drop
                        self.parse_dataidx()?;
                    }
                    10 => {
                        // memory.copy
                        self.match_byte(0x00)?;
                        self.match_byte(0x00)?;
                    }
                    11 => {
                        // memory.fill
                        self.match_byte(0x00)?;
                    }
                    n => {
                        return Err(DecodeError::UnknownPrefixedOpcode {
                            prefix: OPCODE_EXT_PREFIX,
                            opcode: n,
                            offset: opcode2_offset,
                        });
                    }
                }
            }
            OPCODE_ATOMIC_PREFIX => {
                let opcode2_offset = self.offset;
                let opcode2 = self.parse_u32()?;
                if !ATOMIC_OPCODES.contains(&opcode2) {
                    return Err(DecodeError::UnknownPrefixedOpcode {
                        prefix: OPCODE_ATOMIC_PREFIX,
                        opcode: opcode2,
                        offset: opcode2_offset,
                    });
                }
                self.parse_memarg()?;
            }
            _ => match OPCODES.get(&opcode).copied() {
                Some(Immediates::None) => {}
                Some(Immediates::LabelIdx) => {
                    self.parse_labelidx()?;
                }
                Some(Immediates::LabelTable) => {
                    self.parse_vec(Self::parse_labelidx)?;
                    self.parse_labelidx()?;
                }
                Some(Immediates::FuncIdx) => {
                    self.parse_funcidx()?;
                }
                Some(Immediates::TypeThenTable) => {
                    self.parse_typeidx()?;
                    self.parse_tableidx()?;
                }
                Some(Immediates::LocalIdx) => {
                    self.parse_localidx()?;
                }
                Some(Immediates::GlobalIdx) => {
                    self.parse_globalidx()?;
                }
                Some(Immediates::TagIdx) => {
                    self.parse_tagidx()?;
                }
                Some(Immediates::Memarg) => {
                    self.parse_memarg()?;
                }
                Some(Immediates::ZeroByte) => {
                    self.match_byte(0x00)?;
                }
                Some(Immediates::ConstI32) => {
                    self.parse_i32()?;
                }
                Some(Immediates::ConstI64) => {
                    self.parse_i64()?;
                }
                Some(Immediates::ConstF32) => {
                    self.parse_f32()?;
                }
                Some(Immediates::ConstF64) => {
                    self.parse_f64()?;
                }
                None => {
                    return Err(DecodeError::UnknownOpcode {
                        opcode,
                        offset: opcode_offset,
                    });
                }
            },
        }
        Ok(())
    }

    /// try-catch and try-delegate from the exception-handling extension.
    /// The body runs to the first catch/catch_all/delegate/end; `delegate`
    /// then takes a label index and the construct is over, otherwise catch
    /// clauses follow and `end` closes the construct.
    fn parse_try_body(&mut self) -> Result<(), DecodeError> {
        self.parse_blocktype()?;
        while !matches!(
            self.peek(),
            Some(OPCODE_CATCH | OPCODE_CATCH_ALL | OPCODE_DELEGATE | OPCODE_END)
        ) {
            self.parse_instr()?;
        }
        if self.maybe_match_byte(OPCODE_DELEGATE)? {
            self.parse_labelidx()?;
            return Ok(());
        }
        while self.maybe_match_byte(OPCODE_CATCH)? {
            self.parse_tagidx()?;
            while !matches!(
                self.peek(),
                Some(OPCODE_CATCH | OPCODE_CATCH_ALL | OPCODE_END)
            ) {
                self.parse_instr()?;
            }
        }
        while self.maybe_match_byte(OPCODE_CATCH_ALL)? {
            while !matches!(self.peek(), Some(OPCODE_CATCH_ALL | OPCODE_END)) {
                self.parse_instr()?;
            }
        }
        self.match_byte(OPCODE_END)
    }

    /// Block types: 0x40 for no result, a single value type, or an `s33`
    /// type index. The index is encoded as a non-negative signed integer so
    /// that its bit pattern cannot collide with the value-type markers or
    /// 0x40, which correspond to negative values.
    fn parse_blocktype(&mut self) -> Result<(), DecodeError> {
        if self.maybe_match_byte(0x40)? {
            return Ok(());
        }
        if self.can_parse_valtype() {
            self.parse_valtype()?;
        } else {
            self.parse_s33()?;
        }
        Ok(())
    }

    /// Memory immediate: alignment exponent and offset.
    fn parse_memarg(&mut self) -> Result<(), DecodeError> {
        self.parse_u32()?; // align
        self.parse_u32()?; // offset
        Ok(())
    }

    /// An expression is an instruction sequence terminated by `end`.
    pub(super) fn parse_expr(&mut self) -> Result<(), DecodeError> {
        while self.peek() != Some(OPCODE_END) {
            self.parse_instr()?;
        }
        self.match_byte(OPCODE_END)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DecodeError, Decoder};

    fn expr_from(bytes: &[u8]) -> Result<(), DecodeError> {
        let mut d = Decoder::new(bytes).unwrap();
        d.parse_expr()?;
        assert!(d.at_eof(), "expression did not consume all input");
        Ok(())
    }

    #[test]
    fn empty_expression_is_just_end() {
        expr_from(&[0x0B]).unwrap();
    }

    #[test]
    fn constants_carry_their_immediates() {
        // i32.const 42, i64.const -1, f32.const 0, f64.const 0, drop x4
        expr_from(&[
            0x41, 0x2A, //
            0x42, 0x7F, //
            0x43, 0x00, 0x00, 0x00, 0x00, //
            0x44, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x1A, 0x1A, 0x1A, 0x1A, //
            0x0B,
        ])
        .unwrap();
    }

    #[test]
    fn nested_blocks_consume_their_ends() {
        // block (void) { loop (i32) { nop } } end
        expr_from(&[0x02, 0x40, 0x03, 0x7F, 0x01, 0x0B, 0x0B, 0x0B]).unwrap();
    }

    #[test]
    fn block_type_may_be_a_type_index() {
        // block (type 3) { } end
        expr_from(&[0x02, 0x03, 0x0B, 0x0B]).unwrap();
    }

    #[test]
    fn if_with_and_without_else() {
        // if (void) nop end
        expr_from(&[0x04, 0x40, 0x01, 0x0B, 0x0B]).unwrap();
        // if (void) nop else unreachable end
        expr_from(&[0x04, 0x40, 0x01, 0x05, 0x00, 0x0B, 0x0B]).unwrap();
    }

    #[test]
    fn try_with_catch_clauses() {
        // try (void) nop catch 0 nop catch 1 catch_all unreachable end
        expr_from(&[
            0x06, 0x40, 0x01, 0x07, 0x00, 0x01, 0x07, 0x01, 0x19, 0x00, 0x0B, 0x0B,
        ])
        .unwrap();
    }

    #[test]
    fn try_with_initial_catch_all() {
        // try (void) nop catch_all nop end
        expr_from(&[0x06, 0x40, 0x01, 0x19, 0x01, 0x0B, 0x0B]).unwrap();
    }

    #[test]
    fn try_delegate_stops_after_label() {
        // try (void) nop delegate 0
        expr_from(&[0x06, 0x40, 0x01, 0x18, 0x00, 0x0B]).unwrap();
    }

    #[test]
    fn branch_table_reads_targets_and_default() {
        // block (void) br_table [0 0] 0 end
        expr_from(&[0x02, 0x40, 0x0E, 0x02, 0x00, 0x00, 0x00, 0x0B, 0x0B]).unwrap();
    }

    #[test]
    fn call_indirect_takes_type_and_table() {
        expr_from(&[0x11, 0x02, 0x00, 0x0B]).unwrap();
    }

    #[test]
    fn loads_and_stores_take_memargs() {
        // i32.load align=2 offset=16; i64.store32 align=0 offset=0
        expr_from(&[0x28, 0x02, 0x10, 0x3E, 0x00, 0x00, 0x0B]).unwrap();
    }

    #[test]
    fn memory_size_requires_zero_byte() {
        expr_from(&[0x3F, 0x00, 0x0B]).unwrap();
        assert!(matches!(
            expr_from(&[0x3F, 0x01, 0x0B]).unwrap_err(),
            DecodeError::ExpectedByte {
                expected: 0x00,
                actual: 0x01,
                offset: 1
            }
        ));
    }

    #[test]
    fn bulk_memory_family_takes_zero_indices() {
        // memory.init 2, memory.copy, memory.fill, data.drop 1
        expr_from(&[
            0xFC, 0x08, 0x02, 0x00, //
            0xFC, 0x0A, 0x00, 0x00, //
            0xFC, 0x0B, 0x00, //
            0xFC, 0x09, 0x01, //
            0x0B,
        ])
        .unwrap();
    }

    #[test]
    fn atomic_family_takes_memargs() {
        // memory.atomic.notify, i32.atomic.rmw.cmpxchg
        expr_from(&[0xFE, 0x00, 0x02, 0x00, 0xFE, 0x48, 0x02, 0x00, 0x0B]).unwrap();
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        assert!(matches!(
            expr_from(&[0xD0, 0x70, 0x0B]).unwrap_err(),
            DecodeError::UnknownOpcode {
                opcode: 0xD0,
                offset: 0
            }
        ));
    }

    #[test]
    fn unknown_secondary_opcodes_are_rejected() {
        assert!(matches!(
            expr_from(&[0xFC, 0x0C, 0x0B]).unwrap_err(),
            DecodeError::UnknownPrefixedOpcode {
                prefix: 0xFC,
                opcode: 12,
                offset: 1
            }
        ));
        assert!(matches!(
            expr_from(&[0xFE, 0x02, 0x00, 0x00, 0x0B]).unwrap_err(),
            DecodeError::UnknownPrefixedOpcode {
                prefix: 0xFE,
                opcode: 2,
                offset: 1
            }
        ));
    }

    #[test]
    fn truncated_body_fails_with_eof() {
        // block with no closing end
        assert!(matches!(
            expr_from(&[0x02, 0x40, 0x01]).unwrap_err(),
            DecodeError::UnexpectedEof { .. }
        ));
    }
}
