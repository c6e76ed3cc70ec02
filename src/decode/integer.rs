//! Decoding of LEB128-encoded integers.
//!
//! Payload travels in groups of seven bits, least significant first; the
//! high bit of each byte marks continuation. Encodings may be non-minimal,
//! but the trailing byte must not carry bits beyond the target width and a
//! continuation byte is rejected once fewer than eight bits of budget
//! remain.
//!
//! <https://www.w3.org/TR/wasm-core-2/#binary-int>
use super::{DecodeError, Decoder};
use std::io::Read;

impl<R: Read> Decoder<R> {
    pub(super) fn parse_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.parse_un(32)? as u32)
    }

    /// Unsigned LEB128 with a `width`-bit budget.
    fn parse_un(&mut self, width: u32) -> Result<u64, DecodeError> {
        let offset = self.offset;
        let mut result = 0u64;
        let mut remaining = width;
        let mut shift = 0u32;
        loop {
            let byte = self.parse_byte()?;
            result |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                // the trailing byte must fit in the bits still in the budget
                if remaining < 8 && u32::from(byte) >= (1 << remaining) {
                    return Err(DecodeError::InvalidLeb128 {
                        width,
                        signed: false,
                        offset,
                    });
                }
                return Ok(result);
            }
            if remaining <= 7 {
                // a continuation byte here would encode more than `width` bits
                return Err(DecodeError::InvalidLeb128 {
                    width,
                    signed: false,
                    offset,
                });
            }
            shift += 7;
            remaining -= 7;
        }
    }

    /// Type indices in block types are the only place a 33-bit signed
    /// integer appears; see the block-type decoder for why.
    pub(super) fn parse_s33(&mut self) -> Result<i64, DecodeError> {
        self.parse_sn(33)
    }

    pub(super) fn parse_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.parse_sn(32)? as i32)
    }

    pub(super) fn parse_i64(&mut self) -> Result<i64, DecodeError> {
        self.parse_sn(64)
    }

    /// Signed LEB128 with a `width`-bit budget. Bit 6 of the trailing byte
    /// is the sign; the unused high bits of the trailing byte must be all
    /// zero for positive values and all one for negative ones.
    fn parse_sn(&mut self, width: u32) -> Result<i64, DecodeError> {
        let offset = self.offset;
        let mut result = 0i64;
        let mut remaining = width;
        let mut shift = 0u32;
        loop {
            let byte = self.parse_byte()?;
            if byte & 0x80 == 0 {
                if byte & 0x40 == 0 {
                    // positive
                    if remaining < 8 && u32::from(byte) >= (1 << (remaining - 1)) {
                        return Err(DecodeError::InvalidLeb128 {
                            width,
                            signed: true,
                            offset,
                        });
                    }
                    result |= i64::from(byte & 0x3F) << shift;
                } else {
                    // negative: sign-extend by subtracting the continuation bit
                    if remaining < 8 && u32::from(byte) < (1 << 7) - (1 << (remaining - 1)) {
                        return Err(DecodeError::InvalidLeb128 {
                            width,
                            signed: true,
                            offset,
                        });
                    }
                    result |= (i64::from(byte) - 0x80) << shift;
                }
                return Ok(result);
            }
            if remaining <= 7 {
                return Err(DecodeError::InvalidLeb128 {
                    width,
                    signed: true,
                    offset,
                });
            }
            result |= i64::from(byte & 0x7F) << shift;
            shift += 7;
            remaining -= 7;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DecodeError, Decoder};

    fn un_from(width: u32, bytes: &[u8]) -> Result<u64, DecodeError> {
        Decoder::new(bytes).unwrap().parse_un(width)
    }

    fn sn_from(width: u32, bytes: &[u8]) -> Result<i64, DecodeError> {
        Decoder::new(bytes).unwrap().parse_sn(width)
    }

    fn encode_uleb(mut value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
                out.push(byte);
            } else {
                out.push(byte);
                break;
            }
        }
        out
    }

    fn encode_sleb(mut value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            let done = (value == 0 && (byte & 0x40) == 0) || (value == -1 && (byte & 0x40) != 0);
            if done {
                out.push(byte);
                break;
            } else {
                byte |= 0x80;
                out.push(byte);
            }
        }
        out
    }

    fn rejected(err: DecodeError, width: u32, signed: bool) -> bool {
        matches!(
            err,
            DecodeError::InvalidLeb128 {
                width: w,
                signed: s,
                offset: 0
            } if w == width && s == signed
        )
    }

    #[test]
    fn u8_decodes_in_range_values() {
        assert_eq!(un_from(8, &[0x00]).unwrap(), 0);
        assert_eq!(un_from(8, &[0x42]).unwrap(), 0x42);
        assert_eq!(un_from(8, &[0x03]).unwrap(), 0x03);
        assert_eq!(un_from(8, &[0x83, 0x00]).unwrap(), 0x03);
        assert_eq!(un_from(8, &[0xFF, 0x01]).unwrap(), 0xFF);
    }

    #[test]
    fn u8_rejects_out_of_range() {
        // payload bits beyond the width in the trailing byte
        assert!(rejected(un_from(8, &[0x83, 0x10]).unwrap_err(), 8, false));
        // continuation byte once fewer than eight bits remain
        assert!(rejected(
            un_from(8, &[0x80, 0x88, 0x00]).unwrap_err(),
            8,
            false
        ));
    }

    #[test]
    fn u16_decodes_in_range_values() {
        assert_eq!(un_from(16, &[0x83, 0x10]).unwrap(), 0x10 << 7 | 0x03);
        assert_eq!(un_from(16, &[0x80, 0x88, 0x00]).unwrap(), 0x08 << 7);
        assert_eq!(un_from(16, &[0xFF, 0xFF, 0x03]).unwrap(), 0xFFFF);
    }

    #[test]
    fn u16_rejects_out_of_range() {
        assert!(rejected(
            un_from(16, &[0x83, 0x80, 0x10]).unwrap_err(),
            16,
            false
        ));
        assert!(rejected(
            un_from(16, &[0x80, 0x80, 0x88, 0x00]).unwrap_err(),
            16,
            false
        ));
    }

    #[test]
    fn u32_round_trips_minimal_encodings() {
        for value in [0u64, 1, 127, 128, 0x1234_5678, u64::from(u32::MAX)] {
            assert_eq!(un_from(32, &encode_uleb(value)).unwrap(), value);
        }
    }

    #[test]
    fn u32_accepts_max_in_five_bytes() {
        assert_eq!(
            un_from(32, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]).unwrap(),
            0xFFFF_FFFF
        );
    }

    #[test]
    fn u32_rejects_payload_bits_past_the_width() {
        assert!(rejected(
            un_from(32, &[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]).unwrap_err(),
            32,
            false
        ));
    }

    #[test]
    fn u32_rejects_six_byte_encoding() {
        assert!(rejected(
            un_from(32, &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]).unwrap_err(),
            32,
            false
        ));
    }

    #[test]
    fn truncated_integer_fails_with_eof() {
        assert!(matches!(
            un_from(32, &[0x80]).unwrap_err(),
            DecodeError::UnexpectedEof { offset: 1 }
        ));
        assert!(matches!(
            un_from(32, &[0x80, 0x88]).unwrap_err(),
            DecodeError::UnexpectedEof { offset: 2 }
        ));
        assert!(matches!(
            sn_from(32, &[0xFE]).unwrap_err(),
            DecodeError::UnexpectedEof { offset: 1 }
        ));
    }

    #[test]
    fn s8_decodes_edge_values() {
        assert_eq!(sn_from(8, &[0x00]).unwrap(), 0);
        assert_eq!(sn_from(8, &[0x2E]).unwrap(), 0x2E);
        assert_eq!(sn_from(8, &[0x7F]).unwrap(), -1);
        assert_eq!(sn_from(8, &[0x7E]).unwrap(), -2);
        assert_eq!(sn_from(8, &[0xFE, 0x7F]).unwrap(), -2);
    }

    #[test]
    fn s8_rejects_out_of_range() {
        // positive with high bits set in the trailing byte
        assert!(rejected(sn_from(8, &[0x83, 0x3E]).unwrap_err(), 8, true));
        // negative with high bits not all ones
        assert!(rejected(sn_from(8, &[0xFF, 0x7B]).unwrap_err(), 8, true));
        // continuation bytes past the budget, both signs
        assert!(rejected(
            sn_from(8, &[0xFF, 0xFF, 0x3F]).unwrap_err(),
            8,
            true
        ));
        assert!(rejected(
            sn_from(8, &[0xFF, 0xFF, 0x7F]).unwrap_err(),
            8,
            true
        ));
    }

    #[test]
    fn s16_decodes_and_rejects_at_the_boundary() {
        assert_eq!(sn_from(16, &[0xFF, 0x3F]).unwrap(), 0x3F << 7 | 0x7F);
        assert!(rejected(
            sn_from(16, &[0xFF, 0xFF, 0x3F]).unwrap_err(),
            16,
            true
        ));
        assert!(rejected(
            sn_from(16, &[0xFF, 0xFF, 0x7B]).unwrap_err(),
            16,
            true
        ));
    }

    #[test]
    fn s33_covers_the_type_index_range() {
        assert_eq!(sn_from(33, &encode_sleb(0)).unwrap(), 0);
        assert_eq!(
            sn_from(33, &encode_sleb(i64::from(u32::MAX))).unwrap(),
            i64::from(u32::MAX)
        );
        assert_eq!(sn_from(33, &encode_sleb(-1)).unwrap(), -1);
        assert!(rejected(
            sn_from(33, &encode_sleb(i64::from(u32::MAX) + 1)).unwrap_err(),
            33,
            true
        ));
    }

    #[test]
    fn i32_round_trips_edge_values() {
        for value in [0i32, 1, -1, i32::MAX, i32::MIN] {
            let bytes = encode_sleb(i64::from(value));
            let mut d = Decoder::new(bytes.as_slice()).unwrap();
            assert_eq!(d.parse_i32().unwrap(), value);
        }
    }

    #[test]
    fn i32_rejects_out_of_range_values() {
        let too_large = encode_sleb(i64::from(i32::MAX) + 1);
        assert!(rejected(sn_from(32, &too_large).unwrap_err(), 32, true));
        let too_small = encode_sleb(i64::from(i32::MIN) - 1);
        assert!(rejected(sn_from(32, &too_small).unwrap_err(), 32, true));
    }

    #[test]
    fn i64_round_trips_edge_values() {
        for value in [0i64, 1, -1, i64::MAX, i64::MIN] {
            let bytes = encode_sleb(value);
            let mut d = Decoder::new(bytes.as_slice()).unwrap();
            assert_eq!(d.parse_i64().unwrap(), value);
        }
    }

    #[test]
    fn i64_accepts_full_length_boundary_encodings() {
        // i64::MIN: nine continuation bytes then 0x7F
        let mut bytes = vec![0x80u8; 9];
        bytes.push(0x7F);
        assert_eq!(sn_from(64, &bytes).unwrap(), i64::MIN);

        // i64::MAX: nine 0xFF bytes then 0x00
        let mut bytes = vec![0xFFu8; 9];
        bytes.push(0x00);
        assert_eq!(sn_from(64, &bytes).unwrap(), i64::MAX);
    }

    #[test]
    fn i64_rejects_bad_tenth_byte_padding() {
        // negative: the unused bits must be all ones
        let mut bytes = vec![0x80u8; 9];
        bytes.push(0x7E);
        assert!(rejected(sn_from(64, &bytes).unwrap_err(), 64, true));

        // positive: the unused bits must be all zeros
        let mut bytes = vec![0x80u8; 9];
        bytes.push(0x02);
        assert!(rejected(sn_from(64, &bytes).unwrap_err(), 64, true));
    }

    #[test]
    fn i64_rejects_ten_continuation_bytes() {
        assert!(rejected(sn_from(64, &[0x80; 10]).unwrap_err(), 64, true));
    }
}
