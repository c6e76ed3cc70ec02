//! Decoding of floats, names and vectors.
//!
//! <https://www.w3.org/TR/wasm-core-2/#binary-values>
use super::{DecodeError, Decoder};
use std::io::Read;

impl<R: Read> Decoder<R> {
    /// `f32`: four little-endian bytes reinterpreted bitwise as IEEE-754.
    pub(super) fn parse_f32(&mut self) -> Result<f32, DecodeError> {
        let mut bytes = [0u8; 4];
        for b in &mut bytes {
            *b = self.parse_byte()?;
        }
        Ok(f32::from_le_bytes(bytes))
    }

    /// `f64`: eight little-endian bytes reinterpreted bitwise as IEEE-754.
    pub(super) fn parse_f64(&mut self) -> Result<f64, DecodeError> {
        let mut bytes = [0u8; 8];
        for b in &mut bytes {
            *b = self.parse_byte()?;
        }
        Ok(f64::from_le_bytes(bytes))
    }

    /// A name is a `u32` length followed by that many bytes of UTF-8.
    ///
    /// The bytes are read straight into the target buffer rather than
    /// through [`Self::parse_vec`], and ill-formed UTF-8 is rejected.
    pub(super) fn parse_name(&mut self) -> Result<String, DecodeError> {
        let offset = self.offset;
        let len = self.parse_u32()?;
        let mut bytes = Vec::with_capacity(len as usize);
        for _ in 0..len {
            bytes.push(self.parse_byte()?);
        }
        String::from_utf8(bytes).map_err(|_| DecodeError::MalformedUtf8 { offset })
    }

    /// `vec<T>`: a `u32` count followed by that many elements.
    pub(super) fn parse_vec<T>(
        &mut self,
        mut element: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let n = self.parse_u32()?;
        let mut items = Vec::with_capacity(n as usize);
        for _ in 0..n {
            items.push(element(self)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DecodeError, Decoder};

    fn f32_from(bytes: &[u8]) -> f32 {
        Decoder::new(bytes).unwrap().parse_f32().unwrap()
    }

    fn f64_from(bytes: &[u8]) -> f64 {
        Decoder::new(bytes).unwrap().parse_f64().unwrap()
    }

    #[test]
    fn f32_is_bit_for_bit() {
        assert_eq!(f32_from(&[0x00, 0x48, 0x2A, 0x44]), 681.125f32);
        assert_eq!(f32_from(&[0x00, 0x00, 0x00, 0x00]).to_bits(), 0.0f32.to_bits());
        assert_eq!(
            f32_from(&[0x00, 0x00, 0x00, 0x80]).to_bits(),
            (-0.0f32).to_bits()
        );
        assert_eq!(f32_from(&[0x00, 0x00, 0x80, 0x7F]), f32::INFINITY);
        assert_eq!(f32_from(&[0x00, 0x00, 0x80, 0xFF]), f32::NEG_INFINITY);
    }

    #[test]
    fn f64_is_bit_for_bit() {
        assert_eq!(
            f64_from(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x49, 0x85, 0x40]),
            681.125
        );
        assert_eq!(
            f64_from(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80]).to_bits(),
            (-0.0f64).to_bits()
        );
        assert_eq!(
            f64_from(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x7F]),
            f64::INFINITY
        );
        assert_eq!(
            f64_from(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0xFF]),
            f64::NEG_INFINITY
        );
        assert_eq!(
            f64_from(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xE9, 0x3F]),
            0.781250
        );
        assert_eq!(
            f64_from(&[0x00, 0x00, 0x00, 0xC0, 0x8B, 0xF5, 0x72, 0x41]),
            19880124.0
        );
    }

    #[test]
    fn truncated_float_fails_with_eof() {
        let err = Decoder::new([0x00u8, 0x48, 0x2A].as_slice())
            .unwrap()
            .parse_f32()
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { offset: 3 }));
    }

    #[test]
    fn name_reads_length_prefixed_utf8() {
        let bytes: &[u8] = &[0x03, b'h', b'i', b'!', 0xBA];
        let mut d = Decoder::new(bytes).unwrap();
        assert_eq!(d.parse_name().unwrap(), "hi!");
        assert_eq!(d.parse_byte().unwrap(), 0xBA);
    }

    #[test]
    fn truncated_name_fails_with_eof() {
        let err = Decoder::new([0x05u8, b'h', b'i'].as_slice())
            .unwrap()
            .parse_name()
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn ill_formed_utf8_name_is_rejected() {
        let err = Decoder::new([0x02u8, 0xC3, 0x28].as_slice())
            .unwrap()
            .parse_name()
            .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedUtf8 { offset: 0 }));
    }

    #[test]
    fn vec_parses_count_then_elements() {
        let bytes: &[u8] = &[0x03, 0x0A, 0x0B, 0x0C];
        let mut d = Decoder::new(bytes).unwrap();
        let items = d.parse_vec(|d| d.parse_byte()).unwrap();
        assert_eq!(items, vec![0x0A, 0x0B, 0x0C]);
    }

    #[test]
    fn vec_with_missing_elements_fails_with_eof() {
        let bytes: &[u8] = &[0x03, 0x0A];
        let mut d = Decoder::new(bytes).unwrap();
        let err = d.parse_vec(|d| d.parse_byte()).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }
}
