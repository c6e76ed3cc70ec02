//! Section framing and module decoding.
//!
//! <https://www.w3.org/TR/wasm-core-2/#binary-module>
use super::{DecodeError, Decoder, SectionBound};
use crate::core::types::FuncType;
use crate::core::{Import, ImportDesc, Module};
use log::{debug, warn};
use std::io::Read;

const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

// Section ids, in the order sections may appear.
const SECTION_CUSTOM: u8 = 0;
const SECTION_TYPE: u8 = 1;
const SECTION_IMPORT: u8 = 2;
const SECTION_FUNCTION: u8 = 3;
const SECTION_TABLE: u8 = 4;
const SECTION_MEMORY: u8 = 5;
const SECTION_GLOBAL: u8 = 6;
const SECTION_EXPORT: u8 = 7;
const SECTION_START: u8 = 8;
const SECTION_ELEMENT: u8 = 9;
const SECTION_CODE: u8 = 10;
const SECTION_DATA: u8 = 11;
const SECTION_DATA_COUNT: u8 = 12;
// From the exception-handling extension.
const SECTION_TAG: u8 = 13;

// Name subsection ids, per the extended name section draft.
const NAME_SUBSECTION_MODULE: u8 = 0;
const NAME_SUBSECTION_FUNCTIONS: u8 = 1;
const NAME_SUBSECTION_LOCALS: u8 = 2;
const NAME_SUBSECTION_GLOBALS: u8 = 7;
const NAME_SUBSECTION_DATA_SEGMENTS: u8 = 9;

impl<R: Read> Decoder<R> {
    fn parse_magic(&mut self) -> Result<(), DecodeError> {
        for byte in MAGIC {
            self.match_byte(byte)?;
        }
        Ok(())
    }

    fn parse_version(&mut self) -> Result<(), DecodeError> {
        for byte in VERSION {
            self.match_byte(byte)?;
        }
        Ok(())
    }

    /// Section framing: the id byte, a declared `u32` size, then the
    /// contents. The contents are bounded while they run, so a malformed
    /// section fails instead of consuming bytes of the one that follows,
    /// and the declared size must match the bytes actually consumed.
    fn parse_section<T>(
        &mut self,
        id: u8,
        body: impl FnOnce(&mut Self, u32) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.match_byte(id)?;
        let declared = self.parse_u32()?;
        let start = self.offset;
        let outer = self.section.replace(SectionBound {
            id,
            declared,
            start,
        });
        let result = body(self, declared)?;
        self.section = outer;
        let actual = self.offset - start;
        if actual != u64::from(declared) {
            return Err(DecodeError::SectionSizeMismatch {
                id,
                declared,
                actual,
            });
        }
        Ok(result)
    }

    /// Custom sections carry a name and uninterpreted contents. The "name"
    /// section's subsections are decoded (the module name is retained); a
    /// "sourceMappingURL" section is reported on the diagnostic channel;
    /// anything else is skipped in full.
    fn parse_customsec(&mut self, module: &mut Module) -> Result<(), DecodeError> {
        self.parse_section(SECTION_CUSTOM, |d, size| {
            let start = d.offset;
            let end = start + u64::from(size);
            let name = d.parse_name()?;
            match name.as_str() {
                "name" => {
                    while d.offset < end {
                        d.parse_namesubsec(module)?;
                    }
                }
                "sourceMappingURL" => {
                    let url = d.parse_name()?;
                    debug!("source mapping url: {url}");
                    if d.offset != end {
                        warn!(
                            "skipping {} unexpected bytes after the source mapping url",
                            end - d.offset
                        );
                        d.skip_bytes(end - d.offset)?;
                    }
                }
                _ => d.skip_bytes(end - d.offset)?,
            }
            Ok(())
        })
    }

    fn parse_namesubsec(&mut self, module: &mut Module) -> Result<(), DecodeError> {
        let id_offset = self.offset;
        let id = self.parse_byte()?;
        let size = self.parse_u32()?;
        match id {
            NAME_SUBSECTION_MODULE => module.name = Some(self.parse_name()?),
            NAME_SUBSECTION_FUNCTIONS | NAME_SUBSECTION_GLOBALS | NAME_SUBSECTION_DATA_SEGMENTS => {
                self.parse_namemap()?;
            }
            NAME_SUBSECTION_LOCALS => self.parse_indirectnamemap()?,
            _ => {
                warn!("unrecognized name subsection id {id} at offset {id_offset}, skipping {size} bytes");
                self.skip_bytes(size.into())?;
            }
        }
        Ok(())
    }

    // A name map associates indices with names.
    fn parse_namemap(&mut self) -> Result<(), DecodeError> {
        self.parse_vec(|d| {
            d.parse_u32()?; // idx
            d.parse_name()?;
            Ok(())
        })?;
        Ok(())
    }

    // An indirect name map names items within indexed outer items, e.g.
    // locals within functions.
    fn parse_indirectnamemap(&mut self) -> Result<(), DecodeError> {
        self.parse_vec(|d| {
            d.parse_u32()?; // outer idx
            d.parse_namemap()
        })?;
        Ok(())
    }

    fn parse_typesec(&mut self) -> Result<Vec<FuncType>, DecodeError> {
        self.parse_section(SECTION_TYPE, |d, _size| d.parse_vec(Self::parse_functype))
    }

    fn parse_importsec(&mut self) -> Result<Vec<Import>, DecodeError> {
        self.parse_section(SECTION_IMPORT, |d, _size| d.parse_vec(Self::parse_import))
    }

    fn parse_import(&mut self) -> Result<Import, DecodeError> {
        let module = self.parse_name()?;
        let name = self.parse_name()?;
        let desc = self.parse_importdesc()?;
        Ok(Import { module, name, desc })
    }

    // Only the descriptor variant is kept; non-function payloads are
    // validated and dropped.
    fn parse_importdesc(&mut self) -> Result<ImportDesc, DecodeError> {
        let offset = self.offset;
        match self.parse_byte()? {
            0x00 => Ok(ImportDesc::Func(self.parse_typeidx()?)),
            0x01 => {
                self.parse_tabletype()?;
                Ok(ImportDesc::Table)
            }
            0x02 => {
                self.parse_memtype()?;
                Ok(ImportDesc::Memory)
            }
            0x03 => {
                self.parse_globaltype()?;
                Ok(ImportDesc::Global)
            }
            0x04 => {
                // exception-handling extension
                self.parse_tagtype()?;
                Ok(ImportDesc::Tag)
            }
            b => Err(DecodeError::UnknownTag {
                what: "importdesc",
                tag: b.into(),
                offset,
            }),
        }
    }

    fn parse_funcsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_FUNCTION, |d, _size| {
            d.parse_vec(Self::parse_typeidx)?;
            Ok(())
        })
    }

    fn parse_tablesec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_TABLE, |d, _size| {
            d.parse_vec(Self::parse_tabletype)?;
            Ok(())
        })
    }

    fn parse_memsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_MEMORY, |d, _size| {
            d.parse_vec(Self::parse_memtype)?;
            Ok(())
        })
    }

    fn parse_globalsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_GLOBAL, |d, _size| {
            d.parse_vec(|d| {
                d.parse_globaltype()?;
                d.parse_expr() // the init expression
            })?;
            Ok(())
        })
    }

    fn parse_exportsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_EXPORT, |d, _size| {
            d.parse_vec(|d| {
                d.parse_name()?;
                d.parse_exportdesc()
            })?;
            Ok(())
        })
    }

    fn parse_exportdesc(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        match self.parse_byte()? {
            0x00 => self.parse_funcidx().map(drop),
            0x01 => self.parse_tableidx().map(drop),
            0x02 => self.parse_memidx().map(drop),
            0x03 => self.parse_globalidx().map(drop),
            0x04 => self.parse_tagidx().map(drop), // exception-handling extension
            b => Err(DecodeError::UnknownTag {
                what: "exportdesc",
                tag: b.into(),
                offset,
            }),
        }
    }

    fn parse_startsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_START, |d, _size| d.parse_funcidx().map(drop))
    }

    fn parse_elemsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_ELEMENT, |d, _size| {
            d.parse_vec(Self::parse_elem)?;
            Ok(())
        })
    }

    fn parse_elem(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        match self.parse_u32()? {
            // active, table 0, funcref, by function index
            0 => {
                self.parse_expr()?; // the offset expression
                self.parse_vec(Self::parse_funcidx)?;
                Ok(())
            }
            n => Err(DecodeError::UnknownTag {
                what: "element segment",
                tag: n,
                offset,
            }),
        }
    }

    fn parse_codesec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_CODE, |d, _size| {
            d.parse_vec(Self::parse_code)?;
            Ok(())
        })
    }

    fn parse_code(&mut self) -> Result<(), DecodeError> {
        self.parse_u32()?; // the entry size; the body is parsed rather than trusted
        self.parse_vec(Self::parse_locals)?;
        self.parse_expr()
    }

    fn parse_locals(&mut self) -> Result<(), DecodeError> {
        self.parse_u32()?; // count
        self.parse_valtype()?;
        Ok(())
    }

    fn parse_datasec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_DATA, |d, _size| {
            d.parse_vec(Self::parse_data)?;
            Ok(())
        })
    }

    fn parse_data(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        match self.parse_u32()? {
            // active, implicit memory 0
            0 => {
                self.parse_expr()?;
                self.parse_vec(|d| d.parse_byte())?;
                Ok(())
            }
            // passive
            1 => {
                self.parse_vec(|d| d.parse_byte())?;
                Ok(())
            }
            // active, explicit memory
            2 => {
                self.parse_memidx()?;
                self.parse_expr()?;
                self.parse_vec(|d| d.parse_byte())?;
                Ok(())
            }
            n => Err(DecodeError::UnknownTag {
                what: "data segment",
                tag: n,
                offset,
            }),
        }
    }

    fn parse_datacountsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_DATA_COUNT, |d, _size| d.parse_u32().map(drop))
    }

    fn parse_tagsec(&mut self) -> Result<(), DecodeError> {
        self.parse_section(SECTION_TAG, |d, _size| {
            d.parse_vec(Self::parse_tagtype)?;
            Ok(())
        })
    }

    fn parse_opt_customsecs(&mut self, module: &mut Module) -> Result<(), DecodeError> {
        while self.peek() == Some(SECTION_CUSTOM) {
            self.parse_customsec(module)?;
        }
        Ok(())
    }

    /// Parse a whole module: magic, version, then each optional section in
    /// its prescribed order, with custom sections allowed between any two.
    /// Anything left over after the last section is an error.
    pub(super) fn parse_module(&mut self) -> Result<Module, DecodeError> {
        self.parse_magic()?;
        self.parse_version()?;

        let mut module = Module::default();

        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_TYPE) {
            module.types = self.parse_typesec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_IMPORT) {
            module.imports = self.parse_importsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_FUNCTION) {
            self.parse_funcsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_TABLE) {
            self.parse_tablesec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_MEMORY) {
            self.parse_memsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        // the tag section sits between memory and global, following the
        // exception-handling draft
        if self.peek() == Some(SECTION_TAG) {
            self.parse_tagsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_GLOBAL) {
            self.parse_globalsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_EXPORT) {
            self.parse_exportsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_START) {
            self.parse_startsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_ELEMENT) {
            self.parse_elemsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_DATA_COUNT) {
            self.parse_datacountsec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_CODE) {
            self.parse_codesec()?;
        }
        self.parse_opt_customsecs(&mut module)?;
        if self.peek() == Some(SECTION_DATA) {
            self.parse_datasec()?;
        }
        self.parse_opt_customsecs(&mut module)?;

        if !self.at_eof() {
            return Err(DecodeError::TrailingBytes {
                offset: self.offset,
            });
        }

        Ok(module)
    }
}
