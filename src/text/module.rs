//! Serialization of the module model.
//!
//! <https://www.w3.org/TR/wasm-core-2/#text-module>
use super::{TextWriter, WriteError};
use crate::core::types::{FuncType, ValType};
use crate::core::{Import, Module};
use std::io::{self, Write};

impl ValType {
    /// The canonical keyword of a value type.
    fn keyword(self) -> &'static str {
        match self {
            ValType::I32 => "i32",
            ValType::I64 => "i64",
            ValType::F32 => "f32",
            ValType::F64 => "f64",
            ValType::V128 => "v128",
            ValType::FuncRef => "funcref",
            ValType::ExternRef => "externref",
        }
    }
}

impl<W: Write> TextWriter<W> {
    fn write_valtype(&mut self, valtype: ValType) -> io::Result<()> {
        self.tok_keyword(valtype.keyword())
    }

    /// `(func (param ...)? (result ...)?)`, omitting an empty group.
    fn write_functype(&mut self, functype: &FuncType) -> io::Result<()> {
        self.tok_left_paren()?;
        self.tok_keyword("func")?;
        if !functype.params.is_empty() {
            self.tok_left_paren()?;
            self.tok_keyword("param")?;
            for &param in &functype.params {
                self.write_valtype(param)?;
            }
            self.tok_right_paren()?;
        }
        if !functype.results.is_empty() {
            self.tok_left_paren()?;
            self.tok_keyword("result")?;
            for &result in &functype.results {
                self.write_valtype(result)?;
            }
            self.tok_right_paren()?;
        }
        self.tok_right_paren()
    }

    /// One type definition on its own line, with the index as a comment,
    /// e.g. `(type (;0;) (func (param i32)))`.
    fn write_type(&mut self, typeidx: usize, functype: &FuncType) -> io::Result<()> {
        self.lex_nl()?;
        self.tok_left_paren()?;
        self.tok_keyword("type")?;
        self.lex_blockcomment(&typeidx.to_string())?;
        self.write_functype(functype)?;
        self.tok_right_paren()
    }

    // TODO: also serialize import.desc; the descriptor variant is retained
    // in the model but not written yet.
    fn write_import(&mut self, import: &Import) -> io::Result<()> {
        self.lex_nl()?;
        self.tok_left_paren()?;
        self.tok_keyword("import")?;
        self.tok_name(&import.module)?;
        self.tok_name(&import.name)?;
        self.tok_right_paren()
    }

    /// Write `module` in its entirety: `(module`, the optional module
    /// identifier, each type, each import, `)`.
    pub fn write_module(&mut self, module: &Module) -> Result<(), WriteError> {
        self.tok_left_paren()?;
        self.tok_keyword("module")?;
        if let Some(name) = &module.name {
            self.tok_id(name)?;
        }
        for (typeidx, functype) in module.types.iter().enumerate() {
            self.write_type(typeidx, functype)?;
        }
        for import in &module.imports {
            self.write_import(import)?;
        }
        self.tok_right_paren()?;
        Ok(())
    }
}
