//! Writing of WebAssembly modules in the text format.
//!
//! The lexical layer below guarantees a well-formed S-expression token
//! stream: two tokens are never run together, a closing parenthesis is
//! always separated from whatever follows it, and the indentation level
//! tracks the nesting depth.
//!
//! <https://www.w3.org/TR/wasm-core-2/#text-format>
mod module;

use std::io::{self, Write};
use thiserror::Error;

// idchar, beyond ASCII alphanumerics.
const ID_PUNCTUATION: &str = "!#$%&'*+-./:<=>?@\\^_`|~";

/// The error produced when writing a module in the text format fails.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid empty identifier")]
    EmptyIdentifier,

    #[error("invalid idchar in id {id:?}: {ch:?}")]
    InvalidIdChar { id: String, ch: char },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Writes a [`Module`](crate::Module) as its text (S-expression) form.
///
/// The output uses two spaces of indentation per nesting level, LF
/// newlines, and no trailing newline after the outermost `)`.
#[derive(Debug)]
pub struct TextWriter<W> {
    sink: W,
    indent: usize,
    need_ws: bool,
    just_closed_group: bool,
}

impl<W: Write> TextWriter<W> {
    pub fn new(sink: W) -> Self {
        TextWriter {
            sink,
            indent: 0,
            need_ws: false,
            just_closed_group: false,
        }
    }

    // A keyword demands a space before the next token; a `)` demands a
    // space before anything that is not another `)`. Together the two
    // flags keep `)(` and glued keywords out of the output.
    fn lex_maybe_ws(&mut self) -> io::Result<()> {
        if self.need_ws || self.just_closed_group {
            self.sink.write_all(b" ")?;
            self.need_ws = false;
            self.just_closed_group = false;
        }
        Ok(())
    }

    fn tok_keyword(&mut self, keyword: &str) -> io::Result<()> {
        self.lex_maybe_ws()?;
        self.sink.write_all(keyword.as_bytes())?;
        self.need_ws = true;
        self.just_closed_group = false;
        Ok(())
    }

    fn tok_left_paren(&mut self) -> io::Result<()> {
        self.lex_maybe_ws()?;
        self.sink.write_all(b"(")?;
        self.indent += 2;
        self.need_ws = false;
        self.just_closed_group = false;
        Ok(())
    }

    fn tok_right_paren(&mut self) -> io::Result<()> {
        self.sink.write_all(b")")?;
        self.indent -= 2;
        self.need_ws = false;
        self.just_closed_group = true;
        Ok(())
    }

    /// A newline followed by the current indentation.
    fn lex_nl(&mut self) -> io::Result<()> {
        write!(self.sink, "\n{:width$}", "", width = self.indent)?;
        self.need_ws = false;
        self.just_closed_group = false;
        Ok(())
    }

    fn lex_blockcomment(&mut self, comment: &str) -> io::Result<()> {
        self.lex_maybe_ws()?;
        // assumes `comment` does not contain an improperly nested ";)"
        write!(self.sink, "(;{comment};)")?;
        self.need_ws = true;
        self.just_closed_group = true;
        Ok(())
    }

    /// A double-quoted string. Printable ASCII is emitted verbatim, the
    /// short escapes cover the usual suspects, and every other byte is
    /// written as two lowercase hex digits.
    fn tok_string(&mut self, s: &str) -> io::Result<()> {
        self.lex_maybe_ws()?;
        self.sink.write_all(b"\"")?;
        for byte in s.bytes() {
            match byte {
                b'\t' => self.sink.write_all(b"\\t")?,
                b'\n' => self.sink.write_all(b"\\n")?,
                b'\r' => self.sink.write_all(b"\\r")?,
                b'"' => self.sink.write_all(b"\\\"")?,
                b'\'' => self.sink.write_all(b"\\'")?,
                b'\\' => self.sink.write_all(b"\\\\")?,
                0x20..=0x7E => self.sink.write_all(&[byte])?,
                _ => write!(self.sink, "\\{byte:02x}")?,
            }
        }
        self.sink.write_all(b"\"")?;
        self.need_ws = true;
        self.just_closed_group = false;
        Ok(())
    }

    fn tok_name(&mut self, name: &str) -> io::Result<()> {
        self.tok_string(name)
    }

    /// A `$`-prefixed identifier. Identifiers must be non-empty and consist
    /// of ASCII alphanumerics and idchar punctuation only.
    fn tok_id(&mut self, id: &str) -> Result<(), WriteError> {
        if id.is_empty() {
            return Err(WriteError::EmptyIdentifier);
        }
        for ch in id.chars() {
            if !ch.is_ascii_alphanumeric() && !ID_PUNCTUATION.contains(ch) {
                return Err(WriteError::InvalidIdChar {
                    id: id.to_owned(),
                    ch,
                });
            }
        }
        self.lex_maybe_ws()?;
        write!(self.sink, "${id}")?;
        self.need_ws = true;
        self.just_closed_group = false;
        Ok(())
    }
}
