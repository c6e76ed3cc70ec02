//! A converter for WebAssembly modules from the binary format to the text
//! format.
//!
//! This library implements the Binary format of the WebAssembly
//! [specification], version 2, together with a writer for the Text format.
//! The conversion is one-way: bytes in, S-expressions out.
//!
//! Beyond the core specification, the decoder understands the atomic memory
//! instructions and shared limits of the threads extension, the tag section
//! and try/catch instructions of the exception-handling extension, and the
//! global and data-segment name subsections of the extended name section.
//!
//! The main entry points are [`decode_module()`] and
//! [`TextWriter::write_module`].
//!
//! [specification]: https://www.w3.org/TR/wasm-core-2/
#![forbid(unsafe_code)]

mod core;
pub use self::core::types::{FuncType, Limits, ResultType, ValType};
pub use self::core::{Import, ImportDesc, Module};

pub mod decode;
pub use decode::{DecodeError, decode_module};

pub mod text;
pub use text::{TextWriter, WriteError};
