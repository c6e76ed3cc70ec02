use super::types::FuncType;

/// WebAssembly programs are organized into modules, which are the unit of
/// deployment, loading, and compilation.
///
/// The model retains what the text writer consumes today: the module name
/// (if a "name" custom section provided one), the function types, and the
/// imports. Every other section is decoded for well-formedness and then
/// dropped. Indices into [`Self::types`] and [`Self::imports`] are
/// zero-based and positional, in the encoded order.
///
/// <https://www.w3.org/TR/wasm-core-2/#modules>
/// <https://www.w3.org/TR/wasm-core-2/#binary-module>
#[derive(Debug, Default, PartialEq)]
pub struct Module {
    /// The module name from the module-name subsection of the "name" custom
    /// section, if present.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#binary-namesec>
    pub name: Option<String>,

    /// The types component of a module defines a vector of function types.
    /// All function types used in a module must be defined in this
    /// component. They are referenced by type indices.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#types>
    /// <https://www.w3.org/TR/wasm-core-2/#binary-typesec>
    pub types: Vec<FuncType>,

    /// The imports component of a module defines a set of imports that are
    /// required for instantiation. Each import is labeled by a two-level
    /// name space, consisting of a module name and a name for an entity
    /// within that module.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#imports>
    /// <https://www.w3.org/TR/wasm-core-2/#binary-importsec>
    pub imports: Vec<Import>,
}

/// A single import: the two-level name and its descriptor.
#[derive(Debug, PartialEq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub desc: ImportDesc,
}

/// The descriptor of an import, including the tag variant from the
/// exception-handling extension.
///
/// Only the function descriptor keeps its payload (the type index); the
/// other descriptors are validated during decoding and their payloads
/// dropped.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ImportDesc {
    Func(u32),
    Table,
    Memory,
    Global,
    Tag,
}
