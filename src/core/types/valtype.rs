/// Value types classify the individual values that WebAssembly code can
/// compute with and the values that a variable accepts.
///
/// They are either number types (`i32`, `i64`, `f32`, `f64`), the vector
/// type `v128`, or reference types (`funcref`, `externref`). The grouping
/// only matters while parsing, so a single enum covers all seven.
///
/// <https://www.w3.org/TR/wasm-core-2/#value-types>
/// <https://www.w3.org/TR/wasm-core-2/#binary-valtype>
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ValType {
    I32,
    I64,
    F32,
    F64,
    V128,
    FuncRef,
    ExternRef,
}
