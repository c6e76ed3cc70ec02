use super::valtype::ValType;

/// Result types classify the result of executing instructions or functions,
/// which is a sequence of values.
///
/// <https://www.w3.org/TR/wasm-core-2/#result-types>
pub type ResultType = Vec<ValType>;

/// Function types classify the signature of functions, mapping a vector of
/// parameters to a vector of results.
///
/// <https://www.w3.org/TR/wasm-core-2/#function-types>
/// <https://www.w3.org/TR/wasm-core-2/#binary-functype>
#[derive(Debug, PartialEq)]
pub struct FuncType {
    pub params: ResultType,
    pub results: ResultType,
}
