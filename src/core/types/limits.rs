/// Limits classify the size range of resizeable storage associated with
/// memory types and table types. If no maximum is given, the respective
/// storage can grow to any size.
///
/// The `shared` flag comes from the threads extension.
///
/// <https://www.w3.org/TR/wasm-core-2/#limits>
/// <https://www.w3.org/TR/wasm-core-2/#binary-limits>
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Limits {
    pub shared: bool,
    pub min: u32,
    pub max: Option<u32>,
}
