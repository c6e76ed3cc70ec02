pub mod functype;
pub mod limits;
pub mod valtype;

pub use functype::{FuncType, ResultType};
pub use limits::Limits;
pub use valtype::ValType;
