mod module;
pub mod types;

pub use module::{Import, ImportDesc, Module};
