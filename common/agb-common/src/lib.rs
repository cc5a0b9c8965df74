pub mod boxedarray;
pub mod frame;
pub mod macros;
pub mod num;
