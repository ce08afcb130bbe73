//! Runtime support for code generated by `wsdl2rs`.

pub mod soap;
pub mod xml;

pub use serde;
