//! Utility types and functions used by the `cpp_to_lua` generator.

#![forbid(unsafe_code)]

pub mod errors;
pub mod file_utils;
pub mod utils;
