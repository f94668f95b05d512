//! Implementation of the `cpp_to_lua` generator that
//! analyzes a C++ library and produces LuaJIT FFI bindings for it.

mod cdef_generator;
pub mod cli;
pub mod config;
pub mod cpp_data;
pub mod cpp_ffi_data;
pub mod cpp_ffi_generator;
pub mod cpp_function;
mod cpp_glue_generator;
mod cpp_implicit_methods;
mod cpp_parser;
pub mod cpp_type;
pub mod database;
mod default_arguments;
pub mod diagnostics;
mod emitter;
mod lua_code_generator;
mod lua_generator;
pub mod lua_info;
mod overload_resolver;
mod ownership;
pub mod processor;

#[cfg(test)]
mod tests;
