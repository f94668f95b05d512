//! Generator of LuaJIT FFI bindings for C++ libraries.

use cpp_to_lua::cli;
use cpp_to_lua_common::errors::FancyUnwrap;

pub fn main() {
    cli::run_from_args().fancy_unwrap();
}
