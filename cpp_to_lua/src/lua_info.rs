//! Wrapper binding model. These types describe what the generated Lua
//! module exposes and how each exposed name maps onto the flat FFI
//! symbols of the declaration list.

use crate::cpp_ffi_data::Ownership;
use serde_derive::{Deserialize, Serialize};

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

pub fn is_lua_keyword(name: &str) -> bool {
    LUA_KEYWORDS.contains(&name)
}

/// Returns true if `name` can be used after a dot or as a bare
/// identifier in Lua source.
pub fn is_plain_lua_name(name: &str) -> bool {
    !name.is_empty()
        && !is_lua_keyword(name)
        && !name.as_bytes()[0].is_ascii_digit()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

/// What kind of Lua-side binding an overload set produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LuaBindingKind {
    /// Free function exposed as `M.<name>`.
    Function,
    /// Constructor exposed as `M.<Record>_new`. The returned handle
    /// gets a destructor finalizer attached.
    Constructor,
    /// Instance method exposed through the record's method table.
    Method,
    /// Static member function exposed as `M.<Record>_<name>`.
    StaticMethod,
    /// The `delete` method of a record. Clears the finalizer before
    /// destroying the object.
    Destructor,
}

/// Runtime dispatch tag of one wrapper argument position. Overloads
/// that collide on argument count are told apart by checking the actual
/// arguments against these tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LuaTypeTag {
    /// Matches `type(x) == "number"`. Numeric and enum arguments.
    Number,
    /// Matches `type(x) == "string"`. `const char*` arguments.
    String,
    /// Matches `type(x) == "boolean"`.
    Boolean,
    /// Matches `type(x) == "function"`. Callback arguments.
    Function,
    /// Matches `ffi.istype(...)`. The payload is the FFI name of the
    /// record; both value and handle cdata of that record match.
    Cdata(String),
}

/// One FFI function participating in an overload set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuaMember {
    /// Index of the function in `Database::ffi_items`.
    pub ffi_index: usize,
    /// Dispatch tags for the wrapper-visible argument positions, in
    /// order. `None` marks a position that accepts nil or cannot be
    /// checked at runtime.
    pub arg_tags: Vec<Option<LuaTypeTag>>,
    /// Lua literals substituted for omitted trailing arguments, one per
    /// defaulted position, innermost last. Empty if the function has no
    /// usable default arguments.
    pub trailing_defaults: Vec<String>,
    /// Ownership of the returned pointer, determined by the ownership
    /// pass. None if the return type is not a record pointer.
    pub return_ownership: Option<Ownership>,
}

impl LuaMember {
    /// Number of arguments the wrapper accepts when all are supplied.
    pub fn full_arity(&self) -> usize {
        self.arg_tags.len()
    }

    /// Smallest number of arguments the wrapper accepts. Omitted
    /// trailing arguments are filled from `trailing_defaults`.
    pub fn min_arity(&self) -> usize {
        self.arg_tags.len() - self.trailing_defaults.len()
    }

    /// Returns true if this member can be called with `arity` arguments.
    pub fn accepts_arity(&self, arity: usize) -> bool {
        arity >= self.min_arity() && arity <= self.full_arity()
    }
}

/// All member functions sharing one exposed Lua name. A set with one
/// member is the common case; sets with several members get a runtime
/// dispatcher keyed by argument count and type tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuaOverloadSet {
    /// Name the binding is exposed under. For methods this is the key
    /// in the record's method table, otherwise the key in the module
    /// table.
    pub lua_name: String,
    /// FFI name of the record this binding belongs to. None for free
    /// functions.
    pub record: Option<String>,
    pub kind: LuaBindingKind,
    /// Participating functions in declaration order.
    pub members: Vec<LuaMember>,
    /// True if two members accept the same argument count with the same
    /// type tags at every position. Such a set keeps its FFI
    /// declarations but is dropped from the wrapper.
    pub is_ambiguous: bool,
}

impl LuaOverloadSet {
    pub fn short_text(&self) -> String {
        let name = match &self.record {
            Some(record) => format!("{}::{}", record, self.lua_name),
            None => self.lua_name.clone(),
        };
        if self.members.len() == 1 {
            name
        } else {
            format!("{} ({} overloads)", name, self.members.len())
        }
    }
}
