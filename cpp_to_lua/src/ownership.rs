//! Ownership classification of pointer results.
//!
//! Bindings returning a pointer to a record are tagged either owned
//! (the wrapper attaches a destructor finalizer to the handle) or
//! borrowed (no finalizer). Constructors and heap-lowered value returns
//! are always owned; everything else is decided by the configured
//! policy, falling back to borrowed. A leak is recoverable, a double
//! free is not.

use crate::config::Config;
use crate::cpp_data::CppPath;
use crate::cpp_ffi_data::{CppFfiFunction, CppTypeConversionToFfi, Ownership};
use crate::cpp_function::CppFunction;
use crate::cpp_type::{CppPointerLikeTypeKind, CppType};
use crate::lua_info::LuaBindingKind;
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::{format_err, Result};
use log::{debug, warn};
use std::collections::HashSet;

/// Returns the record the function's result points to, if any.
pub fn returned_record_path(function: &CppFfiFunction) -> Option<&CppPath> {
    if let CppType::PointerLike {
        kind: CppPointerLikeTypeKind::Pointer,
        target,
        ..
    } = function.return_type.ffi_type()
    {
        if let CppType::Class(path) = target.as_ref() {
            return Some(path);
        }
    }
    None
}

fn classify(config: &Config, function: &CppFunction) -> Ownership {
    if let Some(rule) = config.ownership_rule() {
        if let Some(ownership) = rule.evaluate(function) {
            debug!(
                "ownership rule `{}` matched {}",
                rule.name(),
                function.short_text()
            );
            return ownership;
        }
    }
    let qualified = function.path.to_cpp_pseudo_code();
    for pattern in config.ownership_patterns() {
        if pattern.pattern.is_match(&qualified) {
            return pattern.ownership;
        }
    }
    if config.owned_names().iter().any(|path| path == &function.path) {
        return Ownership::Owned;
    }
    if config
        .borrowed_names()
        .iter()
        .any(|path| path == &function.path)
    {
        return Ownership::Borrowed;
    }
    Ownership::Borrowed
}

pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    let records_with_delete: HashSet<String> = data
        .db
        .lua_items()
        .iter()
        .filter(|set| set.kind == LuaBindingKind::Destructor)
        .filter_map(|set| set.record.clone())
        .collect();

    let mut updates = Vec::new();
    let db = &*data.db;
    for (set_index, set) in db.lua_items().iter().enumerate() {
        for (member_index, member) in set.members.iter().enumerate() {
            let ffi_item = &db.ffi_items()[member.ffi_index];
            let returned = match returned_record_path(&ffi_item.function) {
                Some(path) => path,
                None => continue,
            };
            let returned_name = db
                .find_ffi_type_name(returned)
                .ok_or_else(|| {
                    format_err!("no FFI name assigned to {}", returned.to_cpp_pseudo_code())
                })?
                .ffi_name
                .clone();
            let function = db
                .source_cpp_item(ffi_item)?
                .cpp_item
                .as_function_ref()
                .ok_or_else(|| {
                    format_err!("ffi item {} has a non-function source", member.ffi_index)
                })?;

            let returns_heap_copy = matches!(
                ffi_item.function.return_type.conversion(),
                CppTypeConversionToFfi::ValueToPointer { .. }
            );
            let mut ownership = if set.kind == LuaBindingKind::Constructor || returns_heap_copy {
                Ownership::Owned
            } else {
                classify(data.config, function)
            };
            if ownership.is_owned() && !records_with_delete.contains(&returned_name) {
                warn!(
                    "{}: owned result of type {} has no destructor binding; \
                     the handle is treated as borrowed",
                    ffi_item.function.short_text(),
                    returned_name
                );
                ownership = Ownership::Borrowed;
            }
            debug!(
                "ownership: {} -> {:?}",
                ffi_item.function.short_text(),
                ownership
            );
            updates.push((set_index, member_index, ownership));
        }
    }

    for (set_index, member_index, ownership) in updates {
        data.db.lua_items_mut()[set_index].members[member_index].return_ownership =
            Some(ownership);
    }
    Ok(())
}
