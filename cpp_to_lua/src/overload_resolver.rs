//! Overload resolution. C++ overloads collapse onto flat C symbols, so
//! every member of an overloaded name gets a declaration-order suffix,
//! and the wrapper gets a dispatcher that tells the overloads apart by
//! argument count and runtime type tags.
//!
//! This step assigns the final exported symbol names. Earlier steps
//! produce preliminary names which may collide across scopes; nothing
//! downstream reads symbol names before this step has run.

use crate::cdef_generator::enumerator_cdef_name;
use crate::cpp_data::CppPath;
use crate::cpp_ffi_data::CppFfiType;
use crate::cpp_ffi_generator::{FfiNameProvider, RESERVED_TYPE_NAMES};
use crate::cpp_function::CppFunctionKind;
use crate::cpp_type::{CppBuiltInNumericType, CppPointerLikeTypeKind, CppType};
use crate::database::{Database, DatabaseItemSource};
use crate::default_arguments::convert_trailing_defaults;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::lua_info::{is_lua_keyword, LuaBindingKind, LuaMember, LuaOverloadSet, LuaTypeTag};
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::{format_err, Result};
use itertools::Itertools;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Functions with the same scope, name, kind and staticness form one
/// overload set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OverloadKey {
    scope: Option<CppPath>,
    name: String,
    kind: CppFunctionKind,
    is_static: bool,
}

/// Computes the runtime dispatch tag of one wrapper argument.
/// Returns `None` for positions that cannot be checked, such as
/// out-parameters and `void*` arguments; those accept anything.
fn lua_type_tag(ffi_type: &CppFfiType, db: &Database) -> Option<LuaTypeTag> {
    match ffi_type.ffi_type() {
        CppType::BuiltInNumeric(CppBuiltInNumericType::Bool) => Some(LuaTypeTag::Boolean),
        CppType::BuiltInNumeric(_)
        | CppType::SpecificNumeric(_)
        | CppType::PointerSizedInteger { .. }
        | CppType::Enum { .. } => Some(LuaTypeTag::Number),
        CppType::FunctionPointer(_) => Some(LuaTypeTag::Function),
        CppType::PointerLike {
            kind: CppPointerLikeTypeKind::Pointer,
            is_const,
            target,
        } => match target.as_ref() {
            CppType::BuiltInNumeric(CppBuiltInNumericType::Char) if *is_const => {
                Some(LuaTypeTag::String)
            }
            CppType::Class(path) => db
                .find_ffi_type_name(path)
                .map(|name| LuaTypeTag::Cdata(name.ffi_name.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// Returns an argument count both members accept with identical type
/// tags at every position, if one exists. A dispatcher cannot tell the
/// two apart at such a count.
fn find_colliding_arity(
    a_tags: &[Option<LuaTypeTag>],
    a_min: usize,
    b_tags: &[Option<LuaTypeTag>],
    b_min: usize,
) -> Option<usize> {
    let low = a_min.max(b_min);
    let high = a_tags.len().min(b_tags.len());
    if low > high {
        return None;
    }
    (low..=high).find(|&k| a_tags[..k] == b_tags[..k])
}

pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    let mut group_order = Vec::new();
    let mut groups: HashMap<OverloadKey, Vec<usize>> = HashMap::new();

    for (index, ffi_item) in data.db.ffi_items().iter().enumerate() {
        let function = data
            .db
            .source_cpp_item(ffi_item)?
            .cpp_item
            .as_function_ref()
            .ok_or_else(|| format_err!("ffi item {} has a non-function source", index))?;
        let key = OverloadKey {
            scope: if function.member().is_some() {
                Some(function.class_type()?)
            } else {
                function.path.parent().ok()
            },
            name: function.path.last().name.clone(),
            kind: function
                .member()
                .map_or(CppFunctionKind::Regular, |member| member.kind.clone()),
            is_static: function.is_static_member(),
        };
        match groups.get_mut(&key) {
            Some(indices) => indices.push(index),
            None => {
                group_order.push(key.clone());
                groups.insert(key, vec![index]);
            }
        }
    }

    // The exported symbols share one identifier namespace with the
    // generated type names and enumerators, so the provider starts out
    // with all of those claimed.
    let mut provider = FfiNameProvider::new();
    for name in RESERVED_TYPE_NAMES {
        provider.claim(*name);
    }
    for type_name in data.db.ffi_type_names() {
        provider.claim(type_name.ffi_name.clone());
    }
    for item in data.db.cpp_items() {
        if let Some(value) = item.cpp_item.as_enum_value_ref() {
            if let Ok(parent) = value.path.parent() {
                if let Some(type_name) = data.db.find_ffi_type_name(&parent) {
                    provider.claim(enumerator_cdef_name(&type_name.ffi_name, value));
                }
            }
        }
    }

    let mut sets = Vec::new();
    for key in &group_order {
        let indices = &groups[key];
        let multiple = indices.len() > 1;

        let mut members = Vec::new();
        let mut min_arities = Vec::new();
        for (position, &index) in indices.iter().enumerate() {
            let preliminary = data.db.ffi_items()[index].function.path.last().name.clone();
            let base = if multiple {
                format!("{}{}", preliminary, position + 1)
            } else {
                preliminary.clone()
            };
            let final_name = provider.create_name(&base);
            if final_name != preliminary {
                debug!("renamed ffi function: {} -> {}", preliminary, final_name);
                data.db.ffi_items_mut()[index].function.path =
                    CppPath::from_good_str(&final_name);
            }

            let db = &*data.db;
            let ffi_item = &db.ffi_items()[index];
            let source_function = db
                .source_cpp_item(ffi_item)?
                .cpp_item
                .as_function_ref()
                .ok_or_else(|| format_err!("ffi item {} has a non-function source", index))?;
            let arg_tags = ffi_item
                .function
                .arguments
                .iter()
                .filter(|arg| arg.meaning.is_argument())
                .map(|arg| lua_type_tag(&arg.argument_type, db))
                .collect_vec();
            let converted = convert_trailing_defaults(source_function, db);
            min_arities.push(arg_tags.len() - converted.literals.len());
            members.push(LuaMember {
                ffi_index: index,
                arg_tags,
                trailing_defaults: Vec::new(),
                return_ownership: None,
            });
        }

        let is_ambiguous = check_ambiguity(data.db, &members, &min_arities)?;

        let kind = match (&key.kind, key.is_static) {
            (CppFunctionKind::Constructor, _) => LuaBindingKind::Constructor,
            (CppFunctionKind::Destructor, _) => LuaBindingKind::Destructor,
            (CppFunctionKind::Regular, true) => LuaBindingKind::StaticMethod,
            (CppFunctionKind::Regular, false) => {
                if key.scope.is_some() && is_member_group(data.db, indices[0])? {
                    LuaBindingKind::Method
                } else {
                    LuaBindingKind::Function
                }
            }
        };
        let record = match kind {
            LuaBindingKind::Function => None,
            _ => {
                let scope = key
                    .scope
                    .as_ref()
                    .ok_or_else(|| format_err!("member function {} has no scope", key.name))?;
                let type_name = data.db.find_ffi_type_name(scope).ok_or_else(|| {
                    format_err!(
                        "no FFI name assigned to {}",
                        scope.to_cpp_pseudo_code()
                    )
                })?;
                Some(type_name.ffi_name.clone())
            }
        };
        let lua_name = match (kind, &record) {
            (LuaBindingKind::Constructor, Some(record)) => format!("{}_new", record),
            (LuaBindingKind::Destructor, _) => "delete".to_string(),
            (LuaBindingKind::StaticMethod, Some(record)) => {
                format!("{}_{}", record, key.name)
            }
            _ => key.name.clone(),
        };

        sets.push(LuaOverloadSet {
            lua_name,
            record,
            kind,
            members,
            is_ambiguous,
        });
    }

    assign_unique_lua_names(data.db, &mut sets);

    for set in sets {
        data.db.add_lua_item(set);
    }
    Ok(())
}

fn is_member_group(db: &Database, ffi_index: usize) -> Result<bool> {
    let function = db
        .source_cpp_item(&db.ffi_items()[ffi_index])?
        .cpp_item
        .as_function_ref()
        .ok_or_else(|| format_err!("ffi item {} has a non-function source", ffi_index))?;
    Ok(function.member().is_some())
}

/// Looks for two members that cannot be told apart at runtime. The
/// first collision found produces a diagnostic; the set is then dropped
/// from the wrapper while its FFI declarations remain usable directly.
fn check_ambiguity(
    db: &mut Database,
    members: &[LuaMember],
    min_arities: &[usize],
) -> Result<bool> {
    for i in 0..members.len() {
        for j in i + 1..members.len() {
            let colliding = find_colliding_arity(
                &members[i].arg_tags,
                min_arities[i],
                &members[j].arg_tags,
                min_arities[j],
            );
            if let Some(arity) = colliding {
                let symbol_i = db.ffi_items()[members[i].ffi_index]
                    .function
                    .path
                    .last()
                    .name
                    .clone();
                let symbol_j = db.ffi_items()[members[j].ffi_index]
                    .function
                    .path
                    .last()
                    .name
                    .clone();
                let source_item = db.source_cpp_item(&db.ffi_items()[members[i].ffi_index])?;
                let item_text = source_item
                    .cpp_item
                    .as_function_ref()
                    .map_or_else(String::new, |function| function.short_text());
                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::AmbiguousOverload,
                    item_text,
                    format!(
                        "{} and {} cannot be distinguished when called with {} argument(s); \
                         the set is excluded from the wrapper",
                        symbol_i, symbol_j, arity
                    ),
                );
                if let DatabaseItemSource::CppParser {
                    origin_location, ..
                } = &source_item.source
                {
                    diagnostic = diagnostic.with_location(origin_location.clone());
                }
                db.add_diagnostic(diagnostic);
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Makes the exposed Lua names unique within their namespaces: one
/// namespace per record's method table and one for the module table,
/// which also holds the enum value tables.
fn assign_unique_lua_names(db: &Database, sets: &mut [LuaOverloadSet]) {
    let enum_paths: HashSet<&CppPath> = db
        .cpp_items()
        .iter()
        .filter_map(|item| item.cpp_item.as_type_ref())
        .filter(|declaration| declaration.kind.is_enum())
        .map(|declaration| &declaration.path)
        .collect();
    let mut module_names: HashSet<String> = db
        .ffi_type_names()
        .iter()
        .filter(|name| enum_paths.contains(&name.path))
        .map(|name| name.ffi_name.clone())
        .collect();
    let mut method_names: HashMap<String, HashSet<String>> = HashMap::new();

    for set in sets {
        if is_lua_keyword(&set.lua_name) {
            set.lua_name.push('_');
        }
        let names = match set.kind {
            LuaBindingKind::Method | LuaBindingKind::Destructor => {
                let record = match &set.record {
                    Some(record) => record.clone(),
                    None => continue,
                };
                method_names.entry(record).or_default()
            }
            _ => &mut module_names,
        };
        let mut num: Option<u32> = None;
        let final_name = loop {
            let name = format!(
                "{}{}",
                set.lua_name,
                num.map_or(String::new(), |num| num.to_string())
            );
            if !names.contains(&name) {
                break name;
            }
            num = Some(num.map_or(1, |num| num + 1));
        };
        if final_name != set.lua_name {
            debug!("renamed lua binding: {} -> {}", set.lua_name, final_name);
            set.lua_name = final_name.clone();
        }
        names.insert(final_name);
    }
}
