//! Rendering of the wrapper module (`<library>_gen.lua`).
//!
//! The module assumes the declaration list has already been fed to
//! `ffi.cdef` and the host glue is linked into the process, so every
//! flat symbol is reachable through `ffi.C`. Enums become lookup
//! tables, records get method tables installed with `ffi.metatype`,
//! and overloaded names get a dispatcher keyed by argument count and
//! runtime type checks.

use crate::cpp_data::CppTypeDeclarationKind;
use crate::database::Database;
use crate::lua_info::{is_plain_lua_name, LuaBindingKind, LuaMember, LuaOverloadSet, LuaTypeTag};
use crate::ownership::returned_record_path;
use cpp_to_lua_common::errors::{format_err, Result};
use itertools::Itertools;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Renders an enum table key. Enumerator names are valid C identifiers,
/// but a few of them collide with Lua keywords and need the bracket
/// form.
fn lua_table_key(name: &str) -> String {
    if is_plain_lua_name(name) {
        name.to_string()
    } else {
        format!("[\"{}\"]", name)
    }
}

/// Argument identifier usable inside the generated function. `self` is
/// taken by the method call syntax and keywords are not identifiers.
fn lua_argument_name(name: &str) -> String {
    if name == "self" || !is_plain_lua_name(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

fn type_check_expression(argument: &str, tag: &LuaTypeTag) -> String {
    match tag {
        LuaTypeTag::Number => format!("type({}) == \"number\"", argument),
        LuaTypeTag::String => format!("type({}) == \"string\"", argument),
        LuaTypeTag::Boolean => format!("type({}) == \"boolean\"", argument),
        LuaTypeTag::Function => format!("type({}) == \"function\"", argument),
        LuaTypeTag::Cdata(record) => format!(
            "(ffi.istype(\"{0}\", {1}) or ffi.istype(\"{0}*\", {1}))",
            record, argument
        ),
    }
}

/// Where a generated function is installed.
enum Exposure<'a> {
    Module,
    MethodTable(&'a str),
}

struct WrapperGenerator<'a> {
    db: &'a Database,
    /// Destructor symbol per record, for finalizer attachment.
    delete_symbols: HashMap<String, String>,
}

impl<'a> WrapperGenerator<'a> {
    fn new(db: &'a Database) -> Self {
        let delete_symbols = db
            .lua_items()
            .iter()
            .filter(|set| set.kind == LuaBindingKind::Destructor && !set.is_ambiguous)
            .filter_map(|set| {
                let record = set.record.clone()?;
                let member = set.members.first()?;
                let symbol = db.ffi_items()[member.ffi_index]
                    .function
                    .path
                    .last()
                    .name
                    .clone();
                Some((record, symbol))
            })
            .collect();
        WrapperGenerator { db, delete_symbols }
    }

    fn symbol(&self, member: &LuaMember) -> String {
        self.db.ffi_items()[member.ffi_index]
            .function
            .path
            .last()
            .name
            .clone()
    }

    /// Names of the wrapper-visible arguments of `member`, in order.
    fn argument_names(&self, member: &LuaMember) -> Vec<String> {
        self.db.ffi_items()[member.ffi_index]
            .function
            .arguments
            .iter()
            .filter(|argument| argument.meaning.is_argument())
            .map(|argument| lua_argument_name(&argument.name))
            .collect()
    }

    /// Renders the `C.<symbol>(...)` expression, wrapping it in a
    /// finalizer attachment when the result is owned.
    fn call_expression(
        &self,
        member: &LuaMember,
        call_arguments: &[String],
        has_self: bool,
    ) -> Result<String> {
        let mut all_arguments = Vec::new();
        if has_self {
            all_arguments.push("self".to_string());
        }
        all_arguments.extend_from_slice(call_arguments);
        let call = format!("C.{}({})", self.symbol(member), all_arguments.join(", "));
        let owned = member
            .return_ownership
            .map_or(false, |ownership| ownership.is_owned());
        if !owned {
            return Ok(call);
        }
        let function = &self.db.ffi_items()[member.ffi_index].function;
        let record_path = returned_record_path(function)
            .ok_or_else(|| format_err!("owned result of {} is not a record", function.short_text()))?;
        let record = &self
            .db
            .find_ffi_type_name(record_path)
            .ok_or_else(|| {
                format_err!("no FFI name assigned to {}", record_path.to_cpp_pseudo_code())
            })?
            .ffi_name;
        let delete_symbol = self.delete_symbols.get(record).ok_or_else(|| {
            format_err!("owned result of {} has no destructor symbol", function.short_text())
        })?;
        Ok(format!("ffi.gc({}, C.{})", call, delete_symbol))
    }

    fn write_set(&self, out: &mut String, set: &LuaOverloadSet, exposure: &Exposure<'_>) -> Result<()> {
        let header = match exposure {
            Exposure::Module => format!("function M.{}", set.lua_name),
            Exposure::MethodTable(record) => {
                format!("function {}_methods:{}", record, set.lua_name)
            }
        };
        let has_self = match exposure {
            Exposure::Module => false,
            Exposure::MethodTable(_) => true,
        };
        if set.kind == LuaBindingKind::Destructor {
            let member = set
                .members
                .first()
                .ok_or_else(|| format_err!("empty overload set: {}", set.lua_name))?;
            writeln!(out, "{}()", header)?;
            writeln!(out, "    ffi.gc(self, nil)")?;
            writeln!(out, "    C.{}(self)", self.symbol(member))?;
            writeln!(out, "end")?;
            writeln!(out)?;
            return Ok(());
        }
        if set.members.len() == 1 {
            self.write_single(out, set, &header, has_self)?;
        } else {
            self.write_dispatcher(out, set, &header, has_self)?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_single(
        &self,
        out: &mut String,
        set: &LuaOverloadSet,
        header: &str,
        has_self: bool,
    ) -> Result<()> {
        let member = &set.members[0];
        let arguments = self.argument_names(member);
        writeln!(out, "{}({})", header, arguments.join(", "))?;
        let min = member.min_arity();
        for (offset, literal) in member.trailing_defaults.iter().enumerate() {
            // an omitted argument arrives as nil
            if literal != "nil" {
                writeln!(
                    out,
                    "    if {0} == nil then {0} = {1} end",
                    arguments[min + offset], literal
                )?;
            }
        }
        let call = self.call_expression(member, &arguments, has_self)?;
        writeln!(out, "    return {}", call)?;
        writeln!(out, "end")?;
        Ok(())
    }

    fn write_dispatcher(
        &self,
        out: &mut String,
        set: &LuaOverloadSet,
        header: &str,
        has_self: bool,
    ) -> Result<()> {
        writeln!(out, "{}(...)", header)?;
        writeln!(out, "    local n = select(\"#\", ...)")?;

        let mut arities: BTreeMap<usize, Vec<&LuaMember>> = BTreeMap::new();
        for member in &set.members {
            for arity in member.min_arity()..=member.full_arity() {
                arities.entry(arity).or_default().push(member);
            }
        }

        let mut first = true;
        for (&arity, candidates) in &arities {
            let guard = if first { "if" } else { "elseif" };
            first = false;
            writeln!(out, "    {} n == {} then", guard, arity)?;
            if arity > 0 {
                let locals = (1..=arity).map(|i| format!("a{}", i)).join(", ");
                writeln!(out, "        local {} = ...", locals)?;
            }

            // narrower candidates are checked first; the last one takes
            // whatever remains
            let mut ordered = candidates.clone();
            ordered.sort_by_key(|member| {
                std::cmp::Reverse(
                    member.arg_tags[..arity]
                        .iter()
                        .filter(|tag| tag.is_some())
                        .count(),
                )
            });

            let call_arguments = |member: &LuaMember| -> Vec<String> {
                let mut arguments = (1..=arity).map(|i| format!("a{}", i)).collect_vec();
                let min = member.min_arity();
                arguments.extend(
                    member.trailing_defaults[arity - min..]
                        .iter()
                        .cloned(),
                );
                arguments
            };

            for (position, member) in ordered.iter().enumerate() {
                let call = self.call_expression(member, &call_arguments(member), has_self)?;
                if position + 1 == ordered.len() {
                    writeln!(out, "        return {}", call)?;
                } else {
                    let checks = member.arg_tags[..arity]
                        .iter()
                        .enumerate()
                        .filter_map(|(index, tag)| {
                            tag.as_ref()
                                .map(|tag| type_check_expression(&format!("a{}", index + 1), tag))
                        })
                        .join(" and ");
                    writeln!(out, "        if {} then", checks)?;
                    writeln!(out, "            return {}", call)?;
                    writeln!(out, "        end")?;
                }
            }
        }
        writeln!(out, "    end")?;
        writeln!(
            out,
            "    error(\"{}: no overload accepts \" .. n .. \" argument(s)\", 2)",
            set.short_text()
        )?;
        writeln!(out, "end")?;
        Ok(())
    }
}

/// Generates the wrapper module text.
pub fn generate_wrapper(db: &Database) -> Result<String> {
    let generator = WrapperGenerator::new(db);
    let mut out = String::new();
    writeln!(
        out,
        "-- {} wrapper module. Generated by cpp_to_lua; do not edit.",
        db.library_name()
    )?;
    writeln!(out)?;
    writeln!(out, "local ffi = require(\"ffi\")")?;
    writeln!(out, "local C = ffi.C")?;
    writeln!(out)?;
    writeln!(out, "local M = {{}}")?;
    writeln!(out)?;

    write_enum_tables(&mut out, db)?;

    let mut emitted = vec![false; db.lua_items().len()];

    // records in registration order, each with its methods, metatype,
    // constructors and statics
    for type_name in db.ffi_type_names() {
        let record = &type_name.ffi_name;
        let record_sets: Vec<(usize, &LuaOverloadSet)> = db
            .lua_items()
            .iter()
            .enumerate()
            .filter(|(_, set)| set.record.as_ref() == Some(record))
            .collect_vec();
        if record_sets.is_empty() {
            continue;
        }

        let usable_methods = record_sets
            .iter()
            .copied()
            .filter(|(_, set)| {
                let is_method = matches!(
                    set.kind,
                    LuaBindingKind::Method | LuaBindingKind::Destructor
                );
                is_method && !set.is_ambiguous
            })
            .collect_vec();
        if !usable_methods.is_empty() {
            writeln!(out, "local {}_methods = {{}}", record)?;
            writeln!(out)?;
            for (index, set) in usable_methods {
                generator.write_set(&mut out, set, &Exposure::MethodTable(record))?;
                emitted[index] = true;
            }
            writeln!(
                out,
                "ffi.metatype(\"{0}\", {{ __index = {0}_methods }})",
                record
            )?;
            writeln!(out)?;
        }

        for (index, set) in record_sets {
            if emitted[index] {
                continue;
            }
            emitted[index] = true;
            if set.is_ambiguous {
                debug!("skipping ambiguous overload set: {}", set.short_text());
                continue;
            }
            generator.write_set(&mut out, set, &Exposure::Module)?;
        }
    }

    // free functions
    for (index, set) in db.lua_items().iter().enumerate() {
        if emitted[index] {
            continue;
        }
        if set.is_ambiguous {
            debug!("skipping ambiguous overload set: {}", set.short_text());
            continue;
        }
        generator.write_set(&mut out, set, &Exposure::Module)?;
    }

    writeln!(out, "return M")?;
    Ok(out)
}

fn write_enum_tables(out: &mut String, db: &Database) -> Result<()> {
    for item in db.cpp_items() {
        let declaration = match item.cpp_item.as_type_ref() {
            Some(declaration) => declaration,
            None => continue,
        };
        if !matches!(declaration.kind, CppTypeDeclarationKind::Enum { .. }) {
            continue;
        }
        let ffi_name = match db.find_ffi_type_name(&declaration.path) {
            Some(name) => &name.ffi_name,
            None => continue,
        };
        if is_plain_lua_name(ffi_name) {
            writeln!(out, "M.{} = {{", ffi_name)?;
        } else {
            writeln!(out, "M[\"{}\"] = {{", ffi_name)?;
        }
        let values = db
            .cpp_items()
            .iter()
            .filter_map(|other| other.cpp_item.as_enum_value_ref())
            .filter(|value| value.path.parent().ok().as_ref() == Some(&declaration.path));
        for value in values {
            writeln!(
                out,
                "    {} = {},",
                lua_table_key(value.short_name()),
                value.value
            )?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;
    }
    Ok(())
}
