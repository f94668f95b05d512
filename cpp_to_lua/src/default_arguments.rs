//! Default argument synthesis. A C++ default argument has no FFI
//! counterpart: the flat declaration always takes the full argument
//! list. The wrapper restores the shorter call forms by substituting a
//! Lua literal for every omitted trailing argument, and this module
//! decides which default expressions can be turned into such literals.

use crate::cpp_function::CppFunction;
use crate::cpp_type::{CppBuiltInNumericType, CppPointerLikeTypeKind, CppType};
use crate::database::{Database, DatabaseItemSource};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::{bail, format_err, Result};
use itertools::Itertools;
use log::trace;
use regex::Regex;

/// A trailing default that could not be converted. Calls with this
/// argument omitted are not available through the wrapper.
#[derive(Debug)]
pub struct DefaultFailure {
    /// Zero-based position of the argument.
    pub position: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct ConvertedDefaults {
    /// Lua literals for the convertible trailing defaults, in argument
    /// order.
    pub literals: Vec<String>,
    /// First unconvertible default, scanning from the last argument
    /// backwards. Defaults before it are unusable as well because
    /// arguments can only be omitted from the end.
    pub failure: Option<DefaultFailure>,
}

/// Converts the trailing default values of `function` to Lua literals.
/// The scan runs from the last argument backwards and stops at the
/// first default that has no literal form.
pub fn convert_trailing_defaults(function: &CppFunction, db: &Database) -> ConvertedDefaults {
    let mut literals = Vec::new();
    let mut failure = None;
    for (position, argument) in function.arguments.iter().enumerate().rev() {
        let expression = match &argument.default_value {
            Some(expression) => expression,
            None => break,
        };
        match default_to_lua_literal(expression, &argument.argument_type, db) {
            Ok(literal) => literals.push(literal),
            Err(error) => {
                trace!(
                    "default value `{}` of {} has no literal form: {}",
                    expression,
                    function.short_text(),
                    error
                );
                failure = Some(DefaultFailure {
                    position,
                    reason: error.to_string(),
                });
                break;
            }
        }
    }
    literals.reverse();
    ConvertedDefaults { literals, failure }
}

fn is_const_char_pointer(type1: &CppType) -> bool {
    if let CppType::PointerLike {
        kind: CppPointerLikeTypeKind::Pointer,
        is_const: true,
        target,
    } = type1
    {
        **target == CppType::BuiltInNumeric(CppBuiltInNumericType::Char)
    } else {
        false
    }
}

fn default_to_lua_literal(
    expression: &str,
    argument_type: &CppType,
    db: &Database,
) -> Result<String> {
    let expression = expression.trim();

    let is_pointer = match argument_type {
        CppType::PointerLike { .. } | CppType::FunctionPointer(_) => true,
        _ => false,
    };
    if is_pointer {
        if expression == "nullptr" || expression == "NULL" || expression == "0" {
            return Ok("nil".to_string());
        }
        if is_const_char_pointer(argument_type)
            && expression.len() >= 2
            && expression.starts_with('"')
            && expression.ends_with('"')
        {
            return Ok(expression.to_string());
        }
        bail!("only null pointers and string literals are supported for pointer arguments");
    }

    if expression == "true" || expression == "false" {
        if let CppType::BuiltInNumeric(CppBuiltInNumericType::Bool) = argument_type {
            return Ok(expression.to_string());
        }
        // bool constant initializing a numeric argument
        return Ok(if expression == "true" { "1" } else { "0" }.to_string());
    }

    let integer = Regex::new(r"^[+-]?(0[xX][0-9a-fA-F]+|[0-9]+)[uUlL]*$")?;
    if let Some(captures) = integer.captures(expression) {
        let body = &captures[1];
        let sign = if expression.starts_with('-') { "-" } else { "" };
        if body.len() > 1
            && body.starts_with('0')
            && !body.starts_with("0x")
            && !body.starts_with("0X")
        {
            // Lua has no octal literals
            if body[1..].bytes().all(|byte| (b'0'..=b'7').contains(&byte)) {
                let value = i64::from_str_radix(&body[1..], 8)?;
                return Ok(format!("{}{}", sign, value));
            }
            bail!("`{}` is not a valid integer literal", expression);
        }
        return Ok(format!("{}{}", sign, body));
    }

    let float =
        Regex::new(r"^[+-]?([0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)([eE][+-]?[0-9]+)?[fFlL]?$")?;
    if float.is_match(expression) {
        let mut literal = expression
            .trim_start_matches('+')
            .trim_end_matches(|c| c == 'f' || c == 'F' || c == 'l' || c == 'L')
            .to_string();
        if literal.ends_with('.') {
            literal.push('0');
        }
        return Ok(literal);
    }

    if expression.starts_with('\'') && expression.ends_with('\'') {
        let chars = expression.chars().collect_vec();
        if chars.len() == 3 && chars[1].is_ascii() && chars[1] != '\\' {
            return Ok((chars[1] as u32).to_string());
        }
        bail!("unsupported character literal: {}", expression);
    }

    let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")?;
    if identifier.is_match(expression) {
        let last_segment = expression.rsplit("::").next().unwrap_or(expression);
        if let CppType::Enum { path } = argument_type {
            let value = db
                .cpp_items()
                .iter()
                .filter_map(|item| item.cpp_item.as_enum_value_ref())
                .find(|value| {
                    value.path.parent().ok().as_ref() == Some(path)
                        && value.short_name() == last_segment
                })
                .ok_or_else(|| {
                    format_err!(
                        "cannot resolve `{}` as a value of {}",
                        expression,
                        path.to_cpp_pseudo_code()
                    )
                })?;
            return Ok(value.value.to_string());
        }
        // enumerator initializing a numeric argument
        let candidates = db
            .cpp_items()
            .iter()
            .filter_map(|item| item.cpp_item.as_enum_value_ref())
            .filter(|value| value.short_name() == last_segment)
            .collect_vec();
        match candidates.len() {
            1 => return Ok(candidates[0].value.to_string()),
            0 => bail!("cannot resolve `{}` as an enumerator", expression),
            _ => bail!("`{}` matches enumerators of multiple enums", expression),
        }
    }

    bail!("the expression has no Lua literal form");
}

/// Fills in the wrapper-level default literals for every binding and
/// reports the defaults that could not be converted.
pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    let mut updates = Vec::new();
    let mut diagnostics = Vec::new();

    let db = &*data.db;
    for (set_index, set) in db.lua_items().iter().enumerate() {
        for (member_index, member) in set.members.iter().enumerate() {
            let ffi_item = &db.ffi_items()[member.ffi_index];
            let source_item = db.source_cpp_item(ffi_item)?;
            let function = source_item
                .cpp_item
                .as_function_ref()
                .ok_or_else(|| {
                    format_err!("ffi item {} has a non-function source", member.ffi_index)
                })?;
            let converted = convert_trailing_defaults(function, db);
            if let Some(failure) = converted.failure {
                let argument_name = &function.arguments[failure.position].name;
                let expression = function.arguments[failure.position]
                    .default_value
                    .as_deref()
                    .unwrap_or("");
                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::UnresolvableDefault,
                    function.short_text(),
                    format!(
                        "default value `{}` of argument `{}`: {}; \
                         wrapper calls must pass at least {} argument(s)",
                        expression,
                        argument_name,
                        failure.reason,
                        failure.position + 1
                    ),
                );
                if let DatabaseItemSource::CppParser {
                    origin_location, ..
                } = &source_item.source
                {
                    diagnostic = diagnostic.with_location(origin_location.clone());
                }
                diagnostics.push(diagnostic);
            }
            if !converted.literals.is_empty() {
                updates.push((set_index, member_index, converted.literals));
            }
        }
    }

    for (set_index, member_index, literals) in updates {
        data.db.lua_items_mut()[set_index].members[member_index].trailing_defaults = literals;
    }
    for diagnostic in diagnostics {
        data.db.add_diagnostic(diagnostic);
    }
    Ok(())
}
