//! Rendering of the flat C declaration list (`<library>_gen.h`).
//!
//! The file has a fixed layout: forward declarations for every record
//! first, then enum and record definitions in declaration order, then
//! typedefs, then function signatures in FFI registration order. Every
//! name is declared before its first use, so the whole text can be fed
//! to `ffi.cdef` in one piece.

use crate::cpp_data::{
    CppAnonymousGroup, CppAnonymousGroupKind, CppEnumValue, CppPath, CppTypeDeclarationKind,
};
use crate::cpp_type::{
    CppBuiltInNumericType, CppFunctionPointerType, CppPointerLikeTypeKind, CppType, TargetWidths,
};
use crate::database::{Database, DatabaseItemSource};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::{bail, err_msg, format_err, Result};
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;
use std::fmt::Write;

/// Renders an FFI type as C source for the declaration list. If
/// `declarator_name` is present, a declaration of that name is produced
/// instead of a bare type. Array and function pointer types require a
/// declarator name because their C syntax wraps it.
pub fn cdef_type(
    type1: &CppType,
    declarator_name: Option<&str>,
    db: &Database,
    widths: &TargetWidths,
) -> Result<String> {
    match type1 {
        CppType::Void
        | CppType::BuiltInNumeric(_)
        | CppType::SpecificNumeric(_)
        | CppType::PointerSizedInteger { .. }
        | CppType::Enum { .. }
        | CppType::Class(_)
        | CppType::PointerLike { .. } => {
            let type_code = plain_cdef_type(type1, db, widths)?;
            match declarator_name {
                Some(name) => Ok(format!("{} {}", type_code, name)),
                None => Ok(type_code),
            }
        }
        CppType::TemplateParameter { .. } => {
            bail!("template parameters are not allowed in the declaration list");
        }
        CppType::Array { element, length } => {
            let name = declarator_name.ok_or_else(|| {
                err_msg("array types can only be rendered with a declarator name")
            })?;
            cdef_type(element, Some(&format!("{}[{}]", name, length)), db, widths)
        }
        CppType::FunctionPointer(CppFunctionPointerType {
            return_type,
            arguments,
            allows_variadic_arguments,
        }) => {
            if *allows_variadic_arguments {
                bail!("function pointers with variadic arguments are not supported");
            }
            let name = declarator_name.ok_or_else(|| {
                err_msg("function pointer types can only be rendered with a declarator name")
            })?;
            let mut arg_texts = Vec::new();
            for arg in arguments {
                arg_texts.push(cdef_type(arg, None, db, widths)?);
            }
            Ok(format!(
                "{} (*{})({})",
                cdef_type(return_type, None, db, widths)?,
                name,
                arg_texts.join(", ")
            ))
        }
    }
}

/// Name of an enumerator inside the C enum definition. Enumerators
/// live in the global C identifier namespace, so they are prefixed
/// with the enum's own FFI name.
pub fn enumerator_cdef_name(enum_ffi_name: &str, value: &CppEnumValue) -> String {
    format!("{}_{}", enum_ffi_name, value.short_name())
}

fn plain_cdef_type(type1: &CppType, db: &Database, widths: &TargetWidths) -> Result<String> {
    match type1 {
        CppType::Void => Ok("void".to_string()),
        CppType::BuiltInNumeric(t) => t.to_cdef_code(widths),
        // fixed-width and pointer-sized integer names are predefined
        // by the FFI loader
        CppType::SpecificNumeric(t) => Ok(t.path.last().name.clone()),
        CppType::PointerSizedInteger { path, .. } => Ok(path.last().name.clone()),
        CppType::Enum { path } | CppType::Class(path) => {
            let name = db.find_ffi_type_name(path).ok_or_else(|| {
                format_err!("no FFI name assigned to {}", path.to_cpp_pseudo_code())
            })?;
            Ok(name.ffi_name.clone())
        }
        CppType::PointerLike {
            kind,
            is_const,
            target,
        } => {
            match kind {
                CppPointerLikeTypeKind::Pointer => {}
                CppPointerLikeTypeKind::Reference | CppPointerLikeTypeKind::RValueReference => {
                    bail!("references cannot appear in the declaration list");
                }
            }
            Ok(format!(
                "{}{}*",
                if *is_const { "const " } else { "" },
                plain_cdef_type(target, db, widths)?
            ))
        }
        _ => bail!("not a plain type: {:?}", type1),
    }
}

/// Generates the declaration list text.
pub fn generate_cdef(data: &mut ProcessorData<'_>) -> Result<String> {
    let widths = data.config.ffi_widths();
    let db = &*data.db;
    let mut out = String::new();
    writeln!(
        out,
        "/* {} FFI declarations. Generated by cpp_to_lua; do not edit. */",
        db.library_name()
    )?;
    writeln!(out)?;

    // is_union per declared record, for the forward declaration keyword
    let declared_records: HashMap<&CppPath, bool> = db
        .cpp_items()
        .iter()
        .filter_map(|item| item.cpp_item.as_type_ref())
        .filter_map(|declaration| match &declaration.kind {
            CppTypeDeclarationKind::Class { is_union, .. } => Some((&declaration.path, *is_union)),
            _ => None,
        })
        .collect();

    for name in db.ffi_type_names() {
        match declared_records.get(&name.path) {
            Some(&is_union) => {
                let keyword = if is_union { "union" } else { "struct" };
                writeln!(out, "typedef {} {1} {1};", keyword, name.ffi_name)?;
            }
            None if name.is_opaque => {
                writeln!(out, "typedef struct {0} {0};", name.ffi_name)?;
            }
            // enums have no forward declarations
            None => {}
        }
    }
    writeln!(out)?;

    for item in db.cpp_items() {
        let declaration = match item.cpp_item.as_type_ref() {
            Some(declaration) => declaration,
            None => continue,
        };
        let ffi_name = match db.find_ffi_type_name(&declaration.path) {
            Some(name) => name,
            None => continue,
        };
        match &declaration.kind {
            CppTypeDeclarationKind::Enum { underlying } => {
                write_enum_definition(
                    &mut out,
                    db,
                    widths,
                    &declaration.path,
                    &ffi_name.ffi_name,
                    underlying,
                )?;
            }
            CppTypeDeclarationKind::Class { is_union, .. } => {
                if ffi_name.is_opaque {
                    continue;
                }
                let keyword = if *is_union { "union" } else { "struct" };
                writeln!(out, "{} {} {{", keyword, ffi_name.ffi_name)?;
                write_record_fields(&mut out, db, widths, &declaration.path)?;
                writeln!(out, "}};")?;
                writeln!(out)?;
            }
        }
    }

    write_typedefs(&mut out, data)?;

    let db = &*data.db;
    for item in db.ffi_items() {
        let function = &item.function;
        let return_text = cdef_type(function.return_type.ffi_type(), None, db, widths)?;
        let arg_texts = function
            .arguments
            .iter()
            .map(|arg| cdef_type(arg.argument_type.ffi_type(), Some(&arg.name), db, widths))
            .collect::<Result<Vec<_>>>()?;
        let arg_list = if arg_texts.is_empty() {
            "void".to_string()
        } else {
            arg_texts.join(", ")
        };
        writeln!(
            out,
            "{} {}({});",
            return_text,
            function.path.last().name,
            arg_list
        )?;
    }

    Ok(out)
}

fn write_enum_definition(
    out: &mut String,
    db: &Database,
    widths: &TargetWidths,
    path: &CppPath,
    ffi_name: &str,
    underlying: &CppType,
) -> Result<()> {
    // only int-backed enums can use a plain C enum definition; other
    // widths are declared through an integer typedef
    if underlying == &CppType::BuiltInNumeric(CppBuiltInNumericType::Int) {
        let values = db
            .cpp_items()
            .iter()
            .filter_map(|item| item.cpp_item.as_enum_value_ref())
            .filter(|value| value.path.parent().ok().as_ref() == Some(path))
            .collect_vec();
        writeln!(out, "typedef enum {{")?;
        for value in &values {
            writeln!(
                out,
                "    {} = {},",
                enumerator_cdef_name(ffi_name, value),
                value.value
            )?;
        }
        writeln!(out, "}} {};", ffi_name)?;
    } else {
        let underlying_text = cdef_type(underlying, Some(ffi_name), db, widths)?;
        writeln!(out, "typedef {};", underlying_text)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_record_fields(
    out: &mut String,
    db: &Database,
    widths: &TargetWidths,
    class_path: &CppPath,
) -> Result<()> {
    let fields = db
        .cpp_items()
        .iter()
        .filter_map(|item| item.cpp_item.as_field_ref())
        .filter(|field| {
            !field.is_static && field.path.parent().ok().as_ref() == Some(class_path)
        })
        .collect_vec();

    let mut current_group: Option<&CppAnonymousGroup> = None;
    for field in fields {
        if field.anonymous_group.as_ref() != current_group {
            if current_group.is_some() {
                writeln!(out, "    }};")?;
            }
            if let Some(group) = &field.anonymous_group {
                let keyword = match group.kind {
                    CppAnonymousGroupKind::Union => "union",
                    CppAnonymousGroupKind::Struct => "struct",
                };
                writeln!(out, "    {} {{", keyword)?;
            }
            current_group = field.anonymous_group.as_ref();
        }
        let indent = if current_group.is_some() {
            "        "
        } else {
            "    "
        };
        let field_text = cdef_type(
            &field.field_type,
            Some(&field.path.last().name),
            db,
            widths,
        )?;
        writeln!(out, "{}{};", indent, field_text)?;
    }
    if current_group.is_some() {
        writeln!(out, "    }};")?;
    }
    Ok(())
}

fn write_typedefs(out: &mut String, data: &mut ProcessorData<'_>) -> Result<()> {
    let widths = data.config.ffi_widths();
    let db = &*data.db;
    let mut skipped = Vec::new();
    let mut lines = Vec::new();
    for item in db.cpp_items() {
        let typedef = match item.cpp_item.as_typedef_ref() {
            Some(typedef) => typedef,
            None => continue,
        };
        let name = &typedef.path.last().name;
        match cdef_type(&typedef.target, Some(name), db, widths) {
            Ok(text) => {
                // `typedef struct Foo Foo;` in the source becomes a
                // self-alias once the record name is assigned; the
                // forward declaration already covers it
                if plain_cdef_type(&typedef.target, db, widths).ok().as_deref()
                    == Some(name.as_str())
                {
                    debug!("skipping self-referential typedef: {}", name);
                    continue;
                }
                lines.push(format!("typedef {};", text));
            }
            Err(error) => {
                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::UnmappableType,
                    format!("typedef {}", typedef.path.to_cpp_pseudo_code()),
                    error.to_string(),
                );
                if let DatabaseItemSource::CppParser {
                    origin_location, ..
                } = &item.source
                {
                    diagnostic = diagnostic.with_location(origin_location.clone());
                }
                skipped.push(diagnostic);
            }
        }
    }
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    writeln!(out)?;
    for diagnostic in skipped {
        data.db.add_diagnostic(diagnostic);
    }
    Ok(())
}
