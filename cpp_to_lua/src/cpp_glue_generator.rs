//! Rendering of the host glue translation unit (`<lib>_host_gen.cpp`).
//!
//! The glue file defines every flat symbol as an `extern "C"` function
//! that calls the real C++ entity. It is the only generated artifact
//! compiled by a C++ compiler; the declaration list and the wrapper
//! module merely describe its exports.

use crate::config::Config;
use crate::cpp_ffi_data::{CppFfiArgumentMeaning, CppFfiFunction, CppTypeConversionToFfi};
use crate::cpp_type::CppType;
use crate::database::{CppFfiDatabaseItem, Database};
use cpp_to_lua_common::errors::{err_msg, Result};
use cpp_to_lua_common::file_utils::path_to_str;
use cpp_to_lua_common::utils::MapIfOk;
use std::fmt::Write;

struct Generator<'a>(&'a Database);

impl Generator<'_> {
    /// Generates function name, return type and arguments list
    /// as they appear in the exported definition.
    fn function_signature(&self, function: &CppFfiFunction) -> Result<String> {
        let mut arg_texts = Vec::new();
        for arg in &function.arguments {
            arg_texts.push(arg.to_cpp_code()?);
        }
        let name_with_args = format!("{}({})", function.path.to_cpp_code()?, arg_texts.join(", "));
        let return_type = function.return_type.ffi_type();
        let r = if let CppType::FunctionPointer(..) = return_type {
            return_type.to_cpp_code(Some(&name_with_args))?
        } else {
            format!("{} {}", return_type.to_cpp_code(None)?, name_with_args)
        };
        Ok(r)
    }

    /// Generates code for values passed to the original C++ entity.
    /// Arguments lowered from values or references are dereferenced.
    fn arguments_values(&self, function: &CppFfiFunction) -> Result<String> {
        let r = function
            .arguments
            .iter()
            .filter(|arg| arg.meaning.is_argument())
            .map_if_ok(|argument| -> Result<_> {
                let mut result = argument.name.clone();
                match argument.argument_type.conversion() {
                    CppTypeConversionToFfi::ValueToPointer { .. }
                    | CppTypeConversionToFfi::ReferenceToPointer => result = format!("*{}", result),
                    CppTypeConversionToFfi::NoChange => {}
                }
                Ok(result)
            })?;
        Ok(r.join(", "))
    }

    /// Wraps `expression` of the return type's original form so that it
    /// produces a value of the FFI form.
    fn convert_return_expression(
        &self,
        function: &CppFfiFunction,
        is_constructor: bool,
        expression: String,
    ) -> Result<String> {
        let mut result = expression;
        match function.return_type.conversion() {
            CppTypeConversionToFfi::NoChange => {}
            CppTypeConversionToFfi::ValueToPointer { .. } => {
                // Constructors already use `new`, which produces a pointer.
                if !is_constructor {
                    result = format!(
                        "new {}({})",
                        function.return_type.original_type().to_cpp_code(None)?,
                        result
                    );
                }
            }
            CppTypeConversionToFfi::ReferenceToPointer => {
                result = format!("&{}", result);
            }
        }
        Ok(result)
    }

    /// Generates the expression evaluated by the exported function.
    fn returned_expression(&self, item: &CppFfiDatabaseItem) -> Result<String> {
        let source_item = self.0.source_cpp_item(item)?;
        let cpp_function = source_item
            .cpp_item
            .as_function_ref()
            .ok_or_else(|| err_msg("source of an ffi function must be a function"))?;

        let function = &item.function;
        let result = if cpp_function.is_constructor() {
            format!(
                "new {}({})",
                cpp_function.class_type()?.to_cpp_code()?,
                self.arguments_values(function)?
            )
        } else if let Some(arg) = function
            .arguments
            .iter()
            .find(|x| x.meaning == CppFfiArgumentMeaning::This)
        {
            format!(
                "{}->{}({})",
                arg.name,
                cpp_function.path.last().to_cpp_code()?,
                self.arguments_values(function)?
            )
        } else {
            format!(
                "{}({})",
                cpp_function.path.to_cpp_code()?,
                self.arguments_values(function)?
            )
        };
        self.convert_return_expression(function, cpp_function.is_constructor(), result)
    }

    /// Generates the body of one exported function.
    fn source_body(&self, item: &CppFfiDatabaseItem) -> Result<String> {
        let source_item = self.0.source_cpp_item(item)?;
        let cpp_function = source_item
            .cpp_item
            .as_function_ref()
            .ok_or_else(|| err_msg("source of an ffi function must be a function"))?;

        if cpp_function.is_destructor() {
            let this_arg = item
                .function
                .arguments
                .iter()
                .find(|x| x.meaning == CppFfiArgumentMeaning::This)
                .ok_or_else(|| err_msg("destructor must have a this argument"))?;
            Ok(format!("delete {};\n", this_arg.name))
        } else {
            Ok(format!(
                "{}{};\n",
                if item.function.return_type.ffi_type().is_void() {
                    ""
                } else {
                    "return "
                },
                self.returned_expression(item)?
            ))
        }
    }

    fn function_implementation(&self, item: &CppFfiDatabaseItem) -> Result<String> {
        Ok(format!(
            "FFI_EXPORT {} {{\n  {}}}\n",
            self.function_signature(&item.function)?,
            self.source_body(item)?
        ))
    }
}

/// Renders the whole host glue translation unit.
pub fn generate_glue(config: &Config, db: &Database) -> Result<String> {
    let generator = Generator(db);
    let mut out = String::new();
    writeln!(
        out,
        "// {} host glue. Generated by cpp_to_lua; do not edit.",
        db.library_name()
    )?;
    writeln!(out)?;
    for directive in config.include_directives() {
        writeln!(out, "#include \"{}\"", path_to_str(directive)?)?;
    }
    writeln!(out)?;
    writeln!(out, "#ifdef _MSC_VER")?;
    writeln!(out, "#define FFI_EXPORT __declspec(dllexport)")?;
    writeln!(out, "#else")?;
    writeln!(out, "#define FFI_EXPORT __attribute__((visibility(\"default\")))")?;
    writeln!(out, "#endif")?;
    writeln!(out)?;
    writeln!(out, "extern \"C\" {{")?;
    writeln!(out)?;
    for item in db.ffi_items() {
        writeln!(out, "{}", generator.function_implementation(item)?)?;
    }
    writeln!(out, "}} // extern \"C\"")?;
    Ok(out)
}
