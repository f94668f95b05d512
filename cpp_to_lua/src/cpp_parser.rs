//! Implementation of the C++ parser that extracts information
//! about the C++ library's API from its headers using libclang.
//! Raw `clang` entities are converted to `CppItem` values at this
//! boundary; no later stage sees `clang` types.

use crate::config::Config;
use crate::cpp_data::{
    CppAnonymousGroup, CppAnonymousGroupKind, CppClassField, CppEnumValue, CppItem,
    CppOriginLocation, CppPath, CppPathItem, CppTypeDeclaration, CppTypeDeclarationKind,
    CppTypedef, CppVisibility,
};
use crate::cpp_function::{
    CppFunction, CppFunctionArgument, CppFunctionKind, CppFunctionMemberData,
};
use crate::cpp_type::{
    CppBuiltInNumericType, CppFunctionPointerType, CppPointerLikeTypeKind,
    CppSpecificNumericType, CppSpecificNumericTypeKind, CppType,
};
use crate::database::DatabaseItemSource;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::processor::ProcessorData;
use clang::diagnostic::Severity;
use clang::{Accessibility, Clang, Entity, EntityKind, Index, Type, TypeKind};
use cpp_to_lua_common::errors::{bail, err_msg, format_err, Result, ResultExt};
use cpp_to_lua_common::file_utils::{create_file, path_to_str};
use itertools::Itertools;
use log::{debug, info, warn};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempdir::TempDir;

fn entity_log_representation(entity: Entity<'_>) -> String {
    match get_path(entity) {
        Ok(path) => path.to_cpp_pseudo_code(),
        Err(_) => format!("{:?}", entity),
    }
}

fn convert_type_kind(kind: TypeKind) -> CppBuiltInNumericType {
    match kind {
        TypeKind::Bool => CppBuiltInNumericType::Bool,
        TypeKind::CharS | TypeKind::CharU => CppBuiltInNumericType::Char,
        TypeKind::SChar => CppBuiltInNumericType::SChar,
        TypeKind::UChar => CppBuiltInNumericType::UChar,
        TypeKind::WChar => CppBuiltInNumericType::WChar,
        TypeKind::Char16 => CppBuiltInNumericType::Char16,
        TypeKind::Char32 => CppBuiltInNumericType::Char32,
        TypeKind::Short => CppBuiltInNumericType::Short,
        TypeKind::UShort => CppBuiltInNumericType::UShort,
        TypeKind::Int => CppBuiltInNumericType::Int,
        TypeKind::UInt => CppBuiltInNumericType::UInt,
        TypeKind::Long => CppBuiltInNumericType::Long,
        TypeKind::ULong => CppBuiltInNumericType::ULong,
        TypeKind::LongLong => CppBuiltInNumericType::LongLong,
        TypeKind::ULongLong => CppBuiltInNumericType::ULongLong,
        TypeKind::Int128 => CppBuiltInNumericType::Int128,
        TypeKind::UInt128 => CppBuiltInNumericType::UInt128,
        TypeKind::Float => CppBuiltInNumericType::Float,
        TypeKind::Double => CppBuiltInNumericType::Double,
        TypeKind::LongDouble => CppBuiltInNumericType::LongDouble,
        _ => unreachable!(),
    }
}

fn convert_accessibility(accessibility: Option<Accessibility>) -> CppVisibility {
    match accessibility.unwrap_or(Accessibility::Public) {
        Accessibility::Public => CppVisibility::Public,
        Accessibility::Protected => CppVisibility::Protected,
        Accessibility::Private => CppVisibility::Private,
    }
}

/// Extract `clang`'s location information for `entity` to `CppOriginLocation`.
fn get_origin_location(entity: Entity<'_>) -> Result<CppOriginLocation> {
    match entity.get_location() {
        Some(loc) => {
            let location = loc.get_presumed_location();
            Ok(CppOriginLocation {
                include_file_path: location.0,
                line: location.1,
                column: location.2,
            })
        }
        None => bail!("no info about location"),
    }
}

/// Returns the fully qualified path of `entity`.
fn get_path(entity: Entity<'_>) -> Result<CppPath> {
    let mut current_entity = entity;
    let mut items = match entity.get_name() {
        Some(name) => vec![CppPathItem::from_good_str(&name)],
        None => bail!("anonymous entity"),
    };
    while let Some(parent) = current_entity.get_semantic_parent() {
        match parent.get_kind() {
            EntityKind::ClassDecl
            | EntityKind::StructDecl
            | EntityKind::UnionDecl
            | EntityKind::Namespace
            | EntityKind::EnumDecl => {
                match parent.get_name() {
                    Some(name) => items.insert(0, CppPathItem::from_good_str(&name)),
                    None => bail!("anonymous nested entity"),
                }
                current_entity = parent;
            }
            EntityKind::ClassTemplate | EntityKind::ClassTemplatePartialSpecialization => {
                bail!("entity nested in a template");
            }
            EntityKind::Method => {
                bail!("entity nested in a method");
            }
            _ => break,
        }
    }
    Ok(CppPath::from_items(items))
}

/// Checks if the typedef `name` resolves to a known fixed-width type.
/// These names are predefined by the FFI loader, so they are kept
/// as-is instead of their expansion.
fn parse_special_typedef(name: &str) -> Option<CppType> {
    let int = |bits, is_signed| {
        Some(CppType::SpecificNumeric(CppSpecificNumericType {
            path: CppPath::from_good_str(name),
            bits,
            kind: CppSpecificNumericTypeKind::Integer { is_signed },
        }))
    };
    match name {
        "int8_t" => int(8, true),
        "uint8_t" => int(8, false),
        "int16_t" => int(16, true),
        "uint16_t" => int(16, false),
        "int32_t" => int(32, true),
        "uint32_t" => int(32, false),
        "int64_t" => int(64, true),
        "uint64_t" => int(64, false),
        "intptr_t" | "ptrdiff_t" | "ssize_t" => Some(CppType::PointerSizedInteger {
            path: CppPath::from_good_str(name),
            is_signed: true,
        }),
        "uintptr_t" | "size_t" => Some(CppType::PointerSizedInteger {
            path: CppPath::from_good_str(name),
            is_signed: false,
        }),
        _ => None,
    }
}

/// Converts a `clang` type to a `CppType`.
fn parse_type(type1: Type<'_>) -> Result<CppType> {
    if type1.is_volatile_qualified() {
        bail!("volatile type");
    }
    match type1.get_kind() {
        TypeKind::Typedef => {
            let name = {
                let mut name = type1.get_display_name();
                if name.starts_with("const ") {
                    name = name[6..].trim().to_string();
                }
                name
            };
            let parsed = parse_type(type1.get_canonical_type())?;
            if let CppType::BuiltInNumeric(..) = parsed {
                if let Some(r) = parse_special_typedef(&name) {
                    return Ok(r);
                }
            }
            Ok(parsed)
        }
        TypeKind::Void => Ok(CppType::Void),
        TypeKind::Bool
        | TypeKind::CharS
        | TypeKind::CharU
        | TypeKind::SChar
        | TypeKind::UChar
        | TypeKind::WChar
        | TypeKind::Char16
        | TypeKind::Char32
        | TypeKind::Short
        | TypeKind::UShort
        | TypeKind::Int
        | TypeKind::UInt
        | TypeKind::Long
        | TypeKind::ULong
        | TypeKind::LongLong
        | TypeKind::ULongLong
        | TypeKind::Int128
        | TypeKind::UInt128
        | TypeKind::Float
        | TypeKind::Double
        | TypeKind::LongDouble => Ok(CppType::BuiltInNumeric(convert_type_kind(
            type1.get_kind(),
        ))),
        TypeKind::Enum => {
            let declaration = type1
                .get_declaration()
                .ok_or_else(|| format_err!("failed to get enum declaration: {:?}", type1))?;
            Ok(CppType::Enum {
                path: get_path(declaration)?,
            })
        }
        TypeKind::Elaborated | TypeKind::Record => {
            let declaration = type1
                .get_declaration()
                .ok_or_else(|| format_err!("failed to get type declaration: {:?}", type1))?;
            if declaration.get_kind() == EntityKind::EnumDecl {
                return Ok(CppType::Enum {
                    path: get_path(declaration)?,
                });
            }
            if convert_accessibility(declaration.get_accessibility()) != CppVisibility::Public {
                bail!(
                    "type uses a private class: {}",
                    entity_log_representation(declaration)
                );
            }
            let mut path = get_path(declaration)?;
            if let Some(arg_types) = type1.get_template_argument_types() {
                if arg_types.is_empty() {
                    bail!("template argument list is empty: {:?}", type1);
                }
                let mut args = Vec::new();
                for arg_type in arg_types {
                    let arg_type = arg_type
                        .ok_or_else(|| err_msg("unsupported kind of template argument"))?;
                    args.push(parse_type(arg_type).with_context(|_| {
                        format!("invalid template argument: {:?}", arg_type)
                    })?);
                }
                let mut items = path.items().to_vec();
                if let Some(last) = items.last_mut() {
                    last.template_arguments = Some(args);
                }
                path = CppPath::from_items(items);
            }
            Ok(CppType::Class(path))
        }
        TypeKind::FunctionPrototype => {
            let argument_types = type1.get_argument_types().ok_or_else(|| {
                format_err!("failed to get argument types from function type: {:?}", type1)
            })?;
            let mut arguments = Vec::new();
            for arg_type in argument_types {
                arguments.push(parse_type(arg_type).with_context(|_| {
                    format!("failed to parse function type's argument type: {:?}", arg_type)
                })?);
            }
            let result_type = type1.get_result_type().ok_or_else(|| {
                format_err!("failed to get result type from function type: {:?}", type1)
            })?;
            let return_type = parse_type(result_type).with_context(|_| {
                format!("failed to parse function type's result type: {:?}", result_type)
            })?;
            Ok(CppType::FunctionPointer(CppFunctionPointerType {
                return_type: Box::new(return_type),
                arguments,
                allows_variadic_arguments: type1.is_variadic(),
            }))
        }
        TypeKind::Pointer | TypeKind::LValueReference | TypeKind::RValueReference => {
            let pointee = type1
                .get_pointee_type()
                .ok_or_else(|| err_msg("can't get pointee type"))?;
            let target = parse_type(pointee)?;
            if let CppType::FunctionPointer(..) = target {
                // the function pointer variant is already a pointer
                if type1.get_kind() == TypeKind::Pointer {
                    return Ok(target);
                }
                bail!("references to function pointers are not supported");
            }
            let kind = match type1.get_kind() {
                TypeKind::Pointer => CppPointerLikeTypeKind::Pointer,
                TypeKind::LValueReference => CppPointerLikeTypeKind::Reference,
                TypeKind::RValueReference => CppPointerLikeTypeKind::RValueReference,
                _ => unreachable!(),
            };
            Ok(CppType::PointerLike {
                kind,
                is_const: pointee.is_const_qualified(),
                target: Box::new(target),
            })
        }
        TypeKind::ConstantArray => {
            let element = type1
                .get_element_type()
                .ok_or_else(|| err_msg("can't get array element type"))?;
            let length = type1
                .get_size()
                .ok_or_else(|| err_msg("can't get array size"))?;
            Ok(CppType::Array {
                element: Box::new(parse_type(element)?),
                length,
            })
        }
        TypeKind::Unexposed => {
            let canonical = type1.get_canonical_type();
            if canonical.get_kind() != TypeKind::Unexposed {
                parse_type(canonical)
            } else {
                bail!("unexposed type is not resolvable: {:?}", type1);
            }
        }
        _ => bail!("unsupported kind of type: {:?}", type1.get_kind()),
    }
}

/// Returns the source text of the argument's default value, if any.
fn argument_default_value(argument_entity: Entity<'_>) -> Result<Option<String>> {
    let range = argument_entity.get_range().ok_or_else(|| {
        format_err!(
            "failed to get range from argument entity: {:?}",
            argument_entity
        )
    })?;
    let mut tokens = Vec::new();
    let mut seen_equals = false;
    for token in range.tokenize() {
        let spelling = token.get_spelling();
        if !seen_equals {
            if spelling == "=" {
                seen_equals = true;
            } else if spelling == "{" {
                // clang sometimes reports incorrect range for arguments
                break;
            }
        } else {
            tokens.push(spelling);
        }
    }
    if !seen_equals || tokens.is_empty() {
        return Ok(None);
    }
    Ok(Some(tokens.join("")))
}

fn init_clang() -> Result<Clang> {
    Clang::new().map_err(|err| format_err!("clang init failed: {}", err))
}

/// Runs the `clang` parser with `config`.
/// If successful, calls `f` and passes the topmost entity (the translation
/// unit) as its argument. Returns output value of `f` or an error.
fn run_clang<R, F: FnMut(Entity<'_>) -> Result<R>>(config: &Config, mut f: F) -> Result<R> {
    let clang = init_clang()?;
    let index = Index::new(&clang, false, false);
    let tmp_dir = TempDir::new("cpp_to_lua")?;
    let tmp_cpp_path = tmp_dir.path().join("input.cpp");
    {
        let mut tmp_file = create_file(&tmp_cpp_path)?;
        for directive in config.include_directives() {
            writeln!(tmp_file, "#include \"{}\"", path_to_str(directive)?)?;
        }
        tmp_file.flush()?;
    }
    let mut args = Vec::<String>::new();
    args.extend(config.cpp_parser_arguments().iter().cloned());
    for dir in config.include_paths() {
        args.push("-I".to_string());
        args.push(path_to_str(dir)?.to_string());
    }
    if let Ok(path) = env::var("CLANG_SYSTEM_INCLUDE_PATH") {
        if !PathBuf::from(&path).exists() {
            warn!(
                "CLANG_SYSTEM_INCLUDE_PATH environment variable is set to \"{}\" \
                 but this path does not exist",
                path
            );
            warn!("This may result in parse errors related to system header includes.");
        }
        args.push("-isystem".to_string());
        args.push(path);
    }
    debug!("clang arguments: {:?}", args);

    let tu = index
        .parser(&tmp_cpp_path)
        .arguments(&args)
        .parse()
        .map_err(|err| format_err!("clang parse failed: {}", err))?;
    let translation_unit = tu.get_entity();
    let diagnostics = tu.get_diagnostics();
    if !diagnostics.is_empty() {
        debug!("clang diagnostics:");
        for diag in &diagnostics {
            debug!("{}", diag);
        }
    }
    if diagnostics
        .iter()
        .any(|d| d.get_severity() == Severity::Error || d.get_severity() == Severity::Fatal)
    {
        bail!(
            "fatal clang error:\n{}",
            diagnostics.iter().map(|d| d.to_string()).join("\n")
        );
    }
    f(translation_unit)
}

/// Runs the parser on specified data.
pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    info!("Initializing clang");
    let config = data.config;
    let mut parser = CppParser { data };
    run_clang(config, |translation_unit| {
        info!("Parsing types");
        parser.parse_types(translation_unit);
        info!("Parsing functions");
        parser.parse_functions(translation_unit);
        Ok(())
    })
}

struct CppParser<'b, 'a> {
    data: &'b mut ProcessorData<'a>,
}

impl CppParser<'_, '_> {
    /// Determines file path of the include file this `entity` is located in.
    fn entity_include_path(&self, entity: Entity<'_>) -> Result<String> {
        if let Some(location) = entity.get_location() {
            let file_path = location.get_presumed_location().0;
            if file_path.is_empty() {
                bail!("empty file path")
            } else {
                Ok(file_path)
            }
        } else {
            bail!("no location for entity")
        }
    }

    /// Determines file name of the include file this `entity` is located in.
    fn entity_include_file(&self, entity: Entity<'_>) -> Result<String> {
        let file_path_buf = PathBuf::from(self.entity_include_path(entity)?);
        let file_name = file_path_buf
            .file_name()
            .ok_or_else(|| err_msg("no file name in file path"))?;
        Ok(file_name.to_string_lossy().into_owned())
    }

    fn parser_source(&self, entity: Entity<'_>) -> Result<DatabaseItemSource> {
        Ok(DatabaseItemSource::CppParser {
            include_file: self.entity_include_file(entity)?,
            origin_location: get_origin_location(entity)?,
        })
    }

    /// Returns false if this `entity` was blacklisted in some way.
    fn should_process_entity(&self, entity: Entity<'_>) -> bool {
        if entity.get_kind() == EntityKind::TranslationUnit {
            return true;
        }
        if let Ok(full_path) = get_path(entity) {
            if let Ok(file_path) = self.entity_include_path(entity) {
                let file_path_buf = PathBuf::from(&file_path);
                if !self.data.config.target_include_paths().is_empty()
                    && !self
                        .data
                        .config
                        .target_include_paths()
                        .iter()
                        .any(|x| file_path_buf.starts_with(x))
                {
                    return false;
                }
            }
            if self
                .data
                .config
                .cpp_parser_blocked_names()
                .iter()
                .any(|x| x == &full_path || x.to_templateless_string() == full_path.last().name)
            {
                return false;
            }
            let namespaces = self.data.config.target_namespaces();
            if !namespaces.is_empty() {
                let inside = namespaces.iter().any(|ns| ns.is_parent_of(&full_path));
                let leads_to_target = entity.get_kind() == EntityKind::Namespace
                    && namespaces.iter().any(|ns| full_path.is_parent_of(ns));
                if !inside && !leads_to_target {
                    return false;
                }
            }
        }
        true
    }

    fn add_unmappable_diagnostic(
        &mut self,
        entity: Entity<'_>,
        what: &str,
        error: &cpp_to_lua_common::errors::Error,
    ) {
        let message = format!(
            "failed to parse {}: {}",
            what,
            error.iter_chain().map(|c| c.to_string()).join(": ")
        );
        let mut diagnostic = Diagnostic::new(
            DiagnosticKind::UnmappableType,
            entity_log_representation(entity),
            message,
        );
        if let Ok(location) = get_origin_location(entity) {
            diagnostic = diagnostic.with_location(location);
        }
        self.data.db.add_diagnostic(diagnostic);
    }

    /// Parses an enum `entity`.
    fn parse_enum(&mut self, entity: Entity<'_>) -> Result<()> {
        let source = self.parser_source(entity).with_context(|_| {
            format!(
                "origin of type is unknown: {}",
                entity_log_representation(entity)
            )
        })?;
        let path = get_path(entity)?;
        let underlying = match entity.get_enum_underlying_type() {
            Some(t) => parse_type(t)
                .with_context(|_| "failed to parse enum underlying type")?,
            None => CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        };
        self.data.db.add_cpp_item(
            source,
            CppItem::Type(CppTypeDeclaration {
                path: path.clone(),
                kind: CppTypeDeclarationKind::Enum { underlying },
            }),
        );
        for child in entity.get_children() {
            if child.get_kind() == EntityKind::EnumConstantDecl {
                let value = child
                    .get_enum_constant_value()
                    .ok_or_else(|| err_msg("failed to get value of enum variant"))?;
                let name = child
                    .get_name()
                    .ok_or_else(|| err_msg("failed to get name of enum variant"))?;
                self.data.db.add_cpp_item(
                    self.parser_source(child)?,
                    CppItem::EnumValue(CppEnumValue {
                        path: path.join(CppPathItem::from_good_str(&name)),
                        value: value.0,
                    }),
                );
            }
        }
        Ok(())
    }

    /// Parses a class field `entity` and adds it to the database.
    fn parse_class_field(
        &mut self,
        entity: Entity<'_>,
        class_path: &CppPath,
        anonymous_group: Option<CppAnonymousGroup>,
        is_static: bool,
    ) -> Result<()> {
        let field_name = entity
            .get_name()
            .ok_or_else(|| err_msg("failed to get field name"))?;
        if entity.is_bit_field() {
            bail!("bit fields are not supported");
        }
        let field_clang_type = entity
            .get_type()
            .ok_or_else(|| err_msg("failed to get field type"))?;
        let field_type = parse_type(field_clang_type).with_context(|_| {
            format!(
                "failed to parse field type: {}::{}",
                class_path.to_cpp_pseudo_code(),
                field_name
            )
        })?;
        self.data.db.add_cpp_item(
            self.parser_source(entity)?,
            CppItem::ClassField(CppClassField {
                path: class_path.join(CppPathItem::from_good_str(&field_name)),
                field_type,
                visibility: convert_accessibility(entity.get_accessibility()),
                is_static,
                anonymous_group,
            }),
        );
        Ok(())
    }

    /// Parses a class or a struct `entity`.
    fn parse_class(&mut self, entity: Entity<'_>) -> Result<()> {
        let source = self.parser_source(entity).with_context(|_| {
            format!(
                "origin of type is unknown: {}",
                entity_log_representation(entity)
            )
        })?;
        let path = get_path(entity)?;
        if let Some(parent) = entity.get_semantic_parent() {
            if let EntityKind::ClassTemplate | EntityKind::ClassTemplatePartialSpecialization =
                parent.get_kind()
            {
                bail!("types nested into template types are not supported");
            }
        }
        let mut has_bases = false;
        let mut has_unsupported_fields = false;
        let mut anonymous_group_count = 0;
        let children = entity.get_children();
        for &child in &children {
            match child.get_kind() {
                EntityKind::FieldDecl => {
                    if let Err(error) = self.parse_class_field(child, &path, None, false) {
                        self.add_unmappable_diagnostic(child, "class field", &error);
                        has_unsupported_fields = true;
                    }
                }
                EntityKind::VarDecl => {
                    // static data member; not part of the layout
                    if let Err(error) = self.parse_class_field(child, &path, None, true) {
                        self.add_unmappable_diagnostic(child, "static class field", &error);
                    }
                }
                EntityKind::BaseSpecifier => {
                    has_bases = true;
                }
                EntityKind::StructDecl | EntityKind::UnionDecl
                    if child.get_name().is_none() && child.is_definition() =>
                {
                    // An anonymous record is either an anonymous member
                    // (its fields belong to the enclosing record) or the
                    // type of a named field declared right after it.
                    let is_field_type = children.iter().any(|sibling| {
                        sibling.get_kind() == EntityKind::FieldDecl
                            && sibling.get_type().and_then(|t| t.get_declaration())
                                == Some(child)
                    });
                    if is_field_type {
                        continue;
                    }
                    let group = CppAnonymousGroup {
                        kind: match child.get_kind() {
                            EntityKind::UnionDecl => CppAnonymousGroupKind::Union,
                            _ => CppAnonymousGroupKind::Struct,
                        },
                        index: anonymous_group_count,
                    };
                    anonymous_group_count += 1;
                    for grandchild in child.get_children() {
                        match grandchild.get_kind() {
                            EntityKind::FieldDecl => {
                                if let Err(error) = self.parse_class_field(
                                    grandchild,
                                    &path,
                                    Some(group.clone()),
                                    false,
                                ) {
                                    self.add_unmappable_diagnostic(
                                        grandchild,
                                        "class field",
                                        &error,
                                    );
                                    has_unsupported_fields = true;
                                }
                            }
                            EntityKind::StructDecl | EntityKind::UnionDecl => {
                                debug!(
                                    "nested anonymous blocks are not flattened: {}",
                                    entity_log_representation(entity)
                                );
                                has_unsupported_fields = true;
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        self.data.db.add_cpp_item(
            source,
            CppItem::Type(CppTypeDeclaration {
                path,
                kind: CppTypeDeclarationKind::Class {
                    is_abstract: entity.is_abstract_record(),
                    is_union: entity.get_kind() == EntityKind::UnionDecl,
                    has_bases,
                    has_unsupported_fields,
                },
            }),
        );
        Ok(())
    }

    /// Parses a typedef or type alias `entity`.
    fn parse_typedef(&mut self, entity: Entity<'_>) -> Result<()> {
        let source = self.parser_source(entity)?;
        let path = get_path(entity)?;
        if parse_special_typedef(&path.last().name).is_some() {
            // predefined by the FFI loader
            return Ok(());
        }
        let underlying = entity
            .get_typedef_underlying_type()
            .ok_or_else(|| format_err!("failed to get underlying type: {:?}", entity))?;
        let target = parse_type(underlying).with_context(|_| {
            format!(
                "failed to parse typedef target: {}",
                path.to_cpp_pseudo_code()
            )
        })?;
        self.data
            .db
            .add_cpp_item(source, CppItem::Typedef(CppTypedef { path, target }));
        Ok(())
    }

    /// Parses a function or method `entity`.
    fn parse_function(&mut self, entity: Entity<'_>) -> Result<()> {
        let path = get_path(entity)?;
        let member = match entity.get_semantic_parent() {
            Some(parent) => match parent.get_kind() {
                EntityKind::ClassDecl | EntityKind::StructDecl | EntityKind::UnionDecl => {
                    Some(CppFunctionMemberData {
                        kind: match entity.get_kind() {
                            EntityKind::Constructor => CppFunctionKind::Constructor,
                            EntityKind::Destructor => CppFunctionKind::Destructor,
                            _ => CppFunctionKind::Regular,
                        },
                        is_virtual: entity.is_virtual_method(),
                        is_pure_virtual: entity.is_pure_virtual_method(),
                        is_const: entity.is_const_method(),
                        is_static: entity.is_static_method(),
                        visibility: convert_accessibility(entity.get_accessibility()),
                    })
                }
                EntityKind::ClassTemplate | EntityKind::ClassTemplatePartialSpecialization => {
                    bail!("methods of template classes are not supported");
                }
                _ => None,
            },
            None => None,
        };
        if entity.is_variadic() {
            bail!("functions with variadic arguments are not supported");
        }
        let function_type = entity
            .get_type()
            .ok_or_else(|| format_err!("failed to get function type: {:?}", entity))?;
        let clang_return_type = function_type
            .get_result_type()
            .ok_or_else(|| format_err!("failed to get function return type: {:?}", entity))?;
        let return_type = parse_type(clang_return_type).with_context(|_| {
            format!(
                "can't parse return type: {}",
                clang_return_type.get_display_name()
            )
        })?;
        let argument_entities = entity
            .get_arguments()
            .ok_or_else(|| format_err!("failed to get function arguments: {:?}", entity))?;
        let mut arguments = Vec::new();
        for (argument_number, argument_entity) in argument_entities.into_iter().enumerate() {
            let name = argument_entity
                .get_name()
                .unwrap_or_else(|| format!("arg{}", argument_number + 1));
            let clang_type = argument_entity.get_type().ok_or_else(|| {
                format_err!(
                    "failed to get type from argument entity: {:?}",
                    argument_entity
                )
            })?;
            let argument_type = parse_type(clang_type).with_context(|_| {
                format!(
                    "can't parse argument type: {}: {}",
                    name,
                    clang_type.get_display_name()
                )
            })?;
            let default_value = argument_default_value(argument_entity)?;
            arguments.push(CppFunctionArgument {
                name,
                argument_type,
                default_value,
            });
        }
        let source = self.parser_source(entity)?;
        self.data.db.add_cpp_item(
            source,
            CppItem::Function(CppFunction {
                path,
                member,
                return_type,
                arguments,
                allows_variadic_arguments: false,
            }),
        );
        Ok(())
    }

    /// Parses type declarations in translation unit `entity`
    /// and saves them to the database. Children are processed before
    /// the entity itself, so nested type definitions are recorded
    /// before the record that contains them, matching the order
    /// required by the flat declaration list.
    fn parse_types(&mut self, entity: Entity<'_>) {
        if !self.should_process_entity(entity) {
            return;
        }
        if entity.get_accessibility() == Some(Accessibility::Private) {
            return; // skipping private stuff
        }
        match entity.get_kind() {
            EntityKind::TranslationUnit
            | EntityKind::Namespace
            | EntityKind::StructDecl
            | EntityKind::ClassDecl
            | EntityKind::UnionDecl
            | EntityKind::UnexposedDecl => {
                for c in entity.get_children() {
                    self.parse_types(c);
                }
            }
            _ => {}
        }
        match entity.get_kind() {
            EntityKind::EnumDecl => {
                if entity.get_name().is_some() && entity.is_definition() {
                    if let Err(error) = self.parse_enum(entity) {
                        self.add_unmappable_diagnostic(entity, "enum", &error);
                    }
                }
            }
            EntityKind::ClassDecl | EntityKind::StructDecl | EntityKind::UnionDecl => {
                let ok = entity.get_name().is_some() && // not an anonymous struct
                    entity.is_definition() && // not a forward declaration
                    entity.get_template().is_none(); // not a template specialization
                if ok {
                    if let Err(error) = self.parse_class(entity) {
                        self.add_unmappable_diagnostic(entity, "class", &error);
                    }
                }
            }
            EntityKind::ClassTemplate => {
                debug!(
                    "skipping template class: {}",
                    entity_log_representation(entity)
                );
            }
            EntityKind::TypedefDecl | EntityKind::TypeAliasDecl => {
                if let Err(error) = self.parse_typedef(entity) {
                    self.add_unmappable_diagnostic(entity, "typedef", &error);
                }
            }
            _ => {}
        }
    }

    /// Parses functions and methods in translation unit `entity`.
    fn parse_functions(&mut self, entity: Entity<'_>) {
        if !self.should_process_entity(entity) {
            return;
        }
        match entity.get_kind() {
            EntityKind::FunctionDecl
            | EntityKind::Method
            | EntityKind::Constructor
            | EntityKind::Destructor => {
                if entity.get_canonical_entity() == entity {
                    if let Some(name) = entity.get_name() {
                        if name.starts_with("operator")
                            && !name["operator".len()..]
                                .chars()
                                .next()
                                .map_or(false, |c| c.is_alphanumeric() || c == '_')
                        {
                            // the wrapper surface has no operator call syntax
                            debug!(
                                "skipping operator: {}",
                                entity_log_representation(entity)
                            );
                            return;
                        }
                    }
                    if let Err(error) = self.parse_function(entity) {
                        self.add_unmappable_diagnostic(entity, "function", &error);
                    }
                }
            }
            EntityKind::ConversionFunction => {
                debug!(
                    "skipping conversion operator: {}",
                    entity_log_representation(entity)
                );
            }
            EntityKind::FunctionTemplate => {
                debug!(
                    "skipping template function: {}",
                    entity_log_representation(entity)
                );
            }
            _ => {}
        }
        match entity.get_kind() {
            EntityKind::TranslationUnit
            | EntityKind::Namespace
            | EntityKind::StructDecl
            | EntityKind::ClassDecl
            | EntityKind::UnionDecl
            | EntityKind::UnexposedDecl => {
                for c in entity.get_children() {
                    self.parse_functions(c);
                }
            }
            _ => {}
        }
    }
}
