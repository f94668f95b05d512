use crate::cpp_data::{CppItem, CppPath, CppTypeDeclarationKind, CppVisibility};
use crate::cpp_function::{CppFunction, CppFunctionKind};
use crate::cpp_ffi_data::{
    CppFfiArgumentMeaning, CppFfiFunction, CppFfiFunctionArgument, CppFfiType,
};
use crate::cpp_type::{CppBuiltInNumericType, CppPointerLikeTypeKind, CppType, CppTypeRole};
use crate::database::{CppFfiDatabaseItem, Database, DatabaseItemSource, FfiTypeName};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::{bail, err_msg, format_err, Result};
use itertools::Itertools;
use log::{debug, trace};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Produces unique `ffi.cdef` type names. A name clash can only happen
/// when distinct C++ paths collapse to the same ascii caption, so the
/// numeric suffix is rarely used in practice.
pub struct FfiNameProvider {
    names: HashSet<String>,
}

impl FfiNameProvider {
    pub fn new() -> Self {
        FfiNameProvider {
            names: HashSet::new(),
        }
    }

    /// Marks a name as taken without generating anything.
    pub fn claim(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn create_name(&mut self, base: &str) -> String {
        let mut num: Option<u32> = None;
        let name = loop {
            let name = format!(
                "{}{}",
                base,
                num.map_or(String::new(), |num| num.to_string())
            );
            if !self.names.contains(&name) {
                break name;
            }
            num = Some(num.map_or(1, |num| num + 1));
        };
        self.names.insert(name.clone());
        name
    }
}

/// Collects the paths of all class and enum types mentioned anywhere
/// in `type1`, including targets of pointers and function pointers.
/// Template arguments are not traversed; an instantiation is treated
/// as a single named type.
fn collect_named_type_paths<'t>(
    type1: &'t CppType,
    classes: &mut Vec<&'t CppPath>,
    enums: &mut Vec<&'t CppPath>,
) {
    match type1 {
        CppType::Class(path) => classes.push(path),
        CppType::Enum { path } => enums.push(path),
        CppType::PointerLike { target, .. } => collect_named_type_paths(target, classes, enums),
        CppType::Array { element, .. } => collect_named_type_paths(element, classes, enums),
        CppType::FunctionPointer(function) => {
            collect_named_type_paths(&function.return_type, classes, enums);
            for arg in &function.arguments {
                collect_named_type_paths(arg, classes, enums);
            }
        }
        _ => {}
    }
}

/// Checks if a field of type `type1` prevents the containing record from
/// being declared with a full layout. `by_value` is false after the
/// first pointer indirection; behind a pointer only renderability of
/// the target matters, not its completeness.
fn field_part_breaks_layout(
    type1: &CppType,
    by_value: bool,
    demoted: &HashSet<CppPath>,
    declared_records: &HashSet<CppPath>,
) -> bool {
    match type1 {
        CppType::Void => false,
        CppType::BuiltInNumeric(numeric) => match numeric {
            CppBuiltInNumericType::Int128
            | CppBuiltInNumericType::UInt128
            | CppBuiltInNumericType::LongDouble => true,
            _ => false,
        },
        CppType::SpecificNumeric(_) | CppType::PointerSizedInteger { .. } => false,
        CppType::Enum { .. } => false,
        CppType::Class(path) => {
            by_value
                && (path.last().template_arguments.is_some()
                    || !declared_records.contains(path)
                    || demoted.contains(path))
        }
        CppType::TemplateParameter { .. } => true,
        CppType::FunctionPointer(..) => type1.to_ffi_type(CppTypeRole::NotReturnType).is_err(),
        CppType::PointerLike { kind, target, .. } => match kind {
            CppPointerLikeTypeKind::Pointer => {
                field_part_breaks_layout(target, false, demoted, declared_records)
            }
            // reference members have no C declaration
            _ => true,
        },
        CppType::Array { element, .. } => {
            if by_value {
                field_part_breaks_layout(element, true, demoted, declared_records)
            } else {
                // pointer to array
                true
            }
        }
    }
}

fn field_type_breaks_layout(
    type1: &CppType,
    demoted: &HashSet<CppPath>,
    declared_records: &HashSet<CppPath>,
    declared_enums: &HashSet<CppPath>,
) -> bool {
    let mut classes = Vec::new();
    let mut enums = Vec::new();
    collect_named_type_paths(type1, &mut classes, &mut enums);
    if enums.iter().any(|path| !declared_enums.contains(*path)) {
        return true;
    }
    field_part_breaks_layout(type1, true, demoted, declared_records)
}

/// Builds the FFI symbol of `function`. Member functions are prefixed
/// with the `ffi.cdef` name of their class; constructors and destructors
/// become `_new` and `_delete` symbols.
fn ffi_symbol(function: &CppFunction, prefix: &str, db: &Database) -> Result<String> {
    let name = if let Some(member) = function.member() {
        let class_path = function.class_type()?;
        let type_name = db.find_ffi_type_name(&class_path).ok_or_else(|| {
            format_err!(
                "class is not available in FFI: {}",
                class_path.to_cpp_pseudo_code()
            )
        })?;
        match member.kind {
            CppFunctionKind::Constructor => format!("{}_new", type_name.ffi_name),
            CppFunctionKind::Destructor => format!("{}_delete", type_name.ffi_name),
            CppFunctionKind::Regular => {
                format!("{}_{}", type_name.ffi_name, function.path.last().name)
            }
        }
    } else {
        function.path.last().name.clone()
    };
    Ok(format!("{}{}", prefix, name))
}

/// Creates the FFI signature for this function:
/// - converts all types to FFI types;
/// - adds "this" argument explicitly if present;
/// - replaces a constructor's return type with a pointer
///   to a heap-allocated object.
pub fn to_ffi_function(
    function: &CppFunction,
    prefix: &str,
    db: &Database,
    declared_enums: &HashSet<CppPath>,
) -> Result<CppFfiFunction> {
    if function.allows_variadic_arguments {
        bail!("variadic argument list cannot be expressed in FFI");
    }
    for type1 in function.all_involved_types() {
        let mut classes = Vec::new();
        let mut enums = Vec::new();
        collect_named_type_paths(&type1, &mut classes, &mut enums);
        if let Some(path) = enums.iter().find(|path| !declared_enums.contains(**path)) {
            bail!("unknown enum type: {}", path.to_cpp_pseudo_code());
        }
    }

    let mut r = CppFfiFunction {
        arguments: Vec::new(),
        return_type: CppFfiType::void(),
        path: CppPath::from_good_str(&ffi_symbol(function, prefix, db)?),
    };

    if let Some(member) = function.member() {
        if !member.is_static && member.kind != CppFunctionKind::Constructor {
            let class_type = CppType::Class(function.class_type()?);
            let this_type = CppType::new_pointer(member.is_const, class_type);
            r.arguments.push(CppFfiFunctionArgument {
                name: "this_ptr".to_string(),
                argument_type: this_type.to_ffi_type(CppTypeRole::NotReturnType)?,
                meaning: CppFfiArgumentMeaning::This,
            });
        }
    }

    for (index, arg) in function.arguments.iter().enumerate() {
        let c_type = arg.argument_type.to_ffi_type(CppTypeRole::NotReturnType)?;
        r.arguments.push(CppFfiFunctionArgument {
            name: arg.name.clone(),
            argument_type: c_type,
            meaning: CppFfiArgumentMeaning::Argument(index),
        });
    }

    let real_return_type = match function.member() {
        Some(member) if member.kind == CppFunctionKind::Constructor => {
            CppType::Class(function.class_type()?)
        }
        _ => function.return_type.clone(),
    };
    r.return_type = real_return_type.to_ffi_type(CppTypeRole::ReturnType)?;

    Ok(r)
}

fn check_preconditions(item: &CppItem) -> Result<()> {
    if let CppItem::Function(function) = item {
        if let Some(member) = function.member() {
            if member.visibility == CppVisibility::Private {
                bail!("function is private");
            }
            if member.visibility == CppVisibility::Protected {
                bail!("function is protected");
            }
        }
        if function.path.last().template_arguments.is_some() {
            bail!("template functions are excluded");
        }
    }
    if item
        .all_involved_types()
        .iter()
        .any(|x| x.is_or_contains_template_parameter())
    {
        bail!("item contains template parameter");
    }
    Ok(())
}

/// Assigns `ffi.cdef` names to all declared types. Records that cannot
/// be declared with a full layout are marked opaque; a record is demoted
/// when it has base classes, virtual methods, unsupported fields, or a
/// by-value field of a type that is itself demoted or unknown.
fn assign_type_names(data: &mut ProcessorData<'_>, provider: &mut FfiNameProvider) {
    let mut declared_records = HashSet::new();
    let mut declared_enums = HashSet::new();
    let mut virtual_classes = HashSet::new();
    let mut demoted = HashSet::new();
    let mut field_types: HashMap<CppPath, Vec<CppType>> = HashMap::new();

    for item in data.db.cpp_items() {
        match &item.cpp_item {
            CppItem::Type(declaration) => match &declaration.kind {
                CppTypeDeclarationKind::Class {
                    is_abstract,
                    has_bases,
                    has_unsupported_fields,
                    ..
                } => {
                    declared_records.insert(declaration.path.clone());
                    if *is_abstract || *has_bases || *has_unsupported_fields {
                        demoted.insert(declaration.path.clone());
                    }
                }
                CppTypeDeclarationKind::Enum { .. } => {
                    declared_enums.insert(declaration.path.clone());
                }
            },
            CppItem::Function(function) => {
                if function.is_virtual() {
                    if let Ok(class_path) = function.class_type() {
                        virtual_classes.insert(class_path);
                    }
                }
            }
            CppItem::ClassField(field) => {
                if !field.is_static {
                    if let Ok(class_path) = field.path.parent() {
                        field_types
                            .entry(class_path)
                            .or_insert_with(Vec::new)
                            .push(field.field_type.clone());
                    }
                }
            }
            _ => {}
        }
    }
    demoted.extend(virtual_classes);

    loop {
        let mut changed = false;
        for (class_path, types) in &field_types {
            if demoted.contains(class_path) {
                continue;
            }
            if types.iter().any(|type1| {
                field_type_breaks_layout(type1, &demoted, &declared_records, &declared_enums)
            }) {
                debug!(
                    "class is demoted to an opaque declaration: {}",
                    class_path.to_cpp_pseudo_code()
                );
                demoted.insert(class_path.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut names = Vec::new();
    for item in data.db.cpp_items() {
        if let CppItem::Type(declaration) = &item.cpp_item {
            let is_opaque = match declaration.kind {
                CppTypeDeclarationKind::Class { .. } => demoted.contains(&declaration.path),
                CppTypeDeclarationKind::Enum { .. } => false,
            };
            names.push(FfiTypeName {
                path: declaration.path.clone(),
                ffi_name: provider.create_name(&declaration.path.ascii_caption()),
                is_opaque,
            });
        }
    }

    // pointer fields may mention records that were never declared;
    // those still need a forward declaration
    let mut field_opaques = Vec::new();
    for item in data.db.cpp_items() {
        if let CppItem::ClassField(field) = &item.cpp_item {
            let container_demoted = field
                .path
                .parent()
                .map(|parent| demoted.contains(&parent))
                .unwrap_or(true);
            if field.is_static || container_demoted {
                continue;
            }
            let mut classes = Vec::new();
            let mut enums = Vec::new();
            collect_named_type_paths(&field.field_type, &mut classes, &mut enums);
            for class_path in classes {
                if !declared_records.contains(class_path)
                    && !field_opaques.contains(class_path)
                {
                    field_opaques.push(class_path.clone());
                }
            }
        }
    }
    for path in field_opaques {
        names.push(FfiTypeName {
            ffi_name: provider.create_name(&path.ascii_caption()),
            path,
            is_opaque: true,
        });
    }

    for name in names {
        data.db.add_ffi_type_name(name);
    }
}

/// Type names the FFI loader predefines. Generated type names must not
/// shadow them.
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    "bool", "char", "int8_t", "uint8_t", "int16_t", "uint16_t", "int32_t", "uint32_t", "int64_t",
    "uint64_t", "intptr_t", "uintptr_t", "ptrdiff_t", "size_t", "ssize_t", "wchar_t", "float",
    "double", "void",
];

/// Runs the FFI generator. Function items are mapped to FFI signatures
/// in parallel; results are merged back in declaration order, so the
/// output does not depend on scheduling.
pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    let mut provider = FfiNameProvider::new();
    for name in RESERVED_TYPE_NAMES {
        provider.claim(*name);
    }
    assign_type_names(data, &mut provider);

    let declared_enums: HashSet<CppPath> = data
        .db
        .cpp_items()
        .iter()
        .filter_map(|item| item.cpp_item.as_type_ref())
        .filter(|declaration| declaration.kind.is_enum())
        .map(|declaration| declaration.path.clone())
        .collect();

    let abstract_classes: HashSet<CppPath> = data
        .db
        .cpp_items()
        .iter()
        .filter_map(|item| item.cpp_item.as_type_ref())
        .filter(|declaration| match declaration.kind {
            CppTypeDeclarationKind::Class { is_abstract, .. } => is_abstract,
            _ => false,
        })
        .map(|declaration| declaration.path.clone())
        .collect();

    let mut function_indices = Vec::new();
    for (index, item) in data.db.cpp_items().iter().enumerate() {
        let function = match item.cpp_item.as_function_ref() {
            Some(function) => function,
            None => continue,
        };
        if let Err(error) = check_preconditions(&item.cpp_item) {
            trace!("skipping {}: {}", item.cpp_item, error);
            continue;
        }
        if function.is_constructor()
            && function
                .class_type()
                .map(|path| abstract_classes.contains(&path))
                .unwrap_or(false)
        {
            trace!("skipping {}: class is abstract", item.cpp_item);
            continue;
        }
        function_indices.push(index);
    }

    let prefix = data.config.symbol_prefix();
    let results: Vec<(usize, Result<CppFfiFunction>)> = {
        let db: &Database = data.db;
        function_indices
            .par_iter()
            .map(|&index| {
                let result = match db.cpp_items()[index].cpp_item.as_function_ref() {
                    Some(function) => to_ffi_function(function, &prefix, db, &declared_enums),
                    None => Err(err_msg("expected a function item")),
                };
                (index, result)
            })
            .collect()
    };

    for (index, result) in results {
        match result {
            Err(error) => {
                let item = &data.db.cpp_items()[index];
                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::UnmappableType,
                    item.cpp_item.to_string(),
                    error.iter_chain().map(|c| c.to_string()).join(": "),
                );
                if let DatabaseItemSource::CppParser {
                    origin_location, ..
                } = &item.source
                {
                    diagnostic = diagnostic.with_location(origin_location.clone());
                }
                data.db.add_diagnostic(diagnostic);
            }
            Ok(function) => {
                let mut classes = Vec::new();
                let mut enums = Vec::new();
                collect_named_type_paths(
                    function.return_type.original_type(),
                    &mut classes,
                    &mut enums,
                );
                for argument in &function.arguments {
                    collect_named_type_paths(
                        argument.argument_type.original_type(),
                        &mut classes,
                        &mut enums,
                    );
                }
                let opaques = classes
                    .into_iter()
                    .filter(|path| data.db.find_ffi_type_name(path).is_none())
                    .cloned()
                    .unique()
                    .collect_vec();
                for path in opaques {
                    let ffi_name = provider.create_name(&path.ascii_caption());
                    data.db.add_ffi_type_name(FfiTypeName {
                        path,
                        ffi_name,
                        is_opaque: true,
                    });
                }
                data.db
                    .add_ffi_item(CppFfiDatabaseItem::from_function(function, index));
            }
        }
    }
    Ok(())
}
