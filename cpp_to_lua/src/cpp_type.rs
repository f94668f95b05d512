//! Types for handling information about C++ types.

use crate::cpp_data::CppPath;
use crate::cpp_ffi_data::{CppFfiType, CppTypeConversionToFfi};
use cpp_to_lua_common::errors::{bail, err_msg, Result, ResultExt};
use serde_derive::{Deserialize, Serialize};
use std::hash::Hash;
use std::hash::Hasher;

#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum CppPointerLikeTypeKind {
    Pointer,
    Reference,
    RValueReference,
}

/// Available built-in C++ numeric types.
/// All these types have corresponding
/// `clang::TypeKind` values (except for `CharS` and `CharU`
/// which map to `CppBuiltInNumericType::Char`)
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum CppBuiltInNumericType {
    Bool,
    Char,
    SChar,
    UChar,
    WChar,
    Char16,
    Char32,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Int128,
    UInt128,
    Float,
    Double,
    LongDouble,
}

/// Information about a fixed-size primitive type
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum CppSpecificNumericTypeKind {
    Integer { is_signed: bool },
    FloatingPoint,
}

/// Information about a C++ function pointer type
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppFunctionPointerType {
    /// Return type of the function
    pub return_type: Box<CppType>,
    /// Arguments of the function
    pub arguments: Vec<CppType>,
    /// Whether arguments are terminated with "..."
    pub allows_variadic_arguments: bool,
}

/// Information about a numeric C++ type that is
/// guaranteed to be the same on all platforms,
/// e.g. `uint32_t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CppSpecificNumericType {
    /// Type identifier (most likely a typedef name)
    pub path: CppPath,
    /// Size of type in bits
    pub bits: usize,
    /// Information about the type (float or integer,
    /// signed or unsigned)
    pub kind: CppSpecificNumericTypeKind,
}

/// Widths of the platform-dependent built-in types on the target ABI.
/// The declaration list must spell every primitive with a fixed-width
/// name, so the mapper takes these as configuration.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct TargetWidths {
    /// Size of `long` and `unsigned long` in bits.
    pub long_bits: usize,
    /// Size of `wchar_t` in bits.
    pub wchar_bits: usize,
}

impl Default for TargetWidths {
    fn default() -> Self {
        TargetWidths {
            long_bits: 64,
            wchar_bits: 32,
        }
    }
}

/// Base C++ type. `CppType` can add indirection
/// and constness to the base variants, but otherwise
/// this enum lists all supported types.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum CppType {
    /// Void
    Void,
    /// Built-in C++ primitive type, like int
    BuiltInNumeric(CppBuiltInNumericType),
    /// Fixed-size primitive type, like int64_t
    SpecificNumeric(CppSpecificNumericType),
    /// Pointer sized integer, like intptr_t
    PointerSizedInteger { path: CppPath, is_signed: bool },
    /// Enum type
    Enum {
        /// Name, including namespaces and nested classes
        path: CppPath,
    },
    /// Class type. A path with template arguments is a template
    /// instantiation; those are only usable behind pointers, as
    /// opaque handles.
    Class(CppPath),
    /// Fixed-size array type, as in fields like `float values[4]`
    Array {
        element: Box<CppType>,
        length: usize,
    },
    /// Template parameter, like `"T"` anywhere inside
    /// a `vector<T>` declaration
    TemplateParameter {
        /// Template instantiation level.
        nested_level: usize,
        /// Index of the parameter.
        index: usize,
        /// Declared name of this template parameter
        name: String,
    },
    /// Function pointer type
    FunctionPointer(CppFunctionPointerType),
    PointerLike {
        kind: CppPointerLikeTypeKind,
        is_const: bool,
        target: Box<CppType>,
    },
}

impl CppBuiltInNumericType {
    /// Returns C++ code representing this type.
    pub fn to_cpp_code(&self) -> &'static str {
        use self::CppBuiltInNumericType::*;
        match *self {
            Bool => "bool",
            Char => "char",
            SChar => "signed char",
            UChar => "unsigned char",
            WChar => "wchar_t",
            Char16 => "char16_t",
            Char32 => "char32_t",
            Short => "short",
            UShort => "unsigned short",
            Int => "int",
            UInt => "unsigned int",
            Long => "long",
            ULong => "unsigned long",
            LongLong => "long long",
            ULongLong => "unsigned long long",
            Int128 => "__int128_t",
            UInt128 => "__uint128_t",
            Float => "float",
            Double => "double",
            LongDouble => "long double",
        }
    }

    /// Returns the fixed-width spelling used in the flat declaration
    /// list. `bool` and `char` keep their own names since the FFI
    /// library defines them portably.
    pub fn to_cdef_code(&self, widths: &TargetWidths) -> Result<String> {
        use self::CppBuiltInNumericType::*;
        let code = match *self {
            Bool => "bool".to_string(),
            Char => "char".to_string(),
            SChar => "int8_t".to_string(),
            UChar => "uint8_t".to_string(),
            WChar => format!("int{}_t", widths.wchar_bits),
            Char16 => "uint16_t".to_string(),
            Char32 => "uint32_t".to_string(),
            Short => "int16_t".to_string(),
            UShort => "uint16_t".to_string(),
            Int => "int32_t".to_string(),
            UInt => "uint32_t".to_string(),
            Long => format!("int{}_t", widths.long_bits),
            ULong => format!("uint{}_t", widths.long_bits),
            LongLong => "int64_t".to_string(),
            ULongLong => "uint64_t".to_string(),
            Int128 | UInt128 => bail!("128-bit integers have no portable FFI representation"),
            Float => "float".to_string(),
            Double => "double".to_string(),
            LongDouble => bail!("long double has no portable FFI representation"),
        };
        Ok(code)
    }

}

impl CppType {
    pub fn new_pointer(is_const: bool, target: CppType) -> Self {
        CppType::PointerLike {
            kind: CppPointerLikeTypeKind::Pointer,
            is_const,
            target: Box::new(target),
        }
    }

    pub fn new_reference(is_const: bool, target: CppType) -> Self {
        CppType::PointerLike {
            kind: CppPointerLikeTypeKind::Reference,
            is_const,
            target: Box::new(target),
        }
    }

    /// Returns true if this is `void` type.
    pub fn is_void(&self) -> bool {
        match *self {
            CppType::Void => true,
            _ => false,
        }
    }
    /// Returns true if this is a class type.
    pub fn is_class(&self) -> bool {
        match *self {
            CppType::Class(..) => true,
            _ => false,
        }
    }
    /// Returns true if this is a template parameter.
    pub fn is_template_parameter(&self) -> bool {
        match *self {
            CppType::TemplateParameter { .. } => true,
            _ => false,
        }
    }
    /// Returns true if this is a function pointer.
    pub fn is_function_pointer(&self) -> bool {
        match *self {
            CppType::FunctionPointer(..) => true,
            _ => false,
        }
    }

    /// Returns true if this is a class type instantiated from a template,
    /// like `vector<int>`. Such types have no declared layout in the model
    /// and are handled as opaque handles.
    pub fn is_template_instantiation(&self) -> bool {
        if let CppType::Class(path) = self {
            path.items().iter().any(|item| item.template_arguments.is_some())
        } else {
            false
        }
    }

    /// Returns true if this is a template parameter or a type that
    /// contains any template parameters.
    pub fn is_or_contains_template_parameter(&self) -> bool {
        match self {
            CppType::TemplateParameter { .. } => true,
            CppType::PointerLike { target, .. } => target.is_or_contains_template_parameter(),
            CppType::Array { element, .. } => element.is_or_contains_template_parameter(),
            CppType::FunctionPointer(type1) => {
                type1.return_type.is_or_contains_template_parameter()
                    || type1
                        .arguments
                        .iter()
                        .any(|arg| arg.is_or_contains_template_parameter())
            }
            CppType::Class(path) => path.items().iter().any(|item| {
                if let Some(template_arguments) = &item.template_arguments {
                    template_arguments
                        .iter()
                        .any(|arg| arg.is_or_contains_template_parameter())
                } else {
                    false
                }
            }),
            _ => false,
        }
    }

    /// Returns C++ code representing this type. If `declarator_name` is
    /// present, a variable declaration is produced instead of a bare type;
    /// function pointer and array types can only be rendered with a
    /// declarator name because their syntax wraps it.
    pub fn to_cpp_code(&self, declarator_name: Option<&str>) -> Result<String> {
        match self {
            CppType::Void
            | CppType::BuiltInNumeric(_)
            | CppType::SpecificNumeric(_)
            | CppType::PointerSizedInteger { .. }
            | CppType::Enum { .. }
            | CppType::Class(_)
            | CppType::PointerLike { .. } => {
                let type_code = self.plain_type_to_cpp_code()?;
                match declarator_name {
                    Some(name) => Ok(format!("{} {}", type_code, name)),
                    None => Ok(type_code),
                }
            }
            CppType::TemplateParameter { .. } => {
                bail!("template parameters are not allowed in C++ code generator");
            }
            CppType::Array { element, length } => {
                let name = declarator_name.ok_or_else(|| {
                    err_msg("array types can only be rendered with a declarator name")
                })?;
                element.to_cpp_code(Some(&format!("{}[{}]", name, length)))
            }
            CppType::FunctionPointer(CppFunctionPointerType {
                return_type,
                arguments,
                allows_variadic_arguments,
            }) => {
                if *allows_variadic_arguments {
                    bail!("function pointers with variadic arguments are not supported");
                }
                let mut arg_texts = Vec::new();
                for arg in arguments {
                    arg_texts.push(arg.to_cpp_code(None)?);
                }
                if let Some(name) = declarator_name {
                    Ok(format!(
                        "{} (*{})({})",
                        return_type.as_ref().to_cpp_code(None)?,
                        name,
                        arg_texts.join(", ")
                    ))
                } else {
                    bail!("function pointer types can only be rendered with a declarator name");
                }
            }
        }
    }

    fn plain_type_to_cpp_code(&self) -> Result<String> {
        match self {
            CppType::Void => Ok("void".to_string()),
            CppType::BuiltInNumeric(t) => Ok(t.to_cpp_code().to_string()),
            CppType::Enum { path }
            | CppType::SpecificNumeric(CppSpecificNumericType { path, .. })
            | CppType::PointerSizedInteger { path, .. } => path.to_cpp_code(),
            CppType::Class(path) => path.to_cpp_code(),
            CppType::PointerLike {
                kind,
                is_const,
                target,
            } => Ok(format!(
                "{}{}{}",
                if *is_const { "const " } else { "" },
                target.to_cpp_code(None)?,
                match *kind {
                    CppPointerLikeTypeKind::Pointer => "*",
                    CppPointerLikeTypeKind::Reference => "&",
                    CppPointerLikeTypeKind::RValueReference => "&&",
                }
            )),
            _ => bail!("not a plain type: {:?}", self),
        }
    }

    /// Generates string representation of this type
    /// for debugging output.
    pub fn to_cpp_pseudo_code(&self) -> String {
        match self {
            CppType::TemplateParameter { name, .. } => {
                return name.to_string();
            }
            CppType::Class(base) => return base.to_cpp_pseudo_code(),
            CppType::FunctionPointer(..) | CppType::Array { .. } => {
                return self
                    .to_cpp_code(Some("FN_PTR"))
                    .unwrap_or_else(|_| "[?]".to_string());
            }
            _ => {}
        };
        self.to_cpp_code(None).unwrap_or_else(|_| "[?]".to_string())
    }

    pub fn ascii_caption(&self) -> String {
        match self {
            CppType::Void | CppType::BuiltInNumeric(_) => {
                self.to_cpp_code(None).unwrap().replace(' ', "_")
            }
            CppType::SpecificNumeric(data) => data.path.ascii_caption(),
            CppType::PointerSizedInteger { path, .. }
            | CppType::Enum { path }
            | CppType::Class(path) => path.ascii_caption(),
            CppType::TemplateParameter { name, .. } => name.to_string(),
            CppType::FunctionPointer(_) => "fn".into(),
            CppType::Array { element, length } => {
                format!("{}_x{}", element.ascii_caption(), length)
            }
            CppType::PointerLike {
                kind,
                is_const,
                target,
            } => format!(
                "{}{}{}",
                target.ascii_caption(),
                if *is_const { "_const" } else { "" },
                match *kind {
                    CppPointerLikeTypeKind::Pointer => "_ptr",
                    CppPointerLikeTypeKind::Reference => "_ref",
                    CppPointerLikeTypeKind::RValueReference => "_rref",
                },
            ),
        }
    }

    pub fn pointer_like_to_target(&self) -> Result<&CppType> {
        if let CppType::PointerLike { target, .. } = self {
            Ok(target)
        } else {
            bail!("not a pointer like type");
        }
    }

    pub fn pointer_like_is_const(&self) -> Result<bool> {
        if let CppType::PointerLike { is_const, .. } = self {
            Ok(*is_const)
        } else {
            bail!("not a pointer like type");
        }
    }
}

/// Context of usage for a C++ type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CppTypeRole {
    /// This type is used as a function's return type
    ReturnType,
    /// This type is not used as a function's return type
    NotReturnType,
}

impl CppType {
    fn contains_reference(&self) -> bool {
        if let CppType::PointerLike { kind, target, .. } = self {
            match *kind {
                CppPointerLikeTypeKind::Pointer => target.contains_reference(),
                CppPointerLikeTypeKind::Reference | CppPointerLikeTypeKind::RValueReference => true,
            }
        } else {
            false
        }
    }

    /// Converts this C++ type to its adaptation for the FFI interface,
    /// removing all features not supported by the C ABI
    /// (references and passing class objects by value).
    pub fn to_ffi_type(&self, role: CppTypeRole) -> Result<CppFfiType> {
        let inner = || -> Result<CppFfiType> {
            if self.is_or_contains_template_parameter() {
                bail!("template parameters cannot be expressed in FFI");
            }
            match self {
                CppType::BuiltInNumeric(t) => {
                    use self::CppBuiltInNumericType::*;
                    match t {
                        Int128 | UInt128 | LongDouble => {
                            bail!("{} has no portable FFI representation", t.to_cpp_code())
                        }
                        _ => {}
                    }
                }
                CppType::FunctionPointer(CppFunctionPointerType {
                    return_type,
                    arguments,
                    allows_variadic_arguments,
                }) => {
                    if *allows_variadic_arguments {
                        bail!("function pointers with variadic arguments are not supported");
                    }
                    let mut all_types: Vec<&CppType> = arguments.iter().collect();
                    all_types.push(return_type.as_ref());
                    for arg in all_types {
                        match *arg {
                            CppType::FunctionPointer(..) => {
                                bail!(
                                    "function pointers containing nested function pointers are \
                                     not supported"
                                );
                            }
                            CppType::Class(..) => {
                                bail!(
                                    "function pointers containing classes by value are not \
                                     supported"
                                );
                            }
                            _ => {}
                        }
                        if arg.contains_reference() {
                            bail!("function pointers containing references are not supported");
                        }
                    }
                    return CppFfiType::new(self.clone(), CppTypeConversionToFfi::NoChange);
                }
                CppType::Class(_) => {
                    if self.is_template_instantiation() {
                        bail!("template instantiations cannot be passed by value");
                    }
                    return CppFfiType::new(
                        self.clone(),
                        CppTypeConversionToFfi::ValueToPointer {
                            is_ffi_const: role != CppTypeRole::ReturnType,
                        },
                    );
                }
                CppType::Array { .. } => {
                    bail!("array types cannot appear in function signatures");
                }
                CppType::PointerLike { kind, target, .. } => {
                    match *kind {
                        CppPointerLikeTypeKind::Pointer => {
                            if let CppType::Array { .. } = &**target {
                                bail!("pointers to arrays are not supported");
                            }
                            if let CppType::FunctionPointer(..) = &**target {
                                bail!("pointers to function pointers are not supported");
                            }
                        }
                        CppPointerLikeTypeKind::Reference => {
                            return CppFfiType::new(
                                self.clone(),
                                CppTypeConversionToFfi::ReferenceToPointer,
                            );
                        }
                        CppPointerLikeTypeKind::RValueReference => {
                            bail!("rvalue references are not supported");
                        }
                    }
                }
                _ => {}
            }
            CppFfiType::new(self.clone(), CppTypeConversionToFfi::NoChange)
        };
        Ok(inner().with_context(|_| format!("Can't express type to FFI: {:?}", self))?)
    }
}

impl PartialEq for CppSpecificNumericType {
    fn eq(&self, other: &CppSpecificNumericType) -> bool {
        // name field is ignored
        self.bits == other.bits && self.kind == other.kind
    }
}
impl Eq for CppSpecificNumericType {}
impl Hash for CppSpecificNumericType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
        self.kind.hash(state);
    }
}
