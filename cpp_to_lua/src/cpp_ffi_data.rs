use crate::cpp_data::CppPath;
use crate::cpp_type::CppType;
use cpp_to_lua_common::errors::Result;
use serde_derive::{Deserialize, Serialize};

/// Relation between original C++ method's argument value
/// and corresponding FFI function's argument value
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CppTypeConversionToFfi {
    /// Argument types are identical.
    NoChange,
    /// C++ argument is a class value (like QPoint)
    /// and FFI argument is a pointer (like QPoint*)
    ValueToPointer { is_ffi_const: bool },
    /// C++ argument is a reference (like QPoint&)
    /// and FFI argument is a pointer (like QPoint*)
    ReferenceToPointer,
}

/// Ownership of a pointer returned by an FFI function, as seen
/// by the wrapper module. Owned pointers receive a finalizer
/// that calls the corresponding delete function.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Ownership {
    /// The caller is responsible for deleting the object.
    Owned,
    /// The object belongs to the library; the wrapper must not delete it.
    Borrowed,
}

impl Ownership {
    pub fn is_owned(self) -> bool {
        self == Ownership::Owned
    }
}

/// Information that indicates how an FFI function argument
/// should be interpreted
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CppFfiArgumentMeaning {
    /// This argument contains value for "this" pointer
    /// used to call C++ class member functions
    This,
    /// Value of this argument should be passed as an argument to
    /// the original C++ method. Associated value is index of the
    /// C++ method's argument (counting from 0).
    Argument(usize),
}

impl CppFfiArgumentMeaning {
    /// Checks if this argument corresponds to an original
    /// C++ method's argument
    pub fn is_argument(&self) -> bool {
        matches!(self, CppFfiArgumentMeaning::Argument(..))
    }
}

/// Representation of an argument of a FFI function
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CppFfiFunctionArgument {
    /// Identifier
    pub name: String,
    /// Type
    pub argument_type: CppFfiType,
    /// C++ equivalent
    pub meaning: CppFfiArgumentMeaning,
}

impl CppFfiFunctionArgument {
    /// Generates C++ code for the part of FFI function signature
    /// corresponding to this argument
    pub fn to_cpp_code(&self) -> Result<String> {
        if let CppType::FunctionPointer(..) = self.argument_type.ffi_type() {
            Ok(self.argument_type.ffi_type().to_cpp_code(Some(&self.name))?)
        } else {
            Ok(format!(
                "{} {}",
                self.argument_type.ffi_type().to_cpp_code(None)?,
                self.name
            ))
        }
    }
}

/// Information about arguments and return type of a FFI function.
/// The path is the final flat symbol name, i.e. it always has
/// a single component.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CppFfiFunction {
    /// List of arguments
    pub arguments: Vec<CppFfiFunctionArgument>,
    /// Return type
    pub return_type: CppFfiType,
    /// Final name of FFI method
    pub path: CppPath,
}

impl CppFfiFunction {
    /// Returns true if this signature has const this_ptr argument,
    /// indicating that original C++ method has const attribute.
    /// Returns false if there is no this argument or it's not const.
    pub fn has_const_this(&self) -> bool {
        self.arguments.iter().any(|arg| {
            arg.meaning == CppFfiArgumentMeaning::This
                && match arg.argument_type.ffi_type() {
                    CppType::PointerLike { is_const, .. } => *is_const,
                    _ => false,
                }
        })
    }

    pub fn has_this(&self) -> bool {
        self.arguments
            .iter()
            .any(|arg| arg.meaning == CppFfiArgumentMeaning::This)
    }

    pub fn short_text(&self) -> String {
        self.path.to_cpp_pseudo_code()
    }
}

/// FFI function type with attached information about
/// corresponding original C++ type and their relation
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CppFfiType {
    /// Original C++ type
    original_type: CppType,
    /// FFI function type
    ffi_type: CppType,
    /// Relation
    conversion: CppTypeConversionToFfi,
}

impl CppFfiType {
    pub fn new(original_type: CppType, conversion: CppTypeConversionToFfi) -> Result<Self> {
        match conversion.clone() {
            CppTypeConversionToFfi::NoChange => Ok(CppFfiType {
                ffi_type: original_type.clone(),
                original_type,
                conversion,
            }),
            CppTypeConversionToFfi::ValueToPointer { is_ffi_const } => Ok(CppFfiType {
                ffi_type: CppType::new_pointer(is_ffi_const, original_type.clone()),
                original_type,
                conversion,
            }),
            CppTypeConversionToFfi::ReferenceToPointer => {
                let target = original_type.pointer_like_to_target()?.clone();
                let is_const = original_type.pointer_like_is_const()?;
                Ok(CppFfiType {
                    ffi_type: CppType::new_pointer(is_const, target),
                    original_type,
                    conversion,
                })
            }
        }
    }

    /// Generates an object representing the void type
    pub fn void() -> Self {
        CppFfiType {
            original_type: CppType::Void,
            ffi_type: CppType::Void,
            conversion: CppTypeConversionToFfi::NoChange,
        }
    }

    pub fn original_type(&self) -> &CppType {
        &self.original_type
    }

    pub fn ffi_type(&self) -> &CppType {
        &self.ffi_type
    }

    pub fn conversion(&self) -> &CppTypeConversionToFfi {
        &self.conversion
    }
}
