//! Types for handling information about C++ functions and methods.

use crate::cpp_data::CppPath;
use crate::cpp_data::CppVisibility;
use crate::cpp_type::CppPointerLikeTypeKind;
use crate::cpp_type::CppType;
use cpp_to_lua_common::errors::{bail, err_msg, Result, ResultExt};
use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};

/// Information about an argument of a C++ function
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppFunctionArgument {
    /// Identifier. If the argument doesn't have a name
    /// (which is allowed in C++), this field contains
    /// generated name "argX" (X is position of the argument).
    pub name: String,
    /// Argument type
    pub argument_type: CppType,
    /// Source text of the argument's default value expression,
    /// if the argument has one.
    pub default_value: Option<String>,
}

impl CppFunctionArgument {
    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }
}

/// Enumerator indicating special cases of C++ methods.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum CppFunctionKind {
    /// Just a class method
    Regular,
    /// Constructor
    Constructor,
    /// Destructor
    Destructor,
}

/// Information about a C++ class member method
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppFunctionMemberData {
    /// Whether this method is a constructor, a destructor or a normal method
    pub kind: CppFunctionKind,
    /// True if this is a virtual method
    pub is_virtual: bool,
    /// True if this is a pure virtual method (requires is_virtual = true)
    pub is_pure_virtual: bool,
    /// True if this is a const method, i.e. "this" pointer received by
    /// this method has const type
    pub is_const: bool,
    /// True if this is a static method, i.e. it doesn't receive "this" pointer at all.
    pub is_static: bool,
    /// Method visibility
    pub visibility: CppVisibility,
}

/// Information about a C++ function or method
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppFunction {
    /// Identifier. For class methods, the path includes the class path;
    /// for free functions it includes namespaces (if any).
    pub path: CppPath,
    /// Additional information about a class member function
    /// or None for free functions
    pub member: Option<CppFunctionMemberData>,
    /// Return type of the method.
    /// Return type is reported as void for constructors and destructors.
    pub return_type: CppType,
    /// List of the method's arguments
    pub arguments: Vec<CppFunctionArgument>,
    /// Whether the argument list is terminated with "..."
    pub allows_variadic_arguments: bool,
}

impl CppFunctionKind {
    /// Returns true if this method is a constructor
    pub fn is_constructor(&self) -> bool {
        match *self {
            CppFunctionKind::Constructor => true,
            _ => false,
        }
    }

    /// Returns true if this method is a destructor
    pub fn is_destructor(&self) -> bool {
        match *self {
            CppFunctionKind::Destructor => true,
            _ => false,
        }
    }

    /// Returns true if this method is a regular method or a free function
    pub fn is_regular(&self) -> bool {
        match *self {
            CppFunctionKind::Regular => true,
            _ => false,
        }
    }
}

impl CppFunction {
    /// Checks if two methods have exactly the same set of input argument types
    pub fn argument_types_equal(&self, other: &CppFunction) -> bool {
        if self.arguments.len() != other.arguments.len() {
            return false;
        }
        if self.allows_variadic_arguments != other.allows_variadic_arguments {
            return false;
        }
        for (i, j) in self.arguments.iter().zip(other.arguments.iter()) {
            if i.argument_type != j.argument_type {
                return false;
            }
        }
        true
    }

    pub fn is_same(&self, other: &CppFunction) -> bool {
        self.path == other.path
            && self.member == other.member
            && self.return_type == other.return_type
            && self.argument_types_equal(other)
    }

    pub fn class_type(&self) -> Result<CppPath> {
        if self.member.is_some() {
            Ok(self.path.parent().with_context(|_| {
                err_msg("CppFunction is a class member but its path is not nested.")
            })?)
        } else {
            bail!("not a member function")
        }
    }

    /// Returns short text representing values in this method
    /// (only for debugging output).
    pub fn short_text(&self) -> String {
        let mut s = String::new();
        if let Some(info) = &self.member {
            if info.is_virtual {
                if info.is_pure_virtual {
                    s = format!("{} pure virtual", s);
                } else {
                    s = format!("{} virtual", s);
                }
            }
            if info.is_static {
                s = format!("{} static", s);
            }
            if info.visibility == CppVisibility::Protected {
                s = format!("{} protected", s);
            }
            if info.visibility == CppVisibility::Private {
                s = format!("{} private", s);
            }
            match info.kind {
                CppFunctionKind::Constructor => s = format!("{} [constructor]", s),
                CppFunctionKind::Destructor => s = format!("{} [destructor]", s),
                CppFunctionKind::Regular => {}
            }
        }
        if self.allows_variadic_arguments {
            s = format!("{} [var args]", s);
        }
        s = format!("{} {}", s, self.return_type.to_cpp_pseudo_code());
        s = format!("{} {}", s, self.path.to_cpp_pseudo_code());
        s = format!(
            "{}({})",
            s,
            self.arguments
                .iter()
                .map(|arg| format!(
                    "{} {}{}",
                    arg.argument_type.to_cpp_pseudo_code(),
                    arg.name,
                    match &arg.default_value {
                        Some(expr) => format!(" = {}", expr),
                        None => String::new(),
                    }
                ))
                .join(", ")
        );
        if let Some(info) = &self.member {
            if info.is_const {
                s = format!("{} const", s);
            }
        }
        s.trim().to_string()
    }

    /// Returns true if this method is a constructor.
    pub fn is_constructor(&self) -> bool {
        match &self.member {
            Some(info) => info.kind.is_constructor(),
            None => false,
        }
    }

    /// Returns true if this method is a destructor.
    pub fn is_destructor(&self) -> bool {
        match &self.member {
            Some(info) => info.kind.is_destructor(),
            None => false,
        }
    }

    /// Returns true if this method is static.
    pub fn is_static_member(&self) -> bool {
        match &self.member {
            Some(info) => info.is_static,
            None => false,
        }
    }

    pub fn is_virtual(&self) -> bool {
        match &self.member {
            Some(info) => info.is_virtual,
            None => false,
        }
    }

    pub fn member(&self) -> Option<&CppFunctionMemberData> {
        self.member.as_ref()
    }

    /// Number of trailing arguments that have default values.
    pub fn trailing_default_argument_count(&self) -> usize {
        self.arguments
            .iter()
            .rev()
            .take_while(|arg| arg.has_default_value())
            .count()
    }

    /// Returns collection of all types found in the signature of this method,
    /// including argument types, return type and type of `this` implicit parameter.
    pub fn all_involved_types(&self) -> Vec<CppType> {
        let mut result = Vec::<CppType>::new();
        if let Some(class_membership) = &self.member {
            result.push(CppType::PointerLike {
                is_const: class_membership.is_const,
                kind: CppPointerLikeTypeKind::Pointer,
                target: Box::new(CppType::Class(
                    self.class_type().expect("member function must have nested path"),
                )),
            });
        }
        for t in self.arguments.iter().map(|x| x.argument_type.clone()) {
            result.push(t);
        }
        result.push(self.return_type.clone());
        result
    }
}
