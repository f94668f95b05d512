//! Types for handling information about C++ library APIs.

use crate::cpp_function::CppFunction;
use crate::cpp_type::CppType;
use cpp_to_lua_common::errors::{bail, ensure, Error, Result};
use cpp_to_lua_common::utils::MapIfOk;
use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One item of a C++ enum declaration
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CppEnumValue {
    /// Full path containing enum path and variant name.
    pub path: CppPath,
    /// Corresponding value
    pub value: i64,
}

impl CppEnumValue {
    pub fn is_same(&self, other: &CppEnumValue) -> bool {
        self.path == other.path && self.value == other.value
    }

    /// Name of the enumerator without the enum path.
    pub fn short_name(&self) -> &str {
        &self.path.last().name
    }
}

/// Kind of an anonymous union or struct flattened into the enclosing record.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum CppAnonymousGroupKind {
    Union,
    Struct,
}

/// Identifies the anonymous union/struct a flattened field came from.
/// Fields with the same group index within one record were declared in
/// the same anonymous block, so the emitter must reproduce that block
/// to keep the record's layout.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppAnonymousGroup {
    pub kind: CppAnonymousGroupKind,
    pub index: usize,
}

/// Member field of a C++ class declaration
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppClassField {
    pub path: CppPath,
    /// Field type
    pub field_type: CppType,
    /// Visibility
    pub visibility: CppVisibility,
    pub is_static: bool,
    /// Set for fields flattened out of an anonymous union/struct.
    pub anonymous_group: Option<CppAnonymousGroup>,
}

impl CppClassField {
    pub fn is_same(&self, other: &CppClassField) -> bool {
        self.path == other.path
            && self.field_type == other.field_type
            && self.visibility == other.visibility
            && self.is_static == other.is_static
    }

    pub fn short_text(&self) -> String {
        let visibility_text = match self.visibility {
            CppVisibility::Public => "",
            CppVisibility::Protected => "protected ",
            CppVisibility::Private => "private ",
        };
        format!(
            "{}{} {}",
            visibility_text,
            self.field_type.to_cpp_pseudo_code(),
            self.path.to_cpp_pseudo_code(),
        )
    }
}

/// Location of a C++ entity's definition in header files.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppOriginLocation {
    /// Full path to the include file
    pub include_file_path: String,
    /// Line of the file
    pub line: u32,
    /// Column of the file
    pub column: u32,
}

/// Visibility of a C++ entity. Defaults to `Public`
/// for entities that can't have visibility (like free functions)
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum CppVisibility {
    Public,
    Protected,
    Private,
}

#[derive(PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppPathItem {
    pub name: String,
    pub template_arguments: Option<Vec<CppType>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct CppPath {
    /// Parts of the path
    items: Vec<CppPathItem>,
}

impl CppPath {
    pub fn from_good_str(path: &str) -> Self {
        CppPath::from_str(path).unwrap()
    }

    pub fn from_item(item: CppPathItem) -> Self {
        CppPath { items: vec![item] }
    }

    pub fn from_items(items: Vec<CppPathItem>) -> Self {
        CppPath { items }
    }

    pub fn items(&self) -> &[CppPathItem] {
        &self.items
    }

    pub fn to_cpp_code(&self) -> Result<String> {
        Ok(self
            .items
            .iter()
            .map_if_ok(CppPathItem::to_cpp_code)?
            .join("::"))
    }

    pub fn to_cpp_pseudo_code(&self) -> String {
        self.items
            .iter()
            .map(CppPathItem::to_cpp_pseudo_code)
            .join("::")
    }

    pub fn join(&self, item: CppPathItem) -> CppPath {
        let mut result = self.clone();
        result.items.push(item);
        result
    }

    pub fn last(&self) -> &CppPathItem {
        self.items.last().expect("empty CppPath encountered")
    }

    pub fn parent(&self) -> Result<CppPath> {
        if self.items.len() > 1 {
            Ok(CppPath {
                items: self.items[..self.items.len() - 1].to_vec(),
            })
        } else {
            bail!("failed to get parent path for {:?}", self)
        }
    }

    /// Returns true if `other` is this path or a parent of it.
    pub fn is_parent_of(&self, other: &CppPath) -> bool {
        other.items.len() >= self.items.len() && other.items[..self.items.len()] == self.items[..]
    }

    /// Identifier-safe rendition of the path, used for naming
    /// opaque handles of template instantiations.
    pub fn ascii_caption(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                let name: String = item
                    .name
                    .chars()
                    .map(|c| {
                        if c == '~' {
                            'd'
                        } else if !c.is_digit(36) && c != '_' {
                            '_'
                        } else {
                            c
                        }
                    })
                    .collect();
                if let Some(args) = &item.template_arguments {
                    format!(
                        "{}_{}",
                        name,
                        args.iter().map(CppType::ascii_caption).join("_")
                    )
                } else {
                    name
                }
            })
            .join("_")
    }

    pub fn to_templateless_string(&self) -> String {
        self.items().iter().map(|item| &item.name).join("::")
    }
}

impl FromStr for CppPath {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        if path.contains('<') || path.contains('>') {
            bail!("attempted to add template arguments to CppPath");
        }
        if path.is_empty() {
            bail!("attempted to construct an empty CppPath");
        }
        let items = path
            .split("::")
            .map(|item| CppPathItem {
                name: item.into(),
                template_arguments: None,
            })
            .collect();
        Ok(CppPath { items })
    }
}

impl CppPathItem {
    pub fn to_cpp_code(&self) -> Result<String> {
        let args = match &self.template_arguments {
            None => "".to_string(),
            Some(args) => format!(
                "< {} >",
                args.map_if_ok(|arg| arg.to_cpp_code(None))?.join(", ")
            ),
        };
        Ok(format!("{}{}", self.name, args))
    }

    pub fn to_cpp_pseudo_code(&self) -> String {
        let args = match &self.template_arguments {
            None => "".to_string(),
            Some(args) => format!(
                "<{}>",
                args.iter().map(CppType::to_cpp_pseudo_code).join(", ")
            ),
        };
        format!("{}{}", self.name, args)
    }

    pub fn from_good_str(name: &str) -> Self {
        Self::from_str(name).unwrap()
    }
}

impl FromStr for CppPathItem {
    type Err = Error;

    fn from_str(name: &str) -> Result<CppPathItem> {
        ensure!(
            !name.contains('<'),
            "attempted to construct CppPathItem containing template arguments"
        );
        ensure!(
            !name.contains('>'),
            "attempted to construct CppPathItem containing template arguments"
        );
        ensure!(!name.is_empty(), "attempted to construct empty CppPathItem");
        Ok(CppPathItem {
            name: name.into(),
            template_arguments: None,
        })
    }
}

impl fmt::Debug for CppPathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "{:?}", self.name)?;
        if let Some(args) = &self.template_arguments {
            write!(
                f,
                "<{}>",
                args.iter().map(|arg| format!("{:?}", arg)).join(", ")
            )?;
        }
        Ok(())
    }
}

#[test]
fn ascii_caption_of_template_path() {
    let mut item = CppPathItem::from_good_str("vector");
    item.template_arguments = Some(vec![CppType::Class(CppPath::from_good_str("Point"))]);
    let path = CppPath::from_good_str("std").join(item);
    assert_eq!(path.ascii_caption(), "std_vector_Point");
    assert_eq!(path.to_templateless_string(), "std::vector");
}

/// Information about a C++ type declaration
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CppTypeDeclarationKind {
    Enum {
        /// The enum's underlying integer type. The declaration list can
        /// only use plain enum definitions when this is `int`; other
        /// widths are declared through an integer typedef instead.
        underlying: CppType,
    },
    Class {
        /// True if the class has pure virtual methods. Abstract classes
        /// are excluded from constructor/destructor synthesis.
        is_abstract: bool,
        /// True for `union` declarations.
        is_union: bool,
        /// True if the class has base classes. Layout of a derived class
        /// can't be reproduced in the declaration list, so such records
        /// are declared as opaque handles.
        has_bases: bool,
        /// True if a field declaration could not be converted.
        /// The record keeps only an opaque declaration in that case.
        has_unsupported_fields: bool,
    },
}

/// Information about a C++ type declaration
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CppTypeDeclaration {
    /// Identifier, including namespaces and nested classes
    pub path: CppPath,
    pub kind: CppTypeDeclarationKind,
}

impl CppTypeDeclaration {
    pub fn is_same(&self, other: &CppTypeDeclaration) -> bool {
        self.path == other.path
    }
}

impl CppTypeDeclarationKind {
    /// Checks if the type is a class type.
    pub fn is_class(&self) -> bool {
        match self {
            CppTypeDeclarationKind::Class { .. } => true,
            _ => false,
        }
    }

    pub fn is_enum(&self) -> bool {
        match self {
            CppTypeDeclarationKind::Enum { .. } => true,
            _ => false,
        }
    }
}

/// A C++ typedef or type alias declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppTypedef {
    pub path: CppPath,
    /// The aliased type.
    pub target: CppType,
}

impl CppTypedef {
    pub fn is_same(&self, other: &CppTypedef) -> bool {
        self.path == other.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::large_enum_variant)]
pub enum CppItem {
    Type(CppTypeDeclaration),
    EnumValue(CppEnumValue),
    Function(CppFunction),
    ClassField(CppClassField),
    Typedef(CppTypedef),
}

impl CppItem {
    pub fn is_same(&self, other: &CppItem) -> bool {
        use self::CppItem::*;

        match self {
            Type(v) => {
                if let Type(v2) = &other {
                    v.is_same(v2)
                } else {
                    false
                }
            }
            EnumValue(v) => {
                if let EnumValue(v2) = &other {
                    v.is_same(v2)
                } else {
                    false
                }
            }
            Function(v) => {
                if let Function(v2) = &other {
                    v.is_same(v2)
                } else {
                    false
                }
            }
            ClassField(v) => {
                if let ClassField(v2) = &other {
                    v.is_same(v2)
                } else {
                    false
                }
            }
            Typedef(v) => {
                if let Typedef(v2) = &other {
                    v.is_same(v2)
                } else {
                    false
                }
            }
        }
    }

    pub fn path(&self) -> &CppPath {
        match self {
            CppItem::Type(data) => &data.path,
            CppItem::EnumValue(data) => &data.path,
            CppItem::Function(data) => &data.path,
            CppItem::ClassField(data) => &data.path,
            CppItem::Typedef(data) => &data.path,
        }
    }

    pub fn all_involved_types(&self) -> Vec<CppType> {
        match self {
            CppItem::Type(t) => match t.kind {
                CppTypeDeclarationKind::Enum { .. } => vec![CppType::Enum {
                    path: t.path.clone(),
                }],
                CppTypeDeclarationKind::Class { .. } => vec![CppType::Class(t.path.clone())],
            },
            CppItem::EnumValue(enum_value) => vec![CppType::Enum {
                path: enum_value
                    .path
                    .parent()
                    .expect("enum value must have parent path"),
            }],
            CppItem::Function(function) => function.all_involved_types(),
            CppItem::ClassField(field) => {
                let class_type =
                    CppType::Class(field.path.parent().expect("field path must have parent"));
                vec![class_type, field.field_type.clone()]
            }
            CppItem::Typedef(typedef) => vec![typedef.target.clone()],
        }
    }

    pub fn as_function_ref(&self) -> Option<&CppFunction> {
        if let CppItem::Function(data) = self {
            Some(data)
        } else {
            None
        }
    }
    pub fn as_field_ref(&self) -> Option<&CppClassField> {
        if let CppItem::ClassField(data) = self {
            Some(data)
        } else {
            None
        }
    }
    pub fn as_enum_value_ref(&self) -> Option<&CppEnumValue> {
        if let CppItem::EnumValue(data) = self {
            Some(data)
        } else {
            None
        }
    }
    pub fn as_type_ref(&self) -> Option<&CppTypeDeclaration> {
        if let CppItem::Type(data) = self {
            Some(data)
        } else {
            None
        }
    }
    pub fn as_typedef_ref(&self) -> Option<&CppTypedef> {
        if let CppItem::Typedef(data) = self {
            Some(data)
        } else {
            None
        }
    }
}

impl fmt::Display for CppItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CppItem::Type(type1) => match type1.kind {
                CppTypeDeclarationKind::Enum { .. } => {
                    format!("enum {}", type1.path.to_cpp_pseudo_code())
                }
                CppTypeDeclarationKind::Class { is_union, .. } => format!(
                    "{} {}",
                    if is_union { "union" } else { "class" },
                    type1.path.to_cpp_pseudo_code()
                ),
            },
            CppItem::Function(method) => method.short_text(),
            CppItem::EnumValue(value) => format!(
                "enum value {} = {}",
                value.path.to_cpp_pseudo_code(),
                value.value
            ),
            CppItem::ClassField(field) => field.short_text(),
            CppItem::Typedef(typedef) => format!(
                "typedef {} = {}",
                typedef.path.to_cpp_pseudo_code(),
                typedef.target.to_cpp_pseudo_code()
            ),
        };

        f.write_str(&s)
    }
}
