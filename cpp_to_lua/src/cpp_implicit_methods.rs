use crate::cpp_data::{CppItem, CppPathItem, CppTypeDeclarationKind, CppVisibility};
use crate::cpp_function::{CppFunction, CppFunctionKind, CppFunctionMemberData};
use crate::cpp_type::CppType;
use crate::database::DatabaseItemSource;
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::Result;
use log::debug;

/// Adds constructors and destructors for every class that does not have
/// explicitly declared ones, producing wrappings for the members
/// implicitly available in C++. A user-declared constructor of any
/// visibility suppresses the implicit default constructor; the same
/// holds for destructors.
pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    let mut methods = Vec::new();
    for item in data.db.cpp_items() {
        let declaration = match item.cpp_item.as_type_ref() {
            Some(declaration) => declaration,
            None => continue,
        };
        let is_abstract = match declaration.kind {
            CppTypeDeclarationKind::Class { is_abstract, .. } => is_abstract,
            CppTypeDeclarationKind::Enum { .. } => continue,
        };
        let class_path = &declaration.path;

        let has_user_constructor = data
            .db
            .cpp_items()
            .iter()
            .filter_map(|other| other.cpp_item.as_function_ref())
            .any(|function| {
                function.is_constructor()
                    && function.class_type().ok().as_ref() == Some(class_path)
            });
        if !has_user_constructor && !is_abstract {
            let default_constructor = CppFunction {
                path: class_path.join(CppPathItem::from_good_str(&class_path.last().name)),
                member: Some(CppFunctionMemberData {
                    kind: CppFunctionKind::Constructor,
                    is_virtual: false,
                    is_pure_virtual: false,
                    is_const: false,
                    is_static: false,
                    visibility: CppVisibility::Public,
                }),
                return_type: CppType::Void,
                arguments: vec![],
                allows_variadic_arguments: false,
            };
            methods.push((DatabaseItemSource::ImplicitConstructor, default_constructor));
        }

        let has_user_destructor = data
            .db
            .cpp_items()
            .iter()
            .filter_map(|other| other.cpp_item.as_function_ref())
            .any(|function| {
                function.is_destructor()
                    && function.class_type().ok().as_ref() == Some(class_path)
            });
        if !has_user_destructor && !is_abstract {
            let destructor = CppFunction {
                path: class_path.join(CppPathItem::from_good_str(&format!(
                    "~{}",
                    class_path.last().name
                ))),
                member: Some(CppFunctionMemberData {
                    kind: CppFunctionKind::Destructor,
                    is_virtual: false,
                    is_pure_virtual: false,
                    is_const: false,
                    is_static: false,
                    visibility: CppVisibility::Public,
                }),
                return_type: CppType::Void,
                arguments: vec![],
                allows_variadic_arguments: false,
            };
            methods.push((DatabaseItemSource::ImplicitDestructor, destructor));
        }
    }
    for (source, method) in methods {
        debug!("added implicit method: {}", method.short_text());
        data.db.add_cpp_item(source, CppItem::Function(method));
    }
    Ok(())
}
