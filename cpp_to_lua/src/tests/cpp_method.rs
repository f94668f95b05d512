use crate::cpp_data::CppPath;
use crate::cpp_data::CppVisibility;
use crate::cpp_ffi_data::CppFfiArgumentMeaning;
use crate::cpp_ffi_data::CppFfiFunction;
use crate::cpp_ffi_data::CppTypeConversionToFfi;
use crate::cpp_function::*;
use crate::cpp_type::*;
use crate::database::{Database, FfiTypeName};
use std::collections::HashSet;

#[test]
fn cpp_method_kind() {
    assert!(!CppFunctionKind::Constructor.is_destructor());
    assert!(CppFunctionKind::Constructor.is_constructor());
    assert!(!CppFunctionKind::Constructor.is_regular());

    assert!(CppFunctionKind::Destructor.is_destructor());
    assert!(!CppFunctionKind::Destructor.is_constructor());
    assert!(!CppFunctionKind::Destructor.is_regular());

    assert!(!CppFunctionKind::Regular.is_destructor());
    assert!(!CppFunctionKind::Regular.is_constructor());
    assert!(CppFunctionKind::Regular.is_regular());
}

pub fn empty_membership() -> CppFunctionMemberData {
    CppFunctionMemberData {
        kind: CppFunctionKind::Regular,
        is_virtual: false,
        is_pure_virtual: false,
        is_const: false,
        is_static: false,
        visibility: CppVisibility::Public,
    }
}

pub fn empty_regular_method() -> CppFunction {
    CppFunction {
        path: CppPath::from_good_str("empty"),
        member: None,
        return_type: CppType::Void,
        arguments: vec![],
        allows_variadic_arguments: false,
    }
}

#[test]
fn argument_types_equal1() {
    let method1 = empty_regular_method();
    let method2 = empty_regular_method();
    assert!(method1.argument_types_equal(&method2));
    assert!(method2.argument_types_equal(&method1));
}

#[test]
fn argument_types_equal2() {
    let mut method1 = empty_regular_method();
    let method2 = empty_regular_method();
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "arg1".to_string(),
        default_value: None,
    });
    assert!(!method1.argument_types_equal(&method2));
    assert!(!method2.argument_types_equal(&method1));
}

#[test]
fn argument_types_equal3() {
    let mut method1 = empty_regular_method();
    let mut method2 = empty_regular_method();
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "arg1".to_string(),
        default_value: None,
    });
    method2.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "x".to_string(),
        default_value: None,
    });
    assert!(method1.argument_types_equal(&method2));
    assert!(method2.argument_types_equal(&method1));
}

#[test]
fn argument_types_equal4() {
    let mut method1 = empty_regular_method();
    let mut method2 = empty_regular_method();
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "arg1".to_string(),
        default_value: None,
    });
    method2.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "arg1".to_string(),
        default_value: Some("1".to_string()),
    });
    assert!(method1.argument_types_equal(&method2));
    assert!(method2.argument_types_equal(&method1));
}

#[test]
fn argument_types_equal5() {
    let mut method1 = empty_regular_method();
    let mut method2 = empty_regular_method();
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "arg1".to_string(),
        default_value: None,
    });
    method2.arguments.push(CppFunctionArgument {
        argument_type: CppType::Enum {
            path: CppPath::from_good_str("Enum1"),
        },
        name: "arg1".to_string(),
        default_value: None,
    });
    assert!(!method1.argument_types_equal(&method2));
    assert!(!method2.argument_types_equal(&method1));
}

#[test]
fn argument_types_equal6() {
    let mut method1 = empty_regular_method();
    let int = CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "arg1".to_string(),
        default_value: None,
    };
    let mut method2 = empty_regular_method();
    method1.arguments.push(int.clone());
    method2.arguments.push(int.clone());
    method2.arguments.push(int.clone());
    assert!(!method1.argument_types_equal(&method2));
    assert!(!method2.argument_types_equal(&method1));
}

#[test]
fn argument_types_equal7() {
    let mut method1 = empty_regular_method();
    let method2 = empty_regular_method();
    method1.return_type = CppType::BuiltInNumeric(CppBuiltInNumericType::Int);
    assert!(method1.argument_types_equal(&method2));
    assert!(method2.argument_types_equal(&method1));
}

#[test]
fn trailing_default_argument_count() {
    let mut method1 = empty_regular_method();
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "a".to_string(),
        default_value: None,
    });
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "b".to_string(),
        default_value: Some("1".to_string()),
    });
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "c".to_string(),
        default_value: Some("2".to_string()),
    });
    assert_eq!(method1.trailing_default_argument_count(), 2);

    let mut method2 = empty_regular_method();
    method2.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "a".to_string(),
        default_value: Some("1".to_string()),
    });
    method2.arguments.push(CppFunctionArgument {
        argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        name: "b".to_string(),
        default_value: None,
    });
    assert_eq!(method2.trailing_default_argument_count(), 0);
}

fn to_ffi(function: &CppFunction, records: &[&str], enums: &[&str]) -> CppFfiFunction {
    let mut db = Database::empty("mylib");
    for name in records {
        db.add_ffi_type_name(FfiTypeName {
            path: CppPath::from_good_str(name),
            ffi_name: name.replace("::", "_"),
            is_opaque: false,
        });
    }
    let declared_enums: HashSet<CppPath> = enums
        .iter()
        .map(|name| CppPath::from_good_str(name))
        .collect();
    crate::cpp_ffi_generator::to_ffi_function(function, "mylib_", &db, &declared_enums).unwrap()
}

#[test]
fn c_signature_empty() {
    let mut method1 = empty_regular_method();
    method1.return_type = CppType::Void;

    assert!(!method1.is_constructor());
    assert!(!method1.is_destructor());
    assert!(method1.class_type().is_err());

    let r = to_ffi(&method1, &[], &[]);
    assert!(r.arguments.is_empty());
    assert!(r.return_type.ffi_type().is_void());
    assert_eq!(r.path, CppPath::from_good_str("mylib_empty"));
}

#[test]
fn c_signature_simple_func() {
    let mut method1 = empty_regular_method();
    method1.return_type = CppType::BuiltInNumeric(CppBuiltInNumericType::Int);
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::Enum {
            path: CppPath::from_good_str("Enum1"),
        },
        name: "arg1".to_string(),
        default_value: None,
    });
    let r = to_ffi(&method1, &[], &["Enum1"]);
    assert!(r.arguments.len() == 1);
    assert_eq!(r.arguments[0].name, "arg1");
    assert_eq!(
        r.arguments[0].argument_type.ffi_type(),
        &method1.arguments[0].argument_type
    );
    assert_eq!(
        r.arguments[0].argument_type.conversion(),
        &CppTypeConversionToFfi::NoChange
    );
    assert_eq!(r.arguments[0].meaning, CppFfiArgumentMeaning::Argument(0));
    assert_eq!(r.return_type.ffi_type(), &method1.return_type);
    assert_eq!(r.return_type.conversion(), &CppTypeConversionToFfi::NoChange);
}

#[test]
fn c_signature_unknown_enum() {
    let mut method1 = empty_regular_method();
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::Enum {
            path: CppPath::from_good_str("Enum1"),
        },
        name: "arg1".to_string(),
        default_value: None,
    });
    let db = Database::empty("mylib");
    let r = crate::cpp_ffi_generator::to_ffi_function(&method1, "mylib_", &db, &HashSet::new());
    assert!(r.is_err());
}

#[test]
fn c_signature_variadic() {
    let mut method1 = empty_regular_method();
    method1.allows_variadic_arguments = true;
    let db = Database::empty("mylib");
    let r = crate::cpp_ffi_generator::to_ffi_function(&method1, "mylib_", &db, &HashSet::new());
    assert!(r.is_err());
}

#[test]
fn c_signature_method_with_this() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::empty");
    method1.member = Some(empty_membership());
    method1.return_type = CppType::BuiltInNumeric(CppBuiltInNumericType::Int);
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::Class(CppPath::from_good_str("MyClass2")),
        name: "my_arg".to_string(),
        default_value: None,
    });

    assert!(!method1.is_constructor());
    assert!(!method1.is_destructor());
    assert_eq!(
        method1.class_type().unwrap(),
        CppPath::from_good_str("MyClass")
    );

    let r = to_ffi(&method1, &["MyClass", "MyClass2"], &[]);
    assert_eq!(r.path, CppPath::from_good_str("mylib_MyClass_empty"));
    assert!(r.arguments.len() == 2);
    assert_eq!(r.arguments[0].name, "this_ptr");
    assert_eq!(
        r.arguments[0].argument_type.ffi_type(),
        &CppType::new_pointer(false, CppType::Class(method1.class_type().unwrap()))
    );
    assert_eq!(
        r.arguments[0].argument_type.conversion(),
        &CppTypeConversionToFfi::NoChange
    );
    assert_eq!(r.arguments[0].meaning, CppFfiArgumentMeaning::This);

    assert_eq!(r.arguments[1].name, "my_arg");
    assert_eq!(
        r.arguments[1].argument_type.ffi_type(),
        &CppType::new_pointer(true, method1.arguments[0].argument_type.clone())
    );
    assert_eq!(
        r.arguments[1].argument_type.conversion(),
        &CppTypeConversionToFfi::ValueToPointer { is_ffi_const: true }
    );
    assert_eq!(r.arguments[1].meaning, CppFfiArgumentMeaning::Argument(0));
    assert_eq!(r.return_type.ffi_type(), &method1.return_type);
}

#[test]
fn c_signature_const_method() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::empty");
    method1.member = Some({
        let mut info = empty_membership();
        info.is_const = true;
        info
    });
    let r = to_ffi(&method1, &["MyClass"], &[]);
    assert!(r.has_this());
    assert!(r.has_const_this());
    assert_eq!(
        r.arguments[0].argument_type.ffi_type(),
        &CppType::new_pointer(true, CppType::Class(method1.class_type().unwrap()))
    );
}

#[test]
fn c_signature_static_method() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::empty");
    method1.member = Some({
        let mut info = empty_membership();
        info.is_static = true;
        info
    });
    method1.return_type = CppType::BuiltInNumeric(CppBuiltInNumericType::Int);
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::Enum {
            path: CppPath::from_good_str("Enum1"),
        },
        name: "arg1".to_string(),
        default_value: None,
    });
    let r = to_ffi(&method1, &["MyClass"], &["Enum1"]);
    assert!(r.arguments.len() == 1);
    assert!(!r.has_this());
    assert_eq!(r.arguments[0].name, "arg1");
    assert_eq!(r.arguments[0].meaning, CppFfiArgumentMeaning::Argument(0));
    assert_eq!(r.return_type.ffi_type(), &method1.return_type);
}

#[test]
fn c_signature_constructor() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::MyClass");
    method1.member = Some({
        let mut info = empty_membership();
        info.kind = CppFunctionKind::Constructor;
        info
    });
    method1.arguments.push(CppFunctionArgument {
        argument_type: CppType::new_reference(
            true,
            CppType::Enum {
                path: CppPath::from_good_str("Enum1"),
            },
        ),
        name: "arg1".to_string(),
        default_value: Some("Enum1::Value1".to_string()),
    });

    assert!(method1.is_constructor());
    assert!(!method1.is_destructor());
    assert_eq!(
        method1.class_type().unwrap(),
        CppPath::from_good_str("MyClass")
    );

    let r = to_ffi(&method1, &["MyClass"], &["Enum1"]);
    assert_eq!(r.path, CppPath::from_good_str("mylib_MyClass_new"));
    assert!(r.arguments.len() == 1);
    assert_eq!(r.arguments[0].name, "arg1");
    assert_eq!(
        r.arguments[0].argument_type.ffi_type(),
        &CppType::new_pointer(
            true,
            CppType::Enum {
                path: CppPath::from_good_str("Enum1"),
            }
        ),
    );
    assert_eq!(
        r.arguments[0].argument_type.conversion(),
        &CppTypeConversionToFfi::ReferenceToPointer
    );
    assert_eq!(r.arguments[0].meaning, CppFfiArgumentMeaning::Argument(0));
    assert_eq!(
        r.return_type.ffi_type(),
        &CppType::new_pointer(false, CppType::Class(CppPath::from_good_str("MyClass"))),
    );
    assert_eq!(
        r.return_type.conversion(),
        &CppTypeConversionToFfi::ValueToPointer {
            is_ffi_const: false
        }
    );
}

#[test]
fn c_signature_destructor() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::~MyClass");
    method1.member = Some({
        let mut info = empty_membership();
        info.kind = CppFunctionKind::Destructor;
        info
    });

    assert!(!method1.is_constructor());
    assert!(method1.is_destructor());

    let r = to_ffi(&method1, &["MyClass"], &[]);
    assert_eq!(r.path, CppPath::from_good_str("mylib_MyClass_delete"));
    assert_eq!(r.arguments.len(), 1);
    assert_eq!(r.arguments[0].name, "this_ptr");
    assert_eq!(
        r.arguments[0].argument_type.ffi_type(),
        &CppType::new_pointer(false, CppType::Class(method1.class_type().unwrap()))
    );
    assert_eq!(
        r.arguments[0].argument_type.conversion(),
        &CppTypeConversionToFfi::NoChange
    );
    assert_eq!(r.arguments[0].meaning, CppFfiArgumentMeaning::This);

    assert!(r.return_type.ffi_type().is_void());
}

#[test]
fn c_signature_method_returning_class() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::empty");
    method1.member = Some(empty_membership());
    method1.return_type = CppType::Class(CppPath::from_good_str("MyClass3"));
    let r = to_ffi(&method1, &["MyClass", "MyClass3"], &[]);
    assert!(r.arguments.len() == 1);
    assert_eq!(r.arguments[0].meaning, CppFfiArgumentMeaning::This);
    assert_eq!(
        r.return_type.ffi_type(),
        &CppType::new_pointer(false, CppType::Class(CppPath::from_good_str("MyClass3"))),
    );
    assert_eq!(
        r.return_type.conversion(),
        &CppTypeConversionToFfi::ValueToPointer {
            is_ffi_const: false
        }
    );
}

#[test]
fn full_name_free_function_in_namespace() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("ns::func1");
    assert!(method1.class_type().is_err());
}

#[test]
fn full_name_method() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::func1");
    method1.member = Some(empty_membership());
    assert_eq!(
        method1.class_type().unwrap(),
        CppPath::from_good_str("MyClass")
    );
}

#[test]
fn full_name_nested_class_method() {
    let mut method1 = empty_regular_method();
    method1.path = CppPath::from_good_str("MyClass::Iterator::func1");
    method1.member = Some(empty_membership());
    assert_eq!(
        method1.class_type().unwrap(),
        CppPath::from_good_str("MyClass::Iterator")
    );
}

#[test]
fn short_text1() {
    let method = CppFunction {
        path: CppPath::from_good_str("Class1::method1"),
        member: Some(CppFunctionMemberData {
            kind: CppFunctionKind::Regular,
            is_virtual: false,
            is_pure_virtual: false,
            is_const: true,
            is_static: false,
            visibility: CppVisibility::Protected,
        }),
        return_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        arguments: vec![
            CppFunctionArgument {
                argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
                name: "arg1".to_string(),
                default_value: None,
            },
            CppFunctionArgument {
                argument_type: CppType::BuiltInNumeric(CppBuiltInNumericType::Double),
                name: "arg2".to_string(),
                default_value: Some("0.5".to_string()),
            },
        ],
        allows_variadic_arguments: false,
    };
    assert_eq!(
        method.short_text(),
        "protected int Class1::method1(int arg1, double arg2 = 0.5) const"
    );
}
