use crate::cpp_data::CppPath;
use crate::cpp_data::CppPathItem;
use crate::cpp_ffi_data::CppTypeConversionToFfi;
use crate::cpp_type::{
    CppBuiltInNumericType, CppFunctionPointerType, CppPointerLikeTypeKind, CppSpecificNumericType,
    CppSpecificNumericTypeKind, CppType, CppTypeRole, TargetWidths,
};

fn assert_type_to_ffi_unchanged(t: &CppType) {
    for role in &[CppTypeRole::NotReturnType, CppTypeRole::ReturnType] {
        let ffi1 = t.to_ffi_type(*role).unwrap();
        assert_eq!(ffi1.original_type(), t);
        assert_eq!(ffi1.ffi_type(), t);
        assert_eq!(ffi1.conversion(), &CppTypeConversionToFfi::NoChange);
    }
}

#[test]
fn void() {
    let type1 = CppType::Void;
    assert_eq!(type1.is_void(), true);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.is_template_parameter(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "void");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn void_ptr() {
    let type1 = CppType::new_pointer(false, CppType::Void);
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "void*");
    assert_eq!(type1.to_cpp_code(Some("data")).unwrap(), "void* data");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn int() {
    let type1 = CppType::BuiltInNumeric(CppBuiltInNumericType::Int);
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "int");
    assert_eq!(type1.to_cpp_code(Some("x")).unwrap(), "int x");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn bool_ptr() {
    let type1 = CppType::new_pointer(false, CppType::BuiltInNumeric(CppBuiltInNumericType::Bool));
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "bool*");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn char_ptr_ptr() {
    let type1 = CppType::new_pointer(
        false,
        CppType::new_pointer(false, CppType::BuiltInNumeric(CppBuiltInNumericType::Char)),
    );
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "char**");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn int64() {
    let type1 = CppType::SpecificNumeric(CppSpecificNumericType {
        path: CppPath::from_good_str("int64_t"),
        bits: 64,
        kind: CppSpecificNumericTypeKind::Integer { is_signed: true },
    });
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "int64_t");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn uintptr() {
    let type1 = CppType::PointerSizedInteger {
        path: CppPath::from_good_str("uintptr_t"),
        is_signed: false,
    };
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "uintptr_t");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn enum1() {
    let type1 = CppType::Enum {
        path: CppPath::from_good_str("ns::Direction"),
    };
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "ns::Direction");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn class_value() {
    let type1 = CppType::Class(CppPath::from_good_str("Point"));
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), true);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "Point");

    let ffi_return_type = type1.to_ffi_type(CppTypeRole::ReturnType).unwrap();
    assert_eq!(ffi_return_type.original_type(), &type1);
    assert_eq!(
        ffi_return_type.ffi_type(),
        &CppType::new_pointer(false, CppType::Class(CppPath::from_good_str("Point"))),
    );
    assert_eq!(
        ffi_return_type.ffi_type().to_cpp_code(None).unwrap(),
        "Point*"
    );
    assert_eq!(
        ffi_return_type.conversion(),
        &CppTypeConversionToFfi::ValueToPointer {
            is_ffi_const: false
        }
    );

    let ffi_arg = type1.to_ffi_type(CppTypeRole::NotReturnType).unwrap();
    assert_eq!(ffi_arg.original_type(), &type1);
    assert_eq!(
        ffi_arg.ffi_type(),
        &CppType::new_pointer(true, CppType::Class(CppPath::from_good_str("Point")))
    );
    assert_eq!(
        ffi_arg.ffi_type().to_cpp_code(None).unwrap(),
        "const Point*"
    );
    assert_eq!(
        ffi_arg.conversion(),
        &CppTypeConversionToFfi::ValueToPointer { is_ffi_const: true }
    );
}

#[test]
fn class_const_ref() {
    let type1 = CppType::new_reference(true, CppType::Class(CppPath::from_good_str("Rect")));
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "const Rect&");

    for role in &[CppTypeRole::NotReturnType, CppTypeRole::ReturnType] {
        let ffi1 = type1.to_ffi_type(*role).unwrap();
        assert_eq!(ffi1.original_type(), &type1);
        assert_eq!(
            ffi1.ffi_type(),
            &CppType::new_pointer(true, CppType::Class(CppPath::from_good_str("Rect")))
        );
        assert_eq!(ffi1.ffi_type().to_cpp_code(None).unwrap(), "const Rect*");
        assert_eq!(ffi1.conversion(), &CppTypeConversionToFfi::ReferenceToPointer);
    }
}

#[test]
fn class_mut_ref() {
    let type1 = CppType::new_reference(false, CppType::Class(CppPath::from_good_str("Rect")));
    assert_eq!(type1.to_cpp_code(None).unwrap(), "Rect&");

    for role in &[CppTypeRole::NotReturnType, CppTypeRole::ReturnType] {
        let ffi1 = type1.to_ffi_type(*role).unwrap();
        assert_eq!(ffi1.original_type(), &type1);
        assert_eq!(
            ffi1.ffi_type(),
            &CppType::new_pointer(false, CppType::Class(CppPath::from_good_str("Rect")))
        );
        assert_eq!(ffi1.ffi_type().to_cpp_code(None).unwrap(), "Rect*");
        assert_eq!(ffi1.conversion(), &CppTypeConversionToFfi::ReferenceToPointer);
    }
}

#[test]
fn class_mut_ptr() {
    let type1 = CppType::new_pointer(false, CppType::Class(CppPath::from_good_str("Window")));
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.to_cpp_code(None).unwrap(), "Window*");
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn rvalue_reference() {
    let type1 = CppType::PointerLike {
        kind: CppPointerLikeTypeKind::RValueReference,
        is_const: false,
        target: Box::new(CppType::Class(CppPath::from_good_str("Buffer"))),
    };
    assert_eq!(type1.to_cpp_code(None).unwrap(), "Buffer&&");
    assert!(type1.to_ffi_type(CppTypeRole::NotReturnType).is_err());
    assert!(type1.to_ffi_type(CppTypeRole::ReturnType).is_err());
}

#[test]
fn template_instantiation() {
    let args = Some(vec![CppType::BuiltInNumeric(CppBuiltInNumericType::Int)]);
    let instantiation = CppType::Class(CppPath::from_item(CppPathItem {
        name: "vector".into(),
        template_arguments: args,
    }));
    assert!(instantiation.is_class());
    assert!(instantiation.is_template_instantiation());
    assert_eq!(instantiation.to_cpp_code(None).unwrap(), "vector< int >");

    // by value: no layout is known
    assert!(instantiation.to_ffi_type(CppTypeRole::NotReturnType).is_err());
    assert!(instantiation.to_ffi_type(CppTypeRole::ReturnType).is_err());

    // behind a pointer it is an ordinary opaque handle
    let pointer = CppType::new_pointer(false, instantiation);
    assert_type_to_ffi_unchanged(&pointer);
}

#[test]
fn template_parameter() {
    let type1 = CppType::new_pointer(
        false,
        CppType::TemplateParameter {
            nested_level: 0,
            index: 0,
            name: "T".into(),
        },
    );
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert_eq!(type1.is_template_parameter(), false);
    assert!(type1.is_or_contains_template_parameter());
    assert!(type1.to_cpp_code(None).is_err());
    assert!(type1.to_ffi_type(CppTypeRole::NotReturnType).is_err());
    assert!(type1.to_ffi_type(CppTypeRole::ReturnType).is_err());
}

#[test]
fn function1() {
    let type1 = CppType::FunctionPointer(CppFunctionPointerType {
        allows_variadic_arguments: false,
        return_type: Box::new(CppType::BuiltInNumeric(CppBuiltInNumericType::Int)),
        arguments: vec![
            CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
            CppType::new_pointer(false, CppType::BuiltInNumeric(CppBuiltInNumericType::Bool)),
        ],
    });
    assert_eq!(type1.is_void(), false);
    assert_eq!(type1.is_class(), false);
    assert!(type1.is_function_pointer());
    assert!(type1.to_cpp_code(None).is_err());
    assert_eq!(
        type1.to_cpp_code(Some("callback")).unwrap(),
        "int (*callback)(int, bool*)"
    );
    assert_type_to_ffi_unchanged(&type1);
}

#[test]
fn function_with_class_value() {
    let type1 = CppType::FunctionPointer(CppFunctionPointerType {
        allows_variadic_arguments: false,
        return_type: Box::new(CppType::Void),
        arguments: vec![CppType::Class(CppPath::from_good_str("Point"))],
    });
    assert!(type1.to_ffi_type(CppTypeRole::NotReturnType).is_err());
}

#[test]
fn function_with_reference() {
    let type1 = CppType::FunctionPointer(CppFunctionPointerType {
        allows_variadic_arguments: false,
        return_type: Box::new(CppType::Void),
        arguments: vec![CppType::new_reference(
            true,
            CppType::BuiltInNumeric(CppBuiltInNumericType::Int),
        )],
    });
    assert!(type1.to_ffi_type(CppTypeRole::NotReturnType).is_err());
}

#[test]
fn nested_function_pointer() {
    let inner = CppType::FunctionPointer(CppFunctionPointerType {
        allows_variadic_arguments: false,
        return_type: Box::new(CppType::Void),
        arguments: vec![],
    });
    let type1 = CppType::FunctionPointer(CppFunctionPointerType {
        allows_variadic_arguments: false,
        return_type: Box::new(CppType::Void),
        arguments: vec![inner],
    });
    assert!(type1.to_ffi_type(CppTypeRole::NotReturnType).is_err());
}

#[test]
fn array_type() {
    let type1 = CppType::Array {
        element: Box::new(CppType::BuiltInNumeric(CppBuiltInNumericType::Float)),
        length: 4,
    };
    assert!(type1.to_cpp_code(None).is_err());
    assert_eq!(
        type1.to_cpp_code(Some("values")).unwrap(),
        "float values[4]"
    );
    // arrays decay in signatures; they are only valid as fields
    assert!(type1.to_ffi_type(CppTypeRole::NotReturnType).is_err());
}

#[test]
fn cdef_codes_default_widths() {
    let widths = TargetWidths::default();
    assert_eq!(widths.long_bits, 64);
    assert_eq!(widths.wchar_bits, 32);

    let check = |t: CppBuiltInNumericType, expected: &str| {
        assert_eq!(t.to_cdef_code(&widths).unwrap(), expected);
    };
    check(CppBuiltInNumericType::Bool, "bool");
    check(CppBuiltInNumericType::Char, "char");
    check(CppBuiltInNumericType::SChar, "int8_t");
    check(CppBuiltInNumericType::UChar, "uint8_t");
    check(CppBuiltInNumericType::WChar, "int32_t");
    check(CppBuiltInNumericType::Short, "int16_t");
    check(CppBuiltInNumericType::UShort, "uint16_t");
    check(CppBuiltInNumericType::Int, "int32_t");
    check(CppBuiltInNumericType::UInt, "uint32_t");
    check(CppBuiltInNumericType::Long, "int64_t");
    check(CppBuiltInNumericType::ULong, "uint64_t");
    check(CppBuiltInNumericType::LongLong, "int64_t");
    check(CppBuiltInNumericType::ULongLong, "uint64_t");
    check(CppBuiltInNumericType::Float, "float");
    check(CppBuiltInNumericType::Double, "double");

    assert!(CppBuiltInNumericType::Int128.to_cdef_code(&widths).is_err());
    assert!(CppBuiltInNumericType::UInt128.to_cdef_code(&widths).is_err());
    assert!(CppBuiltInNumericType::LongDouble
        .to_cdef_code(&widths)
        .is_err());
}

#[test]
fn cdef_codes_narrow_widths() {
    let widths = TargetWidths {
        long_bits: 32,
        wchar_bits: 16,
    };
    assert_eq!(
        CppBuiltInNumericType::Long.to_cdef_code(&widths).unwrap(),
        "int32_t"
    );
    assert_eq!(
        CppBuiltInNumericType::ULong.to_cdef_code(&widths).unwrap(),
        "uint32_t"
    );
    assert_eq!(
        CppBuiltInNumericType::WChar.to_cdef_code(&widths).unwrap(),
        "int16_t"
    );
}

#[test]
fn ascii_captions() {
    assert_eq!(
        CppType::BuiltInNumeric(CppBuiltInNumericType::UInt).ascii_caption(),
        "unsigned_int"
    );
    assert_eq!(
        CppType::new_pointer(true, CppType::Class(CppPath::from_good_str("ns::Point")))
            .ascii_caption(),
        "ns_Point_const_ptr"
    );
    assert_eq!(
        CppType::Array {
            element: Box::new(CppType::BuiltInNumeric(CppBuiltInNumericType::Double)),
            length: 3,
        }
        .ascii_caption(),
        "double_x3"
    );
}
