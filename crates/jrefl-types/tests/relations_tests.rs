use super::*;
use crate::flags::Modifiers;
use crate::registry::ClassDecl;
use crate::test_fixtures::JavaLib;

#[test]
fn test_generic_class_subtyping() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let array_list_string = lib.array_list_of(lib.string);
    let list_string = lib.list_of(lib.string);
    let iterable_string = lib.apply(lib.iterable, &[lib.string]);

    assert!(types.is_subtype(array_list_string, list_string));
    assert!(types.is_subtype(list_string, iterable_string));
    assert!(types.is_subtype(array_list_string, TypeId::OBJECT));
    assert!(types.is_subtype(array_list_string, lib.serializable));
    assert!(!types.is_subtype(array_list_string, lib.list_of(lib.integer)));
    assert!(!types.is_subtype(list_string, array_list_string));
    assert!(!types.is_subtype(lib.list_of(lib.integer), lib.list_of(lib.number)));
}

#[test]
fn test_class_and_interface_subtyping() {
    let lib = JavaLib::new();
    let types = &lib.types;

    assert!(types.is_subtype(lib.integer, lib.number));
    assert!(types.is_subtype(lib.integer, lib.serializable));
    assert!(types.is_subtype(lib.integer, lib.apply(lib.comparable, &[lib.integer])));
    assert!(!types.is_subtype(lib.integer, lib.apply(lib.comparable, &[lib.long])));
    assert!(types.is_subtype(lib.string, lib.char_sequence));
    assert!(!types.is_subtype(lib.number, lib.integer));
    assert!(!types.is_subtype(lib.string, lib.number));
}

#[test]
fn test_wildcard_containment() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let extends_char_seq = types.extends_wildcard(lib.char_sequence).unwrap();
    let super_string = types.super_wildcard(lib.string).unwrap();
    let unbounded = types.unbounded_wildcard();

    let list_string = lib.list_of(lib.string);
    assert!(types.is_subtype(list_string, lib.list_of(extends_char_seq)));
    assert!(types.is_subtype(list_string, lib.list_of(super_string)));
    assert!(types.is_subtype(lib.list_of(TypeId::OBJECT), lib.list_of(super_string)));
    assert!(types.is_subtype(lib.list_of(lib.char_sequence), lib.list_of(super_string)));
    assert!(!types.is_subtype(lib.list_of(lib.integer), lib.list_of(super_string)));
    assert!(!types.is_subtype(lib.list_of(lib.integer), lib.list_of(extends_char_seq)));

    let extends_number = types.extends_wildcard(lib.number).unwrap();
    assert!(types.is_subtype(lib.list_of(extends_number), lib.list_of(unbounded)));
    assert!(!types.is_subtype(lib.list_of(unbounded), lib.list_of(extends_number)));

    // Through the hierarchy: ArrayList<String> <: Collection<? extends CharSequence>
    let collection_extends = lib.apply(lib.collection, &[extends_char_seq]);
    assert!(types.is_subtype(lib.array_list_of(lib.string), collection_extends));
}

#[test]
fn test_contains_type() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let extends_number = types.extends_wildcard(lib.number).unwrap();
    let super_integer = types.super_wildcard(lib.integer).unwrap();

    assert!(types.contains_type(extends_number, lib.integer));
    assert!(types.contains_type(extends_number, extends_number));
    assert!(!types.contains_type(extends_number, lib.string));
    assert!(types.contains_type(super_integer, lib.number));
    assert!(!types.contains_type(super_integer, lib.long));
    assert!(types.contains_type(lib.string, lib.string));
    assert!(!types.contains_type(lib.integer, lib.number));
}

#[test]
fn test_array_subtyping() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let strings = lib.array_of(lib.string);
    let objects = lib.array_of(TypeId::OBJECT);
    let ints = lib.array_of(TypeId::INT);
    let longs = lib.array_of(TypeId::LONG);

    assert!(types.is_subtype(strings, objects));
    assert!(types.is_subtype(strings, lib.array_of(lib.char_sequence)));
    assert!(!types.is_subtype(objects, strings));
    assert!(!types.is_subtype(ints, objects));
    assert!(!types.is_subtype(ints, longs));
    for supertype in [TypeId::OBJECT, lib.cloneable, lib.serializable] {
        assert!(types.is_subtype(ints, supertype));
        assert!(types.is_subtype(strings, supertype));
    }
    assert!(!types.is_subtype(strings, lib.char_sequence));
}

#[test]
fn test_primitive_and_bottom_subtyping() {
    let lib = JavaLib::new();
    let types = &lib.types;

    assert!(types.is_subtype(TypeId::INT, TypeId::LONG));
    assert!(types.is_subtype(TypeId::CHAR, TypeId::INT));
    assert!(!types.is_subtype(TypeId::LONG, TypeId::INT));
    assert!(!types.is_subtype(TypeId::INT, lib.integer));

    assert!(types.is_subtype(TypeId::BOTTOM, lib.string));
    assert!(types.is_subtype(TypeId::BOTTOM, lib.list_of(lib.string)));
    assert!(!types.is_subtype(TypeId::BOTTOM, TypeId::INT));
}

#[test]
fn test_raw_types() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let raw_list = lib.raw(lib.list);
    let raw_array_list = lib.raw(lib.array_list);
    let list_string = lib.list_of(lib.string);

    assert!(types.is_subtype(list_string, raw_list));
    assert!(types.is_subtype(raw_array_list, raw_list));
    assert!(!types.is_subtype(raw_array_list, list_string));
    // Unchecked conversion is allowed for assignment.
    assert!(types.is_assignable(raw_array_list, list_string));
    assert!(!types.is_assignable(lib.string, list_string));
}

#[test]
fn test_self_referential_bounds_terminate() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let e = lib.param(lib.enum_, 0);
    assert!(types.is_subtype(e, lib.enum_));
    assert!(types.is_subtype(e, lib.apply(lib.comparable, &[e])));
    assert!(types.is_subtype(e, lib.serializable));

    let color = types
        .declare_class(ClassDecl::new("com/example/Color").modifiers(Modifiers::PUBLIC | Modifiers::FINAL))
        .unwrap();
    let enum_color = lib.apply(lib.enum_, &[color]);
    types.define_supertypes(color, Some(enum_color), &[]).unwrap();

    assert!(types.is_subtype(color, enum_color));
    assert!(types.is_subtype(color, lib.apply(lib.comparable, &[color])));
    assert!(!types.is_subtype(color, lib.apply(lib.comparable, &[lib.string])));
}

#[test]
fn test_checker_is_reusable() {
    let lib = JavaLib::new();
    let mut checker = SubtypeChecker::new(&lib.types);
    assert!(checker.is_subtype(lib.integer, lib.number));
    assert!(!checker.is_subtype(lib.number, lib.integer));
    assert!(checker.is_subtype(lib.array_list_of(lib.string), lib.list_of(lib.string)));
    let wildcard = lib.types.extends_wildcard(lib.number).unwrap();
    assert!(checker.contains(wildcard, lib.long));
}

#[test]
fn test_wildcard_is_never_a_subtype_target() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let wildcard = types.extends_wildcard(lib.char_sequence).unwrap();
    assert!(!types.is_subtype(lib.string, wildcard));
    assert!(types.is_assignable(lib.string, wildcard));
}

#[test]
fn test_capture_lower_bound_accepts_subtypes() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let super_integer = types.super_wildcard(lib.integer).unwrap();
    let captured_list = types.capture(lib.list_of(super_integer)).unwrap();
    let cap = types.type_arguments(captured_list)[0];
    assert!(types.is_captured(cap));

    assert!(types.is_subtype(lib.integer, cap));
    assert!(types.is_subtype(TypeId::BOTTOM, cap));
    assert!(!types.is_subtype(lib.number, cap));
    assert!(types.is_subtype(cap, TypeId::OBJECT));
}

#[test]
fn test_assignability_conversions() {
    let lib = JavaLib::new();
    let types = &lib.types;

    // widening
    assert!(types.is_assignable(TypeId::INT, TypeId::LONG));
    assert!(!types.is_assignable(TypeId::LONG, TypeId::INT));
    // boxing, then widening reference
    assert!(types.is_assignable(TypeId::INT, lib.integer));
    assert!(types.is_assignable(TypeId::INT, lib.number));
    assert!(types.is_assignable(TypeId::INT, TypeId::OBJECT));
    assert!(!types.is_assignable(TypeId::INT, lib.long));
    // unboxing, then widening primitive
    assert!(types.is_assignable(lib.integer, TypeId::INT));
    assert!(types.is_assignable(lib.integer, TypeId::LONG));
    assert!(!types.is_assignable(lib.long, TypeId::INT));

    assert!(!types.is_assignable(TypeId::VOID, TypeId::OBJECT));
    assert!(types.is_assignable_from(lib.number, lib.integer));
    assert!(!types.is_assignable_from(lib.integer, lib.number));
}

#[test]
fn test_bottom_assignability() {
    let lib = JavaLib::new();
    let types = &lib.types;

    assert!(types.is_assignable(TypeId::BOTTOM, lib.string));
    assert!(types.is_assignable(TypeId::BOTTOM, lib.array_of(TypeId::INT)));
    assert!(!types.is_assignable(TypeId::BOTTOM, TypeId::INT));
    // Everything is assignable to the bottom type.
    assert!(types.is_assignable(lib.string, TypeId::BOTTOM));
    assert!(types.is_assignable(TypeId::INT, TypeId::BOTTOM));
}

#[test]
fn test_type_parameter_targets_use_their_bound() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let list_e = lib.param(lib.list, 0);
    assert!(types.is_assignable(lib.string, list_e));

    let enum_e = lib.param(lib.enum_, 0);
    assert!(!types.is_assignable(lib.string, enum_e));
}

#[test]
fn test_is_instance() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let runtime = lib.raw(lib.array_list);

    assert!(types.is_instance(lib.list_of(lib.string), ValueRef::Instance(runtime)));
    assert!(types.is_instance(TypeId::OBJECT, ValueRef::Instance(lib.string)));
    assert!(!types.is_instance(lib.string, ValueRef::Instance(runtime)));
    assert!(!types.is_instance(TypeId::OBJECT, ValueRef::Null));
    assert!(!types.is_instance(TypeId::BOTTOM, ValueRef::Instance(lib.string)));
    assert!(!types.is_instance(TypeId::BOTTOM, ValueRef::Null));
}

#[test]
fn test_equivalence() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let list_string = lib.list_of(lib.string);
    assert!(types.is_equivalent(list_string, lib.list_of(lib.string)));
    assert!(!types.is_equivalent(list_string, lib.list_of(lib.integer)));
    assert!(!types.is_equivalent(lib.raw(lib.list), lib.list));
    assert!(!types.is_equivalent(lib.param(lib.list, 0), lib.param(lib.array_list, 0)));
    assert!(types.is_equivalent(lib.array_of(list_string), lib.array_of(list_string)));

    let wildcard = types.extends_wildcard(lib.number).unwrap();
    let first = types.capture_wildcard(None, wildcard).unwrap();
    let second = types.capture_wildcard(None, wildcard).unwrap();
    assert!(!types.is_same_type(first, second));
    assert!(types.is_equivalent(first, second));
    assert!(types.is_same_type(first, first));
}

#[test]
fn test_bounds() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let super_integer = types.super_wildcard(lib.integer).unwrap();
    assert_eq!(types.upper_bound(super_integer).unwrap(), TypeId::OBJECT);
    assert_eq!(types.lower_bound(super_integer).unwrap(), lib.integer);
    assert_eq!(types.upper_bound(lib.string).unwrap(), lib.string);
    assert_eq!(types.lower_bound(lib.string).unwrap(), lib.string);
    assert!(types.upper_bound(TypeId(123_456)).is_err());
}

#[test]
fn test_glb() {
    let lib = JavaLib::new();
    let types = &lib.types;

    assert_eq!(types.glb(lib.integer, lib.number).unwrap(), lib.integer);
    assert_eq!(types.glb(lib.number, lib.integer).unwrap(), lib.integer);
    assert_eq!(types.glb(lib.serializable, lib.number).unwrap(), lib.number);
    // Unrelated: the class wins over the interface.
    assert_eq!(types.glb(lib.char_sequence, lib.number).unwrap(), lib.number);
    assert_eq!(types.glb(lib.number, lib.char_sequence).unwrap(), lib.number);
    assert!(types.glb(TypeId::INT, lib.string).is_err());
}

#[test]
fn test_substitution() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let e = lib.param(lib.array_list, 0);
    let bindings = TypeBindings::of(types, lib.array_list_of(lib.string));
    assert_eq!(bindings.get(e), Some(lib.string));
    assert_eq!(bindings.get(lib.param(lib.list, 0)), None);

    assert_eq!(
        types.substitute(lib.list_of(e), &bindings).unwrap(),
        lib.list_of(lib.string)
    );
    assert_eq!(
        types.substitute(lib.array_of(e), &bindings).unwrap(),
        lib.array_of(lib.string)
    );
    let extends_e = types.extends_wildcard(e).unwrap();
    let extends_string = types.extends_wildcard(lib.string).unwrap();
    assert_eq!(
        types
            .substitute(lib.apply(lib.collection, &[extends_e]), &bindings)
            .unwrap(),
        lib.apply(lib.collection, &[extends_string])
    );
    assert_eq!(types.substitute(lib.string, &bindings).unwrap(), lib.string);

    // Empty bindings change nothing.
    let empty = TypeBindings::of(types, lib.string);
    assert!(empty.is_empty());
    assert_eq!(types.substitute(lib.list_of(e), &empty).unwrap(), lib.list_of(e));
}

#[test]
fn test_substituting_a_wildcard_into_an_array_uses_its_bound() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let e = lib.param(lib.array_list, 0);
    let wildcard = types.extends_wildcard(lib.number).unwrap();
    let bindings = TypeBindings::new(type_list(&[e]), type_list(&[wildcard])).unwrap();

    assert_eq!(
        types.substitute(lib.array_of(e), &bindings).unwrap(),
        lib.array_of(lib.number)
    );
    assert_eq!(types.substitute(e, &bindings).unwrap(), wildcard);
}

#[test]
fn test_substitute_list_preserves_identity() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let bindings = TypeBindings::of(types, lib.array_list_of(lib.string));

    let untouched = type_list(&[lib.string, TypeId::INT]);
    let result = types.substitute_list(&untouched, &bindings).unwrap();
    assert!(Arc::ptr_eq(&result, &untouched));

    let e = lib.param(lib.array_list, 0);
    let touched = type_list(&[TypeId::INT, e]);
    let result = types.substitute_list(&touched, &bindings).unwrap();
    assert_eq!(&*result, &[TypeId::INT, lib.string]);
}

#[test]
fn test_bindings_require_matching_lengths() {
    let lib = JavaLib::new();
    let params = lib.types.generic_parameters(lib.map);
    let err = TypeBindings::new(params, type_list(&[lib.string])).unwrap_err();
    assert!(matches!(err, TypeError::InvalidArgument(_)));
}

#[test]
fn test_projected_supertypes() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let array_list_string = lib.array_list_of(lib.string);
    assert_eq!(
        types.base_type(array_list_string).unwrap(),
        Some(lib.apply(lib.abstract_list, &[lib.string]))
    );
    assert_eq!(
        &*types.interfaces(array_list_string).unwrap(),
        &[lib.list_of(lib.string), lib.cloneable, lib.serializable]
    );

    let raw = lib.raw(lib.array_list);
    assert_eq!(types.base_type(raw).unwrap(), Some(lib.raw(lib.abstract_list)));
    assert_eq!(types.interfaces(raw).unwrap()[0], lib.raw(lib.list));

    assert_eq!(types.base_type(lib.list).unwrap(), None);
    assert_eq!(types.base_type(TypeId::INT).unwrap(), None);

    let strings = lib.array_of(lib.string);
    assert_eq!(types.base_type(strings).unwrap(), Some(TypeId::OBJECT));
    assert_eq!(
        &*types.interfaces(strings).unwrap(),
        &[lib.cloneable, lib.serializable]
    );
}

#[test]
fn test_as_super() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let iterable = types.raw_class("java/lang/Iterable");

    assert_eq!(
        types.as_super(lib.array_list_of(lib.string), iterable).unwrap(),
        Some(lib.apply(lib.iterable, &[lib.string]))
    );
    assert_eq!(
        types.as_super(lib.string, types.raw_class("java/util/List")).unwrap(),
        None
    );
    assert_eq!(
        types
            .as_super(lib.array_of(lib.string), types.raw_class("java/lang/Object"))
            .unwrap(),
        Some(TypeId::OBJECT)
    );
    // A bounded parameter sees its bound's supertypes.
    let e = lib.param(lib.enum_, 0);
    assert_eq!(
        types
            .as_super(e, types.raw_class("java/lang/Comparable"))
            .unwrap(),
        Some(lib.apply(lib.comparable, &[e]))
    );
}
