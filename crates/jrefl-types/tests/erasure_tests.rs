use super::*;
use crate::registry::ClassDecl;
use crate::test_fixtures::JavaLib;
use crate::types::type_list;
use rayon::prelude::*;
use std::sync::Arc;

#[test]
fn test_erasure_of_each_kind() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let raw_list = lib.raw(lib.list);

    assert_eq!(types.erasure(TypeId::BOTTOM).unwrap(), TypeId::BOTTOM);
    assert_eq!(types.erasure(TypeId::INT).unwrap(), TypeId::INT);
    assert_eq!(types.erasure(lib.string).unwrap(), lib.string);
    assert_eq!(types.erasure(lib.list).unwrap(), raw_list);
    assert_eq!(types.erasure(lib.list_of(lib.string)).unwrap(), raw_list);
    assert_eq!(types.erasure(raw_list).unwrap(), raw_list);
    assert_eq!(
        types.erasure(lib.array_of(lib.list_of(lib.string))).unwrap(),
        lib.array_of(raw_list)
    );
    assert_eq!(
        types.erasure(lib.array_of(TypeId::INT)).unwrap(),
        lib.array_of(TypeId::INT)
    );

    assert_eq!(types.erasure(lib.param(lib.list, 0)).unwrap(), TypeId::OBJECT);
    assert_eq!(
        types.erasure(lib.param(lib.enum_, 0)).unwrap(),
        lib.raw(lib.enum_)
    );

    let extends_list = types.extends_wildcard(lib.list_of(lib.string)).unwrap();
    assert_eq!(types.erasure(extends_list).unwrap(), raw_list);
    let super_integer = types.super_wildcard(lib.integer).unwrap();
    assert_eq!(types.erasure(super_integer).unwrap(), TypeId::OBJECT);

    let captured = types.capture_wildcard(None, extends_list).unwrap();
    assert_eq!(types.erasure(captured).unwrap(), raw_list);
}

#[test]
fn test_erasure_is_idempotent_and_memoised() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let samples = [
        lib.list_of(lib.string),
        lib.array_of(lib.array_list_of(lib.integer)),
        lib.param(lib.enum_, 0),
        types.extends_wildcard(lib.number).unwrap(),
        TypeId::LONG,
    ];
    for id in samples {
        let erased = types.erasure(id).unwrap();
        assert_eq!(types.erasure(erased).unwrap(), erased);
        assert_eq!(types.node(id).unwrap().cached_erasure(), Some(erased));
        assert_eq!(types.erasure(id).unwrap(), erased);
    }
}

#[test]
fn test_erasure_follows_variable_chains() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let holder = types
        .declare_class(ClassDecl::new("com/example/Holder").type_parameters(&["T", "U"]))
        .unwrap();
    let t = lib.param(holder, 0);
    let u = lib.param(holder, 1);

    // T extends U, U extends List<T>
    types.set_type_parameter_bounds(t, &[u]).unwrap();
    types.set_type_parameter_bounds(u, &[lib.list_of(t)]).unwrap();

    assert_eq!(types.erasure(t).unwrap(), lib.raw(lib.list));
    assert_eq!(types.erasure(u).unwrap(), lib.raw(lib.list));
}

#[test]
fn test_cyclic_variable_bounds_erase_to_object() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let holder = types
        .declare_class(ClassDecl::new("com/example/Cycle").type_parameters(&["A", "B"]))
        .unwrap();
    let a = lib.param(holder, 0);
    let b = lib.param(holder, 1);
    types.set_type_parameter_bounds(a, &[b]).unwrap();
    types.set_type_parameter_bounds(b, &[a]).unwrap();

    assert_eq!(types.erasure(a).unwrap(), TypeId::OBJECT);
    assert_eq!(types.erasure(b).unwrap(), TypeId::OBJECT);
}

#[test]
fn test_erase_list_preserves_identity() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let erased = type_list(&[lib.string, TypeId::INT, lib.raw(lib.list)]);
    assert!(Arc::ptr_eq(&types.erase_list(&erased).unwrap(), &erased));

    let generic = type_list(&[TypeId::INT, lib.list_of(lib.string)]);
    let result = types.erase_list(&generic).unwrap();
    assert!(!Arc::ptr_eq(&result, &generic));
    assert_eq!(&*result, &[TypeId::INT, lib.raw(lib.list)]);
}

#[test]
fn test_failed_erasure_leaves_registry_usable() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let foreign = TypeId(1_000_000);
    assert!(matches!(types.erasure(foreign), Err(TypeError::UnknownType(_))));
    let list = type_list(&[lib.list_of(lib.string), foreign]);
    assert!(types.erase_list(&list).is_err());

    // Nothing is poisoned: later work proceeds normally.
    assert_eq!(
        types.erasure(lib.list_of(lib.string)).unwrap(),
        lib.raw(lib.list)
    );
    assert!(types.make_array_type(lib.string).is_ok());
}

#[test]
fn test_concurrent_erasure_agrees() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let inputs: Vec<TypeId> = vec![
        lib.list_of(lib.string),
        lib.array_list_of(lib.integer),
        lib.apply(lib.map, &[lib.string, lib.long]),
        lib.array_of(lib.list_of(lib.number)),
    ];

    let results: Vec<Vec<TypeId>> = (0..32)
        .into_par_iter()
        .map(|_| inputs.iter().map(|&id| types.erasure(id).unwrap()).collect())
        .collect();

    let expected = vec![
        lib.raw(lib.list),
        lib.raw(lib.array_list),
        lib.raw(lib.map),
        lib.array_of(lib.raw(lib.list)),
    ];
    assert!(results.iter().all(|r| *r == expected));
}

#[test]
fn test_erasure_before_bounds_are_set_is_not_kept() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let holder = types
        .declare_class(ClassDecl::new("com/example/Holder").type_parameters(&["T"]))
        .unwrap();
    let t = lib.param(holder, 0);
    let t_array = lib.array_of(t);
    let extends_t = types.extends_wildcard(t).unwrap();

    assert_eq!(types.erasure(t).unwrap(), TypeId::OBJECT);
    assert_eq!(types.erasure(t_array).unwrap(), lib.array_of(TypeId::OBJECT));
    assert_eq!(types.erasure(extends_t).unwrap(), TypeId::OBJECT);
    assert_eq!(types.node(t).unwrap().cached_erasure(), None);
    assert_eq!(types.node(t_array).unwrap().cached_erasure(), None);

    types.set_type_parameter_bounds(t, &[lib.number]).unwrap();
    assert_eq!(types.erasure(t).unwrap(), lib.number);
    assert_eq!(types.erasure(t_array).unwrap(), lib.array_of(lib.number));
    assert_eq!(types.erasure(extends_t).unwrap(), lib.number);
    assert_eq!(types.node(t_array).unwrap().cached_erasure(), Some(lib.array_of(lib.number)));
}
