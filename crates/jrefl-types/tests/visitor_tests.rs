use super::*;
use crate::test_fixtures::JavaLib;
use crate::types::type_list;

struct KindLabel;

impl TypeVisitor for KindLabel {
    type Output = &'static str;

    fn default_output() -> &'static str {
        "unknown"
    }

    fn visit_class(&mut self, _: &TypeRegistry, _: TypeId, _: &ClassType, _: ()) -> &'static str {
        "class"
    }

    fn visit_primitive(&mut self, _: &TypeRegistry, _: TypeId, _: PrimitiveKind, _: ()) -> &'static str {
        "primitive"
    }

    fn visit_array(&mut self, _: &TypeRegistry, _: TypeId, _: TypeId, _: ()) -> &'static str {
        "array"
    }

    fn visit_type_parameter(
        &mut self,
        _: &TypeRegistry,
        _: TypeId,
        _: &TypeParamInfo,
        _: (),
    ) -> &'static str {
        "type-parameter"
    }

    fn visit_wildcard(&mut self, _: &TypeRegistry, _: TypeId, _: &WildcardBounds, _: ()) -> &'static str {
        "wildcard"
    }

    fn visit_captured(&mut self, _: &TypeRegistry, _: TypeId, _: &CapturedInfo, _: ()) -> &'static str {
        "captured"
    }

    fn visit_other(&mut self, _: &TypeRegistry, _: TypeId, _: ()) -> &'static str {
        "bottom"
    }
}

#[test]
fn test_dispatch_reaches_every_variant() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let wildcard = types.unbounded_wildcard();
    let captured = types.capture_wildcard(None, wildcard).unwrap();

    let cases = [
        (lib.list_of(lib.string), "class"),
        (TypeId::INT, "primitive"),
        (lib.array_of(lib.string), "array"),
        (lib.param(lib.list, 0), "type-parameter"),
        (wildcard, "wildcard"),
        (captured, "captured"),
        (TypeId::BOTTOM, "bottom"),
        (TypeId(987_654), "unknown"),
    ];
    for (id, expected) in cases {
        assert_eq!(KindLabel.visit(types, id, ()), expected, "{id:?}");
    }
}

struct IsNumeric;

impl TypeVisitor for IsNumeric {
    type Output = bool;

    fn default_output() -> bool {
        false
    }

    fn visit_primitive(&mut self, _: &TypeRegistry, _: TypeId, kind: PrimitiveKind, _: ()) -> bool {
        kind.is_numeric()
    }
}

#[test]
fn test_unoverridden_hooks_use_default_output() {
    let lib = JavaLib::new();
    let types = &lib.types;
    assert!(IsNumeric.visit(types, TypeId::DOUBLE, ()));
    assert!(!IsNumeric.visit(types, TypeId::BOOLEAN, ()));
    assert!(!IsNumeric.visit(types, lib.integer, ()));
    assert!(!IsNumeric.visit(types, TypeId::BOTTOM, ()));
}

/// Counts arrays; everything else goes to the catch-all.
#[derive(Default)]
struct ArrayCounter {
    arrays: usize,
    others: usize,
}

impl DefaultTypeVisitor for ArrayCounter {
    type Output = ();

    fn visit_type(&mut self, _: &TypeRegistry, _: TypeId, _: ()) {
        self.others += 1;
    }

    fn visit_array(&mut self, _: &TypeRegistry, _: TypeId, _: TypeId, _: ()) {
        self.arrays += 1;
    }
}

#[test]
fn test_default_visitor_catch_all() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let mut counter = ArrayCounter::default();
    counter.visit_all(
        types,
        &[
            lib.array_of(TypeId::INT),
            lib.string,
            TypeId::BOTTOM,
            types.unbounded_wildcard(),
            lib.array_of(lib.string),
            TypeId(555_555),
        ],
    );
    assert_eq!(counter.arrays, 2);
    assert_eq!(counter.others, 4);
}

/// Replaces `from` with `to` at the top level.
struct Replace {
    from: TypeId,
    to: TypeId,
}

impl DefaultTypeVisitor for Replace {
    type Output = TypeId;

    fn visit_type(&mut self, _: &TypeRegistry, id: TypeId, _: ()) -> TypeId {
        if id == self.from { self.to } else { id }
    }
}

impl TypeMapper for Replace {}

#[test]
fn test_map_list_preserves_identity() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let mut mapper = Replace {
        from: lib.string,
        to: lib.integer,
    };

    let untouched = type_list(&[TypeId::INT, lib.long]);
    assert!(Arc::ptr_eq(&mapper.map_list(types, &untouched, ()), &untouched));

    let touched = type_list(&[TypeId::INT, lib.string, lib.long, lib.string]);
    let mapped = mapper.map_list(types, &touched, ());
    assert_eq!(&*mapped, &[TypeId::INT, lib.integer, lib.long, lib.integer]);
    assert_eq!(mapper.map(types, lib.string, ()), lib.integer);
}

#[test]
fn test_relation_helpers() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let e = lib.param(lib.list, 0);

    let mut occurs = OccursIn::default();
    assert!(occurs.holds(types, lib.list_of(e), e));
    assert!(occurs.holds_for_any(types, &[lib.string, lib.array_of(e)], e));
    assert!(!occurs.holds_for_any(types, &[lib.string, TypeId::INT], e));
    assert!(!occurs.holds_for_any(types, &[], e));
    assert!(occurs.holds_pairwise(types, &[e, lib.list_of(e)], &[e, e]));
    assert!(!occurs.holds_pairwise(types, &[e], &[e, e]));
}

#[test]
fn test_contains_generic_parameters() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let e = lib.param(lib.list, 0);
    let other = lib.param(lib.array_list, 0);

    assert!(!types.contains_generic_parameters(lib.list_of(lib.string)));
    assert!(types.contains_generic_parameters(lib.list_of(e)));
    assert!(types.contains_generic_parameters(lib.array_of(e)));
    let extends_e = types.extends_wildcard(e).unwrap();
    assert!(types.contains_generic_parameters(extends_e));
    let captured = types.capture_wildcard(None, types.unbounded_wildcard()).unwrap();
    assert!(types.contains_generic_parameters(captured));

    assert!(types.contains_generic_parameter(lib.list_of(extends_e), e));
    assert!(!types.contains_generic_parameter(lib.list_of(extends_e), other));
    assert!(!types.contains_generic_parameter(TypeId::INT, e));
}

#[test]
fn test_collect_referenced_types() {
    let lib = JavaLib::new();
    let types = &lib.types;

    let list_integer = lib.list_of(lib.integer);
    let array = lib.array_of(list_integer);
    let map = lib.apply(lib.map, &[lib.string, array]);

    let found = collect_referenced_types(types, map);
    for id in [map, lib.string, array, list_integer, lib.integer] {
        assert!(found.contains(&id), "{id:?} not collected");
    }
    assert_eq!(found.len(), 5);

    // Self-referential bounds terminate.
    let e = lib.param(lib.enum_, 0);
    let found = collect_referenced_types(types, e);
    assert!(found.contains(&e));
    assert!(found.contains(&lib.enum_));
}
