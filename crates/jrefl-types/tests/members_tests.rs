use super::*;
use crate::test_fixtures::JavaLib;

fn field(lib: &JavaLib, name: &str, modifiers: Modifiers) -> Arc<FieldInfo> {
    Arc::new(FieldInfo {
        name: lib.types.names().intern(name),
        declaring: lib.string,
        field_type: TypeId::INT,
        modifiers,
    })
}

fn fields(lib: &JavaLib, names: &[&str]) -> FieldList {
    MemberList::new(
        names
            .iter()
            .map(|name| field(lib, name, Modifiers::PUBLIC))
            .collect(),
    )
}

#[test]
fn test_empty_lists_share_one_backing() {
    let a: FieldList = MemberList::empty();
    let b: FieldList = MemberList::new(Vec::new());
    let c: FieldList = MemberList::default();
    assert!(MemberList::same_view(&a, &b));
    assert!(MemberList::same_view(&a, &c));
    assert!(a.is_empty());
    assert!(a.first().is_none());

    let methods: MethodList = MemberList::empty();
    assert!(MemberList::same_view(&methods, &MemberList::empty()));
}

#[test]
fn test_sub_list_shares_backing() {
    let lib = JavaLib::new();
    let list = fields(&lib, &["a", "b", "c", "d"]);

    let middle = list.sub_list(1, 3).unwrap();
    assert_eq!(middle.len(), 2);
    assert!(Arc::ptr_eq(&middle[0], &list[1]));
    assert!(Arc::ptr_eq(&middle[1], &list[2]));

    let nested = middle.sub_list(1, 2).unwrap();
    assert!(Arc::ptr_eq(&nested[0], &list[2]));

    let whole = list.sub_list(0, 4).unwrap();
    assert!(MemberList::same_view(&whole, &list));

    let empty = list.sub_list(2, 2).unwrap();
    assert!(MemberList::same_view(&empty, &MemberList::empty()));
}

#[test]
fn test_sub_list_bounds() {
    let lib = JavaLib::new();
    let list = fields(&lib, &["a", "b"]);
    assert!(matches!(
        list.sub_list(0, 3),
        Err(TypeError::OutOfBounds { from: 0, to: 3, size: 2 })
    ));
    assert!(matches!(list.sub_list(2, 1), Err(TypeError::OutOfBounds { .. })));
    let tail = list.sub_list(1, 2).unwrap();
    assert!(tail.sub_list(0, 2).is_err());
}

#[test]
fn test_combine() {
    let lib = JavaLib::new();
    let first = fields(&lib, &["a", "b"]);
    let second = fields(&lib, &["c"]);
    let empty = FieldList::empty();

    let combined = MemberList::combine(&[&first, &empty, &second]);
    let names: Vec<_> = combined
        .iter()
        .map(|f| lib.types.names().resolve(f.name).to_string())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);

    let only = MemberList::combine(&[&empty, &second, &empty]);
    assert!(MemberList::same_view(&only, &second));

    let none = MemberList::<FieldInfo>::combine(&[&empty, &empty]);
    assert!(MemberList::same_view(&none, &empty));
    assert!(MemberList::<FieldInfo>::combine(&[]).is_empty());
}

#[test]
fn test_filter_returns_same_view_when_unchanged() {
    let lib = JavaLib::new();
    let list = fields(&lib, &["a", "b"]);
    let all = list.filter(|_| true);
    assert!(MemberList::same_view(&all, &list));
    let none = list.filter(|_| false);
    assert!(MemberList::same_view(&none, &MemberList::empty()));
}

#[test]
fn test_name_and_modifier_filters() {
    let lib = JavaLib::new();
    let names = lib.types.names();
    let list = MemberList::new(vec![
        field(&lib, "count", Modifiers::PUBLIC | Modifiers::STATIC),
        field(&lib, "Count", Modifiers::PRIVATE),
        field(&lib, "total", Modifiers::PUBLIC),
    ]);

    assert_eq!(list.with_name(names, "count", MemberListType::CaseSensitive).len(), 1);
    assert_eq!(list.with_name(names, "COUNT", MemberListType::CaseInsensitive).len(), 2);
    assert_eq!(list.with_name(names, "missing", MemberListType::CaseSensitive).len(), 0);
    assert_eq!(list.with_name(names, "ignored", MemberListType::All).len(), 3);

    assert_eq!(list.with_modifiers(Modifiers::PUBLIC).len(), 2);
    assert_eq!(list.with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC).len(), 1);
}

#[test]
fn test_method_filters() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let methods = types.class_def(lib.array_list).unwrap().members().unwrap().methods.clone();

    assert_eq!(methods.with_arity(1).len(), 3);
    assert_eq!(methods.with_arity(0).len(), 1);
    assert_eq!(methods.with_calling_convention(CallingConvention::STANDARD).len(), 4);
    assert_eq!(methods.with_calling_convention(CallingConvention::VAR_ARGS).len(), 0);
    assert_eq!(methods.with_calling_convention(CallingConvention::empty()).len(), 4);

    let arrays = types.class_def(lib.arrays).unwrap();
    let as_list = &arrays.members().unwrap().methods[0];
    assert_eq!(as_list.calling_convention(), CallingConvention::VAR_ARGS);
    assert!(as_list.is_static());
    assert!(as_list.is_generic_method());
    assert!(!as_list.is_bridge());
}

#[test]
fn test_mixed_member_lists() {
    let lib = JavaLib::new();
    let members = lib.types.class_def(lib.array_list).unwrap().members().unwrap().clone();

    let mut mixed: Vec<MemberInfo> = Vec::new();
    mixed.extend(members.fields.iter().cloned().map(MemberInfo::Field));
    mixed.extend(members.methods.iter().cloned().map(MemberInfo::Method));
    mixed.extend(members.constructors.iter().cloned().map(MemberInfo::Constructor));
    let list = MemberList::new(mixed.into_iter().map(Arc::new).collect());

    assert_eq!(list.of_kind(MemberType::FIELD).len(), 2);
    assert_eq!(list.of_kind(MemberType::METHOD | MemberType::CONSTRUCTOR).len(), 7);
    assert_eq!(list.of_kind(MemberType::NESTED_TYPE).len(), 0);
    assert_eq!(list.of_kind(MemberType::ALL).len(), 9);
    assert!(list.iter().all(|m| m.declaring_type() == lib.array_list));
}

#[test]
fn test_parameter_positions_are_validated() {
    let lib = JavaLib::new();
    let names = lib.types.names();
    let param = |position: u32| {
        Arc::new(ParameterInfo {
            name: names.intern("p"),
            position,
            parameter_type: TypeId::INT,
            declaring: lib.string,
            modifiers: Modifiers::empty(),
        })
    };

    let ok = ParameterList::new(vec![param(0), param(1)]).unwrap();
    assert_eq!(ok.len(), 2);
    assert_eq!(&**ok.parameter_types(), &[TypeId::INT, TypeId::INT]);
    assert_eq!(ok.get(1).map(|p| p.position), Some(1));

    let err = ParameterList::new(vec![param(1)]).unwrap_err();
    assert!(matches!(err, TypeError::InvalidArgument(_)));
    let err = ParameterList::new(vec![param(0), param(0)]).unwrap_err();
    assert!(matches!(err, TypeError::InvalidArgument(_)));

    assert!(ParameterList::empty().parameter_types().is_empty());
}

#[test]
fn test_constructor_info() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let constructors = types
        .class_def(lib.array_list)
        .unwrap()
        .members()
        .unwrap()
        .constructors
        .clone();
    assert_eq!(constructors.len(), 3);

    let sized = &constructors[1];
    assert_eq!(&*types.names().resolve(sized.name), "<init>");
    assert_eq!(sized.signature().return_type(), TypeId::VOID);
    assert_eq!(&**sized.signature().parameter_types(), &[TypeId::INT]);
    assert_eq!(sized.member_type(), MemberType::CONSTRUCTOR);
    assert_eq!(sized.calling_convention(), CallingConvention::STANDARD);
}

#[test]
fn test_method_info_signature() {
    let lib = JavaLib::new();
    let types = &lib.types;
    let e = lib.param(lib.array_list, 0);
    let method = MethodInfo::new(
        types,
        MethodDecl::new("set", lib.array_list, e)
            .param("index", TypeId::INT)
            .param("element", e)
            .throws(lib.number),
    )
    .unwrap();

    assert_eq!(method.return_type(), e);
    assert_eq!(method.parameters.len(), 2);
    assert_eq!(&*method.thrown_types, &[lib.number]);
    assert_eq!(method.member_type(), MemberType::METHOD);

    let erased = method.erased_signature(types).unwrap();
    assert_eq!(erased.return_type(), TypeId::OBJECT);
    assert_eq!(&**erased.parameter_types(), &[TypeId::INT, TypeId::OBJECT]);

    assert!(MethodInfo::new(types, MethodDecl::new("bad", lib.string, TypeId(424_242))).is_err());
}

#[test]
fn test_nested_type_member() {
    let lib = JavaLib::new();
    let nested = NestedTypeInfo {
        nested: lib.map_entry,
        name: lib.types.names().intern("Entry"),
        declaring: lib.map,
        modifiers: Modifiers::PUBLIC | Modifiers::STATIC,
    };
    assert_eq!(nested.member_type(), MemberType::NESTED_TYPE);
    assert_eq!(nested.declaring_type(), lib.map);
    let list: MemberList<NestedTypeInfo> = MemberList::new(vec![Arc::new(nested)]);
    assert_eq!(list.len(), 1);
}

#[test]
fn test_parameter_types_are_derived_once_across_threads() {
    use rayon::prelude::*;

    let lib = JavaLib::new();
    let names = lib.types.names();
    let parameters: Vec<Arc<ParameterInfo>> = [lib.string, TypeId::INT, lib.list_of(lib.string)]
        .into_iter()
        .enumerate()
        .map(|(position, parameter_type)| {
            Arc::new(ParameterInfo {
                name: names.intern(&format!("arg{position}")),
                position: position as u32,
                parameter_type,
                declaring: lib.string,
                modifiers: Modifiers::empty(),
            })
        })
        .collect();
    let list = ParameterList::new(parameters).unwrap();

    let derived: Vec<TypeList> = (0..64)
        .into_par_iter()
        .map(|_| list.parameter_types().clone())
        .collect();
    assert!(derived.iter().all(|types| Arc::ptr_eq(types, &derived[0])));
    assert!(Arc::ptr_eq(list.parameter_types(), &derived[0]));
    assert_eq!(&*derived[0], &[lib.string, TypeId::INT, lib.list_of(lib.string)]);
}
