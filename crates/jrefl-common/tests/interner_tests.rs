use super::*;
use rayon::prelude::*;

#[test]
fn test_intern_deduplicates() {
    let interner = ShardedInterner::new();
    let a = interner.intern("java/util/List");
    let b = interner.intern("java/util/List");
    let c = interner.intern("java/util/Map");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(&*interner.resolve(a), "java/util/List");
}

#[test]
fn test_empty_name_is_none() {
    let interner = ShardedInterner::new();
    assert_eq!(interner.intern(""), Atom::NONE);
    assert!(Atom::NONE.is_none());
    assert_eq!(&*interner.resolve(Atom::NONE), "");
}

#[test]
fn test_get_does_not_intern() {
    let interner = ShardedInterner::new();
    assert_eq!(interner.get("java/lang/Runnable"), None);
    let atom = interner.intern("java/lang/Runnable");
    assert_eq!(interner.get("java/lang/Runnable"), Some(atom));
}

#[test]
fn test_common_names_are_preinterned() {
    let interner = ShardedInterner::with_common_names();
    assert!(interner.get("int").is_some());
    assert!(interner.get("java/lang/Object").is_some());
    assert!(interner.get("<init>").is_some());
}

#[test]
fn test_unknown_atom_resolves_empty() {
    let interner = ShardedInterner::new();
    assert!(interner.try_resolve(Atom(u32::MAX)).is_none());
    assert_eq!(&*interner.resolve(Atom(u32::MAX)), "");
}

#[test]
fn test_concurrent_interning_converges() {
    let interner = ShardedInterner::new();
    let names: Vec<String> = (0..2000).map(|i| format!("pkg/Class{}", i % 97)).collect();

    let atoms: Vec<Atom> = names.par_iter().map(|s| interner.intern(s)).collect();

    for (name, atom) in names.iter().zip(&atoms) {
        assert_eq!(interner.intern(name), *atom);
        assert_eq!(&*interner.resolve(*atom), name.as_str());
    }
    // 97 distinct names plus the empty name.
    assert_eq!(interner.len(), 98);
}

#[test]
fn test_atom_layout() {
    let atom = Atom::pack(5, 3);
    assert_eq!(atom.shard(), 5);
    assert_eq!(atom.slot(), 3);
    assert_eq!(Atom::pack(0, 0), Atom::NONE);

    let interner = ShardedInterner::new();
    let atom = interner.intern("java/lang/Runnable");
    assert_eq!(atom.shard(), ShardedInterner::shard_of("java/lang/Runnable"));
}

#[test]
fn test_poisoned_shard_keeps_serving() {
    let interner = ShardedInterner::new();
    let atom = interner.intern("java/util/List");
    let shard = atom.shard();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = interner.write(shard);
        panic!("writer died while holding the shard");
    }));
    assert!(outcome.is_err());
    assert!(interner.shards[shard].is_poisoned());

    assert_eq!(interner.intern("java/util/List"), atom);
    assert_eq!(&*interner.resolve(atom), "java/util/List");
    assert_eq!(interner.get("java/util/List"), Some(atom));
}
