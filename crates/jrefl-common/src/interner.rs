//! Concurrent name pool.
//!
//! Class names, member names and descriptors are interned once and passed
//! around as `u32` handles ([`Atom`]). Two names are equal iff their atoms
//! are equal, so registry keys hash and compare as integers.
//!
//! The pool is split into shards chosen by name hash. An atom packs the shard
//! into its low bits and the slot within the shard above them, so resolving
//! an atom touches exactly one shard.

use rustc_hash::{FxBuildHasher, FxHashMap};
use serde::Serialize;
use std::hash::BuildHasher;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An interned name. Resolve it with [`ShardedInterner::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty name: slot 0 of shard 0.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    fn shard(self) -> usize {
        (self.0 & SHARD_MASK) as usize
    }

    #[inline]
    fn slot(self) -> usize {
        (self.0 >> SHARD_BITS) as usize
    }

    #[inline]
    fn pack(shard: usize, slot: usize) -> Self {
        Atom(((slot as u32) << SHARD_BITS) | (shard as u32 & SHARD_MASK))
    }
}

const SHARD_BITS: u32 = 6;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;
const MAX_SLOT: usize = (u32::MAX >> SHARD_BITS) as usize;

/// Names every registry needs during bootstrap and member resolution.
const COMMON_NAMES: &[&str] = &[
    "void",
    "boolean",
    "byte",
    "char",
    "short",
    "int",
    "long",
    "float",
    "double",
    "java/lang/Object",
    "java/lang/String",
    "java/lang/Cloneable",
    "java/io/Serializable",
    "java/lang/Boolean",
    "java/lang/Byte",
    "java/lang/Character",
    "java/lang/Short",
    "java/lang/Integer",
    "java/lang/Long",
    "java/lang/Float",
    "java/lang/Double",
    "java/lang/Void",
    "<init>",
    "<clinit>",
    "equals",
    "hashCode",
    "toString",
    "getClass",
    "clone",
    "finalize",
];

#[derive(Default)]
struct Shard {
    atoms: FxHashMap<Arc<str>, Atom>,
    names: Vec<Arc<str>>,
}

/// Sharded name pool for concurrent use.
///
/// A shard only ever grows, so a poisoned lock still guards a consistent
/// shard and is recovered rather than propagated.
pub struct ShardedInterner {
    shards: Box<[RwLock<Shard>]>,
}

impl ShardedInterner {
    /// An empty pool holding only the empty name, as [`Atom::NONE`].
    pub fn new() -> Self {
        let shards: Box<[RwLock<Shard>]> =
            (0..SHARD_COUNT).map(|_| RwLock::new(Shard::default())).collect();
        let pool = Self { shards };
        {
            let mut first = pool.write(Atom::NONE.shard());
            let empty: Arc<str> = Arc::from("");
            first.names.push(Arc::clone(&empty));
            first.atoms.insert(empty, Atom::NONE);
        }
        pool
    }

    /// A pool with primitive, `java.lang` and special member names present.
    pub fn with_common_names() -> Self {
        let pool = Self::new();
        for name in COMMON_NAMES {
            pool.intern(name);
        }
        pool
    }

    fn read(&self, shard: usize) -> RwLockReadGuard<'_, Shard> {
        self.shards[shard].read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, shard: usize) -> RwLockWriteGuard<'_, Shard> {
        self.shards[shard].write().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn shard_of(name: &str) -> usize {
        (FxBuildHasher.hash_one(name) as usize) & (SHARD_COUNT - 1)
    }

    /// Intern `name`, returning the existing atom if it was seen before.
    ///
    /// A shard that has run out of slots yields [`Atom::NONE`].
    pub fn intern(&self, name: &str) -> Atom {
        if name.is_empty() {
            return Atom::NONE;
        }
        let index = Self::shard_of(name);
        if let Some(&atom) = self.read(index).atoms.get(name) {
            return atom;
        }

        let mut shard = self.write(index);
        // Lost the race between the two locks.
        if let Some(&atom) = shard.atoms.get(name) {
            return atom;
        }
        let slot = shard.names.len();
        if slot > MAX_SLOT {
            return Atom::NONE;
        }
        let atom = Atom::pack(index, slot);
        let owned: Arc<str> = Arc::from(name);
        shard.names.push(Arc::clone(&owned));
        shard.atoms.insert(owned, atom);
        atom
    }

    /// The atom for `name` if it has been interned.
    pub fn get(&self, name: &str) -> Option<Atom> {
        if name.is_empty() {
            return Some(Atom::NONE);
        }
        self.read(Self::shard_of(name)).atoms.get(name).copied()
    }

    /// The name behind `atom`; unknown atoms resolve to `""`.
    #[inline]
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        self.read(atom.shard()).names.get(atom.slot()).cloned()
    }

    /// Number of interned names, the empty name included.
    pub fn len(&self) -> usize {
        (0..SHARD_COUNT).map(|shard| self.read(shard).names.len()).sum()
    }

    /// `true` while only the empty name is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for ShardedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedInterner")
            .field("names", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
