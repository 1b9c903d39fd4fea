//! Type representation.
//!
//! Types are referenced through [`TypeId`] handles into a
//! [`TypeRegistry`](crate::registry::TypeRegistry). The handle replaces
//! reference identity: two registered types are the same type iff their ids
//! are equal. Captured wildcards are the exception, since every capture
//! allocates a fresh node.

use crate::flags::Modifiers;
use crate::members::ClassMembers;
use jrefl_common::Atom;
use once_cell::sync::{Lazy, OnceCell};
use serde::Serialize;
use std::sync::Arc;

/// Handle to a type node in a registry.
///
/// The first ids are fixed at bootstrap so primitive checks are integer
/// compares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The universal bottom type (the type of `null`).
    pub const BOTTOM: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
    pub const BOOLEAN: TypeId = TypeId(2);
    pub const BYTE: TypeId = TypeId(3);
    pub const CHAR: TypeId = TypeId(4);
    pub const SHORT: TypeId = TypeId(5);
    pub const INT: TypeId = TypeId(6);
    pub const LONG: TypeId = TypeId(7);
    pub const FLOAT: TypeId = TypeId(8);
    pub const DOUBLE: TypeId = TypeId(9);
    /// `java/lang/Object`, the universal top.
    pub const OBJECT: TypeId = TypeId(10);

    /// First id handed out after bootstrap.
    pub const FIRST_DYNAMIC: u32 = 11;

    /// `true` for `void` and the eight primitive types.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 >= Self::VOID.0 && self.0 <= Self::DOUBLE.0
    }

    #[inline]
    pub const fn is_bootstrap(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }
}

/// Erased class identity: an interned JVM internal name (`java/util/List`,
/// `int`, `[I`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RawClass(pub Atom);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveKind {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 9] = [
        PrimitiveKind::Void,
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    pub const fn descriptor(self) -> char {
        match self {
            Self::Void => 'V',
            Self::Boolean => 'Z',
            Self::Byte => 'B',
            Self::Char => 'C',
            Self::Short => 'S',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Float => 'F',
            Self::Double => 'D',
        }
    }

    pub const fn type_id(self) -> TypeId {
        match self {
            Self::Void => TypeId::VOID,
            Self::Boolean => TypeId::BOOLEAN,
            Self::Byte => TypeId::BYTE,
            Self::Char => TypeId::CHAR,
            Self::Short => TypeId::SHORT,
            Self::Int => TypeId::INT,
            Self::Long => TypeId::LONG,
            Self::Float => TypeId::FLOAT,
            Self::Double => TypeId::DOUBLE,
        }
    }

    /// Internal name of the boxing class.
    pub const fn wrapper_class(self) -> &'static str {
        match self {
            Self::Void => "java/lang/Void",
            Self::Boolean => "java/lang/Boolean",
            Self::Byte => "java/lang/Byte",
            Self::Char => "java/lang/Character",
            Self::Short => "java/lang/Short",
            Self::Int => "java/lang/Integer",
            Self::Long => "java/lang/Long",
            Self::Float => "java/lang/Float",
            Self::Double => "java/lang/Double",
        }
    }

    pub fn from_descriptor(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.descriptor() == c)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn from_wrapper_class(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wrapper_class() == name)
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Void | Self::Boolean)
    }

    /// Identity or widening primitive conversion (JLS 5.1.2).
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short => matches!(target, Int | Long | Float | Double),
            Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Void | Boolean | Double => false,
        }
    }
}

/// Shared, immutable sequence of type handles.
pub type TypeList = Arc<[TypeId]>;

static EMPTY_TYPE_LIST: Lazy<TypeList> = Lazy::new(|| Arc::from(Vec::<TypeId>::new()));

/// The canonical empty type list.
pub fn empty_type_list() -> TypeList {
    Arc::clone(&EMPTY_TYPE_LIST)
}

/// Build a type list, reusing the canonical empty list when `ids` is empty.
pub fn type_list(ids: &[TypeId]) -> TypeList {
    if ids.is_empty() {
        empty_type_list()
    } else {
        Arc::from(ids)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    /// Derive the kind from class-file access flags.
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        if modifiers.contains(Modifiers::ANNOTATION) {
            Self::Annotation
        } else if modifiers.contains(Modifiers::INTERFACE) {
            Self::Interface
        } else if modifiers.contains(Modifiers::ENUM) {
            Self::Enum
        } else {
            Self::Class
        }
    }

    pub fn is_interface(self) -> bool {
        matches!(self, Self::Interface | Self::Annotation)
    }
}

/// Direct supertypes of a class definition, expressed in terms of its own
/// generic parameters.
#[derive(Clone, Debug)]
pub struct Supertypes {
    pub base: Option<TypeId>,
    pub interfaces: TypeList,
}

/// A declared class, shared by its definition, raw and applied forms.
#[derive(Debug)]
pub struct ClassDef {
    /// Id of the generic definition node.
    pub id: TypeId,
    pub raw: RawClass,
    /// JVM internal name.
    pub name: Arc<str>,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub declaring: Option<TypeId>,
    pub generic_parameters: TypeList,
    pub(crate) supertypes: OnceCell<Supertypes>,
    pub(crate) members: OnceCell<ClassMembers>,
    /// Set once the class loader has completed the class. Classes declared
    /// directly start out complete.
    pub(crate) completed: OnceCell<()>,
}

impl ClassDef {
    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generic_parameters.is_empty()
    }

    /// `false` while a class loader has not yet completed the class.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.completed.get().is_some()
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind.is_interface()
    }

    /// Supertypes, or `None` if they have not been defined yet.
    pub fn supertypes(&self) -> Option<&Supertypes> {
        self.supertypes.get()
    }

    /// Members, or `None` if they have not been defined yet.
    pub fn members(&self) -> Option<&ClassMembers> {
        self.members.get()
    }

    /// Name after the last package separator (`java/util/Map$Entry` gives
    /// `Map$Entry`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassForm {
    /// The generic definition itself (`List<E>`), or a non-generic class.
    Definition,
    /// A parameterization of `definition` (`List<String>`).
    Applied { definition: TypeId },
    /// The raw form of a generic class (`List`).
    Raw { definition: TypeId },
}

#[derive(Clone, Debug)]
pub struct ClassType {
    pub def: Arc<ClassDef>,
    pub form: ClassForm,
    /// Generic parameters for a definition, arguments for an application,
    /// empty for a raw type.
    pub type_arguments: TypeList,
}

impl ClassType {
    #[inline]
    pub fn definition(&self) -> TypeId {
        self.def.id
    }

    #[inline]
    pub fn is_raw(&self) -> bool {
        matches!(self.form, ClassForm::Raw { .. })
    }

    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self.form, ClassForm::Applied { .. })
    }

    #[inline]
    pub fn is_generic_definition(&self) -> bool {
        matches!(self.form, ClassForm::Definition) && self.def.is_generic()
    }
}

/// What declares a type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum GenericOwner {
    Class(RawClass),
    /// `descriptor` is the erased method descriptor, which tells overloads
    /// apart.
    Method {
        class: RawClass,
        name: Atom,
        descriptor: Atom,
    },
}

impl GenericOwner {
    pub fn class(self) -> RawClass {
        match self {
            Self::Class(raw) | Self::Method { class: raw, .. } => raw,
        }
    }
}

#[derive(Debug)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub position: u32,
    pub owner: GenericOwner,
    pub(crate) bounds: OnceCell<TypeList>,
}

impl TypeParamInfo {
    pub(crate) fn new(name: Atom, position: u32, owner: GenericOwner) -> Self {
        Self {
            name,
            position,
            owner,
            bounds: OnceCell::new(),
        }
    }

    /// Declared bounds; `None` until set (an unset bound reads as `Object`).
    pub fn declared_bounds(&self) -> Option<&TypeList> {
        self.bounds.get()
    }

    /// First bound, or `Object` when none was declared.
    pub fn upper_bound(&self) -> TypeId {
        self.bounds
            .get()
            .and_then(|bounds| bounds.first().copied())
            .unwrap_or(TypeId::OBJECT)
    }
}

/// `? extends E super S`. A missing extends bound is `Object`, a missing
/// super bound is the bottom type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WildcardBounds {
    pub extends: TypeId,
    pub super_bound: TypeId,
}

impl WildcardBounds {
    pub const UNBOUNDED: WildcardBounds = WildcardBounds {
        extends: TypeId::OBJECT,
        super_bound: TypeId::BOTTOM,
    };

    #[inline]
    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }

    #[inline]
    pub fn has_extends_bound(&self) -> bool {
        self.extends != TypeId::OBJECT
    }

    #[inline]
    pub fn has_super_bound(&self) -> bool {
        self.super_bound != TypeId::BOTTOM
    }
}

/// A fresh type standing for one use-site occurrence of a wildcard.
#[derive(Debug)]
pub struct CapturedInfo {
    pub wildcard: TypeId,
    pub upper: TypeId,
    pub lower: TypeId,
    /// The declaration or type the capture happened in.
    pub site: Option<TypeId>,
    /// Process-unique capture number, used in descriptions.
    pub serial: u64,
}

#[derive(Clone, Debug)]
pub enum TypeData {
    Class(ClassType),
    Primitive(PrimitiveKind),
    Array(TypeId),
    TypeParameter(Arc<TypeParamInfo>),
    Wildcard(WildcardBounds),
    Captured(Arc<CapturedInfo>),
    Bottom,
}

impl TypeData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Class(class) if class.def.is_interface() => "interface",
            Self::Class(_) => "class",
            Self::Primitive(_) => "primitive",
            Self::Array(_) => "array",
            Self::TypeParameter(_) => "type-parameter",
            Self::Wildcard(_) => "wildcard",
            Self::Captured(_) => "captured",
            Self::Bottom => "bottom",
        }
    }
}

/// A registered type plus its memoised erasure.
#[derive(Debug)]
pub struct TypeNode {
    pub(crate) data: TypeData,
    pub(crate) erased: OnceCell<TypeId>,
}

impl TypeNode {
    pub(crate) fn new(data: TypeData) -> Self {
        Self {
            data,
            erased: OnceCell::new(),
        }
    }

    #[inline]
    pub fn data(&self) -> &TypeData {
        &self.data
    }

    /// Erasure if it has already been computed.
    pub fn cached_erasure(&self) -> Option<TypeId> {
        self.erased.get().copied()
    }
}

/// Structural key for canonical non-class nodes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TypeKey {
    Array(TypeId),
    Applied(TypeId, TypeList),
    Raw(TypeId),
    Wildcard(WildcardBounds),
    Parameter(GenericOwner, u32, Atom),
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
