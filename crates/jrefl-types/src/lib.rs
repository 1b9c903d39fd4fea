//! A reflective model of the JVM generic type system.
//!
//! Types are [`TypeId`] handles into a [`TypeRegistry`], which keeps one
//! canonical node per class, primitive, array, parameterization, wildcard
//! and type parameter. On top of the registry:
//!
//! - erasure and method signatures ([`erasure`], [`signature`])
//! - capture conversion ([`capture`])
//! - subtyping, assignability and substitution ([`relations`])
//! - visitors and mappers over [`TypeData`] ([`visitor`])
//! - sliceable member lists and binding-flag member lookup ([`members`],
//!   [`resolve`])
//! - descriptions, descriptors and signatures ([`format`])

pub mod capture;
pub mod erasure;
pub mod error;
pub mod flags;
pub mod format;
pub mod members;
pub mod recursion;
pub mod registry;
pub mod relations;
pub mod resolve;
pub mod signature;
pub mod types;
pub mod visitor;

#[cfg(test)]
#[path = "../tests/test_fixtures.rs"]
pub(crate) mod test_fixtures;

pub use error::{MemberResolutionError, Result, TypeError, UnresolvedKind};
pub use flags::{BindingFlags, CallingConvention, MemberListType, MemberType, Modifiers};
pub use format::TypeSummary;
pub use members::{
    ClassMembers, ConstructorInfo, ConstructorList, FieldInfo, FieldList, Member, MemberInfo,
    MemberList, MethodDecl, MethodInfo, MethodList, NestedTypeInfo, ParameterInfo, ParameterList,
};
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use registry::{ClassDecl, ClassLoader, TypeRegistry};
pub use relations::{SubtypeChecker, TypeBindings, ValueRef};
pub use signature::SignatureType;
pub use types::{
    CapturedInfo, ClassDef, ClassForm, ClassKind, ClassType, GenericOwner, PrimitiveKind,
    RawClass, TypeData, TypeId, TypeList, TypeParamInfo, WildcardBounds,
};
pub use visitor::{
    DefaultTypeVisitor, TypeMapper, TypeRelation, TypeVisitor, UnaryTypeVisitor,
    collect_referenced_types,
};
