//! Visitor protocols over [`TypeData`].
//!
//! - [`TypeVisitor`]: one hook per variant, each defaulting to
//!   [`TypeVisitor::default_output`].
//! - [`DefaultTypeVisitor`]: every hook defaults to one catch-all,
//!   [`DefaultTypeVisitor::visit_type`].
//! - [`UnaryTypeVisitor`]: a `DefaultTypeVisitor` that needs no parameter.
//! - [`TypeMapper`]: a `DefaultTypeVisitor` producing types, with an
//!   identity-preserving list rewrite.
//! - [`TypeRelation`]: a `DefaultTypeVisitor` producing `bool` for a pair of
//!   types.
//!
//! Dispatch is an exhaustive `match`, so a new variant is a compile error in
//! every visitor. Handles that do not belong to the registry never panic:
//! they go to `default_output` (or the catch-all).
//!
//! ```ignore
//! struct IsNumeric;
//!
//! impl TypeVisitor for IsNumeric {
//!     type Output = bool;
//!
//!     fn default_output() -> bool {
//!         false
//!     }
//!
//!     fn visit_primitive(&mut self, _: &TypeRegistry, _: TypeId, kind: PrimitiveKind, _: ()) -> bool {
//!         kind.is_numeric()
//!     }
//! }
//! ```

use crate::registry::TypeRegistry;
use crate::types::{
    CapturedInfo, ClassType, PrimitiveKind, TypeData, TypeId, TypeList, TypeParamInfo,
    WildcardBounds,
};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

// =============================================================================
// TypeVisitor
// =============================================================================

pub trait TypeVisitor<P = ()>: Sized {
    type Output;

    /// Result of every hook that is not overridden.
    fn default_output() -> Self::Output;

    fn visit_class(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _class: &ClassType,
        _param: P,
    ) -> Self::Output {
        Self::default_output()
    }

    fn visit_primitive(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _kind: PrimitiveKind,
        _param: P,
    ) -> Self::Output {
        Self::default_output()
    }

    fn visit_array(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _element: TypeId,
        _param: P,
    ) -> Self::Output {
        Self::default_output()
    }

    fn visit_type_parameter(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _info: &TypeParamInfo,
        _param: P,
    ) -> Self::Output {
        Self::default_output()
    }

    fn visit_wildcard(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _bounds: &WildcardBounds,
        _param: P,
    ) -> Self::Output {
        Self::default_output()
    }

    fn visit_captured(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _info: &CapturedInfo,
        _param: P,
    ) -> Self::Output {
        Self::default_output()
    }

    /// The bottom type.
    fn visit_other(&mut self, _types: &TypeRegistry, _id: TypeId, _param: P) -> Self::Output {
        Self::default_output()
    }

    /// Dispatch on the variant of `id`.
    fn visit(&mut self, types: &TypeRegistry, id: TypeId, param: P) -> Self::Output {
        let Some(data) = types.lookup(id) else {
            return Self::default_output();
        };
        match &data {
            TypeData::Class(class) => self.visit_class(types, id, class, param),
            TypeData::Primitive(kind) => self.visit_primitive(types, id, *kind, param),
            TypeData::Array(element) => self.visit_array(types, id, *element, param),
            TypeData::TypeParameter(info) => self.visit_type_parameter(types, id, info, param),
            TypeData::Wildcard(bounds) => self.visit_wildcard(types, id, bounds, param),
            TypeData::Captured(info) => self.visit_captured(types, id, info, param),
            TypeData::Bottom => self.visit_other(types, id, param),
        }
    }
}

// =============================================================================
// DefaultTypeVisitor
// =============================================================================

pub trait DefaultTypeVisitor<P = ()>: Sized {
    type Output;

    /// The catch-all every hook falls back to.
    fn visit_type(&mut self, types: &TypeRegistry, id: TypeId, param: P) -> Self::Output;

    fn visit_class(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        _class: &ClassType,
        param: P,
    ) -> Self::Output {
        self.visit_type(types, id, param)
    }

    fn visit_primitive(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        _kind: PrimitiveKind,
        param: P,
    ) -> Self::Output {
        self.visit_type(types, id, param)
    }

    fn visit_array(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        _element: TypeId,
        param: P,
    ) -> Self::Output {
        self.visit_type(types, id, param)
    }

    fn visit_type_parameter(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        _info: &TypeParamInfo,
        param: P,
    ) -> Self::Output {
        self.visit_type(types, id, param)
    }

    fn visit_wildcard(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        _bounds: &WildcardBounds,
        param: P,
    ) -> Self::Output {
        self.visit_type(types, id, param)
    }

    fn visit_captured(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        _info: &CapturedInfo,
        param: P,
    ) -> Self::Output {
        self.visit_type(types, id, param)
    }

    fn visit_other(&mut self, types: &TypeRegistry, id: TypeId, param: P) -> Self::Output {
        self.visit_type(types, id, param)
    }

    fn visit(&mut self, types: &TypeRegistry, id: TypeId, param: P) -> Self::Output {
        let Some(data) = types.lookup(id) else {
            return self.visit_type(types, id, param);
        };
        match &data {
            TypeData::Class(class) => self.visit_class(types, id, class, param),
            TypeData::Primitive(kind) => self.visit_primitive(types, id, *kind, param),
            TypeData::Array(element) => self.visit_array(types, id, *element, param),
            TypeData::TypeParameter(info) => self.visit_type_parameter(types, id, info, param),
            TypeData::Wildcard(bounds) => self.visit_wildcard(types, id, bounds, param),
            TypeData::Captured(info) => self.visit_captured(types, id, info, param),
            TypeData::Bottom => self.visit_other(types, id, param),
        }
    }
}

// =============================================================================
// UnaryTypeVisitor
// =============================================================================

/// A [`DefaultTypeVisitor`] with no parameter.
pub trait UnaryTypeVisitor: DefaultTypeVisitor<()> {
    fn visit_unary(&mut self, types: &TypeRegistry, id: TypeId) -> Self::Output {
        self.visit(types, id, ())
    }

    fn visit_all(&mut self, types: &TypeRegistry, ids: &[TypeId]) -> Vec<Self::Output> {
        ids.iter().map(|&id| self.visit(types, id, ())).collect()
    }
}

impl<V: DefaultTypeVisitor<()>> UnaryTypeVisitor for V {}

// =============================================================================
// TypeMapper
// =============================================================================

/// A transforming visitor. Implementations return the input id from
/// `visit_type` and override the hooks for the variants they rewrite.
pub trait TypeMapper<P: Clone = ()>: DefaultTypeVisitor<P, Output = TypeId> {
    fn map(&mut self, types: &TypeRegistry, id: TypeId, param: P) -> TypeId {
        self.visit(types, id, param)
    }

    /// Map every element of `list`.
    ///
    /// Returns `list` itself (same allocation) when no element changes;
    /// otherwise copies once, at the first change.
    fn map_list(&mut self, types: &TypeRegistry, list: &TypeList, param: P) -> TypeList {
        let mut rewritten: Option<SmallVec<[TypeId; 8]>> = None;

        for (index, &original) in list.iter().enumerate() {
            let mapped = self.map(types, original, param.clone());
            match rewritten.as_mut() {
                Some(buffer) => buffer.push(mapped),
                None if mapped != original => {
                    let mut buffer = SmallVec::with_capacity(list.len());
                    buffer.extend_from_slice(&list[..index]);
                    buffer.push(mapped);
                    rewritten = Some(buffer);
                }
                None => {}
            }
        }

        match rewritten {
            Some(buffer) => Arc::from(buffer.as_slice()),
            None => Arc::clone(list),
        }
    }
}

// =============================================================================
// TypeRelation
// =============================================================================

/// A boolean relation `R(t, s)`, dispatched on `t`.
pub trait TypeRelation: DefaultTypeVisitor<TypeId, Output = bool> {
    fn holds(&mut self, types: &TypeRegistry, t: TypeId, s: TypeId) -> bool {
        self.visit(types, t, s)
    }

    /// `true` as soon as `R(t, s)` holds for some `t` in `list`.
    fn holds_for_any(&mut self, types: &TypeRegistry, list: &[TypeId], s: TypeId) -> bool {
        list.iter().any(|&t| self.visit(types, t, s))
    }

    /// Equal lengths and `R(ts[i], ss[i])` for every `i`.
    fn holds_pairwise(&mut self, types: &TypeRegistry, ts: &[TypeId], ss: &[TypeId]) -> bool {
        ts.len() == ss.len()
            && ts
                .iter()
                .zip(ss.iter())
                .all(|(&t, &s)| self.visit(types, t, s))
    }
}

// =============================================================================
// Common visitors
// =============================================================================

/// `R(t, p)`: type parameter `p` occurs in `t`.
#[derive(Default)]
pub struct OccursIn {
    visiting: FxHashSet<TypeId>,
}

impl DefaultTypeVisitor<TypeId> for OccursIn {
    type Output = bool;

    fn visit_type(&mut self, _types: &TypeRegistry, id: TypeId, param: TypeId) -> bool {
        id == param
    }

    fn visit_class(
        &mut self,
        types: &TypeRegistry,
        _id: TypeId,
        class: &ClassType,
        param: TypeId,
    ) -> bool {
        self.holds_for_any(types, &class.type_arguments, param)
    }

    fn visit_array(
        &mut self,
        types: &TypeRegistry,
        _id: TypeId,
        element: TypeId,
        param: TypeId,
    ) -> bool {
        self.visit(types, element, param)
    }

    fn visit_wildcard(
        &mut self,
        types: &TypeRegistry,
        _id: TypeId,
        bounds: &WildcardBounds,
        param: TypeId,
    ) -> bool {
        self.holds_for_any(types, &[bounds.extends, bounds.super_bound], param)
    }

    fn visit_captured(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        info: &CapturedInfo,
        param: TypeId,
    ) -> bool {
        // Captures may be bounded by types that mention themselves.
        if !self.visiting.insert(id) {
            return false;
        }
        let found = self.holds_for_any(types, &[info.upper, info.lower], param);
        self.visiting.remove(&id);
        found
    }
}

impl TypeRelation for OccursIn {}

/// Whether any type parameter or captured wildcard occurs in a type.
#[derive(Default)]
pub struct ContainsGenericParameters {
    visiting: FxHashSet<TypeId>,
}

impl DefaultTypeVisitor for ContainsGenericParameters {
    type Output = bool;

    fn visit_type(&mut self, _types: &TypeRegistry, _id: TypeId, _param: ()) -> bool {
        false
    }

    fn visit_class(&mut self, types: &TypeRegistry, _id: TypeId, class: &ClassType, _: ()) -> bool {
        class
            .type_arguments
            .iter()
            .any(|&arg| self.visit_unary(types, arg))
    }

    fn visit_array(&mut self, types: &TypeRegistry, _id: TypeId, element: TypeId, _: ()) -> bool {
        self.visit_unary(types, element)
    }

    fn visit_type_parameter(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _info: &TypeParamInfo,
        _: (),
    ) -> bool {
        true
    }

    fn visit_wildcard(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        bounds: &WildcardBounds,
        _: (),
    ) -> bool {
        if !self.visiting.insert(id) {
            return false;
        }
        let found = self.visit_unary(types, bounds.extends) || self.visit_unary(types, bounds.super_bound);
        self.visiting.remove(&id);
        found
    }

    fn visit_captured(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        _info: &CapturedInfo,
        _: (),
    ) -> bool {
        true
    }
}

/// Collect every type reachable from a root: arguments, elements and bounds.
pub fn collect_referenced_types(types: &TypeRegistry, root: TypeId) -> FxHashSet<TypeId> {
    struct Collector {
        seen: FxHashSet<TypeId>,
    }

    impl DefaultTypeVisitor for Collector {
        type Output = ();

        fn visit_type(&mut self, _types: &TypeRegistry, id: TypeId, _: ()) {
            self.seen.insert(id);
        }

        fn visit_class(&mut self, types: &TypeRegistry, id: TypeId, class: &ClassType, _: ()) {
            if self.seen.insert(id) {
                for &arg in class.type_arguments.iter() {
                    self.visit_unary(types, arg);
                }
            }
        }

        fn visit_array(&mut self, types: &TypeRegistry, id: TypeId, element: TypeId, _: ()) {
            if self.seen.insert(id) {
                self.visit_unary(types, element);
            }
        }

        fn visit_type_parameter(
            &mut self,
            types: &TypeRegistry,
            id: TypeId,
            info: &TypeParamInfo,
            _: (),
        ) {
            if self.seen.insert(id) {
                if let Some(bounds) = info.declared_bounds() {
                    for &bound in bounds.iter() {
                        self.visit_unary(types, bound);
                    }
                }
            }
        }

        fn visit_wildcard(
            &mut self,
            types: &TypeRegistry,
            id: TypeId,
            bounds: &WildcardBounds,
            _: (),
        ) {
            if self.seen.insert(id) {
                self.visit_unary(types, bounds.extends);
                self.visit_unary(types, bounds.super_bound);
            }
        }

        fn visit_captured(&mut self, types: &TypeRegistry, id: TypeId, info: &CapturedInfo, _: ()) {
            if self.seen.insert(id) {
                self.visit_unary(types, info.upper);
                self.visit_unary(types, info.lower);
            }
        }
    }

    let mut collector = Collector {
        seen: FxHashSet::default(),
    };
    collector.visit_unary(types, root);
    collector.seen
}

impl TypeRegistry {
    /// Whether any type parameter or capture occurs in `id`.
    pub fn contains_generic_parameters(&self, id: TypeId) -> bool {
        ContainsGenericParameters::default().visit_unary(self, id)
    }

    /// Whether the type parameter `param` occurs in `id`.
    pub fn contains_generic_parameter(&self, id: TypeId, param: TypeId) -> bool {
        OccursIn::default().holds(self, id, param)
    }
}

#[cfg(test)]
#[path = "../tests/visitor_tests.rs"]
mod tests;
