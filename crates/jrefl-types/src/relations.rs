//! Type relations: sameness, equivalence, subtyping, containment,
//! assignability, supertype projection and substitution.
//!
//! Subtyping follows JLS 4.10 over the types this model has (there are no
//! intersection types): primitive widening, array covariance, bounded
//! variables, lower bounds of captures, and generic containment (JLS 4.5.1).
//! Assignability adds boxing, unboxing and unchecked raw conversion.

use crate::error::{Result, TypeError};
use crate::recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
use crate::registry::TypeRegistry;
use crate::types::{
    CapturedInfo, ClassForm, ClassType, PrimitiveKind, RawClass, TypeData, TypeId, TypeList,
    TypeParamInfo, WildcardBounds, empty_type_list, type_list,
};
use crate::visitor::{DefaultTypeVisitor, TypeMapper, TypeRelation};
use std::sync::Arc;
use tracing::trace;

/// A runtime value, for [`TypeRegistry::is_instance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRef {
    Null,
    /// An object whose runtime class is the given (erased) type.
    Instance(TypeId),
}

/// A mapping from type parameters to type arguments.
#[derive(Debug, Clone)]
pub struct TypeBindings {
    parameters: TypeList,
    arguments: TypeList,
}

impl TypeBindings {
    pub fn new(parameters: TypeList, arguments: TypeList) -> Result<Self> {
        if parameters.len() != arguments.len() {
            return Err(TypeError::invalid(format!(
                "{} type parameters bound to {} arguments",
                parameters.len(),
                arguments.len()
            )));
        }
        Ok(Self {
            parameters,
            arguments,
        })
    }

    pub fn empty() -> Self {
        Self {
            parameters: empty_type_list(),
            arguments: empty_type_list(),
        }
    }

    /// Parameters of an applied class bound to its arguments; empty for
    /// every other type.
    pub fn of(types: &TypeRegistry, id: TypeId) -> Self {
        match types.class_type(id) {
            Some(class) if class.is_applied() => Self {
                parameters: class.def.generic_parameters.clone(),
                arguments: class.type_arguments,
            },
            _ => Self::empty(),
        }
    }

    pub fn get(&self, parameter: TypeId) -> Option<TypeId> {
        self.parameters
            .iter()
            .position(|&p| p == parameter)
            .map(|index| self.arguments[index])
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameters(&self) -> &TypeList {
        &self.parameters
    }

    pub fn arguments(&self) -> &TypeList {
        &self.arguments
    }
}

// =============================================================================
// Substitution
// =============================================================================

struct Substitutor<'b> {
    bindings: &'b TypeBindings,
    depth: DepthCounter,
    error: Option<TypeError>,
}

impl Substitutor<'_> {
    fn record(&mut self, result: Result<TypeId>, fallback: TypeId) -> TypeId {
        match result {
            Ok(id) => id,
            Err(error) => {
                self.error.get_or_insert(error);
                fallback
            }
        }
    }

    /// A wildcard cannot appear where a type is required; use its bound.
    fn as_type(&mut self, types: &TypeRegistry, id: TypeId, upper: bool) -> TypeId {
        match types.lookup(id) {
            Some(TypeData::Wildcard(bounds)) if upper => bounds.extends,
            Some(TypeData::Wildcard(bounds)) => bounds.super_bound,
            _ => id,
        }
    }
}

impl DefaultTypeVisitor for Substitutor<'_> {
    type Output = TypeId;

    fn visit_type(&mut self, _types: &TypeRegistry, id: TypeId, _: ()) -> TypeId {
        id
    }

    fn visit_type_parameter(
        &mut self,
        _types: &TypeRegistry,
        id: TypeId,
        _info: &TypeParamInfo,
        _: (),
    ) -> TypeId {
        self.bindings.get(id).unwrap_or(id)
    }

    fn visit_class(&mut self, types: &TypeRegistry, id: TypeId, class: &ClassType, _: ()) -> TypeId {
        if class.type_arguments.is_empty() || self.error.is_some() {
            return id;
        }
        if !self.depth.enter() {
            self.error.get_or_insert(TypeError::unsupported(
                "type substitution nested too deeply",
            ));
            return id;
        }
        let arguments = self.map_list(types, &class.type_arguments, ());
        self.depth.leave();

        if Arc::ptr_eq(&arguments, &class.type_arguments) {
            return id;
        }
        self.record(types.make_generic_type(class.def.id, &arguments), id)
    }

    fn visit_array(&mut self, types: &TypeRegistry, id: TypeId, element: TypeId, _: ()) -> TypeId {
        let mapped = self.map(types, element, ());
        if mapped == element {
            return id;
        }
        let mapped = self.as_type(types, mapped, true);
        self.record(types.make_array_type(mapped), id)
    }

    fn visit_wildcard(
        &mut self,
        types: &TypeRegistry,
        id: TypeId,
        bounds: &WildcardBounds,
        _: (),
    ) -> TypeId {
        let extends = self.map(types, bounds.extends, ());
        let super_bound = self.map(types, bounds.super_bound, ());
        if extends == bounds.extends && super_bound == bounds.super_bound {
            return id;
        }
        let extends = self.as_type(types, extends, true);
        let super_bound = self.as_type(types, super_bound, false);
        self.record(types.make_wildcard(extends, super_bound), id)
    }
}

impl TypeMapper for Substitutor<'_> {}

// =============================================================================
// Subtyping
// =============================================================================

/// Subtype and containment checks with cycle and depth protection.
///
/// Cycles are assumed to hold (coinductive), so `E <: Enum<E>` style checks
/// terminate.
pub struct SubtypeChecker<'a> {
    types: &'a TypeRegistry,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        Self {
            types,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    /// `t <: s`
    pub fn is_subtype(&mut self, t: TypeId, s: TypeId) -> bool {
        if t == s {
            return true;
        }
        match self.guard.enter((t, s)) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return true,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                trace!(t = t.0, s = s.0, "subtype check exceeded limits");
                return false;
            }
        }
        let result = self.check(t, s);
        self.guard.leave((t, s));
        result
    }

    fn check(&mut self, t: TypeId, s: TypeId) -> bool {
        let types = self.types;
        match types.lookup(s) {
            None => return false,
            // A capture with a lower bound accepts subtypes of that bound.
            Some(TypeData::Captured(info)) if info.lower != TypeId::BOTTOM => {
                if self.is_subtype(t, info.lower) {
                    return true;
                }
            }
            Some(TypeData::Wildcard(_)) => return false,
            _ => {}
        }
        self.visit(types, t, s)
    }

    /// `s` contains `t` (JLS 4.5.1): `? extends U` contains subtypes of `U`,
    /// `? super L` contains supertypes of `L`, any other type contains only
    /// itself.
    pub fn contains(&mut self, s: TypeId, t: TypeId) -> bool {
        if s == t {
            return true;
        }
        let types = self.types;
        let Some(TypeData::Wildcard(outer)) = types.lookup(s) else {
            return types.is_equivalent(s, t);
        };
        let (t_upper, t_lower) = match types.lookup(t) {
            Some(TypeData::Wildcard(inner)) => (inner.extends, inner.super_bound),
            _ => (t, t),
        };
        self.is_subtype(t_upper, outer.extends)
            && (outer.super_bound == TypeId::BOTTOM || self.is_subtype(outer.super_bound, t_lower))
    }

    fn contains_all(&mut self, outer: &[TypeId], inner: &[TypeId]) -> bool {
        outer.len() == inner.len()
            && outer
                .iter()
                .zip(inner.iter())
                .all(|(&s, &t)| self.contains(s, t))
    }
}

impl DefaultTypeVisitor<TypeId> for SubtypeChecker<'_> {
    type Output = bool;

    fn visit_type(&mut self, _types: &TypeRegistry, _id: TypeId, _s: TypeId) -> bool {
        false
    }

    /// The bottom type is a subtype of every reference type.
    fn visit_other(&mut self, types: &TypeRegistry, _id: TypeId, s: TypeId) -> bool {
        types.contains(s) && !types.is_primitive(s)
    }

    fn visit_primitive(
        &mut self,
        types: &TypeRegistry,
        _id: TypeId,
        kind: PrimitiveKind,
        s: TypeId,
    ) -> bool {
        types
            .primitive_kind(s)
            .is_some_and(|target| kind.widens_to(target))
    }

    fn visit_array(&mut self, types: &TypeRegistry, _id: TypeId, element: TypeId, s: TypeId) -> bool {
        match types.lookup(s) {
            Some(TypeData::Array(target)) => {
                if types.is_primitive(element) || types.is_primitive(target) {
                    element == target
                } else {
                    self.is_subtype(element, target)
                }
            }
            Some(TypeData::Class(class)) => is_array_supertype(&class.def.name),
            _ => false,
        }
    }

    fn visit_type_parameter(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        info: &TypeParamInfo,
        s: TypeId,
    ) -> bool {
        if s == TypeId::OBJECT {
            return true;
        }
        match info.declared_bounds() {
            Some(bounds) => bounds.iter().any(|&bound| self.is_subtype(bound, s)),
            None => false,
        }
    }

    fn visit_wildcard(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        bounds: &WildcardBounds,
        s: TypeId,
    ) -> bool {
        self.is_subtype(bounds.extends, s)
    }

    fn visit_captured(
        &mut self,
        _types: &TypeRegistry,
        _id: TypeId,
        info: &CapturedInfo,
        s: TypeId,
    ) -> bool {
        s == TypeId::OBJECT || self.is_subtype(info.upper, s)
    }

    fn visit_class(&mut self, types: &TypeRegistry, id: TypeId, _class: &ClassType, s: TypeId) -> bool {
        if s == TypeId::OBJECT {
            return true;
        }
        let Some(target) = types.class_type(s) else {
            return false;
        };
        let Ok(Some(projected)) = types.as_super(id, target.def.raw) else {
            return false;
        };
        if target.is_raw() || target.type_arguments.is_empty() {
            return true;
        }
        match types.class_type(projected) {
            // Raw to parameterized is an unchecked conversion, not subtyping.
            Some(source) if source.is_raw() => false,
            Some(source) => self.contains_all(&target.type_arguments, &source.type_arguments),
            None => false,
        }
    }
}

impl TypeRelation for SubtypeChecker<'_> {}

/// Supertypes of every array type (JLS 4.10.3).
fn is_array_supertype(class_name: &str) -> bool {
    matches!(
        class_name,
        "java/lang/Object" | "java/lang/Cloneable" | "java/io/Serializable"
    )
}

// =============================================================================
// Registry entry points
// =============================================================================

impl TypeRegistry {
    /// Identity of registered types. Captures are only the same as
    /// themselves.
    pub fn is_same_type(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    /// Structural equivalence: equal erased class and pairwise equivalent
    /// type arguments, equivalent array elements or wildcard bounds, type
    /// parameters of the same declaration, captures of the same wildcard with
    /// equivalent bounds.
    pub fn is_equivalent(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        let (Some(left), Some(right)) = (self.lookup(a), self.lookup(b)) else {
            return false;
        };
        match (&left, &right) {
            (TypeData::Array(x), TypeData::Array(y)) => self.is_equivalent(*x, *y),
            (TypeData::Wildcard(x), TypeData::Wildcard(y)) => {
                self.is_equivalent(x.extends, y.extends)
                    && self.is_equivalent(x.super_bound, y.super_bound)
            }
            (TypeData::TypeParameter(x), TypeData::TypeParameter(y)) => {
                x.owner == y.owner && x.position == y.position
            }
            (TypeData::Captured(x), TypeData::Captured(y)) => {
                x.wildcard == y.wildcard
                    && self.is_equivalent(x.upper, y.upper)
                    && self.is_equivalent(x.lower, y.lower)
            }
            (TypeData::Class(x), TypeData::Class(y)) => {
                if x.def.raw != y.def.raw || x.is_raw() != y.is_raw() {
                    return false;
                }
                x.type_arguments.len() == y.type_arguments.len()
                    && x.type_arguments
                        .iter()
                        .zip(y.type_arguments.iter())
                        .all(|(&p, &q)| self.is_equivalent(p, q))
            }
            _ => false,
        }
    }

    /// `t <: s`
    pub fn is_subtype(&self, t: TypeId, s: TypeId) -> bool {
        SubtypeChecker::new(self).is_subtype(t, s)
    }

    /// `s` contains `t` as a type argument.
    pub fn contains_type(&self, s: TypeId, t: TypeId) -> bool {
        SubtypeChecker::new(self).contains(s, t)
    }

    /// A value of `source` can be assigned to `target`.
    ///
    /// Everything is assignable to the bottom type; a type-parameter or
    /// wildcard target is checked against its bound.
    pub fn is_assignable(&self, source: TypeId, target: TypeId) -> bool {
        if source == target || target == TypeId::BOTTOM {
            return true;
        }
        match self.lookup(target) {
            None => return false,
            Some(TypeData::TypeParameter(info)) => {
                return self.is_assignable(source, info.upper_bound());
            }
            Some(TypeData::Wildcard(bounds)) => {
                let bound = if bounds.has_super_bound() {
                    bounds.super_bound
                } else {
                    bounds.extends
                };
                return self.is_assignable(source, bound);
            }
            Some(_) => {}
        }
        self.is_convertible(source, target)
    }

    /// `target.is_assignable_from(source)`
    pub fn is_assignable_from(&self, target: TypeId, source: TypeId) -> bool {
        self.is_assignable(source, target)
    }

    fn is_convertible(&self, source: TypeId, target: TypeId) -> bool {
        if source == TypeId::BOTTOM {
            return !self.is_primitive(target);
        }
        if target == TypeId::OBJECT {
            return source != TypeId::VOID && self.contains(source);
        }

        match (self.primitive_kind(source), self.primitive_kind(target)) {
            (Some(from), Some(to)) => return from.widens_to(to),
            (Some(from), None) => {
                // Boxing, then widening reference conversion.
                return from != PrimitiveKind::Void
                    && self
                        .boxed_type(from)
                        .is_some_and(|boxed| self.is_subtype(boxed, target));
            }
            (None, Some(to)) => {
                return self
                    .unboxed_kind(source)
                    .is_some_and(|from| from.widens_to(to));
            }
            (None, None) => {}
        }

        if self.is_subtype(source, target) {
            return true;
        }

        // Unchecked conversion from a raw supertype.
        match self.class_type(target) {
            Some(class) if !class.type_arguments.is_empty() => {
                matches!(
                    self.as_super(source, class.def.raw)
                        .ok()
                        .flatten()
                        .and_then(|projected| self.class_type(projected)),
                    Some(projected) if projected.is_raw()
                )
            }
            _ => false,
        }
    }

    /// Whether `value` is an instance of `t`. Nothing is an instance of the
    /// bottom type, and `null` is an instance of nothing.
    pub fn is_instance(&self, t: TypeId, value: ValueRef) -> bool {
        if t == TypeId::BOTTOM {
            return false;
        }
        match value {
            ValueRef::Null => false,
            ValueRef::Instance(runtime) => self
                .erasure(t)
                .is_ok_and(|erased| self.is_subtype(runtime, erased)),
        }
    }

    /// Upper bound of a wildcard or capture; any other type is its own.
    pub fn upper_bound(&self, id: TypeId) -> Result<TypeId> {
        Ok(match self.data(id)? {
            TypeData::Wildcard(bounds) => bounds.extends,
            TypeData::Captured(info) => info.upper,
            _ => id,
        })
    }

    /// Lower bound of a wildcard or capture; any other type is its own.
    pub fn lower_bound(&self, id: TypeId) -> Result<TypeId> {
        Ok(match self.data(id)? {
            TypeData::Wildcard(bounds) => bounds.super_bound,
            TypeData::Captured(info) => info.lower,
            _ => id,
        })
    }

    /// Greatest lower bound of two reference types.
    ///
    /// Without intersection types, unrelated bounds resolve to the class
    /// over the interface, or to `a` when both are classes or both are
    /// interfaces.
    pub fn glb(&self, a: TypeId, b: TypeId) -> Result<TypeId> {
        for id in [a, b] {
            if !self.is_reference_type(id)? {
                return Err(TypeError::invalid(format!(
                    "{id:?} has no greatest lower bound with a reference type"
                )));
            }
        }
        if self.is_subtype(a, b) {
            return Ok(a);
        }
        if self.is_subtype(b, a) {
            return Ok(b);
        }
        if self.is_interface(a) && !self.is_interface(b) {
            return Ok(b);
        }
        Ok(a)
    }

    /// Replace type parameters in `id` according to `bindings`.
    pub fn substitute(&self, id: TypeId, bindings: &TypeBindings) -> Result<TypeId> {
        if bindings.is_empty() {
            return Ok(id);
        }
        let mut substitutor = Substitutor {
            bindings,
            depth: DepthCounter::with_profile(RecursionProfile::Substitution),
            error: None,
        };
        let result = substitutor.map(self, id, ());
        match substitutor.error {
            Some(error) => Err(error),
            None => Ok(result),
        }
    }

    pub fn substitute_list(&self, list: &TypeList, bindings: &TypeBindings) -> Result<TypeList> {
        if bindings.is_empty() {
            return Ok(Arc::clone(list));
        }
        let mut substitutor = Substitutor {
            bindings,
            depth: DepthCounter::with_profile(RecursionProfile::Substitution),
            error: None,
        };
        let result = substitutor.map_list(self, list, ());
        match substitutor.error {
            Some(error) => Err(error),
            None => Ok(result),
        }
    }

    /// Direct superclass, projected through `id`'s type arguments.
    ///
    /// Raw types see erased supertypes. Arrays extend `Object`; variables
    /// report their first bound.
    pub fn base_type(&self, id: TypeId) -> Result<Option<TypeId>> {
        match self.data(id)? {
            TypeData::Class(class) => {
                let def = &class.def;
                let declared = match def.supertypes() {
                    Some(supertypes) => supertypes.base,
                    None => (!def.is_interface() && def.id != TypeId::OBJECT)
                        .then_some(TypeId::OBJECT),
                };
                match declared {
                    Some(base) => self.project_supertype(id, &class, base).map(Some),
                    None => Ok(None),
                }
            }
            TypeData::Array(_) => Ok(Some(TypeId::OBJECT)),
            TypeData::TypeParameter(info) => Ok(Some(info.upper_bound())),
            TypeData::Captured(info) => Ok(Some(info.upper)),
            TypeData::Wildcard(bounds) => Ok(Some(bounds.extends)),
            TypeData::Primitive(_) | TypeData::Bottom => Ok(None),
        }
    }

    /// Directly implemented interfaces, projected through `id`'s type
    /// arguments.
    pub fn interfaces(&self, id: TypeId) -> Result<TypeList> {
        match self.data(id)? {
            TypeData::Class(class) => {
                let Some(supertypes) = class.def.supertypes() else {
                    return Ok(empty_type_list());
                };
                match class.form {
                    ClassForm::Definition => Ok(supertypes.interfaces.clone()),
                    ClassForm::Raw { .. } => self.erase_list(&supertypes.interfaces),
                    ClassForm::Applied { .. } => {
                        self.substitute_list(&supertypes.interfaces, &TypeBindings::of(self, id))
                    }
                }
            }
            TypeData::Array(_) => {
                let found: Vec<TypeId> = ["java/lang/Cloneable", "java/io/Serializable"]
                    .iter()
                    .filter_map(|name| self.find_by_name(name))
                    .collect();
                Ok(type_list(&found))
            }
            _ => Ok(empty_type_list()),
        }
    }

    fn project_supertype(&self, id: TypeId, class: &ClassType, supertype: TypeId) -> Result<TypeId> {
        match class.form {
            ClassForm::Definition => Ok(supertype),
            ClassForm::Raw { .. } => self.erasure(supertype),
            ClassForm::Applied { .. } => self.substitute(supertype, &TypeBindings::of(self, id)),
        }
    }

    /// The supertype of `id` whose erased class is `raw`, with `id`'s type
    /// arguments carried through.
    pub fn as_super(&self, id: TypeId, raw: RawClass) -> Result<Option<TypeId>> {
        let mut depth = DepthCounter::with_profile(RecursionProfile::HierarchyWalk);
        self.as_super_walk(id, raw, &mut depth)
    }

    fn as_super_walk(
        &self,
        id: TypeId,
        raw: RawClass,
        depth: &mut DepthCounter,
    ) -> Result<Option<TypeId>> {
        if !depth.enter() {
            trace!(ty = id.0, "supertype walk exceeded depth");
            return Ok(None);
        }
        let result = self.as_super_step(id, raw, depth);
        depth.leave();
        result
    }

    fn as_super_step(
        &self,
        id: TypeId,
        raw: RawClass,
        depth: &mut DepthCounter,
    ) -> Result<Option<TypeId>> {
        match self.data(id)? {
            TypeData::Class(class) => {
                if class.def.raw == raw {
                    return Ok(Some(id));
                }
                if let Some(base) = self.base_type(id)? {
                    if let Some(found) = self.as_super_walk(base, raw, depth)? {
                        return Ok(Some(found));
                    }
                }
                for &interface in self.interfaces(id)?.iter() {
                    if let Some(found) = self.as_super_walk(interface, raw, depth)? {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
            TypeData::Array(_) => {
                if self.erased_class(id)? == Some(raw) {
                    return Ok(Some(id));
                }
                let target = self.find_class(raw);
                Ok(target.filter(|&t| {
                    self.class_def(t)
                        .is_some_and(|def| is_array_supertype(&def.name))
                }))
            }
            TypeData::TypeParameter(info) => {
                let bounds = info
                    .declared_bounds()
                    .cloned()
                    .unwrap_or_else(|| type_list(&[TypeId::OBJECT]));
                for &bound in bounds.iter() {
                    if let Some(found) = self.as_super_walk(bound, raw, depth)? {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
            TypeData::Captured(info) => self.as_super_walk(info.upper, raw, depth),
            TypeData::Wildcard(bounds) => self.as_super_walk(bounds.extends, raw, depth),
            TypeData::Primitive(_) | TypeData::Bottom => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "../tests/relations_tests.rs"]
mod tests;
