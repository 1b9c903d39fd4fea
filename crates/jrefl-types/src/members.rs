//! Member descriptors and member lists.
//!
//! A [`MemberList`] is a read-only `(backing, offset, len)` view. Sub-ranges
//! share the parent's backing storage, and every member type has one
//! canonical empty backing so empty lists never allocate.

use crate::error::{Result, TypeError};
use crate::flags::{CallingConvention, MemberListType, MemberType, Modifiers};
use crate::registry::TypeRegistry;
use crate::signature::SignatureType;
use crate::types::{TypeId, TypeList, empty_type_list, type_list};
use jrefl_common::{Atom, ShardedInterner};
use once_cell::sync::{Lazy, OnceCell};
use std::fmt;
use std::sync::Arc;

/// Common view of anything a [`MemberList`] can hold.
pub trait Member: Send + Sync + Sized + 'static {
    fn name(&self) -> Atom;
    fn declaring_type(&self) -> TypeId;
    fn modifiers(&self) -> Modifiers;
    fn member_type(&self) -> MemberType;

    /// The canonical empty backing for lists of this member type.
    fn empty_backing() -> &'static Arc<[Arc<Self>]>;
}

macro_rules! canonical_empty_backing {
    ($ty:ty) => {
        fn empty_backing() -> &'static Arc<[Arc<$ty>]> {
            static EMPTY: Lazy<Arc<[Arc<$ty>]>> = Lazy::new(|| Arc::from(Vec::<Arc<$ty>>::new()));
            &EMPTY
        }
    };
}

// =============================================================================
// Member descriptors
// =============================================================================

#[derive(Debug)]
pub struct ParameterInfo {
    pub name: Atom,
    pub position: u32,
    pub parameter_type: TypeId,
    pub declaring: TypeId,
    pub modifiers: Modifiers,
}

impl Member for ParameterInfo {
    fn name(&self) -> Atom {
        self.name
    }
    fn declaring_type(&self) -> TypeId {
        self.declaring
    }
    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
    fn member_type(&self) -> MemberType {
        MemberType::CUSTOM
    }
    canonical_empty_backing!(ParameterInfo);
}

#[derive(Debug)]
pub struct FieldInfo {
    pub name: Atom,
    pub declaring: TypeId,
    pub field_type: TypeId,
    pub modifiers: Modifiers,
}

impl Member for FieldInfo {
    fn name(&self) -> Atom {
        self.name
    }
    fn declaring_type(&self) -> TypeId {
        self.declaring
    }
    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
    fn member_type(&self) -> MemberType {
        MemberType::FIELD
    }
    canonical_empty_backing!(FieldInfo);
}

#[derive(Debug)]
pub struct ConstructorInfo {
    pub name: Atom,
    pub declaring: TypeId,
    pub modifiers: Modifiers,
    pub parameters: ParameterList,
    pub thrown_types: TypeList,
    signature: Arc<SignatureType>,
}

impl ConstructorInfo {
    /// Constructors are always named `<init>` and return `void`.
    pub fn new(
        types: &TypeRegistry,
        declaring: TypeId,
        modifiers: Modifiers,
        parameters: ParameterList,
        thrown_types: &[TypeId],
    ) -> Result<Arc<Self>> {
        let signature =
            SignatureType::new(types, TypeId::VOID, parameters.parameter_types().clone())?;
        Ok(Arc::new(Self {
            name: types.names().intern("<init>"),
            declaring,
            modifiers,
            parameters,
            thrown_types: type_list(thrown_types),
            signature,
        }))
    }

    pub fn signature(&self) -> &Arc<SignatureType> {
        &self.signature
    }

    pub fn calling_convention(&self) -> CallingConvention {
        CallingConvention::from_modifiers(self.modifiers)
    }
}

impl Member for ConstructorInfo {
    fn name(&self) -> Atom {
        self.name
    }
    fn declaring_type(&self) -> TypeId {
        self.declaring
    }
    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
    fn member_type(&self) -> MemberType {
        MemberType::CONSTRUCTOR
    }
    canonical_empty_backing!(ConstructorInfo);
}

/// Everything needed to describe a method, before validation.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub declaring: TypeId,
    pub modifiers: Modifiers,
    pub return_type: TypeId,
    pub parameters: Vec<(String, TypeId)>,
    pub generic_parameters: Vec<TypeId>,
    pub thrown_types: Vec<TypeId>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, declaring: TypeId, return_type: TypeId) -> Self {
        Self {
            name: name.into(),
            declaring,
            modifiers: Modifiers::PUBLIC,
            return_type,
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            thrown_types: Vec::new(),
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.parameters.push((name.into(), ty));
        self
    }

    pub fn generic_parameters(mut self, params: &[TypeId]) -> Self {
        self.generic_parameters = params.to_vec();
        self
    }

    pub fn throws(mut self, thrown: TypeId) -> Self {
        self.thrown_types.push(thrown);
        self
    }
}

#[derive(Debug)]
pub struct MethodInfo {
    pub name: Atom,
    pub declaring: TypeId,
    pub modifiers: Modifiers,
    pub parameters: ParameterList,
    pub generic_parameters: TypeList,
    pub thrown_types: TypeList,
    signature: Arc<SignatureType>,
}

impl MethodInfo {
    pub fn new(types: &TypeRegistry, decl: MethodDecl) -> Result<Arc<Self>> {
        let parameters = ParameterList::from_types(types, decl.declaring, &decl.parameters)?;
        let signature =
            SignatureType::new(types, decl.return_type, parameters.parameter_types().clone())?;
        Ok(Arc::new(Self {
            name: types.names().intern(&decl.name),
            declaring: decl.declaring,
            modifiers: decl.modifiers,
            parameters,
            generic_parameters: type_list(&decl.generic_parameters),
            thrown_types: type_list(&decl.thrown_types),
            signature,
        }))
    }

    pub fn signature(&self) -> &Arc<SignatureType> {
        &self.signature
    }

    #[inline]
    pub fn return_type(&self) -> TypeId {
        self.signature.return_type()
    }

    pub fn erased_signature(&self, types: &TypeRegistry) -> Result<Arc<SignatureType>> {
        self.signature.erased(types)
    }

    pub fn calling_convention(&self) -> CallingConvention {
        CallingConvention::from_modifiers(self.modifiers)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    #[inline]
    pub fn is_generic_method(&self) -> bool {
        !self.generic_parameters.is_empty()
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.modifiers.contains(Modifiers::BRIDGE)
    }
}

impl Member for MethodInfo {
    fn name(&self) -> Atom {
        self.name
    }
    fn declaring_type(&self) -> TypeId {
        self.declaring
    }
    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
    fn member_type(&self) -> MemberType {
        MemberType::METHOD
    }
    canonical_empty_backing!(MethodInfo);
}

#[derive(Debug)]
pub struct NestedTypeInfo {
    pub nested: TypeId,
    pub name: Atom,
    pub declaring: TypeId,
    pub modifiers: Modifiers,
}

impl Member for NestedTypeInfo {
    fn name(&self) -> Atom {
        self.name
    }
    fn declaring_type(&self) -> TypeId {
        self.declaring
    }
    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
    fn member_type(&self) -> MemberType {
        MemberType::NESTED_TYPE
    }
    canonical_empty_backing!(NestedTypeInfo);
}

/// Any member, for mixed-kind queries.
#[derive(Debug, Clone)]
pub enum MemberInfo {
    Constructor(Arc<ConstructorInfo>),
    Field(Arc<FieldInfo>),
    Method(Arc<MethodInfo>),
    NestedType(Arc<NestedTypeInfo>),
}

impl Member for MemberInfo {
    fn name(&self) -> Atom {
        match self {
            Self::Constructor(c) => c.name,
            Self::Field(f) => f.name,
            Self::Method(m) => m.name,
            Self::NestedType(n) => n.name,
        }
    }
    fn declaring_type(&self) -> TypeId {
        match self {
            Self::Constructor(c) => c.declaring,
            Self::Field(f) => f.declaring,
            Self::Method(m) => m.declaring,
            Self::NestedType(n) => n.declaring,
        }
    }
    fn modifiers(&self) -> Modifiers {
        match self {
            Self::Constructor(c) => c.modifiers,
            Self::Field(f) => f.modifiers,
            Self::Method(m) => m.modifiers,
            Self::NestedType(n) => n.modifiers,
        }
    }
    fn member_type(&self) -> MemberType {
        match self {
            Self::Constructor(_) => MemberType::CONSTRUCTOR,
            Self::Field(_) => MemberType::FIELD,
            Self::Method(_) => MemberType::METHOD,
            Self::NestedType(_) => MemberType::NESTED_TYPE,
        }
    }
    canonical_empty_backing!(MemberInfo);
}

// =============================================================================
// MemberList
// =============================================================================

pub struct MemberList<T: Member> {
    items: Arc<[Arc<T>]>,
    offset: usize,
    len: usize,
}

pub type ConstructorList = MemberList<ConstructorInfo>;
pub type FieldList = MemberList<FieldInfo>;
pub type MethodList = MemberList<MethodInfo>;

impl<T: Member> Clone for MemberList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            offset: self.offset,
            len: self.len,
        }
    }
}

impl<T: Member + fmt::Debug> fmt::Debug for MemberList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Member> Default for MemberList<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Member> MemberList<T> {
    /// The canonical empty list.
    pub fn empty() -> Self {
        Self {
            items: Arc::clone(T::empty_backing()),
            offset: 0,
            len: 0,
        }
    }

    pub fn new(items: Vec<Arc<T>>) -> Self {
        if items.is_empty() {
            return Self::empty();
        }
        Self::from_shared(Arc::from(items))
    }

    /// View over an existing backing sequence.
    pub fn from_shared(items: Arc<[Arc<T>]>) -> Self {
        if items.is_empty() {
            return Self::empty();
        }
        let len = items.len();
        Self {
            items,
            offset: 0,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.as_slice().get(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Arc<T>] {
        &self.items[self.offset..self.offset + self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.as_slice().iter()
    }

    pub fn first(&self) -> Option<&Arc<T>> {
        self.as_slice().first()
    }

    /// Zero-copy view of `[from, to)`.
    pub fn sub_list(&self, from: usize, to: usize) -> Result<Self> {
        if from > to || to > self.len {
            return Err(TypeError::OutOfBounds {
                from,
                to,
                size: self.len,
            });
        }
        if from == to {
            return Ok(Self::empty());
        }
        Ok(Self {
            items: Arc::clone(&self.items),
            offset: self.offset + from,
            len: to - from,
        })
    }

    /// Concatenate `lists` in order.
    ///
    /// With exactly one non-empty input its view is returned unchanged; with
    /// none the canonical empty list is returned.
    pub fn combine(lists: &[&MemberList<T>]) -> Self {
        let mut non_empty = lists.iter().filter(|list| !list.is_empty());
        let Some(first) = non_empty.next() else {
            return Self::empty();
        };
        let rest: Vec<_> = non_empty.collect();
        if rest.is_empty() {
            return (*first).clone();
        }

        let total = first.len() + rest.iter().map(|list| list.len()).sum::<usize>();
        let mut items = Vec::with_capacity(total);
        items.extend(first.iter().cloned());
        for list in rest {
            items.extend(list.iter().cloned());
        }
        Self::new(items)
    }

    /// `true` when both lists view the same range of the same backing.
    pub fn same_view(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.items, &b.items) && a.offset == b.offset && a.len == b.len
    }

    /// Members satisfying `pred`. Returns this view when nothing is removed.
    pub fn filter(&self, mut pred: impl FnMut(&T) -> bool) -> Self {
        let kept: Vec<Arc<T>> = self.iter().filter(|m| pred(m)).cloned().collect();
        if kept.len() == self.len {
            return self.clone();
        }
        Self::new(kept)
    }

    /// Members named `name`, compared according to `list_type`.
    /// [`MemberListType::All`] keeps everything.
    pub fn with_name(&self, names: &ShardedInterner, name: &str, list_type: MemberListType) -> Self {
        match list_type {
            MemberListType::All => self.clone(),
            MemberListType::CaseSensitive => match names.get(name) {
                Some(atom) => self.filter(|m| m.name() == atom),
                None => Self::empty(),
            },
            MemberListType::CaseInsensitive => {
                self.filter(|m| names.resolve(m.name()).eq_ignore_ascii_case(name))
            }
        }
    }

    /// Members whose modifiers include all of `required`.
    pub fn with_modifiers(&self, required: Modifiers) -> Self {
        self.filter(|m| m.modifiers().contains(required))
    }
}

impl<T: Member> std::ops::Index<usize> for MemberList<T> {
    type Output = Arc<T>;

    fn index(&self, index: usize) -> &Arc<T> {
        &self.as_slice()[index]
    }
}

impl<'a, T: Member> IntoIterator for &'a MemberList<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl MemberList<MethodInfo> {
    pub fn with_arity(&self, count: usize) -> Self {
        self.filter(|m| m.parameters.len() == count)
    }

    pub fn with_calling_convention(&self, convention: CallingConvention) -> Self {
        self.filter(|m| convention.matches(m.calling_convention()))
    }
}

impl MemberList<MemberInfo> {
    pub fn of_kind(&self, kinds: MemberType) -> Self {
        self.filter(|m| kinds.intersects(m.member_type()))
    }
}

// =============================================================================
// ParameterList
// =============================================================================

/// Parameters of one method, positions `0..n` in order.
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    list: MemberList<ParameterInfo>,
    types: OnceCell<TypeList>,
}

impl ParameterList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fails with `InvalidArgument` unless positions run `0..n` in order.
    pub fn new(parameters: Vec<Arc<ParameterInfo>>) -> Result<Self> {
        if let Some((index, bad)) = parameters
            .iter()
            .enumerate()
            .find(|(index, p)| p.position as usize != *index)
        {
            return Err(TypeError::invalid(format!(
                "parameter at index {index} has position {}",
                bad.position
            )));
        }
        Ok(Self {
            list: MemberList::new(parameters),
            types: OnceCell::new(),
        })
    }

    pub(crate) fn from_types(
        types: &TypeRegistry,
        declaring: TypeId,
        parameters: &[(String, TypeId)],
    ) -> Result<Self> {
        let infos = parameters
            .iter()
            .enumerate()
            .map(|(position, (name, ty))| {
                Arc::new(ParameterInfo {
                    name: types.names().intern(name),
                    position: position as u32,
                    parameter_type: *ty,
                    declaring,
                    modifiers: Modifiers::empty(),
                })
            })
            .collect();
        Self::new(infos)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<ParameterInfo>> {
        self.list.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ParameterInfo>> {
        self.list.iter()
    }

    pub fn as_list(&self) -> &MemberList<ParameterInfo> {
        &self.list
    }

    /// Parameter types in order, derived once.
    pub fn parameter_types(&self) -> &TypeList {
        self.types.get_or_init(|| {
            let ids: Vec<TypeId> = self.list.iter().map(|p| p.parameter_type).collect();
            type_list(&ids)
        })
    }
}

// =============================================================================
// ClassMembers
// =============================================================================

/// The declared members of one class.
#[derive(Debug, Clone)]
pub struct ClassMembers {
    pub constructors: ConstructorList,
    pub fields: FieldList,
    pub methods: MethodList,
    pub nested_types: TypeList,
}

impl Default for ClassMembers {
    fn default() -> Self {
        Self {
            constructors: MemberList::empty(),
            fields: MemberList::empty(),
            methods: MemberList::empty(),
            nested_types: empty_type_list(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/members_tests.rs"]
mod tests;
