//! Member lookup across a class hierarchy.
//!
//! Members are gathered from the class, its superclass chain and every
//! super-interface, in that order. A method is hidden by one with the same
//! name and erased parameter types found earlier in the walk; a field by an
//! earlier field of the same name. Constructors are never inherited and
//! private members are not visible from subclasses.
//!
//! Each candidate is tested with the flags it would carry
//! ([`BindingFlags::pre_calculate`]) against the query flags with
//! `DECLARED_ONLY` inverted ([`BindingFlags::as_member_query`]).
//! Package-private inherited instance members pass a `NON_PUBLIC | INSTANCE`
//! query without `DECLARED_ONLY` only when they are non-final methods.

use crate::error::{MemberResolutionError, Result, TypeError, UnresolvedKind};
use crate::flags::{BindingFlags, CallingConvention, MemberType, Modifiers};
use crate::members::{
    ConstructorInfo, ConstructorList, FieldInfo, FieldList, Member, MemberInfo, MemberList,
    MethodInfo, MethodList, NestedTypeInfo,
};
use crate::registry::TypeRegistry;
use crate::relations::TypeBindings;
use crate::signature::SignatureType;
use crate::types::{ClassDef, TypeData, TypeId, TypeList};
use indexmap::IndexMap;
use indexmap::map::Entry;
use jrefl_common::Atom;
use jrefl_common::limits::MAX_HIERARCHY_DEPTH;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use tracing::{debug, trace};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// How a name query is matched.
struct FilterOptions {
    name: Option<String>,
    prefix: bool,
    ignore_case: bool,
}

impl FilterOptions {
    /// `IGNORE_CASE` compares case-insensitively; a trailing `*` turns the
    /// name into a prefix when `allow_prefix` is set.
    fn new(name: Option<&str>, flags: BindingFlags, allow_prefix: bool) -> Self {
        let Some(name) = name else {
            return Self {
                name: None,
                prefix: false,
                ignore_case: false,
            };
        };
        let ignore_case = flags.ignores_case();
        let (name, prefix) = match name.strip_suffix('*') {
            Some(stem) if allow_prefix => (stem, true),
            _ => (name, false),
        };
        let name = if ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        Self {
            name: Some(name),
            prefix,
            ignore_case,
        }
    }

    fn accepts(&self, candidate: &str) -> bool {
        let Some(name) = self.name.as_deref() else {
            return true;
        };
        let lowered;
        let candidate = if self.ignore_case {
            lowered = candidate.to_lowercase();
            lowered.as_str()
        } else {
            candidate
        };
        if self.prefix {
            candidate.starts_with(name)
        } else {
            candidate == name
        }
    }
}

/// A member plus whether it was found on a supertype.
struct Candidate<T> {
    member: Arc<T>,
    inherited: bool,
}

/// Flag test shared by fields, methods and constructors.
fn passes_binding_flags<T: Member>(candidate: &Candidate<T>, flags: BindingFlags) -> bool {
    let modifiers = candidate.member.modifiers();
    let is_static = modifiers.is_static();
    let own = BindingFlags::pre_calculate(modifiers.is_public(), candidate.inherited, is_static);
    if !flags.as_member_query().contains(own) {
        return false;
    }

    if !flags.contains(BindingFlags::DECLARED_ONLY)
        && candidate.inherited
        && modifiers.is_package_private()
        && flags.contains(BindingFlags::NON_PUBLIC)
        && !is_static
        && flags.contains(BindingFlags::INSTANCE)
    {
        return candidate.member.member_type() == MemberType::METHOD && !modifiers.is_final();
    }
    true
}

impl TypeRegistry {
    /// The class whose members `site` exposes: the definition of a class
    /// type, `Object` for arrays, the upper bound's class for variables.
    fn member_host(&self, site: TypeId) -> Result<Option<Arc<ClassDef>>> {
        let mut current = site;
        for _ in 0..MAX_HIERARCHY_DEPTH {
            match self.data(current)? {
                TypeData::Class(class) => return Ok(Some(class.def)),
                TypeData::Array(_) => return Ok(self.class_def(TypeId::OBJECT)),
                TypeData::TypeParameter(info) => current = info.upper_bound(),
                TypeData::Captured(info) => current = info.upper,
                TypeData::Wildcard(bounds) => current = bounds.extends,
                TypeData::Primitive(_) | TypeData::Bottom => return Ok(None),
            }
        }
        Ok(None)
    }

    /// `def`, its superclass chain, then every super-interface breadth-first.
    fn hierarchy_of(&self, def: &Arc<ClassDef>) -> Vec<Arc<ClassDef>> {
        let mut order: FxIndexMap<TypeId, Arc<ClassDef>> = FxIndexMap::default();

        let mut chain = Some(Arc::clone(def));
        while let Some(current) = chain.take() {
            if order.len() >= MAX_HIERARCHY_DEPTH as usize {
                break;
            }
            if order.insert(current.id, Arc::clone(&current)).is_some() {
                break;
            }
            chain = current
                .supertypes()
                .and_then(|supertypes| supertypes.base)
                .and_then(|base| self.class_def(base));
        }

        let mut index = 0;
        while index < order.len() && order.len() < MAX_HIERARCHY_DEPTH as usize {
            let current = Arc::clone(&order[index]);
            if let Some(supertypes) = current.supertypes() {
                for &interface in supertypes.interfaces.iter() {
                    if let Some(interface_def) = self.class_def(interface) {
                        order.entry(interface_def.id).or_insert(interface_def);
                    }
                }
            }
            index += 1;
        }

        trace!(class = %def.name, supertypes = order.len() - 1, "walked hierarchy");
        order.into_values().collect()
    }

    fn method_candidates(&self, site: TypeId) -> Result<Vec<Candidate<MethodInfo>>> {
        let Some(host) = self.member_host(site)? else {
            return Ok(Vec::new());
        };
        let mut found: FxIndexMap<(Atom, TypeList), Candidate<MethodInfo>> = FxIndexMap::default();

        for def in self.hierarchy_of(&host) {
            let Some(members) = def.members() else {
                continue;
            };
            let inherited = def.id != host.id;
            for method in members.methods.iter() {
                if inherited && method.modifiers.is_private() {
                    continue;
                }
                // Static interface methods are not inherited.
                if inherited && def.is_interface() && method.is_static() {
                    continue;
                }
                let erased = method.erased_signature(self)?;
                let key = (method.name, erased.parameter_types().clone());
                if let Entry::Vacant(slot) = found.entry(key) {
                    slot.insert(Candidate {
                        member: Arc::clone(method),
                        inherited,
                    });
                }
            }
        }
        Ok(found.into_values().collect())
    }

    fn field_candidates(&self, site: TypeId) -> Result<Vec<Candidate<FieldInfo>>> {
        let Some(host) = self.member_host(site)? else {
            return Ok(Vec::new());
        };
        let mut found: FxIndexMap<Atom, Candidate<FieldInfo>> = FxIndexMap::default();

        for def in self.hierarchy_of(&host) {
            let Some(members) = def.members() else {
                continue;
            };
            let inherited = def.id != host.id;
            for field in members.fields.iter() {
                if inherited && field.modifiers.is_private() {
                    continue;
                }
                found.entry(field.name).or_insert_with(|| Candidate {
                    member: Arc::clone(field),
                    inherited,
                });
            }
        }
        Ok(found.into_values().collect())
    }

    fn constructor_candidates(&self, site: TypeId) -> Result<Vec<Candidate<ConstructorInfo>>> {
        let Some(host) = self.member_host(site)? else {
            return Ok(Vec::new());
        };
        let Some(members) = host.members() else {
            return Ok(Vec::new());
        };
        Ok(members
            .constructors
            .iter()
            .map(|constructor| Candidate {
                member: Arc::clone(constructor),
                inherited: false,
            })
            .collect())
    }

    fn nested_type_candidates(&self, site: TypeId) -> Result<Vec<Arc<NestedTypeInfo>>> {
        let Some(host) = self.member_host(site)? else {
            return Ok(Vec::new());
        };
        let Some(members) = host.members() else {
            return Ok(Vec::new());
        };
        Ok(members
            .nested_types
            .iter()
            .filter_map(|&nested| self.class_def(nested))
            .map(|def| {
                let simple = def.simple_name();
                let inner = simple.rsplit('$').next().unwrap_or(simple);
                Arc::new(NestedTypeInfo {
                    nested: def.id,
                    name: self.names().intern(inner),
                    declaring: host.id,
                    modifiers: def.modifiers,
                })
            })
            .collect())
    }

    fn member_name(&self, atom: Atom) -> Arc<str> {
        self.names().resolve(atom)
    }

    // -------------------------------------------------------------------------
    // Lists
    // -------------------------------------------------------------------------

    pub fn get_fields(&self, site: TypeId, flags: BindingFlags) -> Result<FieldList> {
        let matched: Vec<Arc<FieldInfo>> = self
            .field_candidates(site)?
            .into_iter()
            .filter(|candidate| passes_binding_flags(candidate, flags))
            .map(|candidate| candidate.member)
            .collect();
        Ok(MemberList::new(matched))
    }

    pub fn get_methods(
        &self,
        site: TypeId,
        flags: BindingFlags,
        convention: CallingConvention,
    ) -> Result<MethodList> {
        let matched: Vec<Arc<MethodInfo>> = self
            .method_candidates(site)?
            .into_iter()
            .filter(|candidate| {
                passes_binding_flags(candidate, flags)
                    && convention.matches(candidate.member.calling_convention())
            })
            .map(|candidate| candidate.member)
            .collect();
        Ok(MemberList::new(matched))
    }

    pub fn get_constructors(&self, site: TypeId, flags: BindingFlags) -> Result<ConstructorList> {
        let matched: Vec<Arc<ConstructorInfo>> = self
            .constructor_candidates(site)?
            .into_iter()
            .filter(|candidate| passes_binding_flags(candidate, flags))
            .map(|candidate| candidate.member)
            .collect();
        Ok(MemberList::new(matched))
    }

    /// Nested types are filtered on access only.
    pub fn get_nested_types(
        &self,
        site: TypeId,
        flags: BindingFlags,
    ) -> Result<MemberList<NestedTypeInfo>> {
        let matched: Vec<Arc<NestedTypeInfo>> = self
            .nested_type_candidates(site)?
            .into_iter()
            .filter(|nested| passes_access(nested.modifiers, flags))
            .collect();
        Ok(MemberList::new(matched))
    }

    /// Fields, methods, constructors and nested types selected by `kinds`,
    /// in that order.
    pub fn get_members(
        &self,
        site: TypeId,
        flags: BindingFlags,
        kinds: MemberType,
    ) -> Result<MemberList<MemberInfo>> {
        let mut members: Vec<Arc<MemberInfo>> = Vec::new();
        if kinds.contains(MemberType::FIELD) {
            members.extend(
                self.get_fields(site, flags)?
                    .iter()
                    .cloned()
                    .map(|member| Arc::new(MemberInfo::Field(member))),
            );
        }
        if kinds.contains(MemberType::METHOD) {
            members.extend(
                self.get_methods(site, flags, CallingConvention::ANY)?
                    .iter()
                    .cloned()
                    .map(|member| Arc::new(MemberInfo::Method(member))),
            );
        }
        if kinds.contains(MemberType::CONSTRUCTOR) {
            members.extend(
                self.get_constructors(site, flags)?
                    .iter()
                    .cloned()
                    .map(|member| Arc::new(MemberInfo::Constructor(member))),
            );
        }
        if kinds.contains(MemberType::NESTED_TYPE) {
            members.extend(
                self.get_nested_types(site, flags)?
                    .iter()
                    .cloned()
                    .map(|member| Arc::new(MemberInfo::NestedType(member))),
            );
        }
        Ok(MemberList::new(members))
    }

    // -------------------------------------------------------------------------
    // Single members
    // -------------------------------------------------------------------------

    /// The field named `name` (`IGNORE_CASE` honoured).
    pub fn get_field(&self, site: TypeId, name: &str, flags: BindingFlags) -> Result<Arc<FieldInfo>> {
        let options = FilterOptions::new(Some(name), flags, false);
        let mut matched: Vec<Arc<FieldInfo>> = self
            .field_candidates(site)?
            .into_iter()
            .filter(|candidate| {
                passes_binding_flags(candidate, flags)
                    && options.accepts(&self.member_name(candidate.member.name))
            })
            .map(|candidate| candidate.member)
            .collect();

        match matched.len() {
            0 => Err(self.not_found(UnresolvedKind::Field, name, site)),
            1 => Ok(matched.swap_remove(0)),
            n => Err(TypeError::AmbiguousMatch(format!(
                "{n} fields match `{name}` in {}",
                self.brief_description(site)
            ))),
        }
    }

    /// Methods whose names match `name` (a trailing `*` is a prefix), with
    /// optional argument-type filtering. `None` skips argument checks.
    pub fn find_methods(
        &self,
        site: TypeId,
        name: &str,
        flags: BindingFlags,
        convention: CallingConvention,
        arguments: Option<&[TypeId]>,
    ) -> Result<MethodList> {
        let options = FilterOptions::new(Some(name), flags, true);
        let matched: Vec<Arc<MethodInfo>> = self
            .method_candidates(site)?
            .into_iter()
            .filter(|candidate| {
                let method = &candidate.member;
                passes_binding_flags(candidate, flags)
                    && convention.matches(method.calling_convention())
                    && options.accepts(&self.member_name(method.name))
                    && arguments.is_none_or(|args| {
                        self.accepts_arguments(
                            method.parameters.parameter_types(),
                            method.calling_convention(),
                            flags,
                            args,
                        )
                    })
            })
            .map(|candidate| candidate.member)
            .collect();
        Ok(MemberList::new(matched))
    }

    /// The single method matching `name` and, when given, the argument
    /// types.
    ///
    /// Several candidates are narrowed to those whose parameters accept the
    /// arguments, then to those whose parameters are equivalent to them.
    pub fn get_method(
        &self,
        site: TypeId,
        name: &str,
        flags: BindingFlags,
        convention: CallingConvention,
        arguments: Option<&[TypeId]>,
    ) -> Result<Arc<MethodInfo>> {
        let candidates = self.find_methods(site, name, flags, convention, arguments)?;
        let parameters = |m: &MethodInfo| m.parameters.parameter_types().clone();
        self.select_one(candidates, arguments, parameters)
            .map_err(|error| match error {
                SelectError::NotFound => self.not_found(UnresolvedKind::Method, name, site),
                SelectError::Ambiguous(n) => TypeError::AmbiguousMatch(format!(
                    "{n} methods match `{name}` in {}",
                    self.brief_description(site)
                )),
            })
    }

    /// The constructor accepting `arguments`.
    pub fn get_constructor(
        &self,
        site: TypeId,
        flags: BindingFlags,
        arguments: &[TypeId],
    ) -> Result<Arc<ConstructorInfo>> {
        let matched: Vec<Arc<ConstructorInfo>> = self
            .constructor_candidates(site)?
            .into_iter()
            .filter(|candidate| {
                let constructor = &candidate.member;
                passes_binding_flags(candidate, flags)
                    && self.accepts_arguments(
                        constructor.parameters.parameter_types(),
                        constructor.calling_convention(),
                        flags,
                        arguments,
                    )
            })
            .map(|candidate| candidate.member)
            .collect();

        let parameters = |c: &ConstructorInfo| c.parameters.parameter_types().clone();
        self.select_one(MemberList::new(matched), Some(arguments), parameters)
            .map_err(|error| match error {
                SelectError::NotFound => self.not_found(UnresolvedKind::Constructor, "<init>", site),
                SelectError::Ambiguous(n) => TypeError::AmbiguousMatch(format!(
                    "{n} constructors of {} accept the arguments",
                    self.brief_description(site)
                )),
            })
    }

    /// The nested type named `name`, either simple (`Entry`) or qualified by
    /// the host's name (`java/util/Map$Entry`, `java.util.Map$Entry`).
    pub fn get_nested_type(&self, site: TypeId, name: &str, flags: BindingFlags) -> Result<TypeId> {
        let qualified = name.replace('.', "/");
        let host_name = self.member_host(site)?.map(|def| def.name.to_string());
        let simple = match host_name.as_deref() {
            Some(host) => match strip_owner(&qualified, host, flags.ignores_case()) {
                Some("") => return Err(self.not_found(UnresolvedKind::NestedType, name, site)),
                Some(rest) => rest.to_string(),
                None => qualified,
            },
            None => qualified,
        };

        let options = FilterOptions::new(Some(&simple), flags, false);
        let matched: Vec<Arc<NestedTypeInfo>> = self
            .nested_type_candidates(site)?
            .into_iter()
            .filter(|nested| {
                passes_access(nested.modifiers, flags) && options.accepts(&self.member_name(nested.name))
            })
            .collect();

        match matched.as_slice() {
            [] => Err(self.not_found(UnresolvedKind::NestedType, name, site)),
            [only] => Ok(only.nested),
            many => Err(TypeError::AmbiguousMatch(format!(
                "{} nested types match `{name}` in {}",
                many.len(),
                self.brief_description(site)
            ))),
        }
    }

    /// The signature of `method` as seen from `site`: the declaring class's
    /// type parameters replaced by the arguments `site` supplies for it.
    ///
    /// Seen through a raw type the signature is erased.
    pub fn member_signature_in(&self, site: TypeId, method: &MethodInfo) -> Result<Arc<SignatureType>> {
        let declaring = self.require_class(method.declaring)?;
        let Some(projected) = self.as_super(site, declaring.raw)? else {
            return Err(TypeError::invalid(format!(
                "{} does not inherit from {}",
                self.brief_description(site),
                self.brief_description(method.declaring)
            )));
        };
        if self.is_raw_type(projected) {
            return method.erased_signature(self);
        }

        let bindings = TypeBindings::of(self, projected);
        if bindings.is_empty() {
            return Ok(Arc::clone(method.signature()));
        }
        let signature = method.signature();
        let return_type = self.substitute(signature.return_type(), &bindings)?;
        let parameter_types = self.substitute_list(signature.parameter_types(), &bindings)?;
        if return_type == signature.return_type()
            && Arc::ptr_eq(&parameter_types, signature.parameter_types())
        {
            return Ok(Arc::clone(signature));
        }
        SignatureType::new(self, return_type, parameter_types)
    }

    fn require_class(&self, id: TypeId) -> Result<Arc<ClassDef>> {
        self.class_def(id)
            .ok_or_else(|| TypeError::invalid(format!("{id:?} is not a class type")))
    }

    fn not_found(&self, kind: UnresolvedKind, name: &str, site: TypeId) -> TypeError {
        let declaring = self.brief_description(site);
        debug!(%kind, name, site = %declaring, "member not found");
        MemberResolutionError::member_not_found(kind, name, declaring).into()
    }

    /// Argument-count and exact-binding checks.
    ///
    /// A count mismatch is only allowed for a var-args method called
    /// without `INVOKE_METHOD`/`CREATE_INSTANCE`, with at most the trailing
    /// array parameter missing.
    fn accepts_arguments(
        &self,
        parameters: &TypeList,
        convention: CallingConvention,
        flags: BindingFlags,
        arguments: &[TypeId],
    ) -> bool {
        let defined = parameters.len();
        let supplied = arguments.len();

        if supplied != defined {
            if flags.intersects(BindingFlags::INVOKE_METHOD | BindingFlags::CREATE_INSTANCE) {
                return false;
            }
            if convention != CallingConvention::VAR_ARGS {
                return false;
            }
            if defined == 0 || supplied + 1 < defined {
                return false;
            }
            return self.is_array(parameters[defined - 1]);
        }

        if flags.contains(BindingFlags::EXACT_BINDING) && !flags.contains(BindingFlags::INVOKE_METHOD) {
            return parameters
                .iter()
                .zip(arguments)
                .all(|(&parameter, &argument)| self.is_equivalent(parameter, argument));
        }
        true
    }

    fn select_one<T: Member>(
        &self,
        candidates: MemberList<T>,
        arguments: Option<&[TypeId]>,
        parameters: impl Fn(&T) -> TypeList,
    ) -> std::result::Result<Arc<T>, SelectError> {
        match candidates.len() {
            0 => return Err(SelectError::NotFound),
            1 => return candidates.first().cloned().ok_or(SelectError::NotFound),
            _ => {}
        }
        let Some(arguments) = arguments else {
            return Err(SelectError::Ambiguous(candidates.len()));
        };

        let applicable = candidates.filter(|member| {
            let params = parameters(member);
            params.len() == arguments.len()
                && params
                    .iter()
                    .zip(arguments)
                    .all(|(&parameter, &argument)| self.is_assignable(argument, parameter))
        });
        if applicable.len() == 1 {
            return applicable.first().cloned().ok_or(SelectError::NotFound);
        }

        let pool = if applicable.is_empty() { &candidates } else { &applicable };
        let exact = pool.filter(|member| {
            let params = parameters(member);
            params.len() == arguments.len()
                && params
                    .iter()
                    .zip(arguments)
                    .all(|(&parameter, &argument)| self.is_equivalent(parameter, argument))
        });
        match exact.len() {
            1 => exact.first().cloned().ok_or(SelectError::NotFound),
            _ => Err(SelectError::Ambiguous(pool.len())),
        }
    }
}

enum SelectError {
    NotFound,
    Ambiguous(usize),
}

/// Access-only filter, for nested types.
fn passes_access(modifiers: Modifiers, flags: BindingFlags) -> bool {
    if modifiers.is_public() {
        flags.contains(BindingFlags::PUBLIC)
    } else {
        flags.contains(BindingFlags::NON_PUBLIC)
    }
}

/// `rest` when `name` is `owner` followed by `$rest` or `/rest`.
fn strip_owner<'n>(name: &'n str, owner: &str, ignore_case: bool) -> Option<&'n str> {
    let head = name.get(..owner.len())?;
    let matches = if ignore_case {
        head.eq_ignore_ascii_case(owner)
    } else {
        head == owner
    };
    if !matches {
        return None;
    }
    let rest = &name[owner.len()..];
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('$').or_else(|| rest.strip_prefix('/'))
}

#[cfg(test)]
#[path = "../tests/resolve_tests.rs"]
mod tests;
