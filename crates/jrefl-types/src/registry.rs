//! The type registry.
//!
//! An append-only table of [`TypeNode`]s addressed by [`TypeId`], plus two
//! canonicalising indexes:
//!
//! - `classes`: erased class name to its canonical node (class definitions,
//!   primitives and arrays named by descriptor)
//! - `structural`: structural key to node (arrays, applied and raw generic
//!   types, wildcards, type parameters)
//!
//! Insertion into either index happens under the `DashMap` entry lock, so when
//! several threads race to create the same type exactly one id wins and every
//! caller sees it. Captured wildcards are allocated directly and never enter
//! an index.
//!
//! Primitives, the bottom type and `java/lang/Object` are registered at
//! construction with fixed ids (see [`TypeId`]).

use crate::error::{MemberResolutionError, Result, TypeError};
use crate::flags::{MemberType, Modifiers};
use crate::members::{ClassMembers, Member};
use crate::signature::field_descriptor_len;
use crate::types::{
    ClassDef, ClassForm, ClassKind, ClassType, GenericOwner, PrimitiveKind, RawClass, Supertypes,
    TypeData, TypeId, TypeKey, TypeList, TypeNode, TypeParamInfo, WildcardBounds,
    empty_type_list, type_list,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jrefl_common::ShardedInterner;
use jrefl_common::limits::MAX_ARRAY_DIMENSIONS;
use once_cell::sync::{Lazy, OnceCell};
use rustc_hash::FxBuildHasher;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::cell::RefCell;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, trace};

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Description of a class to register.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    /// Internal (`java/util/List`) or binary (`java.util.List`) name.
    pub name: String,
    pub modifiers: Modifiers,
    /// Derived from `modifiers` when absent.
    pub kind: Option<ClassKind>,
    pub declaring: Option<TypeId>,
    pub type_parameters: Vec<String>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            kind: None,
            declaring: None,
            type_parameters: Vec::new(),
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn interface(mut self) -> Self {
        self.modifiers |= Modifiers::INTERFACE | Modifiers::ABSTRACT;
        self.kind = Some(ClassKind::Interface);
        self
    }

    pub fn declaring(mut self, declaring: TypeId) -> Self {
        self.declaring = Some(declaring);
        self
    }

    pub fn type_parameters(mut self, names: &[&str]) -> Self {
        self.type_parameters = names.iter().map(|n| (*n).to_string()).collect();
        self
    }
}

/// Source of class declarations for names the registry has not seen.
///
/// `declare` returns `Ok(None)` when the class does not exist. After the
/// declaration is registered, `complete` defines supertypes, bounds and
/// members. Completions run one at a time per registry. A failed completion
/// is retried by the next lookup, and lookups only return the class once its
/// completion has succeeded. Lookups made from inside `complete` on a class
/// still being completed return it as it stands.
pub trait ClassLoader: Send + Sync {
    fn declare(&self, name: &str) -> std::result::Result<Option<ClassDecl>, BoxedError>;

    fn complete(&self, _registry: &TypeRegistry, _class: TypeId) -> Result<()> {
        Ok(())
    }
}

pub struct TypeRegistry {
    names: ShardedInterner,
    nodes: RwLock<Vec<Arc<TypeNode>>>,
    classes: DashMap<RawClass, TypeId, FxBuildHasher>,
    structural: DashMap<TypeKey, TypeId, FxBuildHasher>,
    loader: Option<Arc<dyn ClassLoader>>,
    completion: Mutex<()>,
    next_capture: AtomicU64,
}

thread_local! {
    /// Classes the current thread is completing, as (registry address, class).
    static COMPLETING: RefCell<Vec<(usize, TypeId)>> = const { RefCell::new(Vec::new()) };
}

/// Pops the completion entry pushed for a class, even if the loader panics.
struct CompletionScope;

impl CompletionScope {
    fn enter(key: (usize, TypeId)) -> Self {
        COMPLETING.with(|stack| stack.borrow_mut().push(key));
        CompletionScope
    }
}

impl Drop for CompletionScope {
    fn drop(&mut self) {
        COMPLETING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

static GLOBAL: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("nodes", &self.len())
            .field("classes", &self.classes.len())
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}

impl TypeRegistry {
    /// A fresh registry with primitives, the bottom type and `Object`
    /// registered.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A fresh registry that asks `loader` for classes it does not know.
    pub fn with_loader(loader: Arc<dyn ClassLoader>) -> Self {
        Self::build(Some(loader))
    }

    /// The process-wide registry, created on first use. There is no reset;
    /// tests wanting isolation build their own with [`TypeRegistry::new`].
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    fn build(loader: Option<Arc<dyn ClassLoader>>) -> Self {
        let registry = Self {
            names: ShardedInterner::with_common_names(),
            nodes: RwLock::new(Vec::with_capacity(256)),
            classes: DashMap::with_hasher(FxBuildHasher),
            structural: DashMap::with_hasher(FxBuildHasher),
            loader,
            completion: Mutex::new(()),
            next_capture: AtomicU64::new(1),
        };
        registry.bootstrap();
        registry.ensure_primitives_registered();
        registry
    }

    /// Register the fixed-id nodes.
    ///
    /// # Panics
    ///
    /// If `java/lang/Object` cannot be registered with empty supertypes.
    fn bootstrap(&self) {
        self.push_node(|_| TypeData::Bottom);

        for kind in PrimitiveKind::ALL {
            let raw = RawClass(self.names.intern(kind.name()));
            let id = self.push_node(|_| TypeData::Primitive(kind));
            self.classes.insert(raw, id);
        }

        let object = match self.insert_class(ClassDecl::new("java/lang/Object"), true) {
            Ok((id, true)) => id,
            Ok((id, false)) => {
                panic!("type registry bootstrap failed: java/lang/Object already registered as {id:?}")
            }
            Err(error) => panic!("type registry bootstrap failed: java/lang/Object: {error}"),
        };
        let Some(def) = self.class_def(object) else {
            panic!("type registry bootstrap failed: {object:?} is not a class");
        };
        let roots = Supertypes {
            base: None,
            interfaces: empty_type_list(),
        };
        if def.supertypes.set(roots).is_err() {
            panic!("type registry bootstrap failed: supertypes of java/lang/Object already set");
        }
    }

    /// Verify the fixed bootstrap ids.
    ///
    /// # Panics
    ///
    /// If any primitive, the bottom type or `Object` does not read back as the
    /// node registered for it. The registry is unusable in that state.
    pub fn ensure_primitives_registered(&self) {
        if !matches!(self.lookup(TypeId::BOTTOM), Some(TypeData::Bottom)) {
            panic!("type registry bootstrap failed: bottom type is not {:?}", TypeId::BOTTOM);
        }
        for kind in PrimitiveKind::ALL {
            let found = self.find_by_name(kind.name());
            let registered = matches!(
                self.lookup(kind.type_id()),
                Some(TypeData::Primitive(k)) if k == kind
            );
            if found != Some(kind.type_id()) || !registered {
                panic!(
                    "type registry bootstrap failed: primitive `{}` resolved to {:?}, expected {:?}",
                    kind.name(),
                    found,
                    kind.type_id()
                );
            }
        }
        if self.find_by_name("java/lang/Object") != Some(TypeId::OBJECT) {
            panic!(
                "type registry bootstrap failed: java/lang/Object is not {:?}",
                TypeId::OBJECT
            );
        }
    }

    // -------------------------------------------------------------------------
    // Node storage
    // -------------------------------------------------------------------------

    pub(crate) fn push_node(&self, build: impl FnOnce(TypeId) -> TypeData) -> TypeId {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        let id = TypeId(nodes.len() as u32);
        nodes.push(Arc::new(TypeNode::new(build(id))));
        id
    }

    pub(crate) fn node(&self, id: TypeId) -> Result<Arc<TypeNode>> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes
            .get(id.0 as usize)
            .cloned()
            .ok_or(TypeError::UnknownType(id))
    }

    /// The data of a node, or `None` for a handle from another registry.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.node(id).ok().map(|node| node.data.clone())
    }

    pub(crate) fn data(&self, id: TypeId) -> Result<TypeData> {
        self.node(id).map(|node| node.data.clone())
    }

    pub fn contains(&self, id: TypeId) -> bool {
        (id.0 as usize) < self.len()
    }

    /// Number of nodes, captured types included.
    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn names(&self) -> &ShardedInterner {
        &self.names
    }

    fn intern_structural(
        &self,
        key: TypeKey,
        build: impl FnOnce(TypeId) -> TypeData,
    ) -> (TypeId, bool) {
        if let Some(id) = self.structural.get(&key) {
            return (*id, false);
        }
        match self.structural.entry(key) {
            Entry::Occupied(entry) => (*entry.get(), false),
            Entry::Vacant(entry) => {
                let id = self.push_node(build);
                entry.insert(id);
                (id, true)
            }
        }
    }

    pub(crate) fn next_capture_serial(&self) -> u64 {
        self.next_capture.fetch_add(1, Ordering::Relaxed)
    }

    // -------------------------------------------------------------------------
    // Class lookup
    // -------------------------------------------------------------------------

    /// Canonical node for an erased class, without loading. A class the
    /// class loader has not finished completing is not found.
    pub fn find(&self, raw: RawClass) -> Option<TypeId> {
        self.find_class(raw)
            .filter(|&id| self.class_def(id).is_none_or(|def| def.is_complete()))
    }

    /// Canonical node for an erased class, complete or not.
    pub(crate) fn find_class(&self, raw: RawClass) -> Option<TypeId> {
        self.classes.get(&raw).map(|entry| *entry)
    }

    pub fn find_by_name(&self, name: &str) -> Option<TypeId> {
        let name = normalize_name(name);
        let atom = self.names.get(&name)?;
        self.find(RawClass(atom))
    }

    pub fn raw_class(&self, name: &str) -> RawClass {
        RawClass(self.names.intern(&normalize_name(name)))
    }

    /// Canonical node for a class, primitive or array name.
    ///
    /// Array names are descriptors (`[I`, `[Ljava/lang/String;`). Other
    /// unknown names go to the class loader; without one, or when it does not
    /// know the class, the result is a [`MemberResolutionError`].
    pub fn of(&self, name: &str) -> Result<TypeId> {
        let name = normalize_name(name);
        let known = self
            .names
            .get(&name)
            .and_then(|atom| self.find_class(RawClass(atom)));
        if let Some(id) = known {
            self.ensure_complete(id)?;
            return Ok(id);
        }
        if name.starts_with('[') {
            return self.resolve_descriptor(&name);
        }
        self.load_class(&name)
    }

    /// Resolve a single field descriptor (`I`, `Ljava/lang/String;`, `[[J`).
    /// Class names in descriptors denote erased types.
    pub fn resolve_descriptor(&self, descriptor: &str) -> Result<TypeId> {
        let malformed = || TypeError::invalid(format!("malformed descriptor `{descriptor}`"));
        if field_descriptor_len(descriptor) != Some(descriptor.len()) {
            return Err(malformed());
        }

        let dims = descriptor.bytes().take_while(|&b| b == b'[').count();
        if dims > MAX_ARRAY_DIMENSIONS {
            return Err(TypeError::invalid(format!(
                "descriptor `{descriptor}` has more than {MAX_ARRAY_DIMENSIONS} dimensions"
            )));
        }

        let element = &descriptor[dims..];
        let mut id = if let Some(class_name) = element
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
        {
            let class = self.of(class_name)?;
            self.erasure(class)?
        } else {
            let c = element.chars().next().ok_or_else(malformed)?;
            let kind = PrimitiveKind::from_descriptor(c).ok_or_else(malformed)?;
            if kind == PrimitiveKind::Void && dims > 0 {
                return Err(malformed());
            }
            kind.type_id()
        };

        for _ in 0..dims {
            id = self.make_array_type(id)?;
        }
        Ok(id)
    }

    fn load_class(&self, name: &str) -> Result<TypeId> {
        let Some(loader) = self.loader.as_ref() else {
            debug!(class = name, "no class loader configured");
            return Err(MemberResolutionError::type_not_found(name).into());
        };

        let decl = match loader.declare(name) {
            Ok(Some(decl)) => decl,
            Ok(None) => {
                debug!(class = name, "class loader does not know class");
                return Err(MemberResolutionError::type_not_found(name).into());
            }
            Err(cause) => {
                debug!(class = name, error = %cause, "class loader failed");
                return Err(MemberResolutionError::type_not_found(name)
                    .with_cause(cause)
                    .into());
            }
        };

        if normalize_name(&decl.name) != name {
            return Err(TypeError::invalid(format!(
                "class loader answered `{}` for `{name}`",
                decl.name
            )));
        }

        let (id, _) = self.insert_class(decl, false)?;
        self.ensure_complete(id)?;
        Ok(id)
    }

    /// Run the class loader's `complete` for `class` unless it already
    /// succeeded. Blocks while another thread completes a class.
    fn ensure_complete(&self, class: TypeId) -> Result<()> {
        let Some(def) = self.class_def(class) else {
            return Ok(());
        };
        if def.is_complete() {
            return Ok(());
        }
        let Some(loader) = self.loader.as_ref() else {
            return Ok(());
        };

        let key = (self as *const Self as usize, class);
        let (reentrant, holds_lock) = COMPLETING.with(|stack| {
            let stack = stack.borrow();
            (
                stack.contains(&key),
                stack.iter().any(|&(registry, _)| registry == key.0),
            )
        });
        if reentrant {
            return Ok(());
        }
        let _lock = (!holds_lock)
            .then(|| self.completion.lock().unwrap_or_else(PoisonError::into_inner));
        if def.is_complete() {
            return Ok(());
        }

        let result = {
            let _scope = CompletionScope::enter(key);
            loader.complete(self, class)
        };
        match result {
            Ok(()) => {
                let _ = def.completed.set(());
                trace!(class = %def.name, id = class.0, "completed class");
                Ok(())
            }
            Err(error) => {
                debug!(class = %def.name, %error, "class loader failed to complete class");
                Err(error)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Declaration
    // -------------------------------------------------------------------------

    /// Register a class definition. Fails with `InvalidArgument` if the name
    /// is already registered.
    pub fn declare_class(&self, decl: ClassDecl) -> Result<TypeId> {
        let name = decl.name.clone();
        match self.insert_class(decl, true)? {
            (id, true) => Ok(id),
            (_, false) => Err(TypeError::invalid(format!(
                "`{name}` is already registered"
            ))),
        }
    }

    /// Insert a class, or return the node that won a race for the same name.
    /// A class inserted with `complete == false` waits for the class loader.
    fn insert_class(&self, decl: ClassDecl, complete: bool) -> Result<(TypeId, bool)> {
        let name = normalize_name(&decl.name).into_owned();
        if name.is_empty() || name.starts_with('[') || PrimitiveKind::from_name(&name).is_some() {
            return Err(TypeError::invalid(format!("`{name}` is not a class name")));
        }
        if let Some(declaring) = decl.declaring {
            if !matches!(self.lookup(declaring), Some(TypeData::Class(_))) {
                return Err(TypeError::invalid(format!(
                    "declaring type of `{name}` is not a class"
                )));
            }
        }

        let raw = RawClass(self.names.intern(&name));
        if let Some(existing) = self.find_class(raw) {
            return Ok((existing, false));
        }

        let params: Vec<TypeId> = decl
            .type_parameters
            .iter()
            .enumerate()
            .map(|(position, param)| {
                self.intern_parameter(GenericOwner::Class(raw), position as u32, param)
            })
            .collect();
        let params = type_list(&params);
        let kind = decl
            .kind
            .unwrap_or_else(|| ClassKind::from_modifiers(decl.modifiers));

        match self.classes.entry(raw) {
            Entry::Occupied(entry) => Ok((*entry.get(), false)),
            Entry::Vacant(entry) => {
                let id = self.push_node(|id| {
                    let def = ClassDef {
                        id,
                        raw,
                        name: Arc::from(name.as_str()),
                        kind,
                        modifiers: decl.modifiers,
                        declaring: decl.declaring,
                        generic_parameters: params.clone(),
                        supertypes: OnceCell::new(),
                        members: OnceCell::new(),
                        completed: if complete {
                            OnceCell::with_value(())
                        } else {
                            OnceCell::new()
                        },
                    };
                    TypeData::Class(ClassType {
                        def: Arc::new(def),
                        form: ClassForm::Definition,
                        type_arguments: params,
                    })
                });
                entry.insert(id);
                trace!(class = %name, id = id.0, ?kind, "declared class");
                Ok((id, true))
            }
        }
    }

    fn intern_parameter(&self, owner: GenericOwner, position: u32, name: &str) -> TypeId {
        let atom = self.names.intern(name);
        let key = TypeKey::Parameter(owner, position, atom);
        self.intern_structural(key, |_| {
            TypeData::TypeParameter(Arc::new(TypeParamInfo::new(atom, position, owner)))
        })
        .0
    }

    /// Declare a generic parameter of a method of `class`. The method is
    /// identified by name and erased descriptor.
    pub fn declare_method_type_parameter(
        &self,
        class: TypeId,
        method: &str,
        descriptor: &str,
        position: u32,
        name: &str,
    ) -> Result<TypeId> {
        let def = self.require_definition(class)?;
        let owner = GenericOwner::Method {
            class: def.raw,
            name: self.names.intern(method),
            descriptor: self.names.intern(descriptor),
        };
        Ok(self.intern_parameter(owner, position, name))
    }

    fn require_definition(&self, class: TypeId) -> Result<Arc<ClassDef>> {
        match self.data(class)? {
            TypeData::Class(ClassType {
                def,
                form: ClassForm::Definition,
                ..
            }) => Ok(def),
            other => Err(TypeError::invalid(format!(
                "{:?} is a {}, not a class definition",
                class,
                other.kind_name()
            ))),
        }
    }

    /// Define the direct supertypes of a class definition, once.
    ///
    /// A class other than `Object` without an explicit base extends `Object`.
    pub fn define_supertypes(
        &self,
        class: TypeId,
        base: Option<TypeId>,
        interfaces: &[TypeId],
    ) -> Result<()> {
        let def = self.require_definition(class)?;

        if let Some(base) = base {
            match self.class_def(base) {
                Some(base_def) if !base_def.is_interface() => {}
                _ => {
                    return Err(TypeError::invalid(format!(
                        "base type of `{}` must be a class",
                        def.name
                    )));
                }
            }
        }
        for &interface in interfaces {
            match self.class_def(interface) {
                Some(iface) if iface.is_interface() => {}
                _ => {
                    return Err(TypeError::invalid(format!(
                        "{:?} in the interfaces of `{}` is not an interface",
                        interface, def.name
                    )));
                }
            }
        }

        let base = base.or((!def.is_interface() && class != TypeId::OBJECT).then_some(TypeId::OBJECT));
        def.supertypes
            .set(Supertypes {
                base,
                interfaces: type_list(interfaces),
            })
            .map_err(|_| {
                TypeError::invalid(format!("supertypes of `{}` are already defined", def.name))
            })?;
        trace!(class = %def.name, ?base, interfaces = interfaces.len(), "defined supertypes");
        Ok(())
    }

    /// Set the bounds of a type parameter, once. No bounds means `Object`.
    pub fn set_type_parameter_bounds(&self, param: TypeId, bounds: &[TypeId]) -> Result<()> {
        let TypeData::TypeParameter(info) = self.data(param)? else {
            return Err(TypeError::invalid(format!(
                "{param:?} is not a type parameter"
            )));
        };
        for &bound in bounds {
            if !self.is_reference_type(bound)? {
                return Err(TypeError::invalid(format!(
                    "{bound:?} cannot bound a type parameter"
                )));
            }
        }
        let bounds = if bounds.is_empty() {
            type_list(&[TypeId::OBJECT])
        } else {
            type_list(bounds)
        };
        info.bounds.set(bounds).map_err(|_| {
            TypeError::invalid(format!(
                "bounds of `{}` are already set",
                self.names.resolve(info.name)
            ))
        })
    }

    /// Attach the declared members of a class definition, once. Every member
    /// must name `class` as its declaring type.
    pub fn define_members(&self, class: TypeId, members: ClassMembers) -> Result<()> {
        let def = self.require_definition(class)?;

        let foreign = members
            .constructors
            .iter()
            .map(|m| m.declaring_type())
            .chain(members.fields.iter().map(|m| m.declaring_type()))
            .chain(members.methods.iter().map(|m| m.declaring_type()))
            .find(|&declaring| declaring != class);
        if let Some(declaring) = foreign {
            return Err(TypeError::invalid(format!(
                "member of {declaring:?} cannot be defined on `{}`",
                def.name
            )));
        }

        def.members.set(members).map_err(|_| {
            TypeError::invalid(format!("members of `{}` are already defined", def.name))
        })?;
        trace!(class = %def.name, "defined members");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Factories
    // -------------------------------------------------------------------------

    /// `element[]`. Arrays of the bottom type are unsupported.
    pub fn make_array_type(&self, element: TypeId) -> Result<TypeId> {
        match self.data(element)? {
            TypeData::Bottom => {
                return Err(TypeError::unsupported(
                    "cannot create an array of the bottom type",
                ));
            }
            TypeData::Primitive(PrimitiveKind::Void) => {
                return Err(TypeError::invalid("cannot create an array of void"));
            }
            TypeData::Wildcard(_) => {
                return Err(TypeError::invalid("cannot create an array of a wildcard"));
            }
            _ => {}
        }

        let (id, inserted) = self.intern_structural(TypeKey::Array(element), |_| {
            TypeData::Array(element)
        });
        if inserted && self.erasure(element)? == element {
            // Erased arrays are also reachable by descriptor name.
            let descriptor = self.descriptor(id)?;
            let raw = RawClass(self.names.intern(&descriptor));
            self.classes.entry(raw).or_insert(id);
            trace!(array = %descriptor, id = id.0, "registered array type");
        }
        Ok(id)
    }

    /// Apply a generic definition to type arguments.
    ///
    /// Applying a definition to its own parameters returns the definition.
    pub fn make_generic_type(&self, definition: TypeId, arguments: &[TypeId]) -> Result<TypeId> {
        let def = self.require_definition(definition)?;
        if !def.is_generic() {
            return Err(TypeError::invalid(format!(
                "`{}` is not a generic type definition",
                def.name
            )));
        }
        if arguments.len() != def.generic_parameters.len() {
            return Err(TypeError::invalid(format!(
                "`{}` takes {} type arguments, {} given",
                def.name,
                def.generic_parameters.len(),
                arguments.len()
            )));
        }
        for &argument in arguments {
            if !self.is_reference_type(argument)? && !self.is_wildcard(argument) {
                return Err(TypeError::invalid(format!(
                    "{argument:?} is not a valid type argument for `{}`",
                    def.name
                )));
            }
        }
        if *def.generic_parameters == *arguments {
            return Ok(definition);
        }

        let arguments = type_list(arguments);
        let key = TypeKey::Applied(definition, arguments.clone());
        Ok(self
            .intern_structural(key, |_| {
                TypeData::Class(ClassType {
                    def: Arc::clone(&def),
                    form: ClassForm::Applied { definition },
                    type_arguments: arguments,
                })
            })
            .0)
    }

    /// The raw form of a generic class. Non-generic classes are their own raw
    /// form.
    pub fn make_raw_type(&self, class: TypeId) -> Result<TypeId> {
        let def = self
            .class_def(class)
            .ok_or_else(|| TypeError::invalid(format!("{class:?} is not a class type")))?;
        if !def.is_generic() {
            return Ok(def.id);
        }
        let definition = def.id;
        Ok(self
            .intern_structural(TypeKey::Raw(definition), |_| {
                TypeData::Class(ClassType {
                    def,
                    form: ClassForm::Raw { definition },
                    type_arguments: empty_type_list(),
                })
            })
            .0)
    }

    /// `? extends extends super super_bound`. At most one bound may be given:
    /// pass `OBJECT` / `BOTTOM` for an absent bound.
    pub fn make_wildcard(&self, extends: TypeId, super_bound: TypeId) -> Result<TypeId> {
        if !self.is_reference_type(extends)? {
            return Err(TypeError::invalid(format!(
                "{extends:?} cannot be a wildcard bound"
            )));
        }
        if super_bound != TypeId::BOTTOM && !self.is_reference_type(super_bound)? {
            return Err(TypeError::invalid(format!(
                "{super_bound:?} cannot be a wildcard bound"
            )));
        }
        let bounds = WildcardBounds {
            extends,
            super_bound,
        };
        if bounds.has_extends_bound() && bounds.has_super_bound() {
            return Err(TypeError::invalid(
                "a wildcard cannot have both an extends and a super bound",
            ));
        }
        Ok(self.intern_wildcard(bounds))
    }

    fn intern_wildcard(&self, bounds: WildcardBounds) -> TypeId {
        self.intern_structural(TypeKey::Wildcard(bounds), |_| TypeData::Wildcard(bounds))
            .0
    }

    /// `?`
    pub fn unbounded_wildcard(&self) -> TypeId {
        self.intern_wildcard(WildcardBounds::UNBOUNDED)
    }

    /// `? extends bound`
    pub fn extends_wildcard(&self, bound: TypeId) -> Result<TypeId> {
        self.make_wildcard(bound, TypeId::BOTTOM)
    }

    /// `? super bound`
    pub fn super_wildcard(&self, bound: TypeId) -> Result<TypeId> {
        self.make_wildcard(TypeId::OBJECT, bound)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn class_type(&self, id: TypeId) -> Option<ClassType> {
        match self.lookup(id)? {
            TypeData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn class_def(&self, id: TypeId) -> Option<Arc<ClassDef>> {
        self.class_type(id).map(|class| class.def)
    }

    pub fn primitive_kind(&self, id: TypeId) -> Option<PrimitiveKind> {
        match self.lookup(id)? {
            TypeData::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Erased class identity. The bottom type has none.
    pub fn erased_class(&self, id: TypeId) -> Result<Option<RawClass>> {
        match self.data(id)? {
            TypeData::Bottom => Ok(None),
            TypeData::Class(class) => Ok(Some(class.def.raw)),
            TypeData::Primitive(kind) => Ok(Some(RawClass(self.names.intern(kind.name())))),
            TypeData::Array(_) => {
                let descriptor = self.descriptor(id)?;
                Ok(Some(RawClass(self.names.intern(&descriptor))))
            }
            TypeData::TypeParameter(_) | TypeData::Wildcard(_) | TypeData::Captured(_) => {
                let erased = self.erasure(id)?;
                self.erased_class(erased)
            }
        }
    }

    /// `NESTED_TYPE` for types with a declaring type, else `TYPE_INFO`.
    pub fn member_type(&self, id: TypeId) -> MemberType {
        if self.declaring_type(id).is_some() {
            MemberType::NESTED_TYPE
        } else {
            MemberType::TYPE_INFO
        }
    }

    pub fn declaring_type(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id)? {
            TypeData::Class(class) => class.def.declaring,
            TypeData::TypeParameter(info) => self.find_class(info.owner.class()),
            TypeData::Captured(info) => info.site,
            _ => None,
        }
    }

    /// Modifiers as reported by the JVM: primitives are
    /// `public final abstract`, arrays take their element's access.
    pub fn modifiers(&self, id: TypeId) -> Modifiers {
        match self.lookup(id) {
            Some(TypeData::Class(class)) => class.def.modifiers,
            Some(TypeData::Primitive(_)) => {
                Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::ABSTRACT
            }
            Some(TypeData::Array(element)) => {
                (self.modifiers(element) & Modifiers::ACCESS) | Modifiers::FINAL | Modifiers::ABSTRACT
            }
            _ => Modifiers::empty(),
        }
    }

    /// Class types other than primitives, arrays and variables.
    pub fn is_class_type(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::Class(_)))
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        self.class_def(id).is_some_and(|def| def.is_interface())
    }

    pub fn is_primitive(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::Primitive(_)))
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::Array(_)))
    }

    pub fn is_generic_parameter(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::TypeParameter(_)))
    }

    pub fn is_wildcard(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::Wildcard(_)))
    }

    pub fn is_captured(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::Captured(_)))
    }

    pub fn is_bottom(&self, id: TypeId) -> bool {
        id == TypeId::BOTTOM
    }

    /// A generic definition or an application of one.
    pub fn is_generic_type(&self, id: TypeId) -> bool {
        self.class_type(id)
            .is_some_and(|class| class.is_applied() || class.is_generic_definition())
    }

    pub fn is_generic_type_definition(&self, id: TypeId) -> bool {
        self.class_type(id)
            .is_some_and(|class| class.is_generic_definition())
    }

    pub fn is_raw_type(&self, id: TypeId) -> bool {
        self.class_type(id).is_some_and(|class| class.is_raw())
    }

    /// Types that can hold a reference: classes, arrays, variables and
    /// captures. Primitives, wildcards and the bottom type are not.
    pub(crate) fn is_reference_type(&self, id: TypeId) -> Result<bool> {
        Ok(matches!(
            self.data(id)?,
            TypeData::Class(_)
                | TypeData::Array(_)
                | TypeData::TypeParameter(_)
                | TypeData::Captured(_)
        ))
    }

    pub fn generic_parameters(&self, id: TypeId) -> TypeList {
        self.class_def(id)
            .map(|def| def.generic_parameters.clone())
            .unwrap_or_else(empty_type_list)
    }

    pub fn type_arguments(&self, id: TypeId) -> TypeList {
        self.class_type(id)
            .map(|class| class.type_arguments)
            .unwrap_or_else(empty_type_list)
    }

    pub fn generic_definition(&self, id: TypeId) -> Result<TypeId> {
        match self.class_type(id) {
            Some(class) if class.def.is_generic() => Ok(class.def.id),
            _ => Err(TypeError::invalid(format!("{id:?} is not a generic type"))),
        }
    }

    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id)? {
            TypeData::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Extends bound of a wildcard, upper bound of a capture, first bound of
    /// a type parameter.
    pub fn extends_bound(&self, id: TypeId) -> Result<TypeId> {
        match self.data(id)? {
            TypeData::Wildcard(bounds) => Ok(bounds.extends),
            TypeData::Captured(info) => Ok(info.upper),
            TypeData::TypeParameter(info) => Ok(info.upper_bound()),
            other => Err(TypeError::invalid(format!(
                "a {} has no extends bound",
                other.kind_name()
            ))),
        }
    }

    /// Super bound of a wildcard or lower bound of a capture; the bottom type
    /// for type parameters.
    pub fn super_bound(&self, id: TypeId) -> Result<TypeId> {
        match self.data(id)? {
            TypeData::Wildcard(bounds) => Ok(bounds.super_bound),
            TypeData::Captured(info) => Ok(info.lower),
            TypeData::TypeParameter(_) => Ok(TypeId::BOTTOM),
            other => Err(TypeError::invalid(format!(
                "a {} has no super bound",
                other.kind_name()
            ))),
        }
    }

    /// Boxing class of a primitive, if registered.
    pub fn boxed_type(&self, kind: PrimitiveKind) -> Option<TypeId> {
        self.find_by_name(kind.wrapper_class())
    }

    /// Primitive a wrapper class unboxes to.
    pub fn unboxed_kind(&self, id: TypeId) -> Option<PrimitiveKind> {
        let def = self.class_def(id)?;
        PrimitiveKind::from_wrapper_class(&def.name)
    }
}

/// `java.util.List` and `java/util/List` name the same class.
fn normalize_name(name: &str) -> Cow<'_, str> {
    if name.contains('.') {
        Cow::Owned(name.replace('.', "/"))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod tests;
