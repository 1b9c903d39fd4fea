//! Type erasure (JLS 4.6).
//!
//! - primitives, the bottom type and non-generic classes erase to themselves
//! - generic definitions and their applications erase to the raw class
//! - arrays erase to arrays of the erased element
//! - type parameters, wildcards and captures erase to the erasure of their
//!   upper bound, following chains like `T extends U, U extends List<T>`
//!
//! The result is memoised on the node. The cell is only filled on success,
//! so a failed computation can be retried. An erasure read through a type
//! parameter whose bounds are not set yet is provisional and never cached,
//! since setting the bounds later changes it.

use crate::error::{Result, TypeError};
use crate::registry::TypeRegistry;
use crate::types::{ClassForm, TypeData, TypeId, TypeList};
use crate::visitor::{DefaultTypeVisitor, TypeMapper};
use rustc_hash::FxHashSet;
use tracing::trace;

impl TypeRegistry {
    /// The erasure of `id`.
    pub fn erasure(&self, id: TypeId) -> Result<TypeId> {
        self.settled_erasure(id).map(|(erased, _)| erased)
    }

    /// The erasure of `id`, and whether it is final.
    pub(crate) fn settled_erasure(&self, id: TypeId) -> Result<(TypeId, bool)> {
        let node = self.node(id)?;
        let cached = node.erased.get_or_try_init(|| {
            match self.compute_erasure(id, node.data())? {
                (erased, true) => Ok(erased),
                (erased, false) => Err(NotCached::Provisional(erased)),
            }
        });
        match cached {
            Ok(&erased) => Ok((erased, true)),
            Err(NotCached::Provisional(erased)) => Ok((erased, false)),
            Err(NotCached::Failed(error)) => Err(error),
        }
    }

    /// Erase every element, returning `list` itself when nothing changes.
    pub fn erase_list(&self, list: &TypeList) -> Result<TypeList> {
        self.settled_erase_list(list).map(|(erased, _)| erased)
    }

    pub(crate) fn settled_erase_list(&self, list: &TypeList) -> Result<(TypeList, bool)> {
        let mut eraser = Eraser {
            error: None,
            settled: true,
        };
        let erased = eraser.map_list(self, list, ());
        match eraser.error {
            Some(error) => Err(error),
            None => Ok((erased, eraser.settled)),
        }
    }

    fn compute_erasure(&self, id: TypeId, data: &TypeData) -> Result<(TypeId, bool)> {
        let (erased, settled) = match data {
            TypeData::Bottom | TypeData::Primitive(_) => (id, true),
            TypeData::Class(class) => match class.form {
                ClassForm::Raw { .. } => (id, true),
                ClassForm::Definition if !class.def.is_generic() => (id, true),
                ClassForm::Definition => (self.make_raw_type(id)?, true),
                ClassForm::Applied { definition } => (self.make_raw_type(definition)?, true),
            },
            TypeData::Array(element) => {
                let (erased_element, settled) = self.settled_erasure(*element)?;
                if erased_element == *element {
                    (id, settled)
                } else {
                    (self.make_array_type(erased_element)?, settled)
                }
            }
            TypeData::TypeParameter(_) | TypeData::Wildcard(_) | TypeData::Captured(_) => {
                self.erase_variable(id)?
            }
        };
        trace!(ty = id.0, erased = erased.0, settled, "computed erasure");
        Ok((erased, settled))
    }

    /// Walk the upper-bound chain of a variable to its first non-variable
    /// bound. A cycle erases to `Object`.
    fn erase_variable(&self, id: TypeId) -> Result<(TypeId, bool)> {
        let mut seen = FxHashSet::default();
        let mut settled = true;
        let mut current = id;
        loop {
            let upper = match self.data(current)? {
                TypeData::TypeParameter(info) => {
                    settled &= info.declared_bounds().is_some();
                    info.upper_bound()
                }
                TypeData::Wildcard(bounds) => bounds.extends,
                TypeData::Captured(info) => info.upper,
                _ => {
                    let (erased, bound_settled) = self.settled_erasure(current)?;
                    return Ok((erased, settled && bound_settled));
                }
            };
            if !seen.insert(current) {
                return Ok((TypeId::OBJECT, settled));
            }
            current = upper;
        }
    }
}

/// Why a computed value was not stored in its cell.
pub(crate) enum NotCached<T> {
    Failed(TypeError),
    /// Computed, but through a type parameter whose bounds are not set yet.
    Provisional(T),
}

impl<T> From<TypeError> for NotCached<T> {
    fn from(error: TypeError) -> Self {
        NotCached::Failed(error)
    }
}

/// Erasing [`TypeMapper`]. The first error is kept and later elements map to
/// themselves.
struct Eraser {
    error: Option<TypeError>,
    settled: bool,
}

impl DefaultTypeVisitor for Eraser {
    type Output = TypeId;

    fn visit_type(&mut self, types: &TypeRegistry, id: TypeId, _: ()) -> TypeId {
        if self.error.is_some() {
            return id;
        }
        match types.settled_erasure(id) {
            Ok((erased, settled)) => {
                self.settled &= settled;
                erased
            }
            Err(error) => {
                self.error = Some(error);
                id
            }
        }
    }
}

impl TypeMapper for Eraser {}

#[cfg(test)]
#[path = "../tests/erasure_tests.rs"]
mod tests;
