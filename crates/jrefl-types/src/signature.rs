//! Method signatures: a return type and ordered parameter types.

use crate::erasure::NotCached;
use crate::error::{Result, TypeError};
use crate::registry::TypeRegistry;
use crate::types::{TypeData, TypeId, TypeList, empty_type_list, type_list};
use once_cell::sync::OnceCell;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::trace;

/// Immutable `(parameters) -> return` pair.
///
/// The erased signature is computed on first request and cached. When erasure
/// changes nothing, the erased signature is this same `Arc`.
#[derive(Debug)]
pub struct SignatureType {
    return_type: TypeId,
    parameter_types: TypeList,
    /// `Some(None)` means "already erased".
    erased: OnceCell<Option<Arc<SignatureType>>>,
}

impl SignatureType {
    /// Build a signature. A wildcard return type is replaced by its extends
    /// bound.
    pub fn new(
        types: &TypeRegistry,
        return_type: TypeId,
        parameter_types: TypeList,
    ) -> Result<Arc<Self>> {
        let return_type = match types.lookup(return_type) {
            Some(TypeData::Wildcard(bounds)) => bounds.extends,
            Some(_) => return_type,
            None => return Err(TypeError::UnknownType(return_type)),
        };
        if let Some(&unknown) = parameter_types.iter().find(|&&p| !types.contains(p)) {
            return Err(TypeError::UnknownType(unknown));
        }
        Ok(Arc::new(Self {
            return_type,
            parameter_types,
            erased: OnceCell::new(),
        }))
    }

    /// `void ()`.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            return_type: TypeId::VOID,
            parameter_types: empty_type_list(),
            erased: OnceCell::with_value(None),
        })
    }

    /// Parse an erased method descriptor such as `(ILjava/lang/String;)V`.
    pub fn from_descriptor(types: &TypeRegistry, descriptor: &str) -> Result<Arc<Self>> {
        let malformed = || TypeError::invalid(format!("malformed method descriptor `{descriptor}`"));

        let rest = descriptor.strip_prefix('(').ok_or_else(malformed)?;
        let (params, ret) = rest.split_once(')').ok_or_else(malformed)?;

        let mut parameter_types = Vec::new();
        let mut remaining = params;
        while !remaining.is_empty() {
            let len = field_descriptor_len(remaining).ok_or_else(malformed)?;
            let (head, tail) = remaining.split_at(len);
            parameter_types.push(types.resolve_descriptor(head)?);
            remaining = tail;
        }

        let return_type = types.resolve_descriptor(ret)?;
        Self::new(types, return_type, type_list(&parameter_types))
    }

    #[inline]
    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    #[inline]
    pub fn parameter_types(&self) -> &TypeList {
        &self.parameter_types
    }

    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.parameter_types.len()
    }

    /// The erased signature, memoised.
    ///
    /// A failure leaves the cache empty so a later call can retry, as does an
    /// erasure read through a type parameter whose bounds are not set yet.
    pub fn erased(self: &Arc<Self>, types: &TypeRegistry) -> Result<Arc<Self>> {
        let cached = self.erased.get_or_try_init(|| {
            let (return_type, return_settled) = types.settled_erasure(self.return_type)?;
            let (parameter_types, params_settled) =
                types.settled_erase_list(&self.parameter_types)?;

            let erased = if return_type == self.return_type
                && Arc::ptr_eq(&parameter_types, &self.parameter_types)
            {
                None
            } else {
                trace!(
                    params = self.parameter_types.len(),
                    "erased signature differs from declared"
                );
                Some(Arc::new(Self {
                    return_type,
                    parameter_types,
                    erased: OnceCell::with_value(None),
                }))
            };
            if return_settled && params_settled {
                Ok(erased)
            } else {
                Err(NotCached::Provisional(erased))
            }
        });

        let erased = match cached {
            Ok(erased) => erased.clone(),
            Err(NotCached::Provisional(erased)) => erased,
            Err(NotCached::Failed(error)) => return Err(error),
        };
        Ok(erased.unwrap_or_else(|| Arc::clone(self)))
    }

    /// Whether erasing this signature would change nothing.
    pub fn is_erased(self: &Arc<Self>, types: &TypeRegistry) -> Result<bool> {
        Ok(Arc::ptr_eq(&self.erased(types)?, self))
    }

    /// Same return type and pairwise equivalent parameter types.
    pub fn is_equivalent_to(&self, other: &SignatureType, types: &TypeRegistry) -> bool {
        types.is_equivalent(self.return_type, other.return_type)
            && self.parameter_types.len() == other.parameter_types.len()
            && self
                .parameter_types
                .iter()
                .zip(other.parameter_types.iter())
                .all(|(&a, &b)| types.is_equivalent(a, b))
    }
}

impl PartialEq for SignatureType {
    fn eq(&self, other: &Self) -> bool {
        self.return_type == other.return_type && self.parameter_types == other.parameter_types
    }
}

impl Eq for SignatureType {}

impl Hash for SignatureType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.return_type.hash(state);
        self.parameter_types.hash(state);
    }
}

/// Length of the first field descriptor in `s`, if well-formed.
pub(crate) fn field_descriptor_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }
    match bytes.get(i)? {
        b'L' => s[i..].find(';').map(|end| i + end + 1),
        b'Z' | b'B' | b'C' | b'S' | b'I' | b'J' | b'F' | b'D' | b'V' => Some(i + 1),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod tests;
