//! Capture conversion (JLS 5.1.10).
//!
//! Every capture allocates a fresh node: two captures of the same wildcard at
//! the same site are different types with equal bounds. Captured types never
//! enter the registry's canonical indexes.

use crate::error::{Result, TypeError};
use crate::registry::TypeRegistry;
use crate::relations::TypeBindings;
use crate::types::{CapturedInfo, ClassForm, TypeData, TypeId};
use std::sync::Arc;
use tracing::trace;

impl TypeRegistry {
    /// Capture one wildcard at `site`.
    ///
    /// The upper bound is the wildcard's extends bound (`Object` when absent);
    /// the lower bound is its super bound (the bottom type when absent).
    pub fn capture_wildcard(&self, site: Option<TypeId>, wildcard: TypeId) -> Result<TypeId> {
        let TypeData::Wildcard(bounds) = self.data(wildcard)? else {
            return Err(TypeError::invalid(format!(
                "cannot capture `{}`: not a wildcard",
                self.brief_description(wildcard)
            )));
        };
        Ok(self.allocate_capture(site, wildcard, bounds.extends, bounds.super_bound))
    }

    fn allocate_capture(
        &self,
        site: Option<TypeId>,
        wildcard: TypeId,
        upper: TypeId,
        lower: TypeId,
    ) -> TypeId {
        let serial = self.next_capture_serial();
        let id = self.push_node(|_| {
            TypeData::Captured(Arc::new(CapturedInfo {
                wildcard,
                upper,
                lower,
                site,
                serial,
            }))
        });
        trace!(
            wildcard = wildcard.0,
            upper = upper.0,
            lower = lower.0,
            serial,
            id = id.0,
            "captured wildcard"
        );
        id
    }

    /// Capture conversion of an applied class type.
    ///
    /// Each wildcard argument becomes a fresh capture. Its upper bound is the
    /// greatest lower bound of the wildcard's extends bound and the declared
    /// bound of the parameter it fills, with the declared bound's own
    /// parameters replaced by the original arguments. Types without wildcard
    /// arguments are returned unchanged.
    pub fn capture(&self, id: TypeId) -> Result<TypeId> {
        let TypeData::Class(class) = self.data(id)? else {
            return Ok(id);
        };
        let ClassForm::Applied { definition } = class.form else {
            return Ok(id);
        };

        let arguments = &class.type_arguments;
        if !arguments.iter().any(|&arg| self.is_wildcard(arg)) {
            return Ok(id);
        }

        let parameters = class.def.generic_parameters.clone();
        let bindings = TypeBindings::new(parameters.clone(), arguments.clone())?;

        let mut captured = Vec::with_capacity(arguments.len());
        for (&param, &arg) in parameters.iter().zip(arguments.iter()) {
            let TypeData::Wildcard(bounds) = self.data(arg)? else {
                captured.push(arg);
                continue;
            };

            let declared =
                self.upper_bound(self.substitute(self.extends_bound(param)?, &bindings)?)?;
            let upper = if bounds.has_extends_bound() {
                self.glb(bounds.extends, declared)?
            } else {
                declared
            };
            captured.push(self.allocate_capture(Some(id), arg, upper, bounds.super_bound));
        }

        self.make_generic_type(definition, &captured)
    }

    /// Whether `captured` is a capture of `wildcard`.
    pub fn is_capture_of(&self, captured: TypeId, wildcard: TypeId) -> bool {
        matches!(
            self.lookup(captured),
            Some(TypeData::Captured(info)) if info.wildcard == wildcard
        )
    }
}

#[cfg(test)]
#[path = "../tests/capture_tests.rs"]
mod tests;
