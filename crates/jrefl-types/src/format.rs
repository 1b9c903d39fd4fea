//! Human-readable descriptions, JVM descriptors and generic signatures.
//!
//! | style    | `List<String>`                     | `E extends Comparable<E>` |
//! |----------|------------------------------------|---------------------------|
//! | brief    | `java.util.List<java.lang.String>` | `E`                       |
//! | simple   | `List<String>`                     | `E`                       |
//! | full     | `List<java.lang.String>` + supers  | `E extends Comparable<E>` |
//! | erased   | `java.util.List`                   | `java.lang.Comparable`    |
//!
//! Descriptors are always erased (`Ljava/util/List;`); signatures keep
//! arguments (`Ljava/util/List<Ljava/lang/String;>;`).

use crate::error::{Result, TypeError};
use crate::registry::TypeRegistry;
use crate::signature::SignatureType;
use crate::types::{
    CapturedInfo, ClassType, PrimitiveKind, TypeData, TypeId, TypeParamInfo, WildcardBounds,
};
use crate::visitor::TypeVisitor;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Style {
    Brief,
    Simple,
}

/// Appends descriptions to a buffer.
struct DescriptionWriter {
    style: Style,
    out: String,
    depth: u32,
}

const MAX_DESCRIPTION_DEPTH: u32 = 32;

impl DescriptionWriter {
    fn new(style: Style) -> Self {
        Self {
            style,
            out: String::new(),
            depth: 0,
        }
    }

    fn write(&mut self, types: &TypeRegistry, id: TypeId) {
        if !types.contains(id) {
            let _ = write!(self.out, "<unknown #{}>", id.0);
            return;
        }
        if self.depth >= MAX_DESCRIPTION_DEPTH {
            self.out.push_str("...");
            return;
        }
        self.depth += 1;
        self.visit(types, id, ());
        self.depth -= 1;
    }

    fn write_list(&mut self, types: &TypeRegistry, ids: &[TypeId]) {
        for (index, &id) in ids.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.write(types, id);
        }
    }

    fn class_name(&self, internal: &str) -> String {
        match self.style {
            Style::Brief => internal.replace('/', "."),
            Style::Simple => simple_name(internal).to_string(),
        }
    }
}

impl TypeVisitor for DescriptionWriter {
    type Output = ();

    fn default_output() {}

    fn visit_class(&mut self, types: &TypeRegistry, _id: TypeId, class: &ClassType, _: ()) {
        let name = self.class_name(&class.def.name);
        self.out.push_str(&name);
        if !class.type_arguments.is_empty() {
            self.out.push('<');
            self.write_list(types, &class.type_arguments);
            self.out.push('>');
        }
    }

    fn visit_primitive(&mut self, _types: &TypeRegistry, _id: TypeId, kind: PrimitiveKind, _: ()) {
        self.out.push_str(kind.name());
    }

    fn visit_array(&mut self, types: &TypeRegistry, _id: TypeId, element: TypeId, _: ()) {
        self.write(types, element);
        self.out.push_str("[]");
    }

    fn visit_type_parameter(
        &mut self,
        types: &TypeRegistry,
        _id: TypeId,
        info: &TypeParamInfo,
        _: (),
    ) {
        self.out.push_str(&types.names().resolve(info.name));
    }

    fn visit_wildcard(
        &mut self,
        types: &TypeRegistry,
        _id: TypeId,
        bounds: &WildcardBounds,
        _: (),
    ) {
        self.out.push('?');
        if bounds.has_super_bound() {
            self.out.push_str(" super ");
            self.write(types, bounds.super_bound);
        } else if bounds.has_extends_bound() {
            self.out.push_str(" extends ");
            self.write(types, bounds.extends);
        }
    }

    fn visit_captured(&mut self, types: &TypeRegistry, _id: TypeId, info: &CapturedInfo, _: ()) {
        let _ = write!(self.out, "capture#{} of ", info.serial);
        self.write(types, info.wildcard);
    }

    fn visit_other(&mut self, _types: &TypeRegistry, _id: TypeId, _: ()) {
        self.out.push_str("<bottom>");
    }
}

fn simple_name(internal: &str) -> &str {
    let tail = internal.rsplit('/').next().unwrap_or(internal);
    tail.rsplit('$').next().unwrap_or(tail)
}

/// Serializable snapshot of a type, for logs and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub id: TypeId,
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaring: Option<String>,
}

impl TypeRegistry {
    /// Qualified name with type arguments: `java.util.Map<K, java.lang.String>`.
    pub fn brief_description(&self, id: TypeId) -> String {
        let mut writer = DescriptionWriter::new(Style::Brief);
        writer.write(self, id);
        writer.out
    }

    /// Simple name with simple type arguments: `Map<K, String>`.
    pub fn simple_description(&self, id: TypeId) -> String {
        let mut writer = DescriptionWriter::new(Style::Simple);
        writer.write(self, id);
        writer.out
    }

    /// Declaration-style description: classes list their supertypes, type
    /// parameters their bounds.
    pub fn full_description(&self, id: TypeId) -> Result<String> {
        match self.data(id)? {
            TypeData::Class(class) => {
                let mut out = self.simple_name_of(&class.def.name);
                if !class.type_arguments.is_empty() {
                    let arguments: Vec<String> = class
                        .type_arguments
                        .iter()
                        .map(|&arg| self.brief_description(arg))
                        .collect();
                    let _ = write!(out, "<{}>", arguments.join(", "));
                }
                if let Some(base) = self.base_type(id)? {
                    if base != TypeId::OBJECT {
                        let _ = write!(out, " extends {}", self.brief_description(base));
                    }
                }
                let interfaces = self.interfaces(id)?;
                if !interfaces.is_empty() {
                    let names: Vec<String> = interfaces
                        .iter()
                        .map(|&interface| self.brief_description(interface))
                        .collect();
                    let keyword = if class.def.is_interface() {
                        "extends"
                    } else {
                        "implements"
                    };
                    let _ = write!(out, " {keyword} {}", names.join(", "));
                }
                Ok(out)
            }
            TypeData::TypeParameter(info) => {
                let mut out = self.names().resolve(info.name).to_string();
                if let Some(bounds) = info.declared_bounds() {
                    if bounds[..] != [TypeId::OBJECT] {
                        let names: Vec<String> =
                            bounds.iter().map(|&b| self.brief_description(b)).collect();
                        let _ = write!(out, " extends {}", names.join(" & "));
                    }
                }
                Ok(out)
            }
            _ => Ok(self.brief_description(id)),
        }
    }

    /// Qualified name of the erasure: `java.util.List`.
    pub fn erased_description(&self, id: TypeId) -> Result<String> {
        let erased = self.erasure(id)?;
        match self.data(erased)? {
            TypeData::Class(class) => Ok(class.def.name.replace('/', ".")),
            _ => Ok(self.brief_description(erased)),
        }
    }

    fn simple_name_of(&self, internal: &str) -> String {
        simple_name(internal).to_string()
    }

    /// JVM field descriptor of the erasure: `I`, `[J`, `Ljava/util/List;`.
    pub fn descriptor(&self, id: TypeId) -> Result<String> {
        let mut out = String::new();
        self.write_descriptor(id, &mut out)?;
        Ok(out)
    }

    fn write_descriptor(&self, id: TypeId, out: &mut String) -> Result<()> {
        match self.data(id)? {
            TypeData::Primitive(kind) => out.push(kind.descriptor()),
            TypeData::Class(class) => {
                let _ = write!(out, "L{};", class.def.name);
            }
            TypeData::Array(element) => {
                out.push('[');
                self.write_descriptor(element, out)?;
            }
            TypeData::TypeParameter(_) | TypeData::Wildcard(_) | TypeData::Captured(_) => {
                let erased = self.erasure(id)?;
                self.write_descriptor(erased, out)?;
            }
            TypeData::Bottom => {
                return Err(TypeError::unsupported("the bottom type has no descriptor"));
            }
        }
        Ok(())
    }

    /// Generic signature of a type use: `Ljava/util/List<TE;>;`, `TT;`,
    /// `+Ljava/lang/Number;`, `*`.
    pub fn signature(&self, id: TypeId) -> Result<String> {
        let mut out = String::new();
        self.write_signature(id, &mut out)?;
        Ok(out)
    }

    fn write_signature(&self, id: TypeId, out: &mut String) -> Result<()> {
        match self.data(id)? {
            TypeData::Class(class) if class.is_raw() => {
                let _ = write!(out, "L{};", class.def.name);
            }
            TypeData::Class(class) => {
                let _ = write!(out, "L{}", class.def.name);
                if !class.type_arguments.is_empty() {
                    out.push('<');
                    for &arg in class.type_arguments.iter() {
                        self.write_signature(arg, out)?;
                    }
                    out.push('>');
                }
                out.push(';');
            }
            TypeData::Array(element) => {
                out.push('[');
                self.write_signature(element, out)?;
            }
            TypeData::TypeParameter(info) => {
                let _ = write!(out, "T{};", self.names().resolve(info.name));
            }
            TypeData::Wildcard(bounds) => {
                if bounds.has_super_bound() {
                    out.push('-');
                    self.write_signature(bounds.super_bound, out)?;
                } else if bounds.has_extends_bound() {
                    out.push('+');
                    self.write_signature(bounds.extends, out)?;
                } else {
                    out.push('*');
                }
            }
            TypeData::Captured(info) => self.write_signature(info.upper, out)?,
            TypeData::Primitive(_) | TypeData::Bottom => self.write_descriptor(id, out)?,
        }
        Ok(())
    }

    /// Class declaration signature: `<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;`.
    pub fn generic_signature(&self, id: TypeId) -> Result<String> {
        let Some(def) = self.class_def(id) else {
            return self.signature(id);
        };
        let mut out = String::new();
        if def.is_generic() {
            out.push('<');
            for &param in def.generic_parameters.iter() {
                self.write_parameter_declaration(param, &mut out)?;
            }
            out.push('>');
        }
        let base = self.base_type(def.id)?;
        let interfaces = self.interfaces(def.id)?;
        match base {
            Some(base) => self.write_signature(base, &mut out)?,
            None if interfaces.is_empty() || def.is_interface() => {
                self.write_signature(TypeId::OBJECT, &mut out)?;
            }
            None => {}
        }
        for &interface in interfaces.iter() {
            self.write_signature(interface, &mut out)?;
        }
        Ok(out)
    }

    fn write_parameter_declaration(&self, param: TypeId, out: &mut String) -> Result<()> {
        let TypeData::TypeParameter(info) = self.data(param)? else {
            return Err(TypeError::invalid(format!(
                "{} is not a type parameter",
                self.brief_description(param)
            )));
        };
        out.push_str(&self.names().resolve(info.name));
        let bounds = match info.declared_bounds() {
            Some(bounds) => bounds.to_vec(),
            None => vec![TypeId::OBJECT],
        };
        for (index, &bound) in bounds.iter().enumerate() {
            // Interface bounds use the `::` form; a class bound comes first.
            if index == 0 && self.is_interface(bound) {
                out.push(':');
            }
            out.push(':');
            self.write_signature(bound, out)?;
        }
        Ok(())
    }

    /// Erased method descriptor: `(Ljava/util/List;)Ljava/lang/String;`.
    pub fn method_descriptor(&self, signature: &SignatureType) -> Result<String> {
        let mut out = String::from("(");
        for &param in signature.parameter_types().iter() {
            self.write_descriptor(param, &mut out)?;
        }
        out.push(')');
        self.write_descriptor(signature.return_type(), &mut out)?;
        Ok(out)
    }

    /// `java.lang.String (java.util.List<java.lang.String>)`
    pub fn signature_description(&self, signature: &SignatureType) -> String {
        let params: Vec<String> = signature
            .parameter_types()
            .iter()
            .map(|&param| self.brief_description(param))
            .collect();
        format!(
            "{} ({})",
            self.brief_description(signature.return_type()),
            params.join(", ")
        )
    }

    pub fn summarize(&self, id: TypeId) -> Result<TypeSummary> {
        let data = self.data(id)?;
        let descriptor = match data {
            TypeData::Bottom => None,
            _ => Some(self.descriptor(id)?),
        };
        Ok(TypeSummary {
            id,
            kind: data.kind_name(),
            name: self.brief_description(id),
            descriptor,
            type_arguments: self
                .type_arguments(id)
                .iter()
                .map(|&arg| self.brief_description(arg))
                .collect(),
            modifiers: self.modifiers(id).keywords(),
            declaring: self
                .declaring_type(id)
                .map(|declaring| self.brief_description(declaring)),
        })
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
