//! Bitmask enumerations: member kinds, calling conventions, binding flags and
//! JVM access modifiers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Kind of a member. Each kind owns one bit; [`MemberType::ALL`] is their union.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MemberType: u32 {
        const CONSTRUCTOR = 1 << 0;
        const FIELD = 1 << 2;
        const METHOD = 1 << 3;
        const TYPE_INFO = 1 << 5;
        const CUSTOM = 1 << 6;
        const NESTED_TYPE = 1 << 7;

        const ALL = Self::CONSTRUCTOR.bits()
            | Self::FIELD.bits()
            | Self::METHOD.bits()
            | Self::TYPE_INFO.bits()
            | Self::CUSTOM.bits()
            | Self::NESTED_TYPE.bits();
    }
}

impl MemberType {
    pub const fn constructors_only() -> Self {
        Self::CONSTRUCTOR
    }

    pub const fn fields_only() -> Self {
        Self::FIELD
    }

    pub const fn methods_only() -> Self {
        Self::METHOD
    }

    pub const fn types_only() -> Self {
        Self::TYPE_INFO
    }

    pub const fn nested_types_only() -> Self {
        Self::NESTED_TYPE
    }

    pub const fn custom_only() -> Self {
        Self::CUSTOM
    }
}

bitflags! {
    /// JVM access and property flags (JVMS 4.1, 4.5, 4.6).
    ///
    /// Some bits mean different things on different members: `0x0040` is
    /// `VOLATILE` on fields and `BRIDGE` on methods, `0x0080` is `TRANSIENT`
    /// on fields and `VARARGS` on methods.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MANDATED = 0x8000;

        const ACCESS = Self::PUBLIC.bits() | Self::PRIVATE.bits() | Self::PROTECTED.bits();
    }
}

impl Modifiers {
    #[inline]
    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    #[inline]
    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    #[inline]
    pub fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    /// No access modifier at all.
    #[inline]
    pub fn is_package_private(self) -> bool {
        !self.intersects(Self::ACCESS)
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    #[inline]
    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    #[inline]
    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Source keywords for these modifiers, in declaration order.
    pub fn keywords(self) -> Vec<&'static str> {
        const ORDER: &[(Modifiers, &str)] = &[
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
            (Modifiers::NATIVE, "native"),
            (Modifiers::STRICT, "strictfp"),
        ];
        ORDER
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, keyword)| *keyword)
            .collect()
    }
}

bitflags! {
    /// Calling convention of a method or constructor.
    ///
    /// [`CallingConvention::ANY`] is only used in queries; it is never the
    /// convention of an actual method.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CallingConvention: u8 {
        const STANDARD = 0x01;
        const VAR_ARGS = 0x02;
        const ANY = Self::STANDARD.bits() | Self::VAR_ARGS.bits();
    }
}

impl CallingConvention {
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        if modifiers.contains(Modifiers::VARARGS) {
            Self::VAR_ARGS
        } else {
            Self::STANDARD
        }
    }

    /// Whether a method with convention `actual` satisfies this query.
    ///
    /// An empty query matches everything.
    #[inline]
    pub fn matches(self, actual: CallingConvention) -> bool {
        self.is_empty() || self.contains(actual)
    }
}

bitflags! {
    /// Member lookup options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BindingFlags: u32 {
        const IGNORE_CASE = 0x0001;
        const DECLARED_ONLY = 0x0002;
        const INSTANCE = 0x0004;
        const STATIC = 0x0008;
        const PUBLIC = 0x0010;
        const NON_PUBLIC = 0x0020;
        const FLATTEN_HIERARCHY = 0x0040;
        const INVOKE_METHOD = 0x0100;
        const CREATE_INSTANCE = 0x0200;
        const EXACT_BINDING = 0x1_0000;

        const DEFAULT = Self::PUBLIC.bits() | Self::INSTANCE.bits() | Self::STATIC.bits();
        const ALL_MEMBERS = Self::PUBLIC.bits()
            | Self::NON_PUBLIC.bits()
            | Self::INSTANCE.bits()
            | Self::STATIC.bits();
        const ALL_DECLARED = Self::ALL_MEMBERS.bits() | Self::DECLARED_ONLY.bits();
    }
}

impl Default for BindingFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BindingFlags {
    /// The flags a member carries, given where it was found.
    ///
    /// For inherited members `DECLARED_ONLY` is set, and query flags are
    /// matched with that bit inverted, so a query without `DECLARED_ONLY`
    /// accepts inherited members. Inherited statics additionally require
    /// `FLATTEN_HIERARCHY`.
    pub fn pre_calculate(is_public: bool, is_inherited: bool, is_static: bool) -> Self {
        let mut flags = if is_public {
            Self::PUBLIC
        } else {
            Self::NON_PUBLIC
        };

        if is_inherited {
            flags |= Self::DECLARED_ONLY;
            if is_static {
                flags |= Self::STATIC | Self::FLATTEN_HIERARCHY;
            } else {
                flags |= Self::INSTANCE;
            }
        } else if is_static {
            flags |= Self::STATIC;
        } else {
            flags |= Self::INSTANCE;
        }

        flags
    }

    /// Query flags with `DECLARED_ONLY` inverted, ready to test member flags
    /// from [`pre_calculate`](Self::pre_calculate) with `contains`.
    #[inline]
    pub fn as_member_query(self) -> Self {
        self ^ Self::DECLARED_ONLY
    }

    #[inline]
    pub fn ignores_case(self) -> bool {
        self.contains(Self::IGNORE_CASE)
    }
}

/// How a member list is pre-filtered by name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberListType {
    /// No name filter.
    #[default]
    All,
    CaseSensitive,
    CaseInsensitive,
}

#[cfg(test)]
#[path = "../tests/flags_tests.rs"]
mod tests;
