//! Error types for the type model.
//!
//! Only [`MemberResolutionError`] is expected to be recovered from by callers
//! (a decompiler may treat an unresolved member as unknown). The other
//! [`TypeError`] variants report a broken precondition at the call that
//! triggered them.

use crate::types::TypeId;
use std::fmt;
use thiserror::Error;

pub type Result<T, E = TypeError> = std::result::Result<T, E>;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("range [{from}, {to}) is out of bounds for a list of size {size}")]
    OutOfBounds { from: usize, to: usize, size: usize },
    #[error(transparent)]
    MemberResolution(#[from] MemberResolutionError),
    #[error("ambiguous match: {0}")]
    AmbiguousMatch(String),
    #[error("type handle {0:?} does not belong to this registry")]
    UnknownType(TypeId),
}

impl TypeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    /// `true` for the one kind a caller may recover from.
    pub fn is_member_resolution(&self) -> bool {
        matches!(self, Self::MemberResolution(_))
    }
}

/// What kind of entity could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnresolvedKind {
    Type,
    Field,
    Method,
    Constructor,
    NestedType,
}

impl fmt::Display for UnresolvedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Field => "field",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::NestedType => "nested type",
        })
    }
}

/// A type or member could not be located.
///
/// Carries the unresolved name, the description of the type it was looked up
/// in (if any), and optionally the lower-level failure that caused it.
#[derive(Debug, Error)]
#[error("could not resolve {kind} `{name}`{}", in_clause(.declaring_type))]
pub struct MemberResolutionError {
    pub kind: UnresolvedKind,
    pub name: String,
    pub declaring_type: Option<String>,
    #[source]
    pub cause: Option<BoxedCause>,
}

fn in_clause(declaring_type: &Option<String>) -> String {
    match declaring_type {
        Some(owner) => format!(" in `{owner}`"),
        None => String::new(),
    }
}

impl MemberResolutionError {
    pub fn type_not_found(name: impl Into<String>) -> Self {
        Self {
            kind: UnresolvedKind::Type,
            name: name.into(),
            declaring_type: None,
            cause: None,
        }
    }

    pub fn member_not_found(
        kind: UnresolvedKind,
        name: impl Into<String>,
        declaring_type: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            declaring_type: Some(declaring_type.into()),
            cause: None,
        }
    }

    /// Attach the failure that prevented resolution.
    pub fn with_cause(mut self, cause: impl Into<BoxedCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}
