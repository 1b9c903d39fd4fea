//! Centralised limits for recursive type computations.
//!
//! Hierarchy walks and structural relations over self-referential generic
//! declarations (`class Enum<E extends Enum<E>>`) can recurse without bound
//! when a loader hands us a malformed hierarchy. These constants cap that
//! recursion; the named presets in `jrefl_types::recursion` pick among them.

/// Maximum nesting depth for subtype and containment checks.
///
/// `Enum<E extends Enum<E>>` style bounds nest one level per comparison, so a
/// legitimate check rarely exceeds a dozen frames.
pub const MAX_SUBTYPE_DEPTH: u32 = 64;

/// Maximum number of relation steps for a single top-level subtype query.
pub const MAX_SUBTYPE_ITERATIONS: u32 = 100_000;

/// Maximum depth of a supertype walk (`as_super`, member collection).
///
/// Real class hierarchies are shallow; a deeper chain means the loader
/// produced a cycle.
pub const MAX_HIERARCHY_DEPTH: u32 = 256;

/// Maximum depth when substituting type arguments into nested generic types.
pub const MAX_SUBSTITUTION_DEPTH: u32 = 128;

/// Maximum array dimensions accepted in a raw class descriptor (JVMS 4.3.2).
pub const MAX_ARRAY_DIMENSIONS: usize = 255;
