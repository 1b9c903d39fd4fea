//! Recursion limits for type computations.
//!
//! Self-referential generics (`Enum<E extends Enum<E>>`) and malformed class
//! hierarchies can send structural algorithms into unbounded recursion.
//! [`RecursionGuard`] keeps the stack of keys being computed, so a key seen
//! again is a cycle, and caps both stack depth and total steps.
//! [`DepthCounter`] is the depth-only variant for walks that legitimately
//! revisit the same key.
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::SubtypeCheck);
//! match guard.enter((t, s)) {
//!     RecursionResult::Entered => {
//!         let result = check(t, s);
//!         guard.leave((t, s));
//!         result
//!     }
//!     RecursionResult::Cycle => true, // coinductive
//!     _ => false,
//! }
//! ```

use jrefl_common::limits::{
    MAX_HIERARCHY_DEPTH, MAX_SUBSTITUTION_DEPTH, MAX_SUBTYPE_DEPTH, MAX_SUBTYPE_ITERATIONS,
};
use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Step budget for walks that do not define their own.
const DEFAULT_ITERATIONS: u32 = 100_000;

/// Which computation a limit is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Subtype and containment checks.
    SubtypeCheck,
    /// Supertype walks: `as_super`, member collection.
    HierarchyWalk,
    /// Substituting type arguments into nested generic types.
    Substitution,
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => MAX_SUBTYPE_DEPTH,
            Self::HierarchyWalk => MAX_HIERARCHY_DEPTH,
            Self::Substitution => MAX_SUBSTITUTION_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::SubtypeCheck => MAX_SUBTYPE_ITERATIONS,
            Self::HierarchyWalk | Self::Substitution => DEFAULT_ITERATIONS,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

/// Why [`RecursionGuard::enter`] did or did not let a key in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already being computed further up the stack.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        self == Self::Entered
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        self == Self::Cycle
    }

    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

/// Stack of in-progress keys with depth and step caps.
///
/// Keys leave in the reverse order they entered. Debug builds check that
/// order and panic when a guard is dropped with keys still on the stack.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    stack: Vec<K>,
    on_stack: FxHashSet<K>,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            stack: Vec::new(),
            on_stack: FxHashSet::default(),
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Push `key`. Every step counts against the budget, denied ones too.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);
        let denied = if self.iterations > self.max_iterations {
            Some(RecursionResult::IterationExceeded)
        } else if self.depth() >= self.max_depth {
            Some(RecursionResult::DepthExceeded)
        } else {
            None
        };
        if let Some(denied) = denied {
            self.exceeded = true;
            return denied;
        }

        if !self.on_stack.insert(key) {
            return RecursionResult::Cycle;
        }
        self.stack.push(key);
        RecursionResult::Entered
    }

    /// Pop `key`, which must be the most recently entered one.
    pub fn leave(&mut self, key: K) {
        let top = self.stack.pop();
        debug_assert!(top == Some(key), "RecursionGuard::leave() out of order");
        self.on_stack.remove(&key);
    }

    /// Run `f` with `key` on the stack, or report why it was not pushed.
    pub fn scope<T>(&mut self, key: K, f: impl FnOnce() -> T) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let result = f();
                self.leave(key);
                Ok(result)
            }
            denied => Err(denied),
        }
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.on_stack.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.stack.len() as u32
    }

    /// Steps taken so far, denied ones included.
    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Stays set once any limit was hit, even after the stack unwinds.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.stack.is_empty() {
            panic!("RecursionGuard dropped with {} keys on the stack", self.stack.len());
        }
    }
}

/// Depth-only limit.
#[derive(Debug)]
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// `false`, with nothing to undo, once the limit is reached.
    pub fn enter(&mut self) -> bool {
        let admitted = self.depth < self.max_depth;
        if admitted {
            self.depth += 1;
        } else {
            self.exceeded = true;
        }
        admitted
    }

    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl Drop for DepthCounter {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!("DepthCounter dropped at depth {}", self.depth);
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
