//! Failure modes for the allocator's public contract.

use std::fmt;

/// The only way a public allocator operation can fail.
///
/// Passing a handle that was never returned by [`super::Heap`] is not
/// detected or reported; callers are expected to only release or
/// reallocate handles they were actually given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// Growing the heap would exceed the `u32`-addressable word space.
    OutOfMemory,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::OutOfMemory => write!(f, "heap extend would exceed addressable range"),
        }
    }
}

impl std::error::Error for HeapError {}

/// A diagnostic produced by [`super::validator`].
///
/// Validation failures never propagate to the allocator's public
/// contract — callers opt in by calling [`super::Heap::check`] between
/// operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "heap invariant violated: {}", self.0)
    }
}

impl std::error::Error for ValidationError {}
