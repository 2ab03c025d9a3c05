//! Exclusive-ownership boxes over a pluggable allocator.
//!
//! A [`UniqueBox`] owns at most one heap allocation. The allocation is
//! released exactly once, when the box is dropped or reset, through the same
//! allocator instance that produced it.

pub mod alloc;
pub mod boxed;
pub mod boxing;
pub mod error;
pub mod tracking;

pub use crate::alloc::{Alloc, AllocError, DefaultAlloc, Kind};
pub use crate::boxed::UniqueBox;
pub use crate::boxing::{Boxing, InterimBox};
pub use crate::error::OwnerError;
pub use crate::tracking::{AllocStats, Tracking};
