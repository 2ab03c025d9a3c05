use std::alloc::{self as heap, Layout};
use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};

use thiserror::Error;

pub type Size = usize;
pub type Alignment = usize;
pub type Address = *mut u8;

/// Category for a memory record.
///
/// An instance of `Kind` describes a particular layout of memory.
/// You build a `Kind` up as an input to give to an allocator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Kind {
    size: Size,
    align: Alignment,
}

// Accessor methods
impl Kind {
    pub fn size(&self) -> usize { self.size }

    pub fn align(&self) -> usize { self.align }

    pub fn layout(&self) -> Layout {
        // `align` is a non-zero power of two by construction.
        unsafe { Layout::from_size_align_unchecked(self.size, self.align) }
    }

    pub fn is_zero_sized(&self) -> bool { self.size == 0 }
}

// public constructor methods
impl Kind {
    /// Creates a `Kind` describing the record for a single instance of `T`.
    pub fn new<T>() -> Kind {
        Kind { size: mem::size_of::<T>(), align: mem::align_of::<T>() }
    }

    /// Creates a `Kind` from an explicit size and alignment.
    ///
    /// Fails unless `align` is a non-zero power of two and `size`,
    /// rounded up to `align`, does not overflow `isize`.
    pub fn from_size_align(size: usize, align: usize) -> Result<Kind, AllocError> {
        match Layout::from_size_align(size, align) {
            Ok(_) => Ok(Kind { size, align }),
            Err(_) => Err(AllocError::new(Kind { size, align })),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} bytes (align {})", self.size, self.align)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("memory allocation of {kind} failed")]
pub struct AllocError {
    kind: Kind,
}

impl AllocError {
    pub fn new(kind: Kind) -> Self { AllocError { kind } }

    pub fn kind(&self) -> Kind { self.kind }
}

/// A source of raw memory records.
///
/// # Safety
///
/// A non-null address returned from `alloc` must be valid for reads and
/// writes of `kind.size()` bytes, aligned to `kind.align()`, and must stay
/// valid until it is handed back to `dealloc` on the same allocator.
pub unsafe trait Alloc {
    /// Any activity done by the `oom` method must not allocate
    /// from `self` (otherwise you essentially infinite regress).
    fn oom(&mut self, kind: Kind) -> ! { heap::handle_alloc_error(kind.layout()) }

    /// Returns null when the request cannot be satisfied.
    unsafe fn alloc(&mut self, kind: Kind) -> Address;

    /// `ptr` must come from `alloc` on this allocator with the same `kind`.
    unsafe fn dealloc(&mut self, ptr: Address, kind: Kind);

    fn alloc_one<T>(&mut self) -> Result<NonNull<T>, AllocError> {
        let kind = Kind::new::<T>();
        let p = unsafe { self.alloc(kind) } as *mut T;
        NonNull::new(p).ok_or(AllocError::new(kind))
    }

    unsafe fn dealloc_one<T>(&mut self, ptr: NonNull<T>) {
        self.dealloc(ptr.as_ptr() as Address, Kind::new::<T>());
    }
}

unsafe impl<'a, A: Alloc + ?Sized> Alloc for &'a mut A {
    fn oom(&mut self, kind: Kind) -> ! { (**self).oom(kind) }

    unsafe fn alloc(&mut self, kind: Kind) -> Address { (**self).alloc(kind) }

    unsafe fn dealloc(&mut self, ptr: Address, kind: Kind) { (**self).dealloc(ptr, kind) }
}

/// The global heap.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultAlloc;

unsafe impl Alloc for DefaultAlloc {
    unsafe fn alloc(&mut self, kind: Kind) -> Address {
        if kind.is_zero_sized() {
            // Aligned and never dereferenced for any byte.
            ptr::without_provenance_mut(kind.align())
        } else {
            heap::alloc(kind.layout())
        }
    }

    unsafe fn dealloc(&mut self, ptr: Address, kind: Kind) {
        if !kind.is_zero_sized() && !ptr.is_null() {
            heap::dealloc(ptr, kind.layout())
        }
    }
}
