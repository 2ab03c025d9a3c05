use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use tracing::trace;

use crate::alloc::{Alloc, AllocError, DefaultAlloc};
use crate::boxing::Boxing;
use crate::error::OwnerError;

/// Exclusive owner of at most one value of `T` allocated from `A`.
///
/// A `UniqueBox` is either *holding* (it owns one allocation) or *empty*.
/// A holding box releases its allocation exactly once: on drop, on
/// [`reset`](UniqueBox::reset), or by handing it to another owner with
/// [`transfer_to`](UniqueBox::transfer_to). The allocation is always
/// returned to the allocator instance that produced it.
///
/// Dereferencing an empty box with `*` panics with
/// [`OwnerError::InvalidAccess`]; use [`get`](UniqueBox::get) or
/// [`is_holding`](UniqueBox::is_holding) when emptiness is possible.
///
/// `UniqueBox` is neither `Send` nor `Sync`.
pub struct UniqueBox<T, A: Alloc = DefaultAlloc> {
    value: Option<NonNull<T>>,
    alloc: A,
    _owns: PhantomData<T>,
}

impl<T, A: Alloc + Default> UniqueBox<T, A> {
    pub fn new(value: T) -> Self {
        Self::new_in(value, A::default())
    }

    pub fn empty() -> Self {
        Self::empty_in(A::default())
    }

    /// Moves the allocation into a new owner, leaving `self` empty with a
    /// fresh allocator.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }
}

impl<T, A: Alloc> UniqueBox<T, A> {
    /// Allocation failure is fatal, see [`Alloc::oom`].
    pub fn new_in(value: T, alloc: A) -> Self {
        Boxing(alloc).make_place().finalize(value)
    }

    pub fn try_new_in(value: T, alloc: A) -> Result<Self, AllocError> {
        Ok(Boxing(alloc).try_make_place()?.finalize(value))
    }

    pub fn empty_in(alloc: A) -> Self {
        UniqueBox { value: None, alloc, _owns: PhantomData }
    }

    /// Takes ownership of `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must hold an initialized `T` in storage obtained from
    /// `alloc.alloc_one::<T>()`, and nothing else may own it.
    pub unsafe fn from_raw_alloc(raw: NonNull<T>, alloc: A) -> Self {
        UniqueBox { value: Some(raw), alloc, _owns: PhantomData }
    }

    /// Gives up ownership without releasing anything.
    pub fn into_raw_alloc(self) -> (Option<NonNull<T>>, A) {
        let mut this = ManuallyDrop::new(self);
        let value = this.value.take();
        let alloc = unsafe { ptr::read(&this.alloc) };
        (value, alloc)
    }

    /// Moves the value out and frees its storage.
    pub fn into_inner(self) -> Option<T> {
        let (value, mut alloc) = self.into_raw_alloc();
        value.map(|p| unsafe {
            let v = ptr::read(p.as_ptr());
            alloc.dealloc_one(p);
            v
        })
    }

    pub fn is_holding(&self) -> bool { self.value.is_some() }

    pub fn is_empty(&self) -> bool { self.value.is_none() }

    pub fn get(&self) -> Result<&T, OwnerError> {
        match self.value {
            Some(p) => Ok(unsafe { &*p.as_ptr() }),
            None => Err(OwnerError::InvalidAccess),
        }
    }

    pub fn get_mut(&mut self) -> Result<&mut T, OwnerError> {
        match self.value {
            Some(p) => Ok(unsafe { &mut *p.as_ptr() }),
            None => Err(OwnerError::InvalidAccess),
        }
    }

    /// Overwrites the owned value in place. The storage is reused.
    pub fn assign(&mut self, value: T) -> Result<(), OwnerError> {
        *self.get_mut()? = value;
        Ok(())
    }

    /// Address of this owner itself, not of the value it manages.
    pub fn address_of(&self) -> *const Self {
        self as *const Self
    }

    /// Address of the managed allocation, or null when empty.
    pub fn raw_address(&self) -> *const T {
        match self.value {
            Some(p) => p.as_ptr() as *const T,
            None => ptr::null(),
        }
    }

    pub fn allocator(&self) -> &A { &self.alloc }

    /// Hands the allocation, together with the allocator that owns it, to
    /// `other`. Whatever `other` held is released first. `self` ends up
    /// empty and keeps `other`'s previous allocator.
    ///
    /// Does nothing when `self` is empty.
    pub fn transfer_to(&mut self, other: &mut Self) {
        if self.is_empty() {
            return;
        }
        // `self` keeps the allocation until `other` has been cleared, so a
        // panicking destructor in `other` cannot orphan it.
        other.reset();
        let ptr = match self.value.take() {
            Some(ptr) => ptr,
            None => return,
        };
        trace!(from = ?self.address_of(), to = ?other.address_of(), ptr = ?ptr.as_ptr(),
               "transferring ownership");
        mem::swap(&mut self.alloc, &mut other.alloc);
        other.value = Some(ptr);
    }

    /// Drops the value and releases its storage, leaving `self` empty.
    pub fn reset(&mut self) {
        if let Some(ptr) = self.value.take() {
            trace!(owner = ?self.address_of(), ptr = ?ptr.as_ptr(), "releasing owned value");
            let _release = Release { ptr, alloc: &mut self.alloc };
            unsafe { ptr::drop_in_place(ptr.as_ptr()) }
        }
    }
}

// Frees the storage when dropped, also while unwinding out of `T::drop`.
struct Release<'a, T, A: Alloc> {
    ptr: NonNull<T>,
    alloc: &'a mut A,
}

impl<'a, T, A: Alloc> Drop for Release<'a, T, A> {
    fn drop(&mut self) {
        unsafe { self.alloc.dealloc_one(self.ptr) }
    }
}

impl<T, A: Alloc + Default> Default for UniqueBox<T, A> {
    fn default() -> Self { Self::empty() }
}

impl<T, A: Alloc> Deref for UniqueBox<T, A> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.get() {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T, A: Alloc> DerefMut for UniqueBox<T, A> {
    fn deref_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T, A: Alloc> Drop for UniqueBox<T, A> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: fmt::Display, A: Alloc> fmt::Display for UniqueBox<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get() {
            Ok(v) => fmt::Display::fmt(v, f),
            Err(_) => f.write_str("<empty>"),
        }
    }
}

impl<T: fmt::Debug, A: Alloc> fmt::Debug for UniqueBox<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get() {
            Ok(v) => fmt::Debug::fmt(v, f),
            Err(_) => f.write_str("<empty>"),
        }
    }
}

impl<T, A: Alloc> fmt::Pointer for UniqueBox<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Pointer::fmt(&self.raw_address(), f)
    }
}
