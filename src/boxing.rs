use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

use tracing::trace;

use crate::alloc::{Alloc, AllocError, Kind};
use crate::boxed::UniqueBox;

/// Builds a [`UniqueBox`] in two steps: reserve storage, then write the
/// value into it.
pub struct Boxing<A: Alloc>(pub A);

impl<A: Alloc> Boxing<A> {
    /// Allocation failure is fatal, see [`Alloc::oom`].
    pub fn make_place<T>(mut self) -> InterimBox<T, A> {
        match self.0.alloc_one::<T>() {
            Ok(p) => InterimBox { p, a: self.0 },
            Err(e) => self.0.oom(e.kind()),
        }
    }

    pub fn try_make_place<T>(mut self) -> Result<InterimBox<T, A>, AllocError> {
        let p = self.0.alloc_one::<T>()?;
        Ok(InterimBox { p, a: self.0 })
    }

    /// Reserves storage, then runs `init`. If `init` panics the storage
    /// is released while unwinding.
    pub fn emplace<T, F: FnOnce() -> T>(self, init: F) -> UniqueBox<T, A> {
        let place = self.make_place();
        place.finalize(init())
    }
}

/// Reserved, uninitialized storage for one `T`.
///
/// Dropping it unfinalized frees the storage without running any
/// destructor.
pub struct InterimBox<T, A: Alloc> {
    p: NonNull<T>,
    a: A,
}

impl<T, A: Alloc> InterimBox<T, A> {
    pub fn pointer(&mut self) -> *mut T { self.p.as_ptr() }

    pub fn finalize(self, value: T) -> UniqueBox<T, A> {
        let this = ManuallyDrop::new(self);
        let p = this.p;
        let a = unsafe { ptr::read(&this.a) };
        unsafe {
            p.as_ptr().write(value);
            trace!(ptr = ?p.as_ptr(), "finalized place");
            UniqueBox::from_raw_alloc(p, a)
        }
    }
}

impl<T, A: Alloc> Drop for InterimBox<T, A> {
    fn drop(&mut self) {
        trace!(ptr = ?self.p.as_ptr(), "abandoning unfinalized place");
        unsafe { self.a.dealloc(self.p.as_ptr() as *mut u8, Kind::new::<T>()) }
    }
}
