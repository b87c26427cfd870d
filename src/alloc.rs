//               Copyright John Nunley, 2022.
// Distributed under the Boost Software License, Version 1.0.
//       (See accompanying file LICENSE or copy at
//         https://www.boost.org/LICENSE_1_0.txt)

//! Provides a simple wrapper over C allocations.

use core::{
    ops::{Deref, DerefMut},
    ptr::{slice_from_raw_parts_mut, NonNull},
};

/// An allocation, made using the `libc` allocator and released with `free`.
pub(crate) struct CBox<T: ?Sized> {
    ptr: NonNull<T>,
}

impl<T: ?Sized> CBox<T> {
    /// Creates a new `CBox` from a pointer.
    ///
    /// # Safety
    ///
    /// The pointer must be valid, not null and
    /// made from the `libc` allocator.
    pub(crate) unsafe fn new(ptr: *mut T) -> Self {
        CBox {
            ptr: NonNull::new_unchecked(ptr),
        }
    }

    /// Returns the pointer.
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the inner data as a reference.
    pub(crate) fn as_ref(&self) -> &T {
        unsafe { self.ptr.as_ref() }
    }

    /// Returns the inner data as a mutable reference.
    pub(crate) fn as_mut(&mut self) -> &mut T {
        unsafe { self.ptr.as_mut() }
    }
}

impl CBox<[u8]> {
    /// Allocate `len` zeroed bytes with `calloc`.
    ///
    /// Returns `None` if the allocation fails.
    pub(crate) fn zeroed(len: usize) -> Option<Self> {
        // calloc(0) may hand back NULL, so never ask for nothing
        let raw = unsafe { libc::calloc(len.max(1), 1) } as *mut u8;

        if raw.is_null() {
            None
        } else {
            Some(unsafe { CBox::new(slice_from_raw_parts_mut(raw, len)) })
        }
    }
}

impl<T: ?Sized> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.as_ref()
    }
}

impl<T: ?Sized> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.as_mut()
    }
}

impl<T: ?Sized> Drop for CBox<T> {
    fn drop(&mut self) {
        unsafe {
            libc::free(self.as_ptr() as *mut libc::c_void);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CBox;

    #[test]
    fn zeroed_is_zero_and_writable() {
        let mut buf = CBox::zeroed(96).unwrap();
        assert_eq!(buf.len(), 96);
        assert!(buf.iter().all(|&b| b == 0));

        buf[95] = 7;
        assert_eq!(buf.as_ref()[95], 7);
    }
}
