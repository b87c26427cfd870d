// MIT/Apache2 License

//! Current synchronization primitives for this crate.

cfg_if::cfg_if! {
    if #[cfg(not(feature = "real_mutex"))] {
        pub(crate) use spin::{Lazy, Mutex, MutexGuard};

        pub(crate) fn mtx_lock<T>(mtx: &Mutex<T>) -> MutexGuard<'_, T> {
            mtx.lock()
        }
    } else if #[cfg(feature = "pl")] {
        pub(crate) use parking_lot::{Mutex, MutexGuard};
        pub(crate) use once_cell::sync::Lazy;

        pub(crate) fn mtx_lock<T>(mtx: &Mutex<T>) -> MutexGuard<'_, T> {
            mtx.lock()
        }
    } else {
        pub(crate) use std::sync::{Mutex, MutexGuard};
        pub(crate) use once_cell::sync::Lazy;

        /// Lock a mutex, ignoring poison.
        ///
        /// Every critical section in this crate leaves its data consistent
        /// before anything that may panic runs, so a poisoned lock still
        /// guards valid state.
        pub(crate) fn mtx_lock<T>(mtx: &Mutex<T>) -> MutexGuard<'_, T> {
            mtx.lock().unwrap_or_else(|poison| poison.into_inner())
        }
    }
}
