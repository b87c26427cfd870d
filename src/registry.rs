// MIT/Apache2 License

//! Maps native connection handles to their wrapper objects.
//!
//! The registry only holds weak references, so a wrapper lives exactly as
//! long as the host keeps it alive. A handle is never closed by us.
//!
//! Every operation that reads or changes the map runs under one lock, so
//! concurrent lookups of the same handle agree on a single wrapper.

use crate::{
    sync::{mtx_lock, Mutex},
    xlib_ffi::XDisplay,
};
use alloc::{
    sync::{Arc, Weak},
    vec::Vec,
};
use core::{
    fmt,
    hash::BuildHasherDefault,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst},
};
use hashbrown::HashMap;
use rustc_hash::FxHasher;

/// The address of a libX11 `Display`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayHandle(usize);

impl DisplayHandle {
    /// No connection.
    pub const NULL: DisplayHandle = DisplayHandle(0);

    pub fn from_ptr(ptr: *mut XDisplay) -> Self {
        Self(ptr as usize)
    }

    pub fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    pub fn as_ptr(self) -> *mut XDisplay {
        self.0 as *mut XDisplay
    }

    pub fn addr(self) -> usize {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayHandle({:#x})", self.0)
    }
}

/// The host-side object standing for one connection.
///
/// Its handle is attached state, changed only through the registry.
pub struct Connection {
    handle: AtomicUsize,
    // the handle was registered as a live Display* returned by libX11
    native: AtomicBool,
}

impl Connection {
    /// A wrapper that is not yet attached to any handle.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handle: AtomicUsize::new(0),
            native: AtomicBool::new(false),
        })
    }

    /// The handle currently attached to this wrapper.
    pub fn handle(&self) -> DisplayHandle {
        DisplayHandle(self.handle.load(SeqCst))
    }

    /// Whether the handle was registered through
    /// [`Registry::attach_native`].
    pub fn is_native(&self) -> bool {
        self.native.load(SeqCst)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("handle", &self.handle())
            .field("native", &self.is_native())
            .finish()
    }
}

type Entries = HashMap<DisplayHandle, Weak<Connection>, BuildHasherDefault<FxHasher>>;

/// Weak cache from handle to wrapper.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<Entries>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `conn` to `handle`.
    ///
    /// Returns `false` if the wrapper already had that handle. If another
    /// live wrapper holds the handle, the new one replaces it. A wrapper
    /// moved to another handle stops being native.
    pub fn attach(&self, conn: &Arc<Connection>, handle: DisplayHandle) -> bool {
        attach_locked(&mut mtx_lock(&self.entries), conn, handle, false)
    }

    /// Attach `conn` to `handle` and mark it as a live libX11 connection.
    ///
    /// Returns `false` if the wrapper was already natively attached to
    /// that handle.
    ///
    /// # Safety
    ///
    /// `handle` must be null or a `Display *` returned by libX11 that has
    /// not been closed. Native calls may be made on it later.
    pub unsafe fn attach_native(&self, conn: &Arc<Connection>, handle: DisplayHandle) -> bool {
        attach_locked(&mut mtx_lock(&self.entries), conn, handle, !handle.is_null())
    }

    /// The live wrapper attached to `handle`, or one made by `make` and
    /// attached to it.
    ///
    /// The lookup and the insertion happen under one lock. Returns `None`
    /// only for a null handle.
    pub fn get_or_insert_with(
        &self,
        handle: DisplayHandle,
        make: impl FnOnce() -> Arc<Connection>,
    ) -> Option<Arc<Connection>> {
        if handle.is_null() {
            return None;
        }

        let mut entries = mtx_lock(&self.entries);
        if let Some(conn) = entries.get(&handle).and_then(Weak::upgrade) {
            return Some(conn);
        }

        let conn = make();
        attach_locked(&mut entries, &conn, handle, false);
        Some(conn)
    }

    /// The live wrapper attached to `handle`, if any.
    pub fn get(&self, handle: DisplayHandle) -> Option<Arc<Connection>> {
        if handle.is_null() {
            return None;
        }

        mtx_lock(&self.entries).get(&handle).and_then(Weak::upgrade)
    }

    /// Every handle whose live wrapper was attached with
    /// [`Registry::attach_native`].
    pub fn native_handles(&self) -> Vec<DisplayHandle> {
        mtx_lock(&self.entries)
            .iter()
            .filter(|(_, weak)| weak.upgrade().map_or(false, |conn| conn.is_native()))
            .map(|(handle, _)| *handle)
            .collect()
    }

    /// Drop entries whose wrapper has been collected.
    pub fn prune(&self) -> usize {
        let mut entries = mtx_lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    /// The number of entries, dead ones included.
    pub fn len(&self) -> usize {
        mtx_lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn attach_locked(
    entries: &mut Entries,
    conn: &Arc<Connection>,
    handle: DisplayHandle,
    native: bool,
) -> bool {
    let old = DisplayHandle(conn.handle.swap(handle.0, SeqCst));
    if old == handle {
        return native && !conn.native.swap(true, SeqCst);
    }
    conn.native.store(native, SeqCst);

    if !old.is_null() {
        // only drop the entry if it is ours or already dead
        let ours = entries
            .get(&old)
            .map_or(false, |weak| weak.strong_count() == 0 || weak.as_ptr() == Arc::as_ptr(conn));
        if ours {
            entries.remove(&old);
        }
    }

    if !handle.is_null() {
        let weak = Arc::downgrade(conn);
        if let Some(prev) = entries.insert(handle, weak) {
            if let Some(prev) = prev.upgrade() {
                if !Arc::ptr_eq(&prev, conn) {
                    tracing::warn!(
                        "Replacing cached connection object for Display* {:#x}!",
                        handle.0
                    );
                }
            }
        }
    }

    true
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: DisplayHandle = DisplayHandle(0x1000);
    const B: DisplayHandle = DisplayHandle(0x2000);

    #[test]
    fn attach_and_get() {
        let reg = Registry::new();
        let conn = Connection::new();

        assert!(reg.attach(&conn, A));
        assert!(!reg.attach(&conn, A));
        assert_eq!(conn.handle(), A);
        assert!(Arc::ptr_eq(&reg.get(A).unwrap(), &conn));
        assert!(reg.get(DisplayHandle::NULL).is_none());
    }

    #[test]
    fn moving_a_wrapper_removes_the_old_entry() {
        let reg = Registry::new();
        let conn = Connection::new();
        reg.attach(&conn, A);
        reg.attach(&conn, B);

        assert!(reg.get(A).is_none());
        assert!(Arc::ptr_eq(&reg.get(B).unwrap(), &conn));
        assert_eq!(reg.len(), 1);

        // detaching clears it entirely
        reg.attach(&conn, DisplayHandle::NULL);
        assert!(reg.is_empty());
        assert!(conn.handle().is_null());
    }

    #[test]
    fn last_attach_wins() {
        let reg = Registry::new();
        let first = Connection::new();
        let second = Connection::new();
        reg.attach(&first, A);
        reg.attach(&second, A);
        assert!(Arc::ptr_eq(&reg.get(A).unwrap(), &second));

        // moving the displaced wrapper must not evict the new owner
        reg.attach(&first, B);
        assert!(Arc::ptr_eq(&reg.get(A).unwrap(), &second));
        assert!(Arc::ptr_eq(&reg.get(B).unwrap(), &first));
    }

    #[test]
    fn native_flag_follows_the_handle() {
        let reg = Registry::new();
        let conn = Connection::new();

        assert!(unsafe { reg.attach_native(&conn, A) });
        assert!(!unsafe { reg.attach_native(&conn, A) });
        assert!(conn.is_native());

        // reattaching the same handle keeps it, moving drops it
        reg.attach(&conn, A);
        assert!(conn.is_native());
        assert_eq!(reg.native_handles(), alloc::vec![A]);

        reg.attach(&conn, B);
        assert!(!conn.is_native());
        assert!(reg.native_handles().is_empty());

        // plain attaches and lookups never make a wrapper native
        let other = reg.get_or_insert_with(A, Connection::new).unwrap();
        assert!(!other.is_native());
    }

    #[test]
    fn get_or_insert_reuses_live_wrappers() {
        let reg = Registry::new();
        assert!(reg.get_or_insert_with(DisplayHandle::NULL, Connection::new).is_none());

        let first = reg.get_or_insert_with(A, Connection::new).unwrap();
        let second = reg
            .get_or_insert_with(A, || panic!("a live wrapper exists"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.handle(), A);
    }

    #[test]
    fn concurrent_lookups_agree_on_one_wrapper() {
        use std::{sync::Barrier, thread, vec::Vec};

        const THREADS: usize = 8;

        for i in 1..=200 {
            let reg = Arc::new(Registry::new());
            let barrier = Arc::new(Barrier::new(THREADS));
            let handle = DisplayHandle(i * 0x1000);

            let found: Vec<Arc<Connection>> = (0..THREADS)
                .map(|_| {
                    let reg = reg.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        reg.get_or_insert_with(handle, Connection::new).unwrap()
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|t| t.join().unwrap())
                .collect();

            assert!(found.iter().all(|conn| Arc::ptr_eq(conn, &found[0])));
        }
    }

    #[test]
    fn collected_wrappers_are_not_returned() {
        let reg = Registry::new();
        let conn = Connection::new();
        reg.attach(&conn, A);
        drop(conn);

        assert!(reg.get(A).is_none());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.prune(), 1);
        assert!(reg.is_empty());
    }
}
