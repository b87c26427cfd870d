// MIT/Apache2 License

//! Process-wide state shared by every marshalling call.

use crate::{
    bridge::HandlerInstaller,
    buffer::STRUCT_PADDING,
    error::Unusable,
    registry::{Connection, DisplayHandle, Registry},
    structs::ErrorEvent,
    sync::{mtx_lock, Lazy, Mutex},
    value::{StructClass, StructValue},
    xlib_ffi::{XErrorEvent, XEvent, XID},
    Error, Result, Value,
};
use alloc::{sync::Arc, vec};
use core::{
    fmt, mem,
    sync::atomic::{AtomicBool, Ordering::SeqCst},
};

/// A host callback invoked from an error handler.
///
/// Errors and panics raised by the hook are logged and discarded.
pub type Hook = Arc<dyn Fn(Value) -> Result<()> + Send + Sync>;

/// The connection registry, the error handler state and the hooks.
///
/// The native error handlers always report to the global [`context()`];
/// separate instances are mostly useful for testing.
pub struct Context {
    registry: Registry,
    fatal_trapped: AtomicBool,
    fatal_pending: AtomicBool,
    nonfatal_installed: AtomicBool,
    fatal_installed: AtomicBool,
    nonfatal_hook: Mutex<Option<Hook>>,
    fatal_hook: Mutex<Option<Hook>>,
    installer: Mutex<Option<Arc<dyn HandlerInstaller>>>,
}

static CONTEXT: Lazy<Context> = Lazy::new(Context::new);

/// The context used by the native error handlers.
pub fn context() -> &'static Context {
    &CONTEXT
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            fatal_trapped: AtomicBool::new(false),
            fatal_pending: AtomicBool::new(false),
            nonfatal_installed: AtomicBool::new(false),
            fatal_installed: AtomicBool::new(false),
            nonfatal_hook: Mutex::new(None),
            fatal_hook: Mutex::new(None),
            installer: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether a fatal I/O error has been trapped in this context.
    pub fn fatal_trapped(&self) -> bool {
        self.fatal_trapped.load(SeqCst)
    }

    pub fn nonfatal_installed(&self) -> bool {
        self.nonfatal_installed.load(SeqCst)
    }

    pub fn fatal_installed(&self) -> bool {
        self.fatal_installed.load(SeqCst)
    }

    /// Set the hook called with an `XErrorEvent` buffer for protocol errors.
    pub fn set_nonfatal_hook(&self, hook: Option<Hook>) {
        *mtx_lock(&self.nonfatal_hook) = hook;
    }

    /// Set the hook called with the connection that suffered a fatal error.
    pub fn set_fatal_hook(&self, hook: Option<Hook>) {
        *mtx_lock(&self.fatal_hook) = hook;
    }

    /// Attach a wrapper to a handle.
    ///
    /// This never calls into libX11, so `handle` may be any address.
    pub fn attach(&self, conn: &Arc<Connection>, handle: DisplayHandle) {
        self.registry.attach(conn, handle);
    }

    /// Attach a wrapper to a connection opened by libX11.
    ///
    /// Once the fatal handler is installed, the handle is guarded against
    /// libX11 exiting the process on an I/O error.
    ///
    /// # Safety
    ///
    /// `handle` must be null or a `Display *` returned by libX11 that has
    /// not been closed, and must be detached before it is closed.
    pub unsafe fn attach_native(&self, conn: &Arc<Connection>, handle: DisplayHandle) {
        if self.registry.attach_native(conn, handle) && self.fatal_installed() {
            self.guard(handle);
        }
    }

    fn guard(&self, handle: DisplayHandle) {
        let installer = mtx_lock(&self.installer).clone();
        if let Some(installer) = installer {
            if !installer.guard_display(handle) {
                tracing::warn!(
                    "libX11 lacks XSetIOErrorExitHandler; a fatal error on {:?} will exit the process",
                    handle
                );
            }
        }
    }

    /// Resolve a handle to its wrapper.
    ///
    /// A null handle is `Undef`. A handle with no live wrapper gets a new
    /// one if `create` is set, and is returned as a plain integer otherwise.
    pub fn lookup(&self, handle: DisplayHandle, create: bool) -> Value {
        if handle.is_null() {
            return Value::Undef;
        }

        let conn = if create {
            self.registry.get_or_insert_with(handle, Connection::new)
        } else {
            self.registry.get(handle)
        };

        match conn {
            Some(conn) => Value::Connection(conn),
            None => Value::UInt(handle.addr() as u64),
        }
    }

    /// The handle behind a connection argument.
    ///
    /// With `not_null`, the result is guaranteed to be usable for a native
    /// call. Otherwise, `Undef` and raw integers are accepted as well.
    pub fn display_handle(&self, value: &Value, not_null: bool) -> Result<DisplayHandle> {
        if not_null {
            self.check_trapped()?;
        }

        match *value {
            Value::Connection(ref conn) => {
                let handle = conn.handle();
                if not_null && handle.is_null() {
                    Err(Error::ConnectionUnusable(Unusable::Closed))
                } else {
                    Ok(handle)
                }
            }
            Value::Undef if !not_null => Ok(DisplayHandle::NULL),
            Value::Int(addr) if !not_null => Ok(DisplayHandle::from_addr(addr as usize)),
            Value::UInt(addr) if !not_null => Ok(DisplayHandle::from_addr(addr as usize)),
            ref other => Err(Error::invalid(alloc::format!(
                "Invalid X11 connection; must be a connection wrapper (got {})",
                other.describe()
            ))),
        }
    }

    /// Coerce a value to a resource identifier.
    pub fn xid(&self, value: &Value) -> Result<XID> {
        self.check_trapped()?;

        let raw = match *value {
            Value::Map(ref fields) => fields.get("xid"),
            ref other => Some(other),
        };

        match raw {
            Some(Value::Int(i)) => Ok(*i as XID),
            Some(Value::UInt(u)) => Ok(*u as XID),
            _ => Err(Error::invalid(
                "Invalid XID (Window, etc); must be an unsigned int, or a mapping with an xid field",
            )),
        }
    }

    fn check_trapped(&self) -> Result<()> {
        if self.fatal_trapped() {
            Err(Error::ConnectionUnusable(Unusable::FatalTrapped))
        } else {
            Ok(())
        }
    }

    /// Run a native call, turning a fatal error it triggered into an `Err`.
    pub fn call_native<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        self.check_trapped()?;
        let out = f();
        if self.fatal_pending.swap(false, SeqCst) {
            return Err(Error::FatalProtocolError);
        }
        Ok(out)
    }

    /// Install the native error handlers through `installer`.
    ///
    /// Each handler is installed at most once per context.
    pub fn install_error_handlers_with(
        &self,
        installer: Arc<dyn HandlerInstaller>,
        nonfatal: bool,
        fatal: bool,
    ) -> Result<()> {
        *mtx_lock(&self.installer) = Some(installer.clone());

        if nonfatal && !self.nonfatal_installed() {
            installer.install_nonfatal()?;
            self.nonfatal_installed.store(true, SeqCst);
            tracing::debug!("installed non-fatal Xlib error handler");
        }

        if fatal && !self.fatal_installed() {
            installer.install_fatal()?;
            self.fatal_installed.store(true, SeqCst);
            tracing::debug!("installed fatal Xlib error handler");

            for handle in self.registry.native_handles() {
                self.guard(handle);
            }
        }

        Ok(())
    }

    /// Report a protocol error to the non-fatal hook.
    pub fn handle_nonfatal(&self, err: &XErrorEvent) {
        let hook = mtx_lock(&self.nonfatal_hook).clone();
        let hook = match hook {
            Some(hook) => hook,
            None => return,
        };

        // the host sees it as an event, so size it like one
        let mut bytes = vec![0; mem::size_of::<XEvent>() + STRUCT_PADDING];
        if let Err(e) = ErrorEvent::write(&mut bytes, err) {
            tracing::warn!("dropping Xlib error: {}", e);
            return;
        }

        let event = Value::Struct(StructValue::new(StructClass::XErrorEvent, bytes));
        run_hook(&hook, event, "non-fatal");
    }

    /// Trap a fatal I/O error on `handle`.
    ///
    /// The first trap logs and runs the fatal hook. Every trap marks the
    /// current native call as failed, see [`Context::call_native`].
    pub fn handle_fatal(&self, handle: DisplayHandle) -> Error {
        if !self.fatal_trapped.swap(true, SeqCst) {
            tracing::warn!("Xlib fatal error.  Further calls to Xlib are forbidden.");

            let hook = mtx_lock(&self.fatal_hook).clone();
            if let Some(hook) = hook {
                let conn = match self.registry.get_or_insert_with(handle, Connection::new) {
                    Some(conn) => Value::Connection(conn),
                    None => Value::Undef,
                };
                run_hook(&hook, conn, "fatal");
            }
        }

        self.fatal_pending.store(true, SeqCst);
        Error::FatalProtocolError
    }
}

fn run_hook(hook: &Hook, arg: Value, which: &str) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "std")] {
            let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| hook(arg)));
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("{} error hook failed: {}", which, e),
                Err(_) => tracing::warn!("{} error hook panicked", which),
            }
        } else {
            if let Err(e) = hook(arg) {
                tracing::warn!("{} error hook failed: {}", which, e);
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("registry", &self.registry)
            .field("fatal_trapped", &self.fatal_trapped())
            .field("nonfatal_installed", &self.nonfatal_installed())
            .field("fatal_installed", &self.fatal_installed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{buffer::read_struct, FieldMap};
    use alloc::vec::Vec;
    use core::sync::atomic::AtomicUsize;

    const NULL: DisplayHandle = DisplayHandle::NULL;

    fn addr(a: usize) -> DisplayHandle {
        DisplayHandle::from_addr(a)
    }

    #[derive(Default)]
    struct FakeInstaller {
        nonfatal: AtomicUsize,
        fatal: AtomicUsize,
        guarded: std::sync::Mutex<Vec<DisplayHandle>>,
    }

    impl HandlerInstaller for FakeInstaller {
        fn install_nonfatal(&self) -> Result<()> {
            self.nonfatal.fetch_add(1, SeqCst);
            Ok(())
        }

        fn install_fatal(&self) -> Result<()> {
            self.fatal.fetch_add(1, SeqCst);
            Ok(())
        }

        fn guard_display(&self, handle: DisplayHandle) -> bool {
            self.guarded.lock().unwrap().push(handle);
            true
        }
    }

    #[test]
    fn xid_shapes() {
        let ctx = Context::new();
        assert_eq!(ctx.xid(&Value::Int(42)).unwrap(), 42);
        assert_eq!(ctx.xid(&Value::UInt(7)).unwrap(), 7);

        let wrapped: FieldMap = alloc::vec![("xid", Value::Int(99))].into_iter().collect();
        assert_eq!(ctx.xid(&Value::Map(wrapped)).unwrap(), 99);

        let bare: FieldMap = alloc::vec![("id", Value::Int(99))].into_iter().collect();
        assert!(matches!(ctx.xid(&Value::Map(bare)), Err(Error::InvalidArgument(_))));
        assert!(matches!(ctx.xid(&Value::from("12")), Err(Error::InvalidArgument(_))));
        assert!(matches!(ctx.xid(&Value::Undef), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn lookup_reuses_live_wrappers() {
        let ctx = Context::new();
        assert_eq!(ctx.lookup(NULL, true), Value::Undef);

        let first = ctx.lookup(addr(0x10), true);
        let second = ctx.lookup(addr(0x10), true);
        assert_eq!(first, second);

        drop((first, second));
        assert_eq!(ctx.lookup(addr(0x10), false), Value::UInt(0x10));

        let third = ctx.lookup(addr(0x10), true);
        assert!(matches!(third, Value::Connection(ref c) if c.handle() == addr(0x10)));
    }

    #[test]
    fn display_handle_rules() {
        let ctx = Context::new();
        let conn = Connection::new();
        let value = Value::Connection(conn.clone());

        assert_eq!(
            ctx.display_handle(&value, true),
            Err(Error::ConnectionUnusable(Unusable::Closed))
        );
        assert_eq!(ctx.display_handle(&value, false), Ok(NULL));

        ctx.attach(&conn, addr(0x20));
        assert_eq!(ctx.display_handle(&value, true), Ok(addr(0x20)));

        assert_eq!(ctx.display_handle(&Value::Undef, false), Ok(NULL));
        assert!(matches!(
            ctx.display_handle(&Value::Undef, true),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ctx.display_handle(&Value::List(Vec::new()), false),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn installing_is_idempotent() {
        let ctx = Context::new();
        let conn = Connection::new();
        unsafe { ctx.attach_native(&conn, addr(0x30)) };
        // not guarded, it was never handed to us by libX11
        let plain = Connection::new();
        ctx.attach(&plain, addr(0x38));

        let fake = Arc::new(FakeInstaller::default());
        ctx.install_error_handlers_with(fake.clone(), true, false).unwrap();
        ctx.install_error_handlers_with(fake.clone(), true, true).unwrap();
        ctx.install_error_handlers_with(fake.clone(), true, true).unwrap();

        assert_eq!(fake.nonfatal.load(SeqCst), 1);
        assert_eq!(fake.fatal.load(SeqCst), 1);
        assert!(ctx.nonfatal_installed() && ctx.fatal_installed());

        // existing and new native connections are both guarded
        let later = Connection::new();
        unsafe { ctx.attach_native(&later, addr(0x40)) };
        ctx.attach(&Connection::new(), addr(0x48));
        assert_eq!(*fake.guarded.lock().unwrap(), alloc::vec![addr(0x30), addr(0x40)]);
    }

    #[test]
    fn unpacking_never_guards_foreign_handles() {
        use crate::{buffer::new_buffer, Event, XStruct};

        let ctx = Context::new();
        let fake = Arc::new(FakeInstaller::default());
        ctx.install_error_handlers_with(fake.clone(), false, true).unwrap();

        let mut buf = new_buffer::<Event>().bytes;
        let mut input: FieldMap = alloc::vec![
            ("type", Value::Int(crate::xlib_ffi::Expose.into())),
            ("display", Value::Int(0xdead0)),
        ]
        .into_iter()
        .collect();
        Event::pack(&ctx, &mut buf, &mut input, false).unwrap();

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        match out.get("display") {
            Some(Value::Connection(conn)) => {
                assert_eq!(conn.handle(), addr(0xdead0));
                assert!(!conn.is_native());
            }
            other => panic!("expected a connection, got {:?}", other),
        }
        assert!(ctx.lookup(addr(0xbeef0), true) != Value::Undef);
        assert!(fake.guarded.lock().unwrap().is_empty());
    }

    #[test]
    fn fatal_error_traps_once() {
        let ctx = Context::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        ctx.set_fatal_hook(Some(Arc::new(move |conn: Value| -> Result<()> {
            assert!(matches!(conn, Value::Connection(_)));
            seen.fetch_add(1, SeqCst);
            Err(Error::invalid("hook failures are swallowed"))
        })));

        let res = ctx.call_native(|| {
            ctx.handle_fatal(addr(0x50));
            ctx.handle_fatal(addr(0x50));
            5
        });
        assert_eq!(res, Err(Error::FatalProtocolError));
        assert_eq!(calls.load(SeqCst), 1);
        assert!(ctx.fatal_trapped());

        let unusable = Error::ConnectionUnusable(Unusable::FatalTrapped);
        assert_eq!(ctx.call_native(|| ()), Err(unusable.clone()));
        assert_eq!(ctx.xid(&Value::Int(1)), Err(unusable.clone()));
        assert_eq!(ctx.display_handle(&Value::Undef, true), Err(unusable));
    }

    #[test]
    fn nonfatal_hook_gets_an_event_buffer() {
        let ctx = Context::new();
        let got = Arc::new(std::sync::Mutex::new(None));
        let slot = got.clone();
        ctx.set_nonfatal_hook(Some(Arc::new(move |event: Value| -> Result<()> {
            *slot.lock().unwrap() = Some(event);
            panic!("a panicking hook must not escape");
        })));

        let mut err: XErrorEvent = unsafe { mem::zeroed() };
        err.error_code = 3;
        err.resourceid = 0x1234;
        ctx.handle_nonfatal(&err);

        let event = got.lock().unwrap().take().unwrap();
        match event {
            Value::Struct(sv) => {
                assert_eq!(sv.class, StructClass::XErrorEvent);
                assert_eq!(sv.bytes.len(), mem::size_of::<XEvent>() + STRUCT_PADDING);
                let back: XErrorEvent = read_struct(&sv.bytes, "XErrorEvent").unwrap();
                assert_eq!(back.error_code, 3);
                assert_eq!(back.resourceid, 0x1234);
            }
            other => panic!("expected an event buffer, got {:?}", other),
        }
    }
}
