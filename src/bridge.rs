// MIT/Apache2 License

//! Native error handler trampolines.
//!
//! libX11 treats an I/O error as the end of the process: after the I/O
//! error handler returns it calls the per-display exit handler, which by
//! default calls `exit`. We install an exit handler that returns instead,
//! so libX11 unwinds its own frames and the native call comes back to us.
//! [`Context::call_native`](crate::Context::call_native) then reports the
//! failure. Whatever libX11 was doing at that point is left undefined.

use crate::{registry::DisplayHandle, Result};

/// Installs the native handlers.
///
/// Abstracted so the installation bookkeeping can run without libX11.
pub trait HandlerInstaller: Send + Sync {
    /// Install the handler for protocol errors.
    fn install_nonfatal(&self) -> Result<()>;
    /// Install the handler for I/O errors.
    fn install_fatal(&self) -> Result<()>;
    /// Stop libX11 from exiting after an I/O error on `handle`.
    ///
    /// Only called with handles registered through
    /// [`Context::attach_native`](crate::Context::attach_native).
    ///
    /// Returns `false` if that is not possible.
    fn guard_display(&self, handle: DisplayHandle) -> bool;
}

#[cfg(feature = "xlib")]
pub use native::{install_error_handlers, XlibInstaller};

#[cfg(feature = "xlib")]
mod native {
    use super::HandlerInstaller;
    use crate::{
        context::context,
        registry::DisplayHandle,
        xlib_ffi::{xlib, X11Ffi, XDisplay, XErrorEvent},
        Result,
    };
    use alloc::sync::Arc;
    use core::ptr;
    use libc::{c_int, c_void};

    /// Installs the trampolines into the loaded libX11.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct XlibInstaller;

    impl HandlerInstaller for XlibInstaller {
        fn install_nonfatal(&self) -> Result<()> {
            let xlib = xlib()?;
            unsafe { xlib.XSetErrorHandler(Some(error_handler)) };
            Ok(())
        }

        fn install_fatal(&self) -> Result<()> {
            let xlib = xlib()?;
            unsafe { xlib.XSetIOErrorHandler(Some(io_error_handler)) };
            Ok(())
        }

        fn guard_display(&self, handle: DisplayHandle) -> bool {
            match xlib() {
                Ok(xlib) => unsafe {
                    xlib.XSetIOErrorExitHandler(handle.as_ptr(), Some(exit_handler), ptr::null_mut())
                },
                Err(_) => false,
            }
        }
    }

    /// Install the libX11 error handlers that report to the global context.
    pub fn install_error_handlers(nonfatal: bool, fatal: bool) -> Result<()> {
        context().install_error_handlers_with(Arc::new(XlibInstaller), nonfatal, fatal)
    }

    unsafe extern "C" fn error_handler(_dpy: *mut XDisplay, err: *mut XErrorEvent) -> c_int {
        if let Some(err) = err.as_ref() {
            no_unwind(|| context().handle_nonfatal(err));
        }
        0
    }

    unsafe extern "C" fn io_error_handler(dpy: *mut XDisplay) -> c_int {
        no_unwind(|| {
            context().handle_fatal(DisplayHandle::from_ptr(dpy));
        });
        0
    }

    unsafe extern "C" fn exit_handler(dpy: *mut XDisplay, _user_data: *mut c_void) {
        tracing::debug!("suppressed libX11 exit for display {:p}", dpy);
    }

    /// Never let a panic reach a C frame.
    fn no_unwind(f: impl FnOnce()) {
        cfg_if::cfg_if! {
            if #[cfg(feature = "std")] {
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).is_err() {
                    tracing::error!("panic inside an Xlib error handler");
                }
            } else {
                f()
            }
        }
    }
}
