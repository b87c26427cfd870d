//               Copyright John Nunley, 2022.
// Distributed under the Boost Software License, Version 1.0.
//       (See accompanying file LICENSE or copy at
//         https://www.boost.org/LICENSE_1_0.txt)

mod types;
pub use types::*;

#[cfg(feature = "xlib")]
use crate::{sync::Lazy, Result};
#[cfg(feature = "xlib")]
use libc::c_void;

#[cfg(all(feature = "xlib", feature = "dl"))]
mod dynamic_link;
#[cfg(all(feature = "xlib", not(feature = "dl")))]
mod static_link;

/// FFI with `libX11`, using either static or dynamic linking.
///
/// # Safety
///
/// This trait is unsafe because it is not guaranteed that the underlying
/// library is safe.
#[cfg(feature = "xlib")]
#[allow(non_snake_case)]
pub(crate) unsafe trait X11Ffi {
    unsafe fn XSetErrorHandler(&self, handler: XErrorHandler) -> XErrorHandler;
    unsafe fn XSetIOErrorHandler(&self, handler: XIOErrorHandler) -> XIOErrorHandler;
    /// Returns `false` if the loaded library predates `XSetIOErrorExitHandler`.
    unsafe fn XSetIOErrorExitHandler(
        &self,
        display: *mut XDisplay,
        handler: XIOErrorExitHandler,
        user_data: *mut c_void,
    ) -> bool;
}

#[cfg(all(feature = "xlib", not(feature = "dl")))]
type Impl = static_link::StaticLink;
#[cfg(all(feature = "xlib", feature = "dl"))]
type Impl = dynamic_link::DynamicLink;

#[cfg(feature = "xlib")]
static XLIB: Lazy<Result<Impl>> = Lazy::new(|| {
    cfg_if::cfg_if! {
        if #[cfg(not(feature = "dl"))] {
            Ok(static_link::StaticLink)
        } else {
            dynamic_link::DynamicLink::load()
        }
    }
});

#[cfg(feature = "xlib")]
pub(crate) fn xlib() -> Result<&'static Impl> {
    XLIB.as_ref().map_err(Clone::clone)
}
