//               Copyright John Nunley, 2022.
// Distributed under the Boost Software License, Version 1.0.
//       (See accompanying file LICENSE or copy at
//         https://www.boost.org/LICENSE_1_0.txt)

use super::{X11Ffi, XDisplay, XErrorHandler, XIOErrorExitHandler, XIOErrorHandler};
use libc::c_void;

pub(crate) struct StaticLink;

unsafe impl X11Ffi for StaticLink {
    unsafe fn XSetErrorHandler(&self, handler: XErrorHandler) -> XErrorHandler {
        XSetErrorHandler(handler)
    }

    unsafe fn XSetIOErrorHandler(&self, handler: XIOErrorHandler) -> XIOErrorHandler {
        XSetIOErrorHandler(handler)
    }

    unsafe fn XSetIOErrorExitHandler(
        &self,
        display: *mut XDisplay,
        handler: XIOErrorExitHandler,
        user_data: *mut c_void,
    ) -> bool {
        XSetIOErrorExitHandler(display, handler, user_data);
        true
    }
}

#[link(name = "X11")]
extern "C" {
    fn XSetErrorHandler(handler: XErrorHandler) -> XErrorHandler;
    fn XSetIOErrorHandler(handler: XIOErrorHandler) -> XIOErrorHandler;
    // libX11 1.7 and later
    fn XSetIOErrorExitHandler(
        display: *mut XDisplay,
        handler: XIOErrorExitHandler,
        user_data: *mut c_void,
    );
}
