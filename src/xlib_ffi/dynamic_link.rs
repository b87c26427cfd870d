//               Copyright John Nunley, 2022.
// Distributed under the Boost Software License, Version 1.0.
//       (See accompanying file LICENSE or copy at
//         https://www.boost.org/LICENSE_1_0.txt)

use super::{X11Ffi, XDisplay, XErrorHandler, XIOErrorExitHandler, XIOErrorHandler};
use crate::{Error, Result};
use alloc::format;
use libc::c_void;
use libloading::Library;

pub(crate) struct DynamicLink {
    _xlib: Library,
    funcs: Funcs,
}

impl DynamicLink {
    pub(crate) fn load() -> Result<Self> {
        let xlib = unsafe { Library::new("libX11.so.6") }
            .map_err(|err| Error::LibraryUnavailable(format!("Unable to open libX11: {}", err)))?;

        let funcs = unsafe { Funcs::load(&xlib)? };

        tracing::debug!(
            exit_handler = funcs.XSetIOErrorExitHandler.is_some(),
            "loaded libX11 dynamically"
        );

        Ok(Self { _xlib: xlib, funcs })
    }
}

unsafe impl X11Ffi for DynamicLink {
    unsafe fn XSetErrorHandler(&self, handler: XErrorHandler) -> XErrorHandler {
        (self.funcs.XSetErrorHandler)(handler)
    }

    unsafe fn XSetIOErrorHandler(&self, handler: XIOErrorHandler) -> XIOErrorHandler {
        (self.funcs.XSetIOErrorHandler)(handler)
    }

    unsafe fn XSetIOErrorExitHandler(
        &self,
        display: *mut XDisplay,
        handler: XIOErrorExitHandler,
        user_data: *mut c_void,
    ) -> bool {
        match self.funcs.XSetIOErrorExitHandler {
            Some(set) => {
                set(display, handler, user_data);
                true
            }
            None => false,
        }
    }
}

#[allow(non_snake_case)]
struct Funcs {
    XSetErrorHandler: SetErrorHandler,
    XSetIOErrorHandler: SetIOErrorHandler,
    XSetIOErrorExitHandler: Option<SetExitHandler>,
}

type SetErrorHandler = unsafe extern "C" fn(XErrorHandler) -> XErrorHandler;
type SetIOErrorHandler = unsafe extern "C" fn(XIOErrorHandler) -> XIOErrorHandler;
type SetExitHandler = unsafe extern "C" fn(*mut XDisplay, XIOErrorExitHandler, *mut c_void);

impl Funcs {
    unsafe fn load(xlib: &Library) -> Result<Self> {
        Ok(Self {
            XSetErrorHandler: {
                let symbol = concat!("XSetErrorHandler\0").as_bytes();
                *(xlib.get::<SetErrorHandler>(symbol).map_err(|_| {
                    Error::LibraryUnavailable(
                        concat!("Could not find symbol: ", stringify!(XSetErrorHandler)).into(),
                    )
                })?)
            },
            XSetIOErrorHandler: {
                let symbol = concat!("XSetIOErrorHandler\0").as_bytes();
                *(xlib.get::<SetIOErrorHandler>(symbol).map_err(|_| {
                    Error::LibraryUnavailable(
                        concat!("Could not find symbol: ", stringify!(XSetIOErrorHandler)).into(),
                    )
                })?)
            },
            // only present since libX11 1.7
            XSetIOErrorExitHandler: {
                let symbol = concat!("XSetIOErrorExitHandler\0").as_bytes();
                xlib.get::<SetExitHandler>(symbol).ok().map(|sym| *sym)
            },
        })
    }
}
