// MIT/Apache2 License

//! Moves values between a dynamically-typed host and `libX11`.
//!
//! A binding that exposes `libX11` to a dynamic language spends most of its
//! effort on the boundary: turning loosely-typed host values into the exact
//! C structs that Xlib calls expect, and turning structs and events back
//! into something the host can inspect. This crate implements that
//! boundary on its own, independent of any particular host runtime.
//!
//! Host values are modeled by [`Value`], and field mappings by any type
//! implementing [`Fields`]. On top of that, the crate provides:
//!
//! - Coercion of host values into padded struct buffers, see
//!   [`struct_ptr`].
//! - Marshallers for the [`Event`] tagged union and for the flat structs in
//!   [`structs`], all implementing [`XStruct`].
//! - A weak [`Registry`] mapping `Display` handles to their wrapper objects,
//!   so each connection is represented by at most one live wrapper.
//! - Error handlers that turn libX11's fatal I/O error into an ordinary
//!   [`Error`] instead of a process exit, see [`install_error_handlers`].
//!
//! All process-wide state is held by a [`Context`].
//!
//! ## Features
//!
//! - `std` (enabled by default) - Implements `std::error::Error` and
//!   catches panics raised by error hooks.
//! - `real_mutex` (enabled by default) - This feature imports `std` so
//!   that all synchronous data can be locked behind standard library
//!   mutex types. With this feature disabled, the standard library is
//!   not used, but spinlocks are used to secure data instead.
//! - `xlib` (enabled by default) - Enables installing the error handlers
//!   into `libX11`.
//! - `dl` (enabled by default) - Loads `libX11` at runtime instead of
//!   linking to it. This also imports the standard library.
//! - `pl` - Uses `parking_lot` mutexes instead of `std` mutexes throughout
//!   the program. Implies `real_mutex`.
//!
//! The padding added to every struct buffer defaults to 64 bytes and can be
//! changed by setting `X11_STRUCT_PADDING` at build time.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[path = "alloc.rs"]
pub(crate) mod cbox;
pub(crate) mod sync;

mod bridge;
mod buffer;
mod context;
mod error;
mod event;
mod marshal;
mod registry;
mod value;

pub mod structs;
pub mod xlib_ffi;

pub use bridge::HandlerInstaller;
#[cfg(feature = "xlib")]
pub use bridge::{install_error_handlers, XlibInstaller};
pub use buffer::{
    coerce_struct_ptr, new_buffer, struct_ptr, PackFn, Role, ScratchBuf, StructPtr, XStruct,
    STRUCT_PADDING,
};
pub use context::{context, Context, Hook};
pub use error::{Error, Result, Unusable};
pub use event::*;
pub use registry::{Connection, DisplayHandle, Registry};
pub use value::{FieldMap, Fields, StructClass, StructValue, Value};
