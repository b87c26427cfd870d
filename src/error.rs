// MIT/Apache2 License

//! The error type shared by every coercion and marshaller.

use crate::buffer::Role;
use alloc::string::String;
use core::fmt;

/// A specialized `Result` type for this crate.
pub type Result<T = ()> = core::result::Result<T, Error>;

/// Everything that can go wrong while moving a value across the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input value has the wrong shape for the coercion.
    InvalidArgument(String),
    /// A typed buffer was supplied where an unrelated struct type is needed.
    TypeCoercion {
        from: String,
        to: &'static str,
        role: Role,
    },
    /// A buffer or fixed-length byte field has the wrong length.
    BufferTooSmall {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The field storage refused to accept a value.
    StorageWriteFailure { field: String },
    /// libX11 reported that the connection to the server is gone.
    FatalProtocolError,
    /// No further native calls may be made through this connection.
    ConnectionUnusable(Unusable),
    /// libX11 could not be loaded or is missing a required symbol.
    LibraryUnavailable(String),
    /// A scratch allocation failed.
    OutOfMemory(usize),
}

/// Why a connection can no longer be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unusable {
    /// A fatal I/O error was trapped earlier in this process.
    FatalTrapped,
    /// The wrapper's handle was cleared.
    Closed,
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn store_failed(field: &str) -> Self {
        Error::StorageWriteFailure {
            field: field.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => f.write_str(msg),
            Error::TypeCoercion { from, to, role } => {
                write!(f, "Can't coerce {} to {} {}", from, to, role)
            }
            Error::BufferTooSmall {
                what,
                expected,
                actual,
            } => write!(
                f,
                "{} needs {} bytes (got {})",
                what, expected, actual
            ),
            Error::StorageWriteFailure { field } => write!(
                f,
                "Can't store field \"{}\" in supplied mapping",
                field
            ),
            Error::FatalProtocolError => f.write_str("Fatal X11 I/O Error"),
            Error::ConnectionUnusable(Unusable::FatalTrapped) => {
                f.write_str("Cannot call further Xlib functions after fatal Xlib error")
            }
            Error::ConnectionUnusable(Unusable::Closed) => {
                f.write_str("X11 connection was closed")
            }
            Error::LibraryUnavailable(msg) => write!(f, "libX11 is unavailable: {}", msg),
            Error::OutOfMemory(len) => write!(f, "failed to allocate {} bytes", len),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
