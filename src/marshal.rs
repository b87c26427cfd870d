// MIT/Apache2 License

//! Field-level helpers shared by the struct and event marshallers.

use crate::{
    registry::DisplayHandle,
    value::Numeric,
    xlib_ffi::{Visual, XDisplay, XID},
    Context, Error, Fields, Result, Value,
};

/// Applies fields from a mapping to the members of a struct.
///
/// A field that is absent leaves its member untouched.
pub(crate) struct Packer<'a, F: Fields + ?Sized> {
    ctx: &'a Context,
    fields: &'a mut F,
    consume: bool,
}

impl<'a, F: Fields + ?Sized> Packer<'a, F> {
    pub(crate) fn new(ctx: &'a Context, fields: &'a mut F, consume: bool) -> Self {
        Self {
            ctx,
            fields,
            consume,
        }
    }

    fn apply<T>(
        &mut self,
        key: &'static str,
        slot: &mut T,
        convert: impl FnOnce(&Context, &Value) -> Result<T>,
    ) -> Result<bool> {
        let ctx = self.ctx;
        let value = match self.fields.fetch(key) {
            Some(value) => value,
            None => return Ok(false),
        };

        *slot = convert(ctx, value)?;
        if self.consume {
            self.fields.delete(key);
        }
        Ok(true)
    }

    /// A plain integer member.
    pub(crate) fn num<T: Numeric>(&mut self, key: &'static str, slot: &mut T) -> Result<bool> {
        self.apply(key, slot, |_, value| T::from_value(value))
    }

    /// A resource identifier member.
    pub(crate) fn xid(&mut self, key: &'static str, slot: &mut XID) -> Result<bool> {
        self.apply(key, slot, |ctx, value| ctx.xid(value))
    }

    /// A fixed-length byte array member.
    pub(crate) fn bytes<const N: usize>(
        &mut self,
        key: &'static str,
        slot: &mut [u8; N],
    ) -> Result<bool> {
        self.apply(key, slot, |_, value| fixed_bytes(key, value))
    }

    /// A `Display *` member.
    pub(crate) fn display(&mut self, key: &'static str, slot: &mut *mut XDisplay) -> Result<bool> {
        self.apply(key, slot, |ctx, value| {
            ctx.display_handle(value, false).map(|handle| handle.as_ptr())
        })
    }

    /// A `Visual *` member.
    pub(crate) fn visual(&mut self, key: &'static str, slot: &mut *mut Visual) -> Result<bool> {
        self.apply(key, slot, |_, value| match *value {
            Value::Visual(ptr) => Ok(ptr as *mut Visual),
            Value::Undef => Ok(core::ptr::null_mut()),
            ref other => Err(Error::TypeCoercion {
                from: other.describe(),
                to: "Visual",
                role: crate::buffer::Role::RValue,
            }),
        })
    }
}

fn fixed_bytes<const N: usize>(key: &'static str, value: &Value) -> Result<[u8; N]> {
    let bytes = value.as_bytes().ok_or_else(|| {
        Error::invalid(alloc::format!(
            "Expected a byte string for {}, got {}",
            key,
            value.describe()
        ))
    })?;

    if bytes.len() != N {
        return Err(Error::BufferTooSmall {
            what: key,
            expected: N,
            actual: bytes.len(),
        });
    }

    let mut out = [0; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Stores the members of a struct as fields of a mapping.
pub(crate) struct Unpacker<'a, F: Fields + ?Sized> {
    ctx: &'a Context,
    fields: &'a mut F,
}

impl<'a, F: Fields + ?Sized> Unpacker<'a, F> {
    pub(crate) fn new(ctx: &'a Context, fields: &'a mut F) -> Self {
        Self { ctx, fields }
    }

    fn put(&mut self, key: &'static str, value: Value) -> Result<()> {
        self.fields
            .store(key, value)
            .map_err(|_| Error::store_failed(key))
    }

    pub(crate) fn num<T: Numeric>(&mut self, key: &'static str, value: T) -> Result<()> {
        self.put(key, value.into_value())
    }

    pub(crate) fn xid(&mut self, key: &'static str, value: XID) -> Result<()> {
        self.num(key, value)
    }

    pub(crate) fn bytes<const N: usize>(&mut self, key: &'static str, value: [u8; N]) -> Result<()> {
        self.put(key, Value::Bytes(value[..].into()))
    }

    /// Resolves the handle to its connection wrapper, creating one if needed.
    pub(crate) fn display(&mut self, key: &'static str, value: *mut XDisplay) -> Result<()> {
        let conn = self.ctx.lookup(DisplayHandle::from_ptr(value), true);
        self.put(key, conn)
    }

    pub(crate) fn visual(&mut self, key: &'static str, value: *mut Visual) -> Result<()> {
        let value = if value.is_null() {
            Value::Undef
        } else {
            Value::Visual(value as usize)
        };
        self.put(key, value)
    }
}
