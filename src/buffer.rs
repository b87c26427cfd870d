// MIT/Apache2 License

//! Coercion of host values into raw struct buffers.
//!
//! libX11 may grow its structs between versions and only offers
//! `XAlloc*` functions to cope with that, which would not protect a buffer
//! allocated on our side. Instead, every buffer we hand to libX11 carries
//! [`STRUCT_PADDING`] spare bytes past the nominal struct size.

use crate::{
    cbox::CBox,
    value::{FieldMap, StructClass, StructValue, Value},
    Context, Error, Fields, Result,
};
use alloc::vec;
use core::{
    fmt,
    marker::PhantomData,
    mem,
    ops::{Deref, DerefMut},
    ptr,
};

/// Extra bytes allocated past the end of every struct buffer.
///
/// Defaults to 64; set `X11_STRUCT_PADDING` at build time to change it.
pub const STRUCT_PADDING: usize = match option_env!("X11_STRUCT_PADDING") {
    Some(padding) => parse_padding(padding),
    None => 64,
};

const fn parse_padding(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut n = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        if digit < b'0' || digit > b'9' {
            panic!("X11_STRUCT_PADDING must be a decimal number");
        }
        n = n * 10 + (digit - b'0') as usize;
        i += 1;
    }
    n
}

/// How a struct parameter will be used by the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Read by the callee.
    RValue,
    /// Written by the callee.
    LValue,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::RValue => "rvalue",
            Role::LValue => "lvalue",
        })
    }
}

/// A struct type that can be packed from and unpacked to named fields.
pub trait XStruct {
    /// The type tag that typed buffers of this struct carry.
    const CLASS: StructClass;
    /// The nominal size of the C struct.
    const SIZE: usize;

    /// Write every field present in `fields` into `buf`.
    ///
    /// Fields that are absent leave the buffer untouched. If `consume` is
    /// set, each applied field is removed from `fields`.
    fn pack<F: Fields + ?Sized>(
        ctx: &Context,
        buf: &mut [u8],
        fields: &mut F,
        consume: bool,
    ) -> Result<()>;

    /// Store the fields of the struct in `buf` into `fields`.
    fn unpack<F: Fields + ?Sized>(ctx: &Context, buf: &[u8], fields: &mut F) -> Result<()>;

    /// Unpack into a fresh mapping.
    fn unpack_map(ctx: &Context, buf: &[u8]) -> Result<FieldMap> {
        let mut fields = FieldMap::new();
        Self::unpack(ctx, buf, &mut fields)?;
        Ok(fields)
    }
}

/// Signature of the packer used by [`coerce_struct_ptr`].
pub type PackFn = fn(&Context, &mut [u8], &mut FieldMap, bool) -> Result<()>;

/// A raw struct buffer, valid for as long as the value it came from.
pub enum StructPtr<'a> {
    /// Storage owned by the caller's value.
    Borrowed(&'a mut [u8]),
    /// Scratch storage packed from a mapping, freed on drop.
    Scratch(ScratchBuf),
}

/// Zeroed native storage that lives for one marshalling call.
pub struct ScratchBuf(CBox<[u8]>);

impl ScratchBuf {
    fn zeroed(len: usize) -> Result<Self> {
        CBox::zeroed(len)
            .map(ScratchBuf)
            .ok_or(Error::OutOfMemory(len))
    }
}

impl Deref for ScratchBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl DerefMut for ScratchBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl fmt::Debug for ScratchBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScratchBuf").field(&self.len()).finish()
    }
}

impl StructPtr<'_> {
    /// The pointer to pass to libX11.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.deref_mut().as_mut_ptr()
    }
}

impl Deref for StructPtr<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            StructPtr::Borrowed(buf) => buf,
            StructPtr::Scratch(buf) => buf,
        }
    }
}

impl DerefMut for StructPtr<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            StructPtr::Borrowed(buf) => buf,
            StructPtr::Scratch(buf) => buf,
        }
    }
}

impl fmt::Debug for StructPtr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            StructPtr::Borrowed(_) => "Borrowed",
            StructPtr::Scratch(_) => "Scratch",
        };
        f.debug_struct("StructPtr")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

/// Coerce `value` into a buffer for the struct `S`.
///
/// Accepted for both roles: a byte string at least `S::SIZE` long, a
/// reference to one, or a typed buffer. An rvalue may also be a mapping,
/// which is packed into scratch storage. An lvalue may be undef or a
/// reference to undef, in which case zeroed storage is created in place.
pub fn struct_ptr<'a, S: XStruct>(
    ctx: &Context,
    value: &'a mut Value,
    role: Role,
) -> Result<StructPtr<'a>> {
    coerce_struct_ptr(ctx, value, role, S::CLASS, S::SIZE, |ctx, buf, fields, consume| {
        S::pack(ctx, buf, fields, consume)
    })
}

/// The untyped form of [`struct_ptr`].
pub fn coerce_struct_ptr<'a>(
    ctx: &Context,
    value: &'a mut Value,
    role: Role,
    class: StructClass,
    size: usize,
    packer: PackFn,
) -> Result<StructPtr<'a>> {
    let full = size + STRUCT_PADDING;

    match value {
        Value::Map(fields) => {
            if role == Role::LValue {
                return Err(Error::TypeCoercion {
                    from: "mapping".into(),
                    to: class.name(),
                    role,
                });
            }

            let mut scratch = ScratchBuf::zeroed(full)?;
            packer(ctx, &mut scratch, fields, false)?;
            Ok(StructPtr::Scratch(scratch))
        }
        Value::List(_) => Err(Error::TypeCoercion {
            from: "list".into(),
            to: class.name(),
            role,
        }),
        Value::Struct(sv) => {
            let base = match role {
                Role::LValue => StructClass::Struct,
                Role::RValue => class,
            };
            if sv.class != class && !sv.class.is_derived_from(base) {
                return Err(Error::TypeCoercion {
                    from: sv.class.name().into(),
                    to: class.name(),
                    role,
                });
            }

            grow(&mut sv.bytes, size, class).map(StructPtr::Borrowed)
        }
        Value::Undef => {
            if role == Role::RValue {
                return Err(Error::invalid(alloc::format!(
                    "Can't coerce undef to {} rvalue",
                    class.name()
                )));
            }

            *value = Value::Struct(StructValue::new(class, vec![0; full]));
            match value {
                Value::Struct(sv) => Ok(StructPtr::Borrowed(&mut sv.bytes)),
                _ => unreachable!(),
            }
        }
        Value::Ref(inner) => match **inner {
            Value::Undef => {
                if role == Role::RValue {
                    return Err(Error::invalid(alloc::format!(
                        "Can't coerce \\undef to {} rvalue",
                        class.name()
                    )));
                }

                **inner = Value::Bytes(vec![0; full]);
                match **inner {
                    Value::Bytes(ref mut bytes) => Ok(StructPtr::Borrowed(bytes)),
                    _ => unreachable!(),
                }
            }
            Value::Bytes(ref mut bytes) => grow(bytes, size, class).map(StructPtr::Borrowed),
            ref other => Err(not_a_buffer(other, class)),
        },
        Value::Bytes(bytes) => grow(bytes, size, class).map(StructPtr::Borrowed),
        other => Err(not_a_buffer(other, class)),
    }
}

fn not_a_buffer(value: &Value, class: StructClass) -> Error {
    Error::invalid(alloc::format!(
        "Parameters requiring {} can only be coerced from string, string ref, mapping, or undef (got {})",
        class.name(),
        value.describe()
    ))
}

/// Check a caller buffer and make sure it carries the padding.
///
/// The padding is re-established on every use, since the caller may have
/// truncated the buffer since we last saw it.
fn grow(bytes: &mut alloc::vec::Vec<u8>, size: usize, class: StructClass) -> Result<&mut [u8]> {
    if bytes.len() < size {
        return Err(Error::BufferTooSmall {
            what: class.name(),
            expected: size,
            actual: bytes.len(),
        });
    }

    let full = size + STRUCT_PADDING;
    if bytes.len() < full {
        bytes.resize(full, 0);
    }
    Ok(bytes)
}

/// Read a C struct out of the front of a byte buffer.
pub(crate) fn read_struct<T: Copy>(buf: &[u8], what: &'static str) -> Result<T> {
    check_len::<T>(buf.len(), what)?;
    // SAFETY: length checked; the struct types we use accept any bit pattern
    Ok(unsafe { ptr::read_unaligned(buf.as_ptr() as *const T) })
}

/// Writes single members of a C struct laid over a byte buffer.
///
/// A whole struct value is never stored, so the bytes between members keep
/// whatever the buffer held. Use [`put_member!`] to write through it.
pub(crate) struct StructWriter<'a, T> {
    ptr: *mut T,
    _buf: PhantomData<&'a mut [u8]>,
}

impl<'a, T> StructWriter<'a, T> {
    pub(crate) fn new(buf: &'a mut [u8], what: &'static str) -> Result<Self> {
        check_len::<T>(buf.len(), what)?;
        Ok(Self {
            ptr: buf.as_mut_ptr() as *mut T,
            _buf: PhantomData,
        })
    }

    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr
    }
}

/// Store `value` into the member at `path` of a [`StructWriter`].
macro_rules! put_member {
    ($w:expr, $($path:ident).+ = $value:expr) => {{
        let value = $value;
        // SAFETY: the writer holds a buffer covering the whole struct, and
        // no reference to the (possibly unaligned) member is created
        unsafe {
            core::ptr::addr_of_mut!((*($w).as_ptr()).$($path).+).write_unaligned(value)
        }
    }};
}

pub(crate) use put_member;

fn check_len<T>(len: usize, what: &'static str) -> Result<()> {
    let size = mem::size_of::<T>();
    if len < size {
        Err(Error::BufferTooSmall {
            what,
            expected: size,
            actual: len,
        })
    } else {
        Ok(())
    }
}

/// A zeroed, padded buffer for the struct `S`.
pub fn new_buffer<S: XStruct>() -> StructValue {
    StructValue::new(S::CLASS, vec![0; S::SIZE + STRUCT_PADDING])
}
