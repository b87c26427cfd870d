// MIT/Apache2 License

use crate::{
    buffer::{put_member, read_struct, StructWriter, XStruct},
    marshal::{Packer, Unpacker},
    value::StructClass,
    xlib_ffi::XErrorEvent,
    Context, Fields, Result,
};
use core::mem;

/// `XErrorEvent`, the record libX11 hands to the non-fatal error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEvent;

impl ErrorEvent {
    /// Copy the members of `err` into `buf`, leaving the bytes between them
    /// untouched.
    pub(crate) fn write(buf: &mut [u8], err: &XErrorEvent) -> Result<()> {
        let w = StructWriter::<XErrorEvent>::new(buf, "XErrorEvent")?;
        put_member!(w, type_ = err.type_);
        put_member!(w, display = err.display);
        put_member!(w, resourceid = err.resourceid);
        put_member!(w, serial = err.serial);
        put_member!(w, error_code = err.error_code);
        put_member!(w, request_code = err.request_code);
        put_member!(w, minor_code = err.minor_code);
        Ok(())
    }
}

impl XStruct for ErrorEvent {
    const CLASS: StructClass = StructClass::XErrorEvent;
    const SIZE: usize = mem::size_of::<XErrorEvent>();

    fn pack<F: Fields + ?Sized>(
        ctx: &Context,
        buf: &mut [u8],
        fields: &mut F,
        consume: bool,
    ) -> Result<()> {
        let mut s: XErrorEvent = read_struct(buf, "XErrorEvent")?;
        let mut p = Packer::new(ctx, fields, consume);

        p.num("type", &mut s.type_)?;
        p.display("display", &mut s.display)?;
        p.xid("resourceid", &mut s.resourceid)?;
        p.num("serial", &mut s.serial)?;
        p.num("error_code", &mut s.error_code)?;
        p.num("request_code", &mut s.request_code)?;
        p.num("minor_code", &mut s.minor_code)?;

        Self::write(buf, &s)
    }

    fn unpack<F: Fields + ?Sized>(ctx: &Context, buf: &[u8], fields: &mut F) -> Result<()> {
        let s: XErrorEvent = read_struct(buf, "XErrorEvent")?;
        let mut u = Unpacker::new(ctx, fields);

        u.num("type", s.type_)?;
        u.display("display", s.display)?;
        u.xid("resourceid", s.resourceid)?;
        u.num("serial", s.serial)?;
        u.num("error_code", s.error_code)?;
        u.num("request_code", s.request_code)?;
        u.num("minor_code", s.minor_code)
    }
}
