// MIT/Apache2 License

//! `XSizeHints`, whose members are only meaningful when their bit is set in
//! `flags`.

use crate::{
    buffer::{put_member, read_struct, StructWriter, XStruct},
    marshal::{Packer, Unpacker},
    value::StructClass,
    xlib_ffi::{self as ffi, XSizeHints},
    Context, Fields, Result,
};
use core::mem;
use libc::{c_int, c_long};

/// Marshaller for `XSizeHints`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeHints;

/// Every member governed by a flag bit, with that bit.
fn gated(s: &mut XSizeHints) -> [(&'static str, c_long, &mut c_int); 17] {
    [
        ("x", ffi::PPosition, &mut s.x),
        ("y", ffi::PPosition, &mut s.y),
        ("width", ffi::PSize, &mut s.width),
        ("height", ffi::PSize, &mut s.height),
        ("min_width", ffi::PMinSize, &mut s.min_width),
        ("min_height", ffi::PMinSize, &mut s.min_height),
        ("max_width", ffi::PMaxSize, &mut s.max_width),
        ("max_height", ffi::PMaxSize, &mut s.max_height),
        ("width_inc", ffi::PResizeInc, &mut s.width_inc),
        ("height_inc", ffi::PResizeInc, &mut s.height_inc),
        ("min_aspect_x", ffi::PAspect, &mut s.min_aspect.x),
        ("min_aspect_y", ffi::PAspect, &mut s.min_aspect.y),
        ("max_aspect_x", ffi::PAspect, &mut s.max_aspect.x),
        ("max_aspect_y", ffi::PAspect, &mut s.max_aspect.y),
        ("base_width", ffi::PBaseSize, &mut s.base_width),
        ("base_height", ffi::PBaseSize, &mut s.base_height),
        ("win_gravity", ffi::PWinGravity, &mut s.win_gravity),
    ]
}

impl XStruct for SizeHints {
    const CLASS: StructClass = StructClass::XSizeHints;
    const SIZE: usize = mem::size_of::<XSizeHints>();

    fn pack<F: Fields + ?Sized>(
        ctx: &Context,
        buf: &mut [u8],
        fields: &mut F,
        consume: bool,
    ) -> Result<()> {
        let mut s: XSizeHints = read_struct(buf, "XSizeHints")?;
        let mut p = Packer::new(ctx, fields, consume);

        // an explicit flags word first, so the members below add to it
        p.num("flags", &mut s.flags)?;

        let mut flags = s.flags;
        for (key, bit, slot) in gated(&mut s) {
            if p.num(key, slot)? {
                flags |= bit;
            }
        }
        s.flags = flags;

        let w = StructWriter::<XSizeHints>::new(buf, "XSizeHints")?;
        put_member!(w, flags = s.flags);
        put_member!(w, x = s.x);
        put_member!(w, y = s.y);
        put_member!(w, width = s.width);
        put_member!(w, height = s.height);
        put_member!(w, min_width = s.min_width);
        put_member!(w, min_height = s.min_height);
        put_member!(w, max_width = s.max_width);
        put_member!(w, max_height = s.max_height);
        put_member!(w, width_inc = s.width_inc);
        put_member!(w, height_inc = s.height_inc);
        put_member!(w, min_aspect.x = s.min_aspect.x);
        put_member!(w, min_aspect.y = s.min_aspect.y);
        put_member!(w, max_aspect.x = s.max_aspect.x);
        put_member!(w, max_aspect.y = s.max_aspect.y);
        put_member!(w, base_width = s.base_width);
        put_member!(w, base_height = s.base_height);
        put_member!(w, win_gravity = s.win_gravity);
        Ok(())
    }

    fn unpack<F: Fields + ?Sized>(ctx: &Context, buf: &[u8], fields: &mut F) -> Result<()> {
        let mut s: XSizeHints = read_struct(buf, "XSizeHints")?;
        let mut u = Unpacker::new(ctx, fields);

        let flags = s.flags;
        u.num("flags", flags)?;
        for (key, bit, value) in gated(&mut s) {
            if flags & bit != 0 {
                u.num(key, *value)?;
            }
        }
        Ok(())
    }
}
