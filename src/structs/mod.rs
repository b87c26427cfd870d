// MIT/Apache2 License

//! Marshallers for the flat (non-union) structs.

/// Implements [`XStruct`](crate::buffer::XStruct) for a struct whose fields
/// map one to one onto members of the C struct.
macro_rules! flat_struct {
    (
        $(#[$meta:meta])*
        $name:ident($ffi:ident) {
            $($field:ident => $kind:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl crate::buffer::XStruct for $name {
            const CLASS: crate::value::StructClass = crate::value::StructClass::$ffi;
            const SIZE: usize = core::mem::size_of::<crate::xlib_ffi::$ffi>();

            fn pack<F: crate::Fields + ?Sized>(
                ctx: &crate::Context,
                buf: &mut [u8],
                fields: &mut F,
                consume: bool,
            ) -> crate::Result<()> {
                let mut s: crate::xlib_ffi::$ffi =
                    crate::buffer::read_struct(buf, stringify!($ffi))?;
                let mut p = crate::marshal::Packer::new(ctx, fields, consume);
                $(p.$kind(stringify!($field), &mut s.$field)?;)*

                let w = crate::buffer::StructWriter::<crate::xlib_ffi::$ffi>::new(
                    buf,
                    stringify!($ffi),
                )?;
                $(crate::buffer::put_member!(w, $field = s.$field);)*
                Ok(())
            }

            fn unpack<F: crate::Fields + ?Sized>(
                ctx: &crate::Context,
                buf: &[u8],
                fields: &mut F,
            ) -> crate::Result<()> {
                let s: crate::xlib_ffi::$ffi = crate::buffer::read_struct(buf, stringify!($ffi))?;
                let mut u = crate::marshal::Unpacker::new(ctx, fields);
                $(u.$kind(stringify!($field), s.$field)?;)*
                Ok(())
            }
        }
    };
}

mod error_event;
mod size_hints;
mod visual_info;
mod window_attributes;

pub use error_event::ErrorEvent;
pub use size_hints::SizeHints;
pub use visual_info::VisualInfo;
pub use window_attributes::SetWindowAttributes;
