// MIT/Apache2 License

flat_struct! {
    /// `XSetWindowAttributes`, passed to `XCreateWindow` and
    /// `XChangeWindowAttributes`.
    SetWindowAttributes(XSetWindowAttributes) {
        background_pixmap => xid,
        background_pixel => num,
        border_pixmap => xid,
        border_pixel => num,
        bit_gravity => num,
        win_gravity => num,
        backing_store => num,
        backing_planes => num,
        backing_pixel => num,
        save_under => num,
        event_mask => num,
        do_not_propagate_mask => num,
        override_redirect => num,
        colormap => xid,
        cursor => xid,
    }
}

#[cfg(test)]
mod tests {
    use super::SetWindowAttributes;
    use crate::{
        buffer::{new_buffer, read_struct},
        xlib_ffi::XSetWindowAttributes,
        Context, FieldMap, Value, XStruct,
    };

    #[test]
    fn resource_ids_accept_wrappers() {
        let ctx = Context::new();
        let mut buf = new_buffer::<SetWindowAttributes>().bytes;
        let colormap: FieldMap = alloc::vec![("xid", Value::Int(0x20))].into_iter().collect();
        let mut fields: FieldMap = alloc::vec![
            ("colormap", Value::Map(colormap)),
            ("event_mask", Value::Int(1 << 15)),
            ("override_redirect", Value::Int(1)),
        ]
        .into_iter()
        .collect();

        SetWindowAttributes::pack(&ctx, &mut buf, &mut fields, true).unwrap();
        assert!(fields.is_empty());

        let raw: XSetWindowAttributes = read_struct(&buf, "XSetWindowAttributes").unwrap();
        assert_eq!(raw.colormap, 0x20);
        assert_eq!(raw.event_mask, 1 << 15);

        let out = SetWindowAttributes::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.len(), 15);
        assert_eq!(out.get("colormap"), Some(&Value::UInt(0x20)));
        assert_eq!(out.get("override_redirect"), Some(&Value::Int(1)));
    }
}
