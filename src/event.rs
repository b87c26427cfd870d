// MIT/Apache2 License

//! Marshalling of the `XEvent` tagged union.
//!
//! An `XEvent` is a flat overlay of ~30 structs that share a common header.
//! Here it is decoded into [`Event`], whose [`EventBody`] holds only the
//! variant selected by the discriminant, and encoded back into the overlay
//! once all fields have been applied.

use crate::{
    buffer::{put_member, read_struct, StructWriter, XStruct},
    marshal::{Packer, Unpacker},
    value::StructClass,
    xlib_ffi::{self as ffi, Atom, Bool, Colormap, Drawable, Time, Window, XDisplay},
    Context, Fields, Result,
};
use core::mem;
use libc::{c_char, c_int, c_long, c_short, c_uint, c_ulong};

/// Declares the Rust side of one variant of the union.
///
/// `member` is the union member holding the variant, and each field names
/// how it is coerced: `num` for plain integers, `xid` for resource ids and
/// `bytes` for fixed-length byte arrays.
macro_rules! event_struct {
    (
        $(#[$meta:meta])*
        $name:ident($member:ident) {
            $($field:ident: $ty:ty => $kind:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $ty,)*
        }

        impl $name {
            /// The field names of this variant.
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn decode(raw: &ffi::XEvent) -> Self {
                // SAFETY: every union member is plain data
                let c = unsafe { raw.$member };
                Self {
                    $($field: c.$field,)*
                }
            }

            fn encode(&self, w: &StructWriter<'_, ffi::XEvent>) {
                $(put_member!(w, $member.$field = self.$field);)*
            }

            fn pack<F: Fields + ?Sized>(&mut self, p: &mut Packer<'_, F>) -> Result<()> {
                $(p.$kind(stringify!($field), &mut self.$field)?;)*
                Ok(())
            }

            fn unpack<F: Fields + ?Sized>(&self, u: &mut Unpacker<'_, F>) -> Result<()> {
                $(u.$kind(stringify!($field), self.$field)?;)*
                Ok(())
            }
        }
    };
}

/// Declares the variant groups, the discriminants that select them and the
/// class name an event of that group carries.
macro_rules! event_groups {
    ($($group:ident($body:ident, $class:literal) = $($ty:ident)|+;)*) => {
        /// A set of event types that share one union member.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventGroup {
            $($group,)*
            /// Any discriminant we have no layout for.
            Unknown,
        }

        impl EventGroup {
            /// The group an event type belongs to.
            pub fn of(ty: c_int) -> Self {
                match ty {
                    $($(ffi::$ty)|+ => EventGroup::$group,)*
                    _ => EventGroup::Unknown,
                }
            }

            /// The struct name of events in this group.
            pub fn class_name(self) -> &'static str {
                match self {
                    $(EventGroup::$group => $class,)*
                    EventGroup::Unknown => "XEvent",
                }
            }

            /// The variant fields of events in this group, header excluded.
            pub fn fields(self) -> &'static [&'static str] {
                match self {
                    $(EventGroup::$group => $body::FIELDS,)*
                    EventGroup::Unknown => &[],
                }
            }
        }

        /// The variant part of an event.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum EventBody {
            $($group($body),)*
            Unknown,
        }

        impl EventBody {
            fn decode(group: EventGroup, raw: &ffi::XEvent) -> Self {
                match group {
                    $(EventGroup::$group => EventBody::$group($body::decode(raw)),)*
                    EventGroup::Unknown => EventBody::Unknown,
                }
            }

            fn encode(&self, w: &StructWriter<'_, ffi::XEvent>) {
                match self {
                    $(EventBody::$group(body) => body.encode(w),)*
                    EventBody::Unknown => {}
                }
            }

            fn pack<F: Fields + ?Sized>(&mut self, p: &mut Packer<'_, F>) -> Result<()> {
                match self {
                    $(EventBody::$group(body) => body.pack(p),)*
                    EventBody::Unknown => Ok(()),
                }
            }

            fn unpack<F: Fields + ?Sized>(&self, u: &mut Unpacker<'_, F>) -> Result<()> {
                match self {
                    $(EventBody::$group(body) => body.unpack(u),)*
                    EventBody::Unknown => Ok(()),
                }
            }

            /// The group this body belongs to.
            pub fn group(&self) -> EventGroup {
                match self {
                    $(EventBody::$group(_) => EventGroup::$group,)*
                    EventBody::Unknown => EventGroup::Unknown,
                }
            }
        }
    };
}

event_groups! {
    Key(KeyEvent, "XKeyEvent") = KeyPress | KeyRelease;
    Button(ButtonEvent, "XButtonEvent") = ButtonPress | ButtonRelease;
    Motion(MotionEvent, "XMotionEvent") = MotionNotify;
    Crossing(CrossingEvent, "XCrossingEvent") = EnterNotify | LeaveNotify;
    FocusChange(FocusChangeEvent, "XFocusChangeEvent") = FocusIn | FocusOut;
    Keymap(KeymapEvent, "XKeymapEvent") = KeymapNotify;
    Expose(ExposeEvent, "XExposeEvent") = Expose;
    GraphicsExpose(GraphicsExposeEvent, "XGraphicsExposeEvent") = GraphicsExpose;
    NoExpose(NoExposeEvent, "XNoExposeEvent") = NoExpose;
    Visibility(VisibilityEvent, "XVisibilityEvent") = VisibilityNotify;
    CreateWindow(CreateWindowEvent, "XCreateWindowEvent") = CreateNotify;
    DestroyWindow(DestroyWindowEvent, "XDestroyWindowEvent") = DestroyNotify;
    Unmap(UnmapEvent, "XUnmapEvent") = UnmapNotify;
    Map(MapEvent, "XMapEvent") = MapNotify;
    MapRequest(MapRequestEvent, "XMapRequestEvent") = MapRequest;
    Reparent(ReparentEvent, "XReparentEvent") = ReparentNotify;
    Configure(ConfigureEvent, "XConfigureEvent") = ConfigureNotify;
    ConfigureRequest(ConfigureRequestEvent, "XConfigureRequestEvent") = ConfigureRequest;
    Gravity(GravityEvent, "XGravityEvent") = GravityNotify;
    ResizeRequest(ResizeRequestEvent, "XResizeRequestEvent") = ResizeRequest;
    Circulate(CirculateEvent, "XCirculateEvent") = CirculateNotify;
    CirculateRequest(CirculateRequestEvent, "XCirculateRequestEvent") = CirculateRequest;
    Property(PropertyEvent, "XPropertyEvent") = PropertyNotify;
    SelectionClear(SelectionClearEvent, "XSelectionClearEvent") = SelectionClear;
    SelectionRequest(SelectionRequestEvent, "XSelectionRequestEvent") = SelectionRequest;
    Selection(SelectionEvent, "XSelectionEvent") = SelectionNotify;
    Colormap(ColormapEvent, "XColormapEvent") = ColormapNotify;
    ClientMessage(ClientMessageEvent, "XClientMessageEvent") = ClientMessage;
    Mapping(MappingEvent, "XMappingEvent") = MappingNotify;
    Generic(GenericEvent, "XGenericEvent") = GenericEvent;
}

impl EventGroup {
    /// Whether the variant struct has a `window` member of its own.
    ///
    /// If so, the `window` field is that member. This differs from bindings
    /// that always write `window` to the header slot: there, `window` on a
    /// DestroyNotify lands in `event`, which shares that slot. Hosts ported
    /// from such a binding should set `event` explicitly.
    ///
    /// For the other groups, the `window` field addresses the slot in the
    /// common header, which overlaps the first variant member.
    pub fn has_window(self) -> bool {
        !matches!(
            self,
            EventGroup::GraphicsExpose
                | EventGroup::NoExpose
                | EventGroup::SelectionRequest
                | EventGroup::Selection
                | EventGroup::Generic
                | EventGroup::Unknown
        )
    }
}

event_struct! {
    KeyEvent(xkey) {
        window: Window => xid,
        root: Window => xid,
        subwindow: Window => xid,
        time: Time => num,
        x: c_int => num,
        y: c_int => num,
        x_root: c_int => num,
        y_root: c_int => num,
        state: c_uint => num,
        keycode: c_uint => num,
        same_screen: Bool => num,
    }
}

event_struct! {
    ButtonEvent(xbutton) {
        window: Window => xid,
        root: Window => xid,
        subwindow: Window => xid,
        time: Time => num,
        x: c_int => num,
        y: c_int => num,
        x_root: c_int => num,
        y_root: c_int => num,
        state: c_uint => num,
        button: c_uint => num,
        same_screen: Bool => num,
    }
}

event_struct! {
    MotionEvent(xmotion) {
        window: Window => xid,
        root: Window => xid,
        subwindow: Window => xid,
        time: Time => num,
        x: c_int => num,
        y: c_int => num,
        x_root: c_int => num,
        y_root: c_int => num,
        state: c_uint => num,
        is_hint: c_char => num,
        same_screen: Bool => num,
    }
}

event_struct! {
    CrossingEvent(xcrossing) {
        window: Window => xid,
        root: Window => xid,
        subwindow: Window => xid,
        time: Time => num,
        x: c_int => num,
        y: c_int => num,
        x_root: c_int => num,
        y_root: c_int => num,
        mode: c_int => num,
        detail: c_int => num,
        same_screen: Bool => num,
        focus: Bool => num,
        state: c_uint => num,
    }
}

event_struct! {
    FocusChangeEvent(xfocus) {
        window: Window => xid,
        mode: c_int => num,
        detail: c_int => num,
    }
}

event_struct! {
    KeymapEvent(xkeymap) {
        window: Window => xid,
        key_vector: [u8; 32] => bytes,
    }
}

event_struct! {
    ExposeEvent(xexpose) {
        window: Window => xid,
        x: c_int => num,
        y: c_int => num,
        width: c_int => num,
        height: c_int => num,
        count: c_int => num,
    }
}

event_struct! {
    GraphicsExposeEvent(xgraphicsexpose) {
        drawable: Drawable => xid,
        x: c_int => num,
        y: c_int => num,
        width: c_int => num,
        height: c_int => num,
        count: c_int => num,
        major_code: c_int => num,
        minor_code: c_int => num,
    }
}

event_struct! {
    NoExposeEvent(xnoexpose) {
        drawable: Drawable => xid,
        major_code: c_int => num,
        minor_code: c_int => num,
    }
}

event_struct! {
    VisibilityEvent(xvisibility) {
        window: Window => xid,
        state: c_int => num,
    }
}

event_struct! {
    CreateWindowEvent(xcreatewindow) {
        parent: Window => xid,
        window: Window => xid,
        x: c_int => num,
        y: c_int => num,
        width: c_int => num,
        height: c_int => num,
        border_width: c_int => num,
        override_redirect: Bool => num,
    }
}

event_struct! {
    DestroyWindowEvent(xdestroywindow) {
        event: Window => xid,
        window: Window => xid,
    }
}

event_struct! {
    UnmapEvent(xunmap) {
        event: Window => xid,
        window: Window => xid,
        from_configure: Bool => num,
    }
}

event_struct! {
    MapEvent(xmap) {
        event: Window => xid,
        window: Window => xid,
        override_redirect: Bool => num,
    }
}

event_struct! {
    MapRequestEvent(xmaprequest) {
        parent: Window => xid,
        window: Window => xid,
    }
}

event_struct! {
    ReparentEvent(xreparent) {
        event: Window => xid,
        window: Window => xid,
        parent: Window => xid,
        x: c_int => num,
        y: c_int => num,
        override_redirect: Bool => num,
    }
}

event_struct! {
    ConfigureEvent(xconfigure) {
        event: Window => xid,
        window: Window => xid,
        x: c_int => num,
        y: c_int => num,
        width: c_int => num,
        height: c_int => num,
        border_width: c_int => num,
        above: Window => xid,
        override_redirect: Bool => num,
    }
}

event_struct! {
    ConfigureRequestEvent(xconfigurerequest) {
        parent: Window => xid,
        window: Window => xid,
        x: c_int => num,
        y: c_int => num,
        width: c_int => num,
        height: c_int => num,
        border_width: c_int => num,
        above: Window => xid,
        detail: c_int => num,
        value_mask: c_ulong => num,
    }
}

event_struct! {
    GravityEvent(xgravity) {
        event: Window => xid,
        window: Window => xid,
        x: c_int => num,
        y: c_int => num,
    }
}

event_struct! {
    ResizeRequestEvent(xresizerequest) {
        window: Window => xid,
        width: c_int => num,
        height: c_int => num,
    }
}

event_struct! {
    CirculateEvent(xcirculate) {
        event: Window => xid,
        window: Window => xid,
        place: c_int => num,
    }
}

event_struct! {
    CirculateRequestEvent(xcirculaterequest) {
        parent: Window => xid,
        window: Window => xid,
        place: c_int => num,
    }
}

event_struct! {
    PropertyEvent(xproperty) {
        window: Window => xid,
        atom: Atom => xid,
        time: Time => num,
        state: c_int => num,
    }
}

event_struct! {
    SelectionClearEvent(xselectionclear) {
        window: Window => xid,
        selection: Atom => xid,
        time: Time => num,
    }
}

event_struct! {
    SelectionRequestEvent(xselectionrequest) {
        owner: Window => xid,
        requestor: Window => xid,
        selection: Atom => xid,
        target: Atom => xid,
        property: Atom => xid,
        time: Time => num,
    }
}

event_struct! {
    SelectionEvent(xselection) {
        requestor: Window => xid,
        selection: Atom => xid,
        target: Atom => xid,
        property: Atom => xid,
        time: Time => num,
    }
}

event_struct! {
    ColormapEvent(xcolormap) {
        window: Window => xid,
        colormap: Colormap => xid,
        new: Bool => num,
        state: c_int => num,
    }
}

event_struct! {
    MappingEvent(xmapping) {
        window: Window => xid,
        request: c_int => num,
        first_keycode: c_int => num,
        count: c_int => num,
    }
}

event_struct! {
    GenericEvent(xgeneric) {
        extension: c_int => num,
        evtype: c_int => num,
    }
}

const DATA_LEN: usize = mem::size_of::<ffi::ClientMessageData>();
const B_LEN: usize = mem::size_of::<[c_char; 20]>();
const S_LEN: usize = mem::size_of::<[c_short; 10]>();
const L_LEN: usize = mem::size_of::<[c_long; 5]>();

/// A client message.
///
/// `data` holds the raw bytes of the message; the `b`, `s` and `l` fields
/// are views of its prefix sized for 8, 16 and 32 bit formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessageEvent {
    pub window: Window,
    pub message_type: Atom,
    pub format: c_int,
    pub data: [u8; DATA_LEN],
}

impl ClientMessageEvent {
    /// The field names of this variant.
    pub const FIELDS: &'static [&'static str] = &["window", "message_type", "format", "b", "s", "l"];

    fn decode(raw: &ffi::XEvent) -> Self {
        let c = unsafe { raw.xclient };
        Self {
            window: c.window,
            message_type: c.message_type,
            format: c.format,
            // SAFETY: same size, and the union is plain bytes
            data: unsafe { mem::transmute::<ffi::ClientMessageData, [u8; DATA_LEN]>(c.data) },
        }
    }

    fn encode(&self, w: &StructWriter<'_, ffi::XEvent>) {
        put_member!(w, xclient.window = self.window);
        put_member!(w, xclient.message_type = self.message_type);
        put_member!(w, xclient.format = self.format);
        // SAFETY: same as put_member!, the data area is plain bytes
        unsafe {
            let data = core::ptr::addr_of_mut!((*w.as_ptr()).xclient.data);
            (data as *mut [u8; DATA_LEN]).write_unaligned(self.data);
        }
    }

    fn pack<F: Fields + ?Sized>(&mut self, p: &mut Packer<'_, F>) -> Result<()> {
        pack_view::<_, B_LEN>(&mut self.data, p, "b")?;
        pack_view::<_, L_LEN>(&mut self.data, p, "l")?;
        pack_view::<_, S_LEN>(&mut self.data, p, "s")?;
        p.num("format", &mut self.format)?;
        p.xid("message_type", &mut self.message_type)?;
        p.xid("window", &mut self.window)?;
        Ok(())
    }

    fn unpack<F: Fields + ?Sized>(&self, u: &mut Unpacker<'_, F>) -> Result<()> {
        u.bytes("b", view::<B_LEN>(&self.data))?;
        u.bytes("l", view::<L_LEN>(&self.data))?;
        u.bytes("s", view::<S_LEN>(&self.data))?;
        u.num("format", self.format)?;
        u.xid("message_type", self.message_type)?;
        u.xid("window", self.window)
    }
}

fn view<const N: usize>(data: &[u8; DATA_LEN]) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(&data[..N]);
    out
}

fn pack_view<F: Fields + ?Sized, const N: usize>(
    data: &mut [u8; DATA_LEN],
    p: &mut Packer<'_, F>,
    key: &'static str,
) -> Result<()> {
    let mut part = view::<N>(data);
    if p.bytes(key, &mut part)? {
        data[..N].copy_from_slice(&part);
    }
    Ok(())
}

/// A decoded `XEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub type_: c_int,
    pub serial: c_ulong,
    pub send_event: Bool,
    pub display: *mut XDisplay,
    pub body: EventBody,
}

impl Event {
    /// Decode the variant selected by the discriminant of `raw`.
    pub fn decode(raw: &ffi::XEvent) -> Self {
        let any = unsafe { raw.xany };
        Self {
            type_: any.type_,
            serial: any.serial,
            send_event: any.send_event,
            display: any.display,
            body: EventBody::decode(EventGroup::of(any.type_), raw),
        }
    }

    /// Decode the event at the front of `buf`.
    pub fn read(buf: &[u8]) -> Result<Self> {
        read_struct(buf, "XEvent").map(|raw| Self::decode(&raw))
    }

    /// Write the members of this event into `buf`.
    ///
    /// Only the header and the members of the variant are written; every
    /// other byte is left as it was.
    pub fn write(&self, buf: &mut [u8]) -> Result<()> {
        let w = StructWriter::<ffi::XEvent>::new(buf, "XEvent")?;
        self.write_header(&w);
        self.body.encode(&w);
        Ok(())
    }

    fn write_header(&self, w: &StructWriter<'_, ffi::XEvent>) {
        put_member!(w, xany.type_ = self.type_);
        put_member!(w, xany.serial = self.serial);
        put_member!(w, xany.send_event = self.send_event);
        put_member!(w, xany.display = self.display);
    }

    /// The variant group selected by the discriminant.
    pub fn group(&self) -> EventGroup {
        EventGroup::of(self.type_)
    }

    /// The class an unpacked event of this type should carry.
    pub fn class(&self) -> StructClass {
        StructClass::for_event_type(self.type_)
    }
}

const HEADER_LEN: usize = mem::size_of::<ffi::XAnyEvent>();

/// Zero everything past the common header.
fn clear_variant(raw: &mut ffi::XEvent) {
    let any = unsafe { raw.xany };
    raw.pad = [0; 24];
    raw.xany = any;
}

impl XStruct for Event {
    const CLASS: StructClass = StructClass::XEvent;
    const SIZE: usize = mem::size_of::<ffi::XEvent>();

    fn pack<F: Fields + ?Sized>(
        ctx: &Context,
        buf: &mut [u8],
        fields: &mut F,
        consume: bool,
    ) -> Result<()> {
        let mut raw: ffi::XEvent = read_struct(buf, "XEvent")?;
        let mut p = Packer::new(ctx, fields, consume);

        let old = unsafe { raw.type_ };
        let mut ty = old;
        let mut regroup = false;
        if p.num("type", &mut ty)? && ty != old {
            if EventGroup::of(old) != EventGroup::of(ty) {
                tracing::trace!(from = old, to = ty, "event changed variant group");
                clear_variant(&mut raw);
                regroup = true;
            }
            raw.type_ = ty;
        }

        let group = EventGroup::of(ty);
        let mut header_window = unsafe { raw.xany.window };
        if !group.has_window() {
            p.xid("window", &mut header_window)?;
            let mut any = unsafe { raw.xany };
            any.window = header_window;
            raw.xany = any;
        }

        let mut event = Event::decode(&raw);
        p.num("serial", &mut event.serial)?;
        p.num("send_event", &mut event.send_event)?;
        p.display("display", &mut event.display)?;

        if group == EventGroup::Unknown {
            tracing::warn!("Unknown XEvent type {}", ty);
        }
        event.body.pack(&mut p)?;

        // nothing is written until every field has been applied
        if regroup {
            buf[HEADER_LEN..Self::SIZE].iter_mut().for_each(|b| *b = 0);
        }
        let w = StructWriter::<ffi::XEvent>::new(buf, "XEvent")?;
        if !group.has_window() {
            put_member!(w, xany.window = header_window);
        }
        event.write_header(&w);
        event.body.encode(&w);
        Ok(())
    }

    fn unpack<F: Fields + ?Sized>(ctx: &Context, buf: &[u8], fields: &mut F) -> Result<()> {
        let raw: ffi::XEvent = read_struct(buf, "XEvent")?;
        let event = Event::decode(&raw);
        let mut u = Unpacker::new(ctx, fields);

        u.num("type", event.type_)?;
        u.num("serial", event.serial)?;
        u.num("send_event", event.send_event)?;
        u.display("display", event.display)?;

        let group = event.group();
        if !group.has_window() {
            u.xid("window", unsafe { raw.xany.window })?;
        }
        if group == EventGroup::Unknown {
            tracing::warn!("Unknown XEvent type {}", event.type_);
        }

        event.body.unpack(&mut u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::new_buffer,
        registry::{Connection, DisplayHandle},
        Error, FieldMap, Value,
    };
    use alloc::vec::Vec;

    fn fields(pairs: &[(&str, Value)]) -> FieldMap {
        pairs.iter().cloned().collect()
    }

    fn packed(ctx: &Context, pairs: &[(&str, Value)]) -> Vec<u8> {
        let mut buf = new_buffer::<Event>().bytes;
        Event::pack(ctx, &mut buf, &mut fields(pairs), false).unwrap();
        buf
    }

    fn raw(buf: &[u8]) -> ffi::XEvent {
        read_struct(buf, "XEvent").unwrap()
    }

    #[test]
    fn key_press_round_trip() {
        let ctx = Context::new();
        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::KeyPress.into())),
                ("keycode", Value::Int(38)),
                ("state", Value::Int(0)),
                ("window", Value::Int(12345)),
            ],
        );

        let key = unsafe { raw(&buf).xkey };
        assert_eq!(key.keycode, 38);
        assert_eq!(key.window, 12345);

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        let expected = fields(&[
            ("type", Value::Int(2)),
            ("serial", Value::UInt(0)),
            ("send_event", Value::Int(0)),
            ("display", Value::Undef),
            ("window", Value::UInt(12345)),
            ("root", Value::UInt(0)),
            ("subwindow", Value::UInt(0)),
            ("time", Value::UInt(0)),
            ("x", Value::Int(0)),
            ("y", Value::Int(0)),
            ("x_root", Value::Int(0)),
            ("y_root", Value::Int(0)),
            ("state", Value::UInt(0)),
            ("keycode", Value::UInt(38)),
            ("same_screen", Value::Int(0)),
        ]);
        assert_eq!(out, expected);
    }

    #[test]
    fn changing_group_clears_variant() {
        let ctx = Context::new();
        let mut buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::ConfigureNotify.into())),
                ("serial", Value::Int(9)),
                ("width", Value::Int(640)),
                ("height", Value::Int(480)),
                ("above", Value::Int(77)),
            ],
        );

        Event::pack(
            &ctx,
            &mut buf,
            &mut fields(&[("type", Value::Int(ffi::KeyPress.into()))]),
            false,
        )
        .unwrap();

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.get("serial"), Some(&Value::UInt(9)));
        for key in out.keys() {
            if !matches!(key, "type" | "serial" | "display") {
                let value = out.get(key).unwrap();
                assert!(
                    matches!(value, Value::Int(0) | Value::UInt(0)),
                    "{} leaked as {:?}",
                    key,
                    value
                );
            }
        }
    }

    #[test]
    fn changing_within_group_keeps_variant() {
        let ctx = Context::new();
        let mut buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::KeyPress.into())),
                ("keycode", Value::Int(24)),
            ],
        );

        Event::pack(
            &ctx,
            &mut buf,
            &mut fields(&[("type", Value::Int(ffi::KeyRelease.into()))]),
            false,
        )
        .unwrap();

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.get("type"), Some(&Value::Int(3)));
        assert_eq!(out.get("keycode"), Some(&Value::UInt(24)));
    }

    #[test]
    fn consume_leaves_unknown_fields() {
        let ctx = Context::new();
        let mut buf = new_buffer::<Event>().bytes;
        let mut input = fields(&[
            ("type", Value::Int(ffi::ButtonPress.into())),
            ("button", Value::Int(3)),
            ("x", Value::Int(10)),
            ("wibble", Value::Int(1)),
        ]);

        Event::pack(&ctx, &mut buf, &mut input, true).unwrap();
        assert_eq!(input.len(), 1);
        assert!(input.contains_key("wibble"));
        assert_eq!(unsafe { raw(&buf).xbutton.button }, 3);
    }

    #[test]
    fn unknown_type_only_touches_header() {
        let ctx = Context::new();
        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(99)),
                ("serial", Value::Int(4)),
                ("x", Value::Int(5)),
                ("window", Value::Int(8)),
            ],
        );

        assert!(buf[mem::size_of::<ffi::XAnyEvent>()..].iter().all(|&b| b == 0));

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out.get("type"), Some(&Value::Int(99)));
        assert_eq!(out.get("window"), Some(&Value::UInt(8)));
        assert_eq!(Event::decode(&raw(&buf)).class(), StructClass::XEvent);
    }

    #[test]
    fn client_message_views_share_data() {
        let ctx = Context::new();
        let mut longs = [0u8; L_LEN];
        longs[0] = 0xAB;
        longs[L_LEN - 1] = 0xCD;

        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::ClientMessage.into())),
                ("format", Value::Int(32)),
                ("message_type", Value::Int(300)),
                ("l", Value::from(&longs[..])),
            ],
        );

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.get("l"), Some(&Value::from(&longs[..])));
        assert_eq!(out.get("b"), Some(&Value::from(&longs[..B_LEN])));
        assert_eq!(out.get("s"), Some(&Value::from(&longs[..S_LEN])));
        assert_eq!(out.get("format"), Some(&Value::Int(32)));
        assert_eq!(out.get("message_type"), Some(&Value::UInt(300)));
    }

    #[test]
    fn client_message_rejects_wrong_length() {
        let ctx = Context::new();
        let mut buf = packed(&ctx, &[("type", Value::Int(ffi::ClientMessage.into()))]);
        let before = buf.clone();

        let err = Event::pack(
            &ctx,
            &mut buf,
            &mut fields(&[("format", Value::Int(8)), ("b", Value::from("abc"))]),
            false,
        )
        .unwrap_err();

        assert_eq!(
            err,
            Error::BufferTooSmall {
                what: "b",
                expected: B_LEN,
                actual: 3
            }
        );
        assert_eq!(buf, before);
    }

    #[test]
    fn keymap_vector_is_fixed_length() {
        let ctx = Context::new();
        let mut keys = [0u8; 32];
        keys[4] = 0x10;
        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::KeymapNotify.into())),
                ("key_vector", Value::from(&keys[..])),
            ],
        );

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.get("key_vector"), Some(&Value::from(&keys[..])));
    }

    #[test]
    fn window_is_the_variant_member() {
        let ctx = Context::new();
        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::DestroyNotify.into())),
                ("event", Value::Int(1)),
                ("window", Value::Int(2)),
            ],
        );

        let destroy = unsafe { raw(&buf).xdestroywindow };
        assert_eq!(destroy.event, 1);
        assert_eq!(destroy.window, 2);

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.get("event"), Some(&Value::UInt(1)));
        assert_eq!(out.get("window"), Some(&Value::UInt(2)));
    }

    #[test]
    fn windowless_variant_uses_header_slot() {
        let ctx = Context::new();
        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::GraphicsExpose.into())),
                ("window", Value::Int(5)),
            ],
        );
        assert_eq!(unsafe { raw(&buf).xgraphicsexpose.drawable }, 5);

        // an explicit variant member wins over the header slot
        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::GraphicsExpose.into())),
                ("window", Value::Int(5)),
                ("drawable", Value::Int(6)),
            ],
        );
        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.get("drawable"), Some(&Value::UInt(6)));
        assert_eq!(out.get("window"), Some(&Value::UInt(6)));
    }

    #[test]
    fn xid_fields_accept_mappings() {
        let ctx = Context::new();
        let parent = fields(&[("xid", Value::Int(0x400001))]);
        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::MapRequest.into())),
                ("parent", Value::Map(parent)),
            ],
        );
        assert_eq!(unsafe { raw(&buf).xmaprequest.parent }, 0x400001);
    }

    #[test]
    fn display_resolves_to_the_same_wrapper() {
        let ctx = Context::new();
        let conn = Connection::new();
        ctx.attach(&conn, DisplayHandle::from_addr(0x5000));

        let buf = packed(
            &ctx,
            &[
                ("type", Value::Int(ffi::Expose.into())),
                ("display", Value::Connection(conn.clone())),
            ],
        );
        assert_eq!(unsafe { raw(&buf).xany.display } as usize, 0x5000);

        let out = Event::unpack_map(&ctx, &buf).unwrap();
        assert_eq!(out.get("display"), Some(&Value::Connection(conn)));
    }

    #[test]
    fn refused_store_aborts_unpack() {
        struct Refusing;

        impl Fields for Refusing {
            fn fetch(&self, _: &str) -> Option<&Value> {
                None
            }

            fn delete(&mut self, _: &str) -> Option<Value> {
                None
            }

            fn store(&mut self, _: &str, _: Value) -> Result<()> {
                Err(Error::invalid("read only"))
            }
        }

        let ctx = Context::new();
        let buf = new_buffer::<Event>().bytes;
        let err = Event::unpack(&ctx, &buf, &mut Refusing).unwrap_err();
        assert_eq!(
            err,
            Error::StorageWriteFailure {
                field: "type".into()
            }
        );
    }

    #[test]
    fn every_event_type_round_trips() {
        let ctx = Context::new();

        for ty in ffi::KeyPress..=ffi::GenericEvent {
            let group = EventGroup::of(ty);
            assert_ne!(group, EventGroup::Unknown, "type {}", ty);

            // a fresh buffer reads back as zero in every variant field
            let zeroed = Event::unpack_map(&ctx, &packed(&ctx, &[("type", Value::Int(ty.into()))]))
                .unwrap();
            for key in group.fields() {
                match zeroed.get(key) {
                    Some(Value::Int(0)) | Some(Value::UInt(0)) => {}
                    Some(Value::Bytes(b)) if b.iter().all(|&b| b == 0) => {}
                    other => panic!("{} of type {} unpacked as {:?}", key, ty, other),
                }
            }

            let mut input = fields(&[
                ("type", Value::Int(ty.into())),
                ("serial", Value::UInt(1000 + ty as u64)),
                ("send_event", Value::Int(1)),
            ]);
            for (i, key) in group.fields().iter().enumerate() {
                // `b` and `s` are prefixes of `l`
                if matches!(*key, "b" | "s") {
                    continue;
                }

                let n = i as u8 + 1;
                let value = match zeroed.get(key) {
                    Some(Value::Int(_)) => Value::Int(n.into()),
                    Some(Value::UInt(_)) => Value::UInt(n.into()),
                    Some(Value::Bytes(b)) => {
                        Value::Bytes((0..b.len()).map(|j| n.wrapping_add(j as u8)).collect())
                    }
                    other => panic!("{} of type {} unpacked as {:?}", key, ty, other),
                };
                input.insert(*key, value);
            }

            let mut buf = new_buffer::<Event>().bytes;
            Event::pack(&ctx, &mut buf, &mut input.clone(), false).unwrap();
            let out = Event::unpack_map(&ctx, &buf).unwrap();

            for key in input.keys() {
                assert_eq!(out.get(key), input.get(key), "{} of type {}", key, ty);
            }
            if group == EventGroup::ClientMessage {
                let l = out.get("l").and_then(Value::as_bytes).unwrap();
                assert_eq!(out.get("b"), Some(&Value::from(&l[..B_LEN])));
                assert_eq!(out.get("s"), Some(&Value::from(&l[..S_LEN])));
            }
        }
    }

    #[test]
    fn only_members_are_written() {
        let ctx = Context::new();
        let mut buf = alloc::vec![0xAA; Event::SIZE];
        buf[..4].copy_from_slice(&ffi::KeyPress.to_ne_bytes());
        // the gap between `type` and `serial`, empty where longs are 4 bytes
        let gap = 4..mem::align_of::<c_ulong>().max(4);

        Event::pack(&ctx, &mut buf, &mut fields(&[("keycode", Value::Int(38))]), false).unwrap();
        assert!(buf[gap.clone()].iter().all(|&b| b == 0xAA));
        assert_eq!(unsafe { raw(&buf).xkey.keycode }, 38);

        // a new group zeroes the variant area, gaps included
        Event::pack(
            &ctx,
            &mut buf,
            &mut fields(&[("type", Value::Int(ffi::DestroyNotify.into()))]),
            false,
        )
        .unwrap();
        assert!(buf[gap].iter().all(|&b| b == 0xAA));
        assert!(buf[HEADER_LEN..].iter().all(|&b| b == 0));
        assert_eq!(Event::read(&buf).unwrap().group(), EventGroup::DestroyWindow);
    }

    #[test]
    fn write_leaves_bytes_past_the_variant() {
        let mut buf = alloc::vec![0x55; Event::SIZE];
        let event = Event {
            type_: ffi::FocusIn,
            serial: 3,
            send_event: 0,
            display: core::ptr::null_mut(),
            body: EventBody::FocusChange(FocusChangeEvent {
                window: 9,
                mode: 1,
                detail: 2,
            }),
        };
        event.write(&mut buf).unwrap();

        assert_eq!(Event::read(&buf).unwrap(), event);
        assert_eq!(buf[Event::SIZE - 1], 0x55);
    }

    #[test]
    fn group_classes() {
        assert_eq!(EventGroup::of(ffi::LeaveNotify).class_name(), "XCrossingEvent");
        assert_eq!(EventGroup::of(ffi::SelectionNotify).class_name(), "XSelectionEvent");
        assert_eq!(EventGroup::of(0), EventGroup::Unknown);
        assert!(!EventGroup::Generic.has_window());
        assert!(EventGroup::Colormap.has_window());
    }
}
