// MIT/Apache2 License

//! Host-side values and field mappings.

use crate::{
    event::EventGroup,
    registry::Connection,
    Error, Result,
};
use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::{fmt, str};

/// A value as seen by the host language.
#[derive(Clone)]
pub enum Value {
    /// Nothing at all.
    Undef,
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A byte string.
    Bytes(Vec<u8>),
    /// A reference to a field mapping.
    Map(FieldMap),
    /// A reference to an aggregate that is neither a scalar nor a mapping.
    List(Vec<Value>),
    /// A reference to a scalar.
    Ref(alloc::boxed::Box<Value>),
    /// A byte buffer tagged with the struct type it holds.
    Struct(StructValue),
    /// A connection wrapper.
    Connection(Arc<Connection>),
    /// A pointer to a libX11 `Visual`.
    Visual(usize),
}

impl Value {
    /// Whether this value is `Undef`.
    pub fn is_undef(&self) -> bool {
        matches!(self, Value::Undef)
    }

    /// A short description of the value, used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Value::Undef => "undef".into(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Bytes(b) => alloc::format!("string of length {}", b.len()),
            Value::Map(_) => "mapping".into(),
            Value::List(_) => "list".into(),
            Value::Ref(inner) => alloc::format!("\\{}", inner.describe()),
            Value::Struct(sv) => sv.class.name().into(),
            Value::Connection(_) => "connection".into(),
            Value::Visual(_) => "Visual".into(),
        }
    }

    /// Interpret this value as a signed integer.
    pub fn as_i64(&self) -> Result<i64> {
        match *self {
            Value::Int(i) => Ok(i),
            Value::UInt(u) => Ok(u as i64),
            Value::Undef => Ok(0),
            Value::Bytes(ref b) => parse_number(b)
                .ok_or_else(|| Error::invalid(alloc::format!("Expected a number, got {}", self.describe()))),
            _ => Err(Error::invalid(alloc::format!(
                "Expected a number, got {}",
                self.describe()
            ))),
        }
    }

    /// Borrow the bytes of a string value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the mapping of a mapping value.
    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

fn parse_number(bytes: &[u8]) -> Option<i64> {
    let s = str::from_utf8(bytes).ok()?.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<u64>().ok().map(|u| u as i64))
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => f.write_str("Undef"),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::UInt(u) => f.debug_tuple("UInt").field(u).finish(),
            Value::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Value::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Value::List(l) => f.debug_tuple("List").field(l).finish(),
            Value::Ref(r) => f.debug_tuple("Ref").field(r).finish(),
            Value::Struct(s) => f.debug_tuple("Struct").field(s).finish(),
            Value::Connection(c) => f
                .debug_tuple("Connection")
                .field(&c.handle())
                .finish(),
            Value::Visual(p) => write!(f, "Visual({:#x})", p),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undef, Value::Undef) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Connection(a), Value::Connection(b)) => Arc::ptr_eq(a, b),
            (Value::Visual(a), Value::Visual(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident as $as:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v as $as)
                }
            }
        )*
    };
}

value_from! {
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().into())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<FieldMap> for Value {
    fn from(m: FieldMap) -> Self {
        Value::Map(m)
    }
}

impl From<Arc<Connection>> for Value {
    fn from(c: Arc<Connection>) -> Self {
        Value::Connection(c)
    }
}

/// A C scalar type that can be read from and written to a [`Value`].
pub(crate) trait Numeric: Copy {
    fn from_value(value: &Value) -> Result<Self>;
    fn into_value(self) -> Value;
}

macro_rules! numeric {
    ($($ty:ty => $variant:ident as $as:ty),* $(,)?) => {
        $(
            impl Numeric for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    // wrap to the C width, the same way a C cast would
                    match *value {
                        Value::UInt(u) => Ok(u as $ty),
                        ref other => other.as_i64().map(|i| i as $ty),
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self as $as)
                }
            }
        )*
    };
}

numeric! {
    i8 => Int as i64,
    u8 => UInt as u64,
    i16 => Int as i64,
    u16 => UInt as u64,
    i32 => Int as i64,
    u32 => UInt as u64,
    i64 => Int as i64,
    u64 => UInt as u64,
}

/// Storage for named fields.
///
/// Marshallers read their input through this trait and write their output
/// through it. A `store` may be refused, which aborts the marshalling call.
pub trait Fields {
    /// Look up a field.
    fn fetch(&self, key: &str) -> Option<&Value>;
    /// Remove a field, returning it if it was present.
    fn delete(&mut self, key: &str) -> Option<Value>;
    /// Insert or overwrite a field.
    fn store(&mut self, key: &str, value: Value) -> Result<()>;
}

/// A string-keyed set of fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: HashMap<String, Value>,
}

impl FieldMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Insert a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Whether a field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }
}

impl Fields for FieldMap {
    fn fetch(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn delete(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    fn store(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.into(), value);
        Ok(())
    }
}

impl<K: Into<String>, V: Into<Value>> core::iter::FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A struct type tag carried by typed buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructClass {
    /// The generic base of every struct type.
    Struct,
    /// A generic `XEvent`.
    XEvent,
    /// An `XEvent` known to hold a particular variant group.
    Event(EventGroup),
    /// An `XErrorEvent`.
    XErrorEvent,
    /// An `XVisualInfo`.
    XVisualInfo,
    /// An `XSetWindowAttributes`.
    XSetWindowAttributes,
    /// An `XSizeHints`.
    XSizeHints,
}

impl StructClass {
    /// The name of this struct type.
    pub fn name(self) -> &'static str {
        match self {
            StructClass::Struct => "Struct",
            StructClass::XEvent => "XEvent",
            StructClass::Event(group) => group.class_name(),
            StructClass::XErrorEvent => "XErrorEvent",
            StructClass::XVisualInfo => "XVisualInfo",
            StructClass::XSetWindowAttributes => "XSetWindowAttributes",
            StructClass::XSizeHints => "XSizeHints",
        }
    }

    /// The class an event with the given discriminant should carry.
    pub fn for_event_type(ty: libc::c_int) -> Self {
        match EventGroup::of(ty) {
            EventGroup::Unknown => StructClass::XEvent,
            group => StructClass::Event(group),
        }
    }

    fn parent(self) -> Option<Self> {
        match self {
            StructClass::Struct => None,
            StructClass::Event(_) | StructClass::XErrorEvent => Some(StructClass::XEvent),
            _ => Some(StructClass::Struct),
        }
    }

    /// Whether this class is `base` or inherits from it.
    pub fn is_derived_from(self, base: StructClass) -> bool {
        let mut class = Some(self);
        while let Some(c) = class {
            if c == base {
                return true;
            }
            class = c.parent();
        }
        false
    }
}

/// A byte buffer tagged with its struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    pub class: StructClass,
    pub bytes: Vec<u8>,
}

impl StructValue {
    /// Wrap a byte buffer.
    pub fn new(class: StructClass, bytes: Vec<u8>) -> Self {
        Self { class, bytes }
    }
}

type HashMap<K, V> = hashbrown::HashMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_wraps_to_c_width() {
        assert_eq!(i32::from_value(&Value::Int(-1)).unwrap(), -1);
        assert_eq!(u32::from_value(&Value::Int(-1)).unwrap(), u32::MAX);
        assert_eq!(u8::from_value(&Value::UInt(0x1_02)).unwrap(), 2);
        assert_eq!(i64::from_value(&Value::from("  42 ")).unwrap(), 42);
        assert_eq!(u64::from_value(&Value::Undef).unwrap(), 0);
    }

    #[test]
    fn numeric_rejects_aggregates() {
        let err = i32::from_value(&Value::Map(FieldMap::new())).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(i32::from_value(&Value::from("twelve")).is_err());
    }

    #[test]
    fn class_hierarchy() {
        let key = StructClass::for_event_type(2);
        assert_eq!(key.name(), "XKeyEvent");
        assert!(key.is_derived_from(StructClass::XEvent));
        assert!(key.is_derived_from(StructClass::Struct));
        assert!(!key.is_derived_from(StructClass::XSizeHints));
        assert!(StructClass::XErrorEvent.is_derived_from(StructClass::XEvent));
        assert!(!StructClass::XVisualInfo.is_derived_from(StructClass::XEvent));
        assert_eq!(StructClass::for_event_type(200), StructClass::XEvent);
    }

    #[test]
    fn field_map_collects() {
        let map: FieldMap = alloc::vec![("a", Value::Int(1)), ("b", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(map.get("b").and_then(Value::as_bytes), Some(&b"x"[..]));
    }
}
