//! Dynamic value graph.
//!
//! Composite variants are shared handles: cloning a [`Value`] clones the
//! handle, so two values can point at the same array, object or instance.
//! That sharing is what the object cache preserves across the wire.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;
use hxwire_token::format_float;

use crate::class::{InstanceRef, Serializable};

/// A mutable, shared composite.
pub type Shared<T> = Rc<RefCell<T>>;

/// Insertion-ordered string-keyed fields of an object or string map.
pub type Fields = Entries<Rc<str>>;

const DEBUG_DEPTH: usize = 8;

/// A dynamically-typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    String(Rc<str>),
    Bytes(Rc<Bytes>),
    Date(Rc<Date>),
    Array(Shared<Vec<Value>>),
    List(Shared<Vec<Value>>),
    Object(Shared<Fields>),
    StringMap(Shared<Fields>),
    IntMap(Shared<Entries<i32>>),
    ObjectMap(Shared<Vec<(Value, Value)>>),
    Instance(InstanceRef),
    /// A host handle with no wire form.
    Opaque(Opaque),
}

/// Discriminant of a [`Value`], used to keep identity checks within one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
    Date,
    Array,
    List,
    Object,
    StringMap,
    IntMap,
    ObjectMap,
    Instance,
    Opaque,
}

impl ValueKind {
    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Date => "date",
            ValueKind::Array => "array",
            ValueKind::List => "list",
            ValueKind::Object => "object",
            ValueKind::StringMap => "string map",
            ValueKind::IntMap => "int map",
            ValueKind::ObjectMap => "object map",
            ValueKind::Instance => "instance",
            ValueKind::Opaque => "opaque",
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Date(_) => ValueKind::Date,
            Value::Array(_) => ValueKind::Array,
            Value::List(_) => ValueKind::List,
            Value::Object(_) => ValueKind::Object,
            Value::StringMap(_) => ValueKind::StringMap,
            Value::IntMap(_) => ValueKind::IntMap,
            Value::ObjectMap(_) => ValueKind::ObjectMap,
            Value::Instance(_) => ValueKind::Instance,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Identity of a shared value: its kind plus the address of its handle.
    ///
    /// Returns `None` for primitives and strings, which have no identity on
    /// the wire.
    pub fn identity(&self) -> Option<(ValueKind, usize)> {
        let addr = match self {
            Value::Bytes(rc) => Rc::as_ptr(rc) as *const () as usize,
            Value::Date(rc) => Rc::as_ptr(rc) as *const () as usize,
            Value::Array(rc) | Value::List(rc) => Rc::as_ptr(rc) as *const () as usize,
            Value::Object(rc) | Value::StringMap(rc) => Rc::as_ptr(rc) as *const () as usize,
            Value::IntMap(rc) => Rc::as_ptr(rc) as *const () as usize,
            Value::ObjectMap(rc) => Rc::as_ptr(rc) as *const () as usize,
            Value::Instance(rc) => Rc::as_ptr(rc) as *const () as usize,
            Value::Opaque(opaque) => Rc::as_ptr(&opaque.inner) as *const () as usize,
            _ => return None,
        };
        Some((self.kind(), addr))
    }

    /// Returns true if both values are the same shared handle.
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Value::Bytes(Rc::new(bytes.into()))
    }

    pub fn date(millis: f64) -> Self {
        Value::Date(Rc::new(Date::from_millis(millis)))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn object<K: AsRef<str>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(RefCell::new(collect_fields(fields))))
    }

    pub fn string_map<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::StringMap(Rc::new(RefCell::new(collect_fields(entries))))
    }

    pub fn int_map(entries: impl IntoIterator<Item = (i32, Value)>) -> Self {
        Value::IntMap(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    pub fn object_map(entries: Vec<(Value, Value)>) -> Self {
        Value::ObjectMap(Rc::new(RefCell::new(entries)))
    }

    /// Wrap a class instance.
    pub fn instance<T: Serializable>(instance: T) -> Self {
        Value::Instance(Rc::new(RefCell::new(instance)))
    }

    /// Wrap a host handle that cannot be serialized.
    pub fn opaque<T: Any>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value of an `Int` or `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(f64::from(*i)),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer value of an `Int`, or of a `Float` that holds a whole 32-bit number.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && *f >= f64::from(i32::MIN) && *f <= f64::from(i32::MAX) => {
                Some(*f as i32)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// Items of an `Array` or `List`.
    pub fn as_items(&self) -> Option<&Shared<Vec<Value>>> {
        match self {
            Value::Array(items) | Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Fields of an `Object` or `StringMap`.
    pub fn as_fields(&self) -> Option<&Shared<Fields>> {
        match self {
            Value::Object(fields) | Value::StringMap(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceRef> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Run `f` against the instance if it is a `T`.
    pub fn with_instance<T: Serializable, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let instance = self.as_instance()?.borrow();
        instance.as_any().downcast_ref::<T>().map(f)
    }
}

fn collect_fields<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Value)>) -> Fields {
    entries
        .into_iter()
        .map(|(k, v)| (Rc::from(k.as_ref()), v))
        .collect()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Structural equality.
///
/// Numbers compare numerically across `Int` and `Float`, the same handle is
/// always equal to itself, and instances compare through
/// [`Serializable::fields_eq`]. Two distinct cyclic graphs never terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.same_identity(other) {
            return true;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) | (Value::List(a), Value::List(b)) => {
                *a.borrow() == *b.borrow()
            }
            (Value::Object(a), Value::Object(b)) | (Value::StringMap(a), Value::StringMap(b)) => {
                *a.borrow() == *b.borrow()
            }
            (Value::IntMap(a), Value::IntMap(b)) => *a.borrow() == *b.borrow(),
            (Value::ObjectMap(a), Value::ObjectMap(b)) => *a.borrow() == *b.borrow(),
            (Value::Instance(a), Value::Instance(b)) => a.borrow().fields_eq(&*b.borrow()),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DebugValue {
            value: self,
            depth: 0,
        }
        .fmt(f)
    }
}

struct DebugValue<'a> {
    value: &'a Value,
    depth: usize,
}

impl DebugValue<'_> {
    fn child<'b>(&self, value: &'b Value) -> DebugValue<'b> {
        DebugValue {
            value,
            depth: self.depth + 1,
        }
    }
}

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value;
        if self.depth >= DEBUG_DEPTH && value.identity().is_some() {
            return write!(f, "{:?}(..)", value.kind());
        }
        match value {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(v) => write!(f, "Float({v:?})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Bytes(b) => write!(f, "Bytes({b:?})"),
            Value::Date(d) => write!(f, "Date({:?})", d.millis()),
            Value::Array(items) | Value::List(items) => {
                write!(f, "{:?}", value.kind())?;
                match items.try_borrow() {
                    Ok(items) => f
                        .debug_list()
                        .entries(items.iter().map(|v| self.child(v)))
                        .finish(),
                    Err(_) => f.write_str("(<borrowed>)"),
                }
            }
            Value::Object(fields) | Value::StringMap(fields) => {
                write!(f, "{:?}", value.kind())?;
                match fields.try_borrow() {
                    Ok(fields) => f
                        .debug_map()
                        .entries(fields.iter().map(|(k, v)| (k, self.child(v))))
                        .finish(),
                    Err(_) => f.write_str("(<borrowed>)"),
                }
            }
            Value::IntMap(entries) => {
                f.write_str("IntMap")?;
                match entries.try_borrow() {
                    Ok(entries) => f
                        .debug_map()
                        .entries(entries.iter().map(|(k, v)| (k, self.child(v))))
                        .finish(),
                    Err(_) => f.write_str("(<borrowed>)"),
                }
            }
            Value::ObjectMap(entries) => {
                f.write_str("ObjectMap")?;
                match entries.try_borrow() {
                    Ok(entries) => f
                        .debug_map()
                        .entries(entries.iter().map(|(k, v)| (self.child(k), self.child(v))))
                        .finish(),
                    Err(_) => f.write_str("(<borrowed>)"),
                }
            }
            Value::Instance(instance) => match instance.try_borrow() {
                Ok(instance) => {
                    let mut out = f.debug_struct(instance.class_name());
                    for name in instance.field_names() {
                        if let Some(field) = instance.get_field(name) {
                            out.field(name, &self.child(&field));
                        }
                    }
                    out.finish()
                }
                Err(_) => f.write_str("Instance(<borrowed>)"),
            },
            Value::Opaque(opaque) => write!(f, "Opaque({})", opaque.type_name()),
        }
    }
}

/// Short, non-recursive rendering used in messages.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_nan() => f.write_str("NaN"),
            Value::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::String(s) => f.write_str(s),
            Value::Instance(instance) => match instance.try_borrow() {
                Ok(instance) => write!(f, "[{}]", instance.class_name()),
                Err(_) => f.write_str("[instance]"),
            },
            Value::Opaque(opaque) => write!(f, "[{}]", opaque.type_name()),
            other => write!(f, "[{}]", other.kind().name()),
        }
    }
}

/// A date as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Date {
    millis: f64,
}

impl Date {
    pub fn from_millis(millis: f64) -> Self {
        Self { millis }
    }

    pub fn millis(&self) -> f64 {
        self.millis
    }
}

/// A host handle carried through a value graph.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Rc<dyn Any>,
}

impl Opaque {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Rc::new(value),
        }
    }

    /// Name of the wrapped Rust type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

/// Insertion-ordered key/value entries.
///
/// Inserting an existing key replaces its value in place, keeping the
/// original position. Equality ignores order.
#[derive(Debug, Clone)]
pub struct Entries<K> {
    entries: Vec<(K, Value)>,
}

impl<K> Entries<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl<K: PartialEq> Entries<K> {
    /// Insert or replace; returns the previous value for `key`.
    pub fn insert(&mut self, key: K, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        K: std::borrow::Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| std::borrow::Borrow::<Q>::borrow(k) == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<Value>
    where
        K: std::borrow::Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        let index = self
            .entries
            .iter()
            .position(|(k, _)| std::borrow::Borrow::<Q>::borrow(k) == key)?;
        Some(self.entries.remove(index).1)
    }
}

impl<K> Default for Entries<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq> PartialEq for Entries<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl<K: PartialEq> FromIterator<(K, Value)> for Entries<K> {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut entries = Entries::new();
        for (k, v) in iter {
            entries.insert(k, v);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_variants() {
        assert_eq!(Value::Int(3), Value::Float(3.0));
        assert_ne!(Value::Int(3), Value::Float(3.5));
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn identity_is_per_handle() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = a.clone();
        let c = Value::array(vec![Value::Int(1)]);

        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
        assert_eq!(a, c);
        assert!(!Value::string("x").same_identity(&Value::string("x")));
    }

    #[test]
    fn identity_is_kind_scoped() {
        let items = Rc::new(RefCell::new(vec![]));
        let array = Value::Array(items.clone());
        let list = Value::List(items);
        assert!(!array.same_identity(&list));
        assert_ne!(array, list);
    }

    #[test]
    fn shared_fields_look_up_by_str() {
        let object = Value::object([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let fields = object.as_fields().unwrap();

        assert_eq!(fields.borrow().get("b"), Some(&Value::Int(2)));
        assert!(fields.borrow().contains_key("a"));
        assert_eq!(fields.borrow_mut().remove("a"), Some(Value::Int(1)));
        assert!(!fields.borrow().contains_key("a"));
        assert_eq!(fields.borrow().len(), 1);
    }

    #[test]
    fn entries_replace_in_place() {
        let mut fields = Fields::new();
        fields.insert(Rc::from("a"), Value::Int(1));
        fields.insert(Rc::from("b"), Value::Int(2));
        let previous = fields.insert(Rc::from("a"), Value::Int(3));

        assert_eq!(previous, Some(Value::Int(1)));
        let keys: Vec<&str> = fields.keys().map(|k| k.as_ref()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(fields.get("a"), Some(&Value::Int(3)));
        assert_eq!(fields.remove("b"), Some(Value::Int(2)));
        assert!(!fields.contains_key("b"));
    }

    #[test]
    fn entries_equality_ignores_order() {
        let a = Value::object([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let b = Value::object([("y", Value::Int(2)), ("x", Value::Int(1))]);
        assert_eq!(a, b);
    }

    #[test]
    fn debug_of_cycle_terminates() {
        let array = Value::array(vec![Value::Int(1)]);
        if let Value::Array(items) = &array {
            items.borrow_mut().push(array.clone());
        }
        let text = format!("{array:?}");
        assert!(text.starts_with("Array[Int(1), Array[Int(1)"));
        assert!(text.contains("Array(..)"));
    }

    #[test]
    fn display_is_short() {
        assert_eq!(Value::string("boom").to_string(), "boom");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Float(1e21).to_string(), "1e+21");
        assert_eq!(Value::array(vec![]).to_string(), "[array]");
    }

    #[test]
    fn as_i32_accepts_whole_floats() {
        assert_eq!(Value::Float(7.0).as_i32(), Some(7));
        assert_eq!(Value::Float(7.5).as_i32(), None);
        assert_eq!(Value::Float(3e10).as_i32(), None);
    }

    #[test]
    fn opaque_keeps_type_name() {
        let value = Value::opaque(42u8);
        match &value {
            Value::Opaque(opaque) => {
                assert_eq!(opaque.type_name(), "u8");
                assert_eq!(opaque.downcast_ref::<u8>(), Some(&42));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
