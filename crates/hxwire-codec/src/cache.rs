//! Reference and string caches.
//!
//! Both sides keep two disjoint, append-only tables addressed by insertion
//! order: one for composite values, one for strings. The encoder looks
//! values up by identity and strings by content; the decoder only ever
//! appends and indexes.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::error::{CodecError, Result};
use crate::value::{Value, ValueKind};

/// Encode-side object table keyed by identity.
///
/// Identity is the pair of value kind and handle address, so two values of
/// different kinds never match even if they share storage. Entries hold a
/// clone of the handle, which keeps every address live and unique for the
/// lifetime of the table.
#[derive(Debug, Default)]
pub struct ObjectCache {
    entries: Vec<Value>,
    index: HashMap<(ValueKind, usize), usize>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of a previously registered value.
    pub fn lookup(&self, value: &Value) -> Option<usize> {
        let key = value.identity()?;
        self.index.get(&key).copied()
    }

    /// Append `value` and return its index. Values without identity are not
    /// cached and return `None`.
    pub fn register(&mut self, value: &Value) -> Option<usize> {
        let key = value.identity()?;
        let index = self.entries.len();
        self.entries.push(value.clone());
        self.index.insert(key, index);
        Some(index)
    }

    /// Look `value` up; on a miss, register it.
    ///
    /// Returns `Some(index)` on a hit and `None` after registering.
    pub fn lookup_or_register(&mut self, value: &Value) -> Option<usize> {
        if let Some(index) = self.lookup(value) {
            trace!(index, kind = value.kind().name(), "object cache hit");
            return Some(index);
        }
        self.register(value);
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Encode-side string table keyed by content.
#[derive(Debug, Default)]
pub struct StringTable {
    indices: HashMap<Rc<str>, usize>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `s` if it was interned before; otherwise assign the next
    /// index and return `None`.
    pub fn intern(&mut self, s: &str) -> Option<usize> {
        if let Some(index) = self.indices.get(s) {
            return Some(*index);
        }
        let index = self.indices.len();
        self.indices.insert(Rc::from(s), index);
        None
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Decode-side tables, appended in encounter order.
#[derive(Debug, Default)]
pub struct DecodeCache {
    objects: Vec<Value>,
    strings: Vec<Rc<str>>,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_object(&mut self, value: Value) {
        self.objects.push(value);
    }

    pub fn push_string(&mut self, s: Rc<str>) {
        self.strings.push(s);
    }

    /// Resolve an `r<index>` back-reference.
    pub fn object(&self, index: i64) -> Result<Value> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.objects.get(i))
            .cloned()
            .ok_or(CodecError::InvalidReference {
                index,
                len: self.objects.len(),
            })
    }

    /// Resolve an `R<index>` back-reference.
    pub fn string(&self, index: i64) -> Result<Rc<str>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .cloned()
            .ok_or(CodecError::InvalidStringReference {
                index,
                len: self.strings.len(),
            })
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }
}
