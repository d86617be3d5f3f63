//! The in-memory value model the traversal engine walks.
//!
//! The authoritative regime described by the type descriptors is flat
//! layout: primitives inline, compounds at declared offsets, and a handful
//! of heap-backed kinds (`String`, `Blob`, `Array`, `List`, `Unmanaged`)
//! reached through a single pointer-sized header. This crate represents that
//! same shape as a safe tree instead of raw bytes plus offset arithmetic —
//! the alternative the design notes call out as preferable "when raw-byte
//! inspection of host values is not required" (see DESIGN.md). `Field`/`Item`
//! offsets on the RTTI side are unaffected and still describe the flat
//! layout a host embedding this crate would actually use.

use std::cell::RefCell;
use std::rc::Rc;

use crate::unmanaged::UnmanagedValue;

pub type UnmanagedHandle = Rc<RefCell<Box<dyn UnmanagedValue>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    /// 32-bit fixed-point, scale factor 1000.
    Fixed(i32),
    Boolean(bool),
    Char(i32),
    String(Rc<str>),
    Blob(Rc<[u8]>),
    /// Field values in declared order, one per `Type::Record` field.
    Record(Vec<Value>),
    /// Field values in declared order, one per `Type::Tuple` field.
    Tuple(Vec<Value>),
    Array(Vec<Value>),
    List(Vec<Value>),
    Custom { variant: u8, fields: Vec<Value> },
    Unmanaged(UnmanagedHandle),
}

impl Value {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) | Value::Char(v) | Value::Fixed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Structural equality used by round-trip tests. `Unmanaged` values
    /// compare equal only by pointer identity since the core never inspects
    /// their contents (mirrors the opaque `ptr` of the source).
    pub fn structurally_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Fixed(a), Value::Fixed(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Record(a), Value::Record(b))
            | (Value::Tuple(a), Value::Tuple(b))
            | (Value::Array(a), Value::Array(b))
            | (Value::List(a), Value::List(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.structurally_equal(y))
            }
            (
                Value::Custom { variant: va, fields: fa },
                Value::Custom { variant: vb, fields: fb },
            ) => {
                va == vb
                    && fa.len() == fb.len()
                    && fa.iter().zip(fb.iter()).all(|(x, y)| x.structurally_equal(y))
            }
            (Value::Unmanaged(a), Value::Unmanaged(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
