//! The unmanaged extension point (§4.7).
//!
//! The source expresses this as three raw function pointers installed into a
//! slot by a caller-supplied factory callback. The idiomatic Rust shape for
//! "a capability registered by the host, invoked by the core without the
//! core inspecting its internals" is a trait object behind a registry, so
//! that is what this crate exposes instead of a `(ptr, fn, fn, fn)` tuple.

use std::fmt;

use crate::error::{Error, Result};
use crate::stream::{InStream, OutStream};

/// A host-constructed opaque value. The core never inspects its contents; it
/// only calls the three methods below, mirroring `serialize`/`deSerialize`/
/// `toString` in the source.
pub trait UnmanagedValue: fmt::Debug {
    fn serialize(&self, sink: &mut OutStream) -> Result<()>;
    fn deserialize(&mut self, source: &mut InStream) -> Result<()>;
    fn to_ascii(&self) -> String;
}

/// Registered per unmanaged type name; constructs a fresh [`UnmanagedValue`]
/// to be filled in by `deserialize`. Stands in for the source's
/// `(context, unmanaged_type_descriptor, target_slot) -> void` factory
/// callback.
pub trait UnmanagedFactory {
    fn create(&self, type_name: &str) -> Option<Box<dyn UnmanagedValue>>;
}

/// A factory that never produces anything, used when the caller has not
/// registered unmanaged support. Decoding any `Unmanaged` type against it
/// fails with [`Error::MissingUnmanagedFactory`] (error code −2), matching
/// scenario S6.
pub struct NoUnmanagedFactory;

impl UnmanagedFactory for NoUnmanagedFactory {
    fn create(&self, _type_name: &str) -> Option<Box<dyn UnmanagedValue>> {
        None
    }
}

pub(crate) fn require_factory(
    factory: &dyn UnmanagedFactory,
    type_name: &str,
) -> Result<Box<dyn UnmanagedValue>> {
    factory.create(type_name).ok_or_else(|| {
        tracing::warn!(type_name, "unmanaged value has no registered factory");
        Error::MissingUnmanagedFactory(type_name.to_string())
    })
}
