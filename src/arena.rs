//! Arena collaborator (§6): an append-only allocator the decoder fills but
//! never frees from. Two arenas are threaded through every decode: one for
//! ordinary dynamic values, one for unmanaged host objects, matching the
//! source's separation of `arena` and `unmanaged_arena`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::Result;
use crate::unmanaged::{require_factory, UnmanagedFactory};
use crate::value::{UnmanagedHandle, Value};

/// General dynamic arena: strings, blobs, arrays, lists, records.
#[derive(Default)]
pub struct Arena {
    allocations: Cell<u64>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_string(&self, bytes: &[u8]) -> Rc<str> {
        self.allocations.set(self.allocations.get() + 1);
        Rc::from(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn alloc_blob(&self, bytes: &[u8]) -> Rc<[u8]> {
        self.allocations.set(self.allocations.get() + 1);
        Rc::from(bytes)
    }

    /// Returns a value buffer prepared to hold `count` items; the caller
    /// fills it in declared order, mirroring `allocArrayPrepared`'s
    /// uninitialized-but-sized header.
    pub fn alloc_array_prepared(&self, count: usize) -> Vec<Value> {
        self.allocations.set(self.allocations.get() + 1);
        Vec::with_capacity(count)
    }

    pub fn alloc_list_prepared(&self, count: usize) -> Vec<Value> {
        self.allocations.set(self.allocations.get() + 1);
        Vec::with_capacity(count)
    }

    /// Number of dynamic allocations made through this arena so far.
    pub fn allocation_count(&self) -> u64 {
        self.allocations.get()
    }
}

/// Arena for host-defined opaque (`Unmanaged`) objects.
#[derive(Default)]
pub struct UnmanagedArena {
    allocations: Cell<u64>,
}

impl UnmanagedArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_unmanaged(
        &self,
        factory: &dyn UnmanagedFactory,
        type_name: &str,
    ) -> Result<UnmanagedHandle> {
        let value = require_factory(factory, type_name)?;
        self.allocations.set(self.allocations.get() + 1);
        Ok(Rc::new(RefCell::new(value)))
    }

    pub fn allocation_count(&self) -> u64 {
        self.allocations.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn arena_counts_allocations() {
        let arena = Arena::new();
        arena.alloc_string(b"hi");
        arena.alloc_blob(&[1, 2, 3]);
        assert_eq!(arena.allocation_count(), 2);
    }

    #[test]
    fn alloc_string_is_lossy_utf8() {
        let arena = Arena::new();
        let s = arena.alloc_string(b"hello");
        assert_eq!(&*s, "hello");
    }

    #[test]
    fn unmanaged_arena_without_factory_errors() {
        let arena = UnmanagedArena::new();
        let err = arena.alloc_unmanaged(&crate::unmanaged::NoUnmanagedFactory, "Foo").unwrap_err();
        assert!(matches!(err, Error::MissingUnmanagedFactory(name) if name == "Foo"));
    }
}
