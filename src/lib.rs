//! Type-directed serialization of runtime values to a compact binary wire
//! format, human-readable ASCII, and a hand-parsed YAML 1.2 subset.
//!
//! The three format modules ([`binary`], [`ascii`], [`yaml`]) share one
//! shape: a dense match on [`rtti::Type`] that recurses in lock-step with
//! the value being visited. [`rtti`], [`value`], [`arena`] and [`stream`]
//! are the collaborators that traversal is built against; in the system
//! this crate is extracted from they are supplied externally, but nothing
//! else in this packaging provides them, so concrete, minimal
//! implementations live here instead.

pub mod arena;
pub mod ascii;
pub mod binary;
pub mod error;
pub mod rtti;
pub mod stream;
pub mod unmanaged;
pub mod value;
pub mod yaml;

pub use error::{Error, Result};
pub use value::Value;
