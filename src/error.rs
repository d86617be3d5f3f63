//! Stable error surface for the traversal engine.
//!
//! The wire contract promises a small set of stable negative integer codes
//! (see the binary/YAML format documentation). [`Error::code`] recovers that
//! integer for callers that still need to match on it, while the enum itself
//! carries a proper diagnostic message for logs.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("cannot serialize value of this type")]
    CannotSerialize,

    #[error("unsupported version header {0}.{1}.{2}, expected 0.1.*")]
    UnsupportedVersion(u8, u8, u8),

    #[error("unmanaged type '{0}' has no registered factory")]
    MissingUnmanagedFactory(String),

    #[error("yaml format error: {0}")]
    YamlFormat(String),

    #[error("unknown variant '{variant}' for custom type '{type_name}'")]
    UnknownVariant { type_name: String, variant: String },

    #[error("expected boolean literal or end of line not found")]
    ExpectedBooleanOrEol,

    #[error("expected field '{expected}' but found '{found}'")]
    FieldNameMismatch { expected: String, found: String },

    #[error("missing ':' after field name '{0}'")]
    MissingColon(String),

    #[error("arity mismatch: expected {expected} fields, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("{kind} length {len} exceeds 1-byte prefix capacity")]
    LengthOverflow { kind: &'static str, len: usize },

    #[error("output buffer too small, need at least {needed} bytes")]
    BufferTooSmall { needed: usize },
}

impl Error {
    /// The stable legacy error code for this variant.
    pub fn code(&self) -> i32 {
        match self {
            Error::CannotSerialize | Error::UnsupportedVersion(..) => -1,
            Error::MissingUnmanagedFactory(_) => -2,
            Error::YamlFormat(_) | Error::UnknownVariant { .. } => -4,
            Error::ExpectedBooleanOrEol => -5,
            Error::FieldNameMismatch { .. } | Error::MissingColon(_) => -6,
            Error::ArityMismatch { .. } => -48,
            Error::UnexpectedEof | Error::LengthOverflow { .. } | Error::BufferTooSmall { .. } => -1,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
