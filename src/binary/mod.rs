//! The binary octet-stream format (§4.2, §4.3).

pub mod decode;
pub mod encode;

pub use decode::{decode, decode_raw};
pub use encode::{encode, encode_raw, VERSION};
