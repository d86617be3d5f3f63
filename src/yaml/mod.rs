//! Bidirectional YAML 1.2 subset (§4.5, §4.6).

pub mod emit;
pub mod parse;

pub use emit::emit;
pub use parse::parse;
