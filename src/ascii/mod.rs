//! Human-readable ASCII rendering (§4.4). One-way: not meant to be parsed
//! back (see the YAML module for the round-trippable textual format).

pub mod flags;
pub mod printer;

pub use flags::PrintFlags;
pub use printer::{print_colored, print_into, print_plain};
