//! Pretty-printer flags (§4.4): a bitfield controlling alias prefixes, blob
//! rendering, and the custom-type prefix.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintFlags(u32);

impl PrintFlags {
    pub const ALIAS: u32 = 0x01;
    pub const BLOB_EXPANDED: u32 = 0x02;
    pub const BLOB_ASCII: u32 = 0x04;
    pub const BLOB_AUTO_FORMAT: u32 = 0x08;
    pub const CUSTOM_TYPE_VARIANT_PREFIX: u32 = 0x10;

    /// Internal, one-shot variants of [`Self::ALIAS`] and the no-color
    /// printer's quote suppression; not meant to be set by callers directly,
    /// hence not exposed through [`Self::with`].
    pub(crate) const ALIAS_ONCE: u32 = 0x20;
    pub(crate) const NO_STRING_QUOTES_ONCE: u32 = 0x40;

    pub fn new() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn with(mut self, bit: u32) -> Self {
        self.0 |= bit;
        self
    }

    pub fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    #[must_use]
    pub(crate) fn without(mut self, bit: u32) -> Self {
        self.0 &= !bit;
        self
    }
}
