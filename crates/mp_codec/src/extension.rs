/// The `(type code, payload length)` header of an extension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionHeader {
    pub type_code: i8,
    pub length: u32,
}

impl ExtensionHeader {
    #[inline]
    pub const fn new(type_code: i8, length: u32) -> Self {
        Self { type_code, length }
    }
}

/// An extension value borrowed from the decode buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension<'a> {
    pub header: ExtensionHeader,
    pub data: &'a [u8],
}

impl Extension<'_> {
    #[inline]
    pub const fn type_code(&self) -> i8 {
        self.header.type_code
    }
}
