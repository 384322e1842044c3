/*++

Licensed under the Apache-2.0 license.

File Name:

    types.rs

Abstract:

    File contains the address and data types used by the emulated bus.

--*/
use ureg::AccessWidth;

/// Physical address on the emulated bus
pub type RvAddr = u32;

/// Data carried by one bus access, zero-extended
pub type RvData = u64;

/// Size of a bus access
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RvSize {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
    DoubleWord = 8,
}

impl RvSize {
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

impl From<AccessWidth> for RvSize {
    fn from(width: AccessWidth) -> Self {
        match width {
            AccessWidth::Byte => Self::Byte,
            AccessWidth::HalfWord => Self::HalfWord,
            AccessWidth::Word => Self::Word,
            AccessWidth::DoubleWord => Self::DoubleWord,
        }
    }
}
