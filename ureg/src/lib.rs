// Licensed under the Apache-2.0 license

//! Register access capability.
//!
//! Drivers never dereference device addresses themselves. They are handed an
//! `Mmio` implementation at construction: `RealMmio` on silicon, or a bus
//! adapter from the emulator in tests.
#![cfg_attr(not(test), no_std)]

/// Width of a single memory-mapped access.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessWidth {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
    DoubleWord = 8,
}

impl AccessWidth {
    /// Maps a width in bits to an access width.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::Byte),
            16 => Some(Self::HalfWord),
            32 => Some(Self::Word),
            64 => Some(Self::DoubleWord),
            _ => None,
        }
    }

    pub const fn bytes(self) -> usize {
        self as usize
    }

    pub const fn bits(self) -> u32 {
        (self as u32) * 8
    }

    /// Mask covering every bit an access of this width can carry.
    pub const fn mask(self) -> u64 {
        match self {
            Self::DoubleWord => u64::MAX,
            _ => (1u64 << self.bits()) - 1,
        }
    }
}

/// A faulting access. The address is the one the driver issued.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MmioFault {
    pub addr: usize,
}

pub trait Mmio {
    /// Loads `width` bytes from `addr`. The value is zero-extended.
    fn read(&self, width: AccessWidth, addr: usize) -> Result<u64, MmioFault>;

    /// Stores the low `width` bytes of `val` to `addr`.
    fn write(&self, width: AccessWidth, addr: usize, val: u64) -> Result<(), MmioFault>;

    fn read_u32(&self, addr: usize) -> Result<u32, MmioFault> {
        Ok(self.read(AccessWidth::Word, addr)? as u32)
    }

    fn write_u32(&self, addr: usize, val: u32) -> Result<(), MmioFault> {
        self.write(AccessWidth::Word, addr, val.into())
    }
}

impl<T: Mmio + ?Sized> Mmio for &T {
    fn read(&self, width: AccessWidth, addr: usize) -> Result<u64, MmioFault> {
        (**self).read(width, addr)
    }

    fn write(&self, width: AccessWidth, addr: usize, val: u64) -> Result<(), MmioFault> {
        (**self).write(width, addr, val)
    }
}

/// Volatile accesses to real device memory.
#[derive(Debug)]
pub struct RealMmio(());

impl RealMmio {
    /// # Safety
    ///
    /// Every address later passed to this value must be a mapped device (or
    /// memory) address that tolerates volatile accesses of the given width,
    /// aligned to that width.
    pub const unsafe fn new() -> Self {
        Self(())
    }
}

impl Mmio for RealMmio {
    fn read(&self, width: AccessWidth, addr: usize) -> Result<u64, MmioFault> {
        if addr % width.bytes() != 0 {
            return Err(MmioFault { addr });
        }
        // SAFETY: the constructor's contract covers every address handed in.
        unsafe {
            Ok(match width {
                AccessWidth::Byte => core::ptr::read_volatile(addr as *const u8).into(),
                AccessWidth::HalfWord => core::ptr::read_volatile(addr as *const u16).into(),
                AccessWidth::Word => core::ptr::read_volatile(addr as *const u32).into(),
                AccessWidth::DoubleWord => core::ptr::read_volatile(addr as *const u64),
            })
        }
    }

    fn write(&self, width: AccessWidth, addr: usize, val: u64) -> Result<(), MmioFault> {
        if addr % width.bytes() != 0 {
            return Err(MmioFault { addr });
        }
        // SAFETY: the constructor's contract covers every address handed in.
        unsafe {
            match width {
                AccessWidth::Byte => core::ptr::write_volatile(addr as *mut u8, val as u8),
                AccessWidth::HalfWord => core::ptr::write_volatile(addr as *mut u16, val as u16),
                AccessWidth::Word => core::ptr::write_volatile(addr as *mut u32, val as u32),
                AccessWidth::DoubleWord => core::ptr::write_volatile(addr as *mut u64, val),
            }
        }
        Ok(())
    }
}
