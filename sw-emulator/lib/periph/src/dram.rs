/*++

Licensed under the Apache-2.0 license.

File Name:

    dram.rs

Abstract:

    File contains the emulated DRAM shared by the host caches and the enclave.

--*/

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use te_drivers::Dcache;
use te_emu_bus::{BusError, Ram};

/// Physical base of emulated DRAM. The transfer buffer lives at its start.
pub const DRAM_BASE: u32 = 0x9000_0000;
pub const DRAM_SIZE: usize = 0x1_0000;

/// Physically addressed view of a RAM that several devices share.
#[derive(Clone)]
pub struct Dram {
    ram: Rc<RefCell<Ram>>,
    base: u32,
}

impl Default for Dram {
    fn default() -> Self {
        Self::new(DRAM_BASE, DRAM_SIZE)
    }
}

impl Dram {
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            ram: Rc::new(RefCell::new(Ram::zeroed(size))),
            base,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// The backing RAM, for attaching to a bus.
    pub fn ram(&self) -> Rc<RefCell<Ram>> {
        self.ram.clone()
    }

    fn range(&self, pa: u32, len: usize) -> Option<std::ops::Range<usize>> {
        let start = pa.checked_sub(self.base)? as usize;
        let end = start.checked_add(len)?;
        (end <= self.ram.borrow().data().len()).then_some(start..end)
    }

    pub fn read(&self, pa: u32, out: &mut [u8]) -> Result<(), BusError> {
        let range = self
            .range(pa, out.len())
            .ok_or(BusError::LoadAccessFault)?;
        out.copy_from_slice(&self.ram.borrow().data()[range]);
        Ok(())
    }

    pub fn write(&self, pa: u32, data: &[u8]) -> Result<(), BusError> {
        let range = self
            .range(pa, data.len())
            .ok_or(BusError::StoreAccessFault)?;
        self.ram.borrow_mut().data_mut()[range].copy_from_slice(data);
        Ok(())
    }

    pub fn read_u32(&self, pa: u32) -> Result<u32, BusError> {
        let mut word = [0u8; 4];
        self.read(pa, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    pub fn write_u32(&self, pa: u32, val: u32) -> Result<(), BusError> {
        self.write(pa, &val.to_le_bytes())
    }
}

/// Write-back data cache in front of `Dram`.
///
/// Cleaning copies CPU-side bytes out to DRAM; invalidating reloads them.
pub struct EmuDcache {
    dram: Dram,
    cleans: Cell<u32>,
    invalidates: Cell<u32>,
}

impl EmuDcache {
    pub fn new(dram: Dram) -> Self {
        Self {
            dram,
            cleans: Cell::new(0),
            invalidates: Cell::new(0),
        }
    }

    pub fn cleans(&self) -> u32 {
        self.cleans.get()
    }

    pub fn invalidates(&self) -> u32 {
        self.invalidates.get()
    }
}

impl Dcache for EmuDcache {
    fn clean_range(&self, pa: u32, data: &[u8]) {
        self.cleans.set(self.cleans.get() + 1);
        if self.dram.write(pa, data).is_err() {
            println!("[emu] clean of unbacked range {pa:#010x}+{:#x}", data.len());
        }
    }

    fn invalidate_range(&self, pa: u32, data: &mut [u8]) {
        self.invalidates.set(self.invalidates.get() + 1);
        if self.dram.read(pa, data).is_err() {
            println!("[emu] invalidate of unbacked range {pa:#010x}+{:#x}", data.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dram_bounds() {
        let dram = Dram::new(0x1000, 16);
        dram.write_u32(0x100c, 0xfeed_f00d).unwrap();
        assert_eq!(dram.read_u32(0x100c), Ok(0xfeed_f00d));
        assert_eq!(dram.read_u32(0x100d), Err(BusError::LoadAccessFault));
        assert_eq!(dram.write(0xfff, &[1]), Err(BusError::StoreAccessFault));
    }

    #[test]
    fn test_cache_round_trip() {
        let dram = Dram::new(0x1000, 16);
        let cache = EmuDcache::new(dram.clone());
        cache.clean_range(0x1004, &[1, 2, 3]);
        dram.write(0x1005, &[9]).unwrap();
        let mut out = [0u8; 3];
        cache.invalidate_range(0x1004, &mut out);
        assert_eq!(out, [1, 9, 3]);
        assert_eq!((cache.cleans(), cache.invalidates()), (1, 1));
    }
}
