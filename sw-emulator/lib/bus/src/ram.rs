/*++

Licensed under the Apache-2.0 license.

File Name:

    ram.rs

Abstract:

    File contains implementation of RAM

--*/

use crate::{Bus, BusError, RvAddr, RvData, RvSize};

/// Little-endian byte-addressable memory
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    /// Create new RAM
    ///
    /// # Arguments
    ///
    /// * `data` - Initial contents of the RAM
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn zeroed(size: usize) -> Self {
        Self::new(vec![0u8; size])
    }

    pub fn mmap_size(&self) -> RvAddr {
        self.data.len() as RvAddr
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn range(&self, size: RvSize, addr: RvAddr) -> Option<std::ops::Range<usize>> {
        let start = addr as usize;
        let end = start.checked_add(size.bytes())?;
        (end <= self.data.len()).then_some(start..end)
    }
}

impl Bus for Ram {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        if addr as usize % size.bytes() != 0 {
            return Err(BusError::LoadAddrMisaligned);
        }
        let range = self.range(size, addr).ok_or(BusError::LoadAccessFault)?;
        let mut bytes = [0u8; 8];
        bytes[..size.bytes()].copy_from_slice(&self.data[range]);
        Ok(u64::from_le_bytes(bytes))
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        if addr as usize % size.bytes() != 0 {
            return Err(BusError::StoreAddrMisaligned);
        }
        let range = self.range(size, addr).ok_or(BusError::StoreAccessFault)?;
        self.data[range].copy_from_slice(&val.to_le_bytes()[..size.bytes()]);
        Ok(())
    }
}
