/*++

Licensed under the Apache-2.0 license.

File Name:

    status_reg.rs

Abstract:

    File contains access to the boot status scratch registers.

--*/
use crate::memory_map::MemoryMap;
use te_error::{TeError, TeResult};
use te_registers::soc;
use ureg::Mmio;

/// The offsets are shared with the other boot stages and must not change.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StatusReg {
    ResetCause,
    BootCnt,
}

impl StatusReg {
    pub fn phys_addr(self) -> u32 {
        match self {
            Self::ResetCause => soc::RESET_CAUSE,
            Self::BootCnt => soc::BOOT_CNT,
        }
    }
}

/// Status registers live in the statically mapped peripheral window.
pub struct StatusRegs<'a> {
    pub mmio: &'a dyn Mmio,
    pub map: &'a dyn MemoryMap,
}

impl StatusRegs<'_> {
    fn va(&self, reg: StatusReg) -> TeResult<usize> {
        self.map
            .static_va(reg.phys_addr(), 4)
            .ok_or(TeError::DRIVER_MMU_MAP_FAILED)
    }

    pub fn read(&self, reg: StatusReg) -> TeResult<u32> {
        self.mmio
            .read_u32(self.va(reg)?)
            .map_err(|_| TeError::DRIVER_MMIO_FAULT)
    }

    pub fn write(&self, reg: StatusReg, val: u32) -> TeResult<()> {
        self.mmio
            .write_u32(self.va(reg)?, val)
            .map_err(|_| TeError::DRIVER_MMIO_FAULT)
    }
}
