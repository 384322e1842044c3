/*++

Licensed under the Apache-2.0 license.

File Name:

    mem_map.rs

Abstract:

    File contains an identity-mapped MMU model with temporary mapping bookkeeping.

--*/

use std::cell::{Cell, RefCell};

use te_drivers::MemoryMap;
use te_emu_bus::testing::Log;
use te_error::{TeError, TeResult};

/// Virtual addresses equal physical ones. Only the bookkeeping is modelled.
pub struct EmuMemMap {
    pub log: Log,
    static_regions: Vec<(u32, u32)>,
    live: RefCell<Vec<(usize, u32)>>,
    fail_map: Cell<bool>,
    fail_unmap: Cell<bool>,
}

impl EmuMemMap {
    pub fn new(static_regions: Vec<(u32, u32)>) -> Self {
        Self {
            log: Log::new(),
            static_regions,
            live: RefCell::new(Vec::new()),
            fail_map: Cell::new(false),
            fail_unmap: Cell::new(false),
        }
    }

    /// Temporary mappings that are still in place.
    pub fn live_mappings(&self) -> Vec<(usize, u32)> {
        self.live.borrow().clone()
    }

    pub fn fail_map(&self, fail: bool) {
        self.fail_map.set(fail);
    }

    pub fn fail_unmap(&self, fail: bool) {
        self.fail_unmap.set(fail);
    }
}

impl MemoryMap for EmuMemMap {
    fn static_va(&self, pa: u32, len: u32) -> Option<usize> {
        let end = u64::from(pa) + u64::from(len);
        self.static_regions
            .iter()
            .any(|&(base, size)| pa >= base && end <= u64::from(base) + u64::from(size))
            .then_some(pa as usize)
    }

    fn add_mapping(&self, pa: u32, len: u32) -> TeResult<usize> {
        self.log.record(format_args!("map({pa:#010x}, {len:#x})"));
        if self.fail_map.get() {
            return Err(TeError::DRIVER_MMU_MAP_FAILED);
        }
        let va = pa as usize;
        self.live.borrow_mut().push((va, len));
        Ok(va)
    }

    fn remove_mapping(&self, va: usize, len: u32) -> TeResult<()> {
        self.log.record(format_args!("unmap({va:#010x}, {len:#x})"));
        if self.fail_unmap.get() {
            return Err(TeError::DRIVER_MMU_UNMAP_FAILED);
        }
        let mut live = self.live.borrow_mut();
        match live.iter().position(|m| *m == (va, len)) {
            Some(idx) => {
                live.remove(idx);
                Ok(())
            }
            None => Err(TeError::DRIVER_MMU_UNMAP_FAILED),
        }
    }
}
