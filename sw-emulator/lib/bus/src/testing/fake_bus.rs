/*++

Licensed under the Apache-2.0 license.

File Name:

    fake_bus.rs

Abstract:

    File contains a scripted register file implementing the Bus trait.

--*/
use crate::{testing::Log, Bus, BusError, RvAddr, RvData, RvSize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Bus that stores writes, plays back scripted reads and records every
/// access in `log`.
///
/// A read returns the next scripted value for its address if one is queued,
/// otherwise the last value written there, otherwise zero.
#[derive(Default)]
pub struct FakeBus {
    pub log: Log,
    regs: HashMap<RvAddr, RvData>,
    scripted: HashMap<RvAddr, VecDeque<RvData>>,
    faults: HashSet<RvAddr>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues values for successive reads of `addr`.
    pub fn script(&mut self, addr: RvAddr, vals: &[RvData]) {
        self.scripted.entry(addr).or_default().extend(vals);
    }

    /// Makes every access to `addr` fault.
    pub fn fault(&mut self, addr: RvAddr) {
        self.faults.insert(addr);
    }

    pub fn reg(&self, addr: RvAddr) -> Option<RvData> {
        self.regs.get(&addr).copied()
    }

    fn suffix(size: RvSize) -> char {
        match size {
            RvSize::Byte => 'b',
            RvSize::HalfWord => 'h',
            RvSize::Word => 'w',
            RvSize::DoubleWord => 'd',
        }
    }
}

impl Bus for FakeBus {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        if self.faults.contains(&addr) {
            self.log
                .record(format_args!("read.{} {addr:#010x} fault", Self::suffix(size)));
            return Err(BusError::LoadAccessFault);
        }
        let val = match self.scripted.get_mut(&addr).and_then(VecDeque::pop_front) {
            Some(val) => val,
            None => self.regs.get(&addr).copied().unwrap_or(0),
        };
        self.log
            .record(format_args!("read.{} {addr:#010x} -> {val:#x}", Self::suffix(size)));
        Ok(val)
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        if self.faults.contains(&addr) {
            self.log
                .record(format_args!("write.{} {addr:#010x} fault", Self::suffix(size)));
            return Err(BusError::StoreAccessFault);
        }
        self.log
            .record(format_args!("write.{} {addr:#010x} <- {val:#x}", Self::suffix(size)));
        self.regs.insert(addr, val);
        Ok(())
    }
}
