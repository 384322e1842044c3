/*++

Licensed under the Apache-2.0 license.

File Name:

    dynamic_bus.rs

Abstract:

    File contains the address decoder that routes accesses to the emulated
    SoC devices.

--*/

use std::fmt;

use crate::{Bus, BusError, RvAddr, RvData, RvSize};

struct Window {
    name: String,
    base: RvAddr,
    /// Last decoded address, inclusive
    last: RvAddr,
    dev: Box<dyn Bus>,
}

impl Window {
    fn contains(&self, addr: RvAddr) -> bool {
        self.base <= addr && addr <= self.last
    }
}

/// Reasons a device cannot be attached.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AttachError {
    EmptyWindow { name: String },
    Overlap { name: String, other: String },
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyWindow { name } => write!(f, "device {name} has an empty window"),
            Self::Overlap { name, other } => write!(f, "device {name} overlaps device {other}"),
        }
    }
}

impl std::error::Error for AttachError {}

/// Decodes physical addresses to the devices attached at runtime. Devices
/// see offsets from the base of their window.
#[derive(Default)]
pub struct DynamicBus {
    /// Sorted by base address, never overlapping
    windows: Vec<Window>,
}

impl DynamicBus {
    pub fn new() -> DynamicBus {
        Self::default()
    }

    /// Decodes `len` bytes starting at `base` to `dev`.
    pub fn attach(
        &mut self,
        name: &str,
        base: RvAddr,
        len: u32,
        dev: Box<dyn Bus>,
    ) -> Result<(), AttachError> {
        let last = match len.checked_sub(1).and_then(|span| base.checked_add(span)) {
            Some(last) => last,
            None => {
                return Err(AttachError::EmptyWindow { name: name.into() });
            }
        };
        let index = self.windows.partition_point(|w| w.base < base);
        let neighbours = [index.checked_sub(1), Some(index)];
        for other in neighbours.into_iter().flatten().filter_map(|i| self.windows.get(i)) {
            if base <= other.last && other.base <= last {
                return Err(AttachError::Overlap {
                    name: name.into(),
                    other: other.name.clone(),
                });
            }
        }
        self.windows.insert(
            index,
            Window {
                name: name.into(),
                base,
                last,
                dev,
            },
        );
        Ok(())
    }

    /// Names of the attached devices in address order.
    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.windows.iter().map(|w| w.name.as_str())
    }

    fn decode(&mut self, addr: RvAddr) -> Option<(&mut Box<dyn Bus>, RvAddr)> {
        let index = self.windows.partition_point(|w| w.last < addr);
        let window = self.windows.get_mut(index).filter(|w| w.contains(addr))?;
        Some((&mut window.dev, addr - window.base))
    }
}

impl Bus for DynamicBus {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        match self.decode(addr) {
            Some((dev, offset)) => dev.read(size, offset),
            None => Err(BusError::LoadAccessFault),
        }
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        match self.decode(addr) {
            Some((dev, offset)) => dev.write(size, offset, val),
            None => Err(BusError::StoreAccessFault),
        }
    }
}
