// Licensed under the Apache-2.0 license

use std::cell::RefCell;

use ureg::{AccessWidth, MmioFault};

use crate::{Bus, RvAddr};

/// An MMIO implementation that reads and writes to a `te_emu_bus::Bus`.
///
/// Addresses handed to the driver are used as bus addresses; bus faults come
/// back as `MmioFault`.
pub struct BusMmio<TBus: Bus> {
    bus: RefCell<TBus>,
}

impl<TBus: Bus> BusMmio<TBus> {
    pub fn new(bus: TBus) -> Self {
        Self {
            bus: RefCell::new(bus),
        }
    }

    pub fn into_inner(self) -> TBus {
        self.bus.into_inner()
    }

    fn bus_addr(addr: usize) -> Result<RvAddr, MmioFault> {
        RvAddr::try_from(addr).map_err(|_| MmioFault { addr })
    }
}

impl<TBus: Bus> ureg::Mmio for BusMmio<TBus> {
    fn read(&self, width: AccessWidth, addr: usize) -> Result<u64, MmioFault> {
        self.bus
            .borrow_mut()
            .read(width.into(), Self::bus_addr(addr)?)
            .map_err(|_| MmioFault { addr })
    }

    fn write(&self, width: AccessWidth, addr: usize, val: u64) -> Result<(), MmioFault> {
        self.bus
            .borrow_mut()
            .write(width.into(), Self::bus_addr(addr)?, val & width.mask())
            .map_err(|_| MmioFault { addr })
    }
}

#[cfg(test)]
mod tests {
    use crate::Ram;
    use ureg::Mmio;

    use super::*;

    #[test]
    fn test_bus_mmio() {
        let mmio = BusMmio::new(Ram::zeroed(12));
        mmio.write_u32(4, 0x3abc_9321).unwrap();
        mmio.write(AccessWidth::HalfWord, 8, 0x39af).unwrap();
        mmio.write(AccessWidth::Byte, 10, 0x1f3).unwrap();

        assert_eq!(mmio.read_u32(4), Ok(0x3abc_9321));
        assert_eq!(mmio.read(AccessWidth::HalfWord, 8), Ok(0x39af));
        assert_eq!(mmio.read(AccessWidth::Byte, 10), Ok(0xf3));
        assert_eq!(mmio.read_u32(12), Err(MmioFault { addr: 12 }));
        assert_eq!(
            mmio.into_inner().data(),
            &[0x00, 0x00, 0x00, 0x00, 0x21, 0x93, 0xbc, 0x3a, 0xaf, 0x39, 0xf3, 0x00]
        );
    }
}
