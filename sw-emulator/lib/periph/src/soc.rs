/*++

Licensed under the Apache-2.0 license.

File Name:

    soc.rs

Abstract:

    File contains the emulated SoC that wires enclave mailboxes and platform seams together.

--*/

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use te_drivers::{Enclave, TeBuf, TeHw, TeMailbox};
use te_emu_bus::{AttachError, BusMmio, DynamicBus, Ram};
use te_registers::{mailbox, soc};
use ureg::{Mmio, MmioFault};

use crate::dram::{Dram, EmuDcache};
use crate::i2c::EmuI2c;
use crate::mem_map::EmuMemMap;
use crate::otp::EmuOtp;
use crate::smc::EmuSmc;
use crate::te_mailbox::{ResponseMode, TeMailboxPeriph};
use crate::timer::EmuTimer;

pub const PAGE_SIZE: u32 = 0x1000;

/// System configuration page holding the memory-proxy registers.
pub const SYS_CFG_PAGE: u32 = 0x2010_3000;
pub const SEC_SYS_CFG_PAGE: u32 = 0x2410_3000;

/// Boot ROM status page. It sits outside the statically mapped windows.
pub const BOOT_STATUS_PAGE: u32 = 0x1829_1000;

const SCRATCH_PAGE: u32 = soc::A55_SYS_CFG + soc::SCRATCH;
const SEC_HOST_BOOT_PAGE: u32 = soc::SEC_HOST_BOOT_READY & !(PAGE_SIZE - 1);

pub struct EmuSocBuilder {
    dual_tile: bool,
    response: ResponseMode,
    timer_step_us: u64,
}

impl Default for EmuSocBuilder {
    fn default() -> Self {
        Self {
            dual_tile: false,
            response: ResponseMode::AfterPolls(1),
            timer_step_us: 1000,
        }
    }
}

impl EmuSocBuilder {
    pub fn dual_tile(mut self, dual_tile: bool) -> Self {
        self.dual_tile = dual_tile;
        self
    }

    /// Response behaviour of every enclave.
    pub fn response(mut self, response: ResponseMode) -> Self {
        self.response = response;
        self
    }

    pub fn timer_step_us(mut self, step_us: u64) -> Self {
        self.timer_step_us = step_us;
        self
    }

    pub fn build(self) -> Result<EmuSoc, AttachError> {
        let dram = Dram::default();
        let mut bus = DynamicBus::new();

        let mailbox_periph = |bus: &mut DynamicBus, name: &str, base: u32| {
            let mut periph = TeMailboxPeriph::new(dram.clone());
            periph.response = self.response;
            let periph = Rc::new(RefCell::new(periph));
            bus.attach(name, base, mailbox::WINDOW_SIZE as u32, Box::new(periph.clone()))
                .map(|_| periph)
        };
        let primary = mailbox_periph(&mut bus, "te_mailbox", soc::TE_MAILBOX_BASE)?;
        let secondary = if self.dual_tile {
            Some(mailbox_periph(&mut bus, "sec_te_mailbox", soc::SEC_TE_MAILBOX_BASE)?)
        } else {
            None
        };

        let mut pages = vec![
            ("scratch", SCRATCH_PAGE),
            ("sys_cfg", SYS_CFG_PAGE),
            ("boot_status", BOOT_STATUS_PAGE),
        ];
        let mut static_regions = vec![(soc::PERIPH_BASE, soc::PERIPH_SIZE)];
        if self.dual_tile {
            pages.push(("sec_host_boot", SEC_HOST_BOOT_PAGE));
            pages.push(("sec_sys_cfg", SEC_SYS_CFG_PAGE));
            static_regions.push((soc::SEC_PERIPH_BASE, soc::SEC_PERIPH_SIZE));
        }
        for (name, base) in pages {
            bus.attach(name, base, PAGE_SIZE, Box::new(Ram::zeroed(PAGE_SIZE as usize)))?;
        }

        Ok(EmuSoc {
            mmio: BusMmio::new(bus),
            dcache: EmuDcache::new(dram.clone()),
            timer: EmuTimer::new(self.timer_step_us),
            mem_map: EmuMemMap::new(static_regions),
            otp: EmuOtp::default(),
            i2c: EmuI2c::default(),
            smc: EmuSmc::new(dram.clone()),
            dram,
            primary,
            secondary,
        })
    }
}

/// Everything the secure world talks to, with VA equal to PA.
pub struct EmuSoc {
    pub mmio: BusMmio<DynamicBus>,
    pub dram: Dram,
    pub dcache: EmuDcache,
    pub timer: EmuTimer,
    pub mem_map: EmuMemMap,
    pub otp: EmuOtp,
    pub i2c: EmuI2c,
    pub smc: EmuSmc,
    primary: Rc<RefCell<TeMailboxPeriph>>,
    secondary: Option<Rc<RefCell<TeMailboxPeriph>>>,
}

impl EmuSoc {
    pub fn builder() -> EmuSocBuilder {
        EmuSocBuilder::default()
    }

    pub fn is_dual_tile(&self) -> bool {
        self.secondary.is_some()
    }

    /// The primary enclave. Release the borrow before driving the mailbox.
    pub fn primary(&self) -> RefMut<'_, TeMailboxPeriph> {
        self.primary.borrow_mut()
    }

    pub fn secondary(&self) -> Option<RefMut<'_, TeMailboxPeriph>> {
        self.secondary.as_ref().map(|periph| periph.borrow_mut())
    }

    pub fn hw(&self) -> TeHw<'_> {
        TeHw {
            mmio: &self.mmio,
            dcache: &self.dcache,
            timer: &self.timer,
        }
    }

    /// A transfer buffer placed at the start of DRAM.
    pub fn te_buf(&self) -> TeBuf {
        TeBuf::new(self.dram.base())
    }

    pub fn enclave(&self) -> Enclave<'_> {
        let primary = TeMailbox::new(self.hw(), soc::TE_MAILBOX_BASE as usize);
        let secondary = self
            .is_dual_tile()
            .then(|| TeMailbox::new(self.hw(), soc::SEC_TE_MAILBOX_BASE as usize));
        Enclave::new(primary, secondary, self.te_buf())
    }

    pub fn read_phys(&self, pa: u32) -> Result<u32, MmioFault> {
        self.mmio.read_u32(pa as usize)
    }

    pub fn write_phys(&self, pa: u32, val: u32) -> Result<(), MmioFault> {
        self.mmio.write_u32(pa as usize, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use te_drivers::{MemoryMap, Tile};

    #[test]
    fn test_single_tile_layout() {
        let soc = EmuSoc::builder().build().unwrap();
        assert!(!soc.is_dual_tile());
        assert!(soc.secondary().is_none());
        assert_eq!(soc.write_phys(soc::BOOT_CNT, 3), Ok(()));
        assert_eq!(soc.read_phys(soc::BOOT_CNT), Ok(3));
        assert!(soc.read_phys(soc::SEC_HOST_BOOT_READY).is_err());
        assert_eq!(
            soc.mem_map.static_va(soc::TE_MAILBOX_BASE, 0x1000),
            Some(soc::TE_MAILBOX_BASE as usize)
        );
        assert_eq!(soc.mem_map.static_va(BOOT_STATUS_PAGE, 4), None);
    }

    #[test]
    fn test_dual_tile_enclaves_are_independent() {
        let soc = EmuSoc::builder().dual_tile(true).build().unwrap();
        soc.secondary().unwrap().model.mailbox_version = 7;
        let mut enclave = soc.enclave();
        assert_eq!(enclave.get_mailbox_version(Tile::Secondary), Ok(7));
        assert_ne!(enclave.get_mailbox_version(Tile::Primary), Ok(7));
        assert_eq!(soc.primary().requests().len(), 1);
        assert_eq!(soc.secondary().unwrap().requests().len(), 1);
    }
}
