/*++

Licensed under the Apache-2.0 license.

File Name:

    drivers.rs

Abstract:

    File contains the state shared by every pseudo-TA.

--*/

use crate::access::AccessTables;
use te_drivers::{
    cprintln, Dcache, Enclave, I2cController, Lifecycle, MemoryMap, Otp, PlatformConfig,
    RuntimeLog, SecureMonitor, StatusRegs, TeBuf, TeHw, TeMailbox, Tile, Timer,
};
use te_error::{TeError, TeResult};
use te_registers::{mailbox, soc};
use ureg::Mmio;

/// Hardware capabilities handed to the runtime by the platform layer.
#[derive(Copy, Clone)]
pub struct Platform<'a> {
    pub mmio: &'a dyn Mmio,
    pub dcache: &'a dyn Dcache,
    pub timer: &'a dyn Timer,
    pub mem_map: &'a dyn MemoryMap,
    pub otp: &'a dyn Otp,
    pub i2c: &'a dyn I2cController,
    pub smc: &'a dyn SecureMonitor,
    /// Physical address of the enclave transfer buffer.
    pub te_buf_phys: u32,
}

impl<'a> Platform<'a> {
    pub fn te_hw(&self) -> TeHw<'a> {
        TeHw {
            mmio: self.mmio,
            dcache: self.dcache,
            timer: self.timer,
        }
    }

    pub fn status_regs(&self) -> StatusRegs<'a> {
        StatusRegs {
            mmio: self.mmio,
            map: self.mem_map,
        }
    }
}

pub struct Drivers<'a> {
    pub platform: Platform<'a>,

    /// Enclave mailboxes of the primary and, on dual-tile systems, the
    /// secondary tile
    pub enclave: Enclave<'a>,

    /// Values cached from the device tree at boot
    pub config: PlatformConfig,

    pub tables: AccessTables<'a>,

    /// Runtime error log read out by `runtime_log.ta`
    pub log: RuntimeLog,
}

impl<'a> Drivers<'a> {
    /// Resolves the mailbox register windows. The secondary window is only
    /// looked up on dual-tile systems.
    pub fn new(
        platform: Platform<'a>,
        config: PlatformConfig,
        tables: AccessTables<'a>,
    ) -> TeResult<Self> {
        let mailbox = |pa: u32| -> TeResult<TeMailbox<'a>> {
            let va = platform
                .mem_map
                .static_va(pa, mailbox::WINDOW_SIZE as u32)
                .ok_or_else(|| {
                    cprintln!("[rt] No mapping for TE mailbox {}", te_drivers::printer::HexU32(pa));
                    TeError::DRIVER_MAILBOX_REGS_UNMAPPED
                })?;
            Ok(TeMailbox::new(platform.te_hw(), va))
        };

        let primary = mailbox(soc::TE_MAILBOX_BASE)?;
        let secondary = if config.dual_tile {
            Some(mailbox(soc::SEC_TE_MAILBOX_BASE)?)
        } else {
            None
        };

        Ok(Self {
            platform,
            enclave: Enclave::new(primary, secondary, TeBuf::new(platform.te_buf_phys)),
            config,
            tables,
            log: RuntimeLog::new(),
        })
    }

    /// Tiles an operation must be applied to, primary first.
    pub fn tiles(&self) -> &'static [Tile] {
        if self.config.dual_tile {
            &[Tile::Primary, Tile::Secondary]
        } else {
            &[Tile::Primary]
        }
    }

    pub fn primary_lifecycle(&self) -> TeResult<Lifecycle> {
        self.enclave.get_lifecycle_state(Tile::Primary)
    }
}
