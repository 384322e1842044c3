/*++

Licensed under the Apache-2.0 license.

File Name:

    secondary_launcher.rs

Abstract:

    File contains the pseudo-TA that releases the secondary tile from reset.

--*/

use crate::params::Params;
use crate::{Drivers, Uuid};
use te_drivers::{cprintln, runtime_error};
use te_error::{TeError, TeResult};
use te_registers::soc;

pub const BOOT_SECONDARY: u32 = 0;

pub struct SecondaryLauncherCmd;
impl SecondaryLauncherCmd {
    pub const NAME: &'static str = "secondary_launcher.ta";
    pub const UUID: Uuid = Uuid::new(
        0xfb27_d3c0,
        0x0f18,
        0x4882,
        [0x8e, 0x2f, 0xcd, 0x52, 0x39, 0xae, 0x1e, 0x7a],
    );

    /// Parameter types are not checked; the command takes none.
    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, _params: &mut Params) -> TeResult<()> {
        if cmd != BOOT_SECONDARY {
            return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
        }

        if !drivers.config.dual_tile {
            runtime_error!(
                drivers.log,
                "Refusing to initiate secondary boot. Not a dual-tile system."
            );
            return Err(TeError::RUNTIME_SECONDARY_NOT_DUAL_TILE);
        }
        if !drivers.config.secondary_linux_enabled {
            runtime_error!(
                drivers.log,
                "Refusing to initiate secondary boot. Not configured to boot Linux on secondary tile."
            );
            return Err(TeError::RUNTIME_SECONDARY_LINUX_DISABLED);
        }

        cprintln!("[launcher] Initiating secondary boot...");
        let platform = drivers.platform;
        let va = platform
            .mem_map
            .static_va(soc::SEC_HOST_BOOT_READY, 4)
            .ok_or(TeError::DRIVER_MMU_MAP_FAILED)?;
        let reg = platform
            .mmio
            .read_u32(va)
            .map_err(|_| TeError::DRIVER_MMIO_FAULT)?;
        platform
            .mmio
            .write_u32(va, reg | soc::HOST_BOOT_READY_MASK)
            .map_err(|_| TeError::DRIVER_MMIO_FAULT)?;
        cprintln!("[launcher] Done");
        Ok(())
    }
}
