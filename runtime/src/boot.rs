// Licensed under the Apache-2.0 license

use crate::params::{check_param_types, ParamTypes, Params};
use crate::{Drivers, Uuid};
use te_drivers::{cprintln, runtime_error, StatusReg};
use te_error::{TeError, TeResult};

pub const SET_BOOT_SUCCESSFUL: u32 = 0;

pub struct BootCmd;
impl BootCmd {
    pub const NAME: &'static str = "boot.ta";
    pub const UUID: Uuid = Uuid::new(
        0x2fd9_7d66,
        0xe52f,
        0x4e29,
        [0x8e, 0x61, 0xd1, 0x86, 0xeb, 0xb4, 0x86, 0xf6],
    );

    /// Clears the boot attempt counter so the next reset is not treated as
    /// a failed boot.
    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        if cmd != SET_BOOT_SUCCESSFUL {
            return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
        }
        check_param_types(params, ParamTypes::NONE)?;

        if drivers
            .platform
            .status_regs()
            .write(StatusReg::BootCnt, 0)
            .is_err()
        {
            runtime_error!(drivers.log, "Unable to clear the boot counter");
            return Err(TeError::RUNTIME_BOOT_STATUS_WRITE_FAILED);
        }
        cprintln!("[boot] Boot marked successful");
        Ok(())
    }
}
