/*++

Licensed under the Apache-2.0 license.

File Name:

    adimem.rs

Abstract:

    File contains the memory read/write proxy pseudo-TA.

--*/

use crate::access::{authorize_privileged, Denial, MemKey, Rights};
use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use te_drivers::printer::HexU32;
use te_drivers::{runtime_error, with_io_mapping};
use te_error::{TeError, TeResult};
use ureg::AccessWidth;

pub const ADIMEM_READ: u32 = 0;
pub const ADIMEM_WRITE: u32 = 1;

const PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueInput,
    ParamType::ValueInput,
    ParamType::ValueInout,
    ParamType::ValueInput,
]);

pub struct AdimemCmd;
impl AdimemCmd {
    pub const NAME: &'static str = "adimem.ta";
    pub const UUID: Uuid = Uuid::new(
        0x23fd_8eb3,
        0xf9e6,
        0x434c,
        [0x94, 0xf2, 0xa9, 0x1a, 0x61, 0x38, 0xbf, 0x3d],
    );

    /// params[0].a address, params[1].a size in bits, params[2].a data,
    /// params[3].a privilege flag.
    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        let op = match cmd {
            ADIMEM_READ => Rights::READ,
            ADIMEM_WRITE => Rights::WRITE,
            _ => {
                runtime_error!(drivers.log, "Invalid command");
                return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
            }
        };

        if check_param_types(params, PARAM_TYPES).is_err() {
            runtime_error!(drivers.log, "Bad parameters");
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }
        let addr = params::value(params, 0)?.a;
        let size = params::value(params, 1)?.a;
        let privileged = params::value(params, 3)?.a != 0 && Self::privilege_allowed(drivers);

        let width = match AccessWidth::from_bits(size) {
            Some(width) if width != AccessWidth::DoubleWord => width,
            _ => {
                runtime_error!(drivers.log, "adimem.ta Invalid data size");
                return Err(TeError::RUNTIME_ADIMEM_INVALID_SIZE);
            }
        };

        let key = MemKey {
            address: addr,
            size,
        };
        match authorize_privileged(drivers.tables.adimem, &key, op, privileged) {
            Ok(()) => (),
            Err(Denial::UnnecessaryPrivilege) => {
                runtime_error!(drivers.log, "Access denied. Re-run as non-privileged.");
                return Err(TeError::RUNTIME_ADIMEM_UNNECESSARY_PRIVILEGE);
            }
            Err(Denial::NotPermitted) => {
                runtime_error!(drivers.log, "Access denied.");
                return Err(TeError::RUNTIME_ADIMEM_ACCESS_DENIED);
            }
        }

        let platform = drivers.platform;
        let len = width.bytes() as u32;
        let data = params::value_mut(params, 2)?;
        let result = with_io_mapping(platform.mem_map, addr, len, |va| {
            if op == Rights::READ {
                let val = platform
                    .mmio
                    .read(width, va)
                    .map_err(|_| TeError::DRIVER_MMIO_FAULT)?;
                data.a = val as u32;
            } else {
                platform
                    .mmio
                    .write(width, va, data.a.into())
                    .map_err(|_| TeError::DRIVER_MMIO_FAULT)?;
            }
            Ok(())
        });

        if let Err(err) = result {
            if err == TeError::DRIVER_MMU_MAP_FAILED || err == TeError::DRIVER_MMU_UNMAP_FAILED {
                runtime_error!(drivers.log, "adimem.ta MMU address mapping failure");
            } else {
                runtime_error!(drivers.log, "adimem.ta access to {} failed", HexU32(addr));
            }
            return Err(err);
        }
        Ok(())
    }

    /// Privilege is only honored by debug builds on devices that have not
    /// been deployed.
    fn privilege_allowed(drivers: &Drivers) -> bool {
        drivers.config.is_debug_privilege()
            && drivers
                .primary_lifecycle()
                .map_or(false, |lifecycle| lifecycle.is_pre_deployed())
    }
}
