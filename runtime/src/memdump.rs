/*++

Licensed under the Apache-2.0 license.

File Name:

    memdump.rs

Abstract:

    File contains the memory-dump pseudo-TA.

--*/

use crate::access::MemdumpRecord;
use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use te_drivers::printer::HexU32;
use te_drivers::{runtime_error, with_io_mapping};
use te_error::{TeError, TeResult};
use ureg::AccessWidth;

pub const MEMDUMP_RECORDS: u32 = 0;
pub const MEMDUMP_SIZE: u32 = 1;
pub const MEMDUMP_DUMP: u32 = 2;

const RECORDS_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueOutput,
    ParamType::None,
    ParamType::None,
    ParamType::None,
]);

const SIZE_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueInput,
    ParamType::ValueOutput,
    ParamType::None,
    ParamType::None,
]);

const DUMP_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::MemrefOutput,
    ParamType::ValueInout,
    ParamType::ValueOutput,
    ParamType::ValueOutput,
]);

pub struct MemdumpCmd;
impl MemdumpCmd {
    pub const NAME: &'static str = "adi_memdump.ta";
    pub const UUID: Uuid = Uuid::new(
        0x39f7_4b29,
        0x8507,
        0x4142,
        [0x8b, 0x8e, 0x3d, 0x12, 0xeb, 0x9d, 0x49, 0x7b],
    );

    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        let (types, name) = match cmd {
            MEMDUMP_RECORDS => (RECORDS_PARAM_TYPES, "records"),
            MEMDUMP_SIZE => (SIZE_PARAM_TYPES, "size"),
            MEMDUMP_DUMP => (DUMP_PARAM_TYPES, "dump"),
            _ => {
                runtime_error!(drivers.log, "Invalid command");
                return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
            }
        };
        if check_param_types(params, types).is_err() {
            runtime_error!(drivers.log, "Bad parameters to memdump {} command", name);
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }

        let dual_tile = drivers.config.dual_tile;
        match cmd {
            MEMDUMP_RECORDS => {
                params::value_mut(params, 0)?.a = drivers.tables.memdump_count(dual_tile);
                Ok(())
            }
            MEMDUMP_SIZE => {
                let record = Self::record(drivers, params::value(params, 0)?.a)?;
                params::value_mut(params, 1)?.a = record.size;
                Ok(())
            }
            _ => Self::dump(drivers, params),
        }
    }

    fn record(drivers: &Drivers, index: u32) -> TeResult<MemdumpRecord> {
        match drivers
            .tables
            .memdump_record(index, drivers.config.dual_tile)
        {
            Some(record) => Ok(*record),
            None => {
                runtime_error!(drivers.log, "Invalid record number {}", index);
                Err(TeError::RUNTIME_MEMDUMP_INVALID_RECORD)
            }
        }
    }

    fn dump(drivers: &mut Drivers, params: &mut Params) -> TeResult<()> {
        let record = Self::record(drivers, params::value(params, 1)?.a)?;

        let width = match AccessWidth::from_bits(record.width) {
            Some(width) => width,
            None => {
                runtime_error!(drivers.log, "Not a valid register width {}", record.width);
                return Err(TeError::RUNTIME_MEMDUMP_INVALID_WIDTH);
            }
        };
        if (record.size * 8) % record.width != 0 {
            runtime_error!(drivers.log, "Size of record is not a multiple of width");
            return Err(TeError::RUNTIME_MEMDUMP_SIZE_NOT_WIDTH_MULTIPLE);
        }

        let out = params::memref_mut(params, 0)?;
        if out.buf.len() < record.size as usize {
            runtime_error!(drivers.log, "Output buffer too small for record");
            return Err(TeError::RUNTIME_MEMDUMP_SHORT_BUFFER);
        }

        let step = width.bytes();
        let tables = drivers.tables;
        let platform = drivers.platform;
        for (i, chunk) in out.buf[..record.size as usize].chunks_exact_mut(step).enumerate() {
            let addr = record.addr + (i * step) as u32;
            let val = if tables.is_excluded(addr) {
                0
            } else {
                let read = with_io_mapping(platform.mem_map, addr, step as u32, |va| {
                    platform
                        .mmio
                        .read(width, va)
                        .map_err(|_| TeError::DRIVER_MMIO_FAULT)
                });
                match read {
                    Ok(val) => val & !tables.bit_field_mask(addr),
                    Err(err) => {
                        runtime_error!(drivers.log, "adi_memdump.ta READ of {} failed", HexU32(addr));
                        return Err(err);
                    }
                }
            };
            chunk.copy_from_slice(&val.to_le_bytes()[..step]);
        }

        out.size = record.size as usize;
        params::value_mut(params, 1)?.a = record.addr;
        params::value_mut(params, 2)?.a = record.width;
        params::value_mut(params, 3)?.a = record.endianness();
        Ok(())
    }
}
