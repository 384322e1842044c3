/*++

Licensed under the Apache-2.0 license.

File Name:

    i2c.rs

Abstract:

    File contains the I2C proxy pseudo-TA.

--*/

use crate::access::{authorize, I2cKey, Rights};
use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use arrayvec::ArrayVec;
use te_drivers::{runtime_error, with_io_mapping, TwiHandle, I2C_SPEED_MAX, I2C_SPEED_MIN};
use te_error::{TeError, TeResult};
use te_registers::soc;
use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const I2C_GET: u32 = 0;
pub const I2C_SET: u32 = 1;
pub const I2C_SET_GET: u32 = 2;

pub const I2C_MAX_BYTES: usize = 256;

/// Request block carried by params[0].
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct I2cRequest {
    pub bus: U64,
    pub slave: U64,
    pub address: U64,
    /// Register address length in bytes
    pub addr_len: U64,
    pub set_bytes: U64,
    pub get_bytes: U64,
    /// Bus clock (Hz)
    pub speed: U64,
}

pub struct I2cCmd;
impl I2cCmd {
    pub const NAME: &'static str = "adi_i2c.ta";
    pub const UUID: Uuid = Uuid::new(
        0x7e07_8f09,
        0xe8cb,
        0x47ac,
        [0xbc, 0x44, 0xfc, 0x6f, 0x09, 0x17, 0x43, 0x57],
    );

    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        let (buffer_type, op) = match cmd {
            I2C_GET => (ParamType::MemrefOutput, Rights::READ),
            I2C_SET => (ParamType::MemrefInput, Rights::WRITE),
            I2C_SET_GET => (ParamType::MemrefInout, Rights::WRITE_READ),
            _ => {
                runtime_error!(drivers.log, "Invalid command");
                return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
            }
        };
        let types = ParamTypes::new([
            ParamType::MemrefInput,
            buffer_type,
            ParamType::None,
            ParamType::None,
        ]);
        if check_param_types(params, types).is_err() {
            runtime_error!(drivers.log, "Bad parameters");
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }

        let req = match I2cRequest::read_from_prefix(params::memref(params, 0)?.data()) {
            Ok((req, _)) => req,
            Err(_) => {
                runtime_error!(drivers.log, "Bad parameters");
                return Err(TeError::RUNTIME_I2C_INVALID_PARAMS);
            }
        };
        Self::check_request(drivers, &req, op)?;

        let set_bytes = req.set_bytes.get() as usize;
        let get_bytes = req.get_bytes.get() as usize;
        let buffer = params::memref_mut(params, 1)?;
        let needed = match cmd {
            I2C_GET => get_bytes,
            I2C_SET => set_bytes,
            _ => set_bytes.max(get_bytes),
        };
        if buffer.buf.len() < needed || (op != Rights::READ && buffer.size < set_bytes) {
            runtime_error!(drivers.log, "Shared buffer too small");
            return Err(TeError::RUNTIME_I2C_SHORT_BUFFER);
        }

        let bus_pa = match req.bus.get() {
            0 => soc::I2C_0_BASE,
            _ => return Err(TeError::RUNTIME_I2C_INVALID_BUS),
        };

        let mut staged = ArrayVec::<u8, I2C_MAX_BYTES>::new();
        // Bounded by check_request.
        staged.extend(core::iter::repeat(0).take(needed));
        if op != Rights::READ {
            staged[..set_bytes].copy_from_slice(&buffer.buf[..set_bytes]);
        }

        let platform = drivers.platform;
        let slave = req.slave.get() as u8;
        let addr = req.address.get() as u32;
        let addr_len = req.addr_len.get() as u32;
        let result = with_io_mapping(platform.mem_map, bus_pa, soc::I2C_SIZE, |va| {
            let handle = TwiHandle {
                pa: bus_pa,
                va,
                sclk: drivers.config.sysclk_freq,
                twi_clk: req.speed.get() as u32,
            };
            platform.i2c.init(&handle)?;
            match cmd {
                I2C_GET => platform.i2c.read(&handle, slave, addr, addr_len, &mut staged),
                I2C_SET => platform.i2c.write(&handle, slave, addr, addr_len, &staged),
                _ => platform.i2c.write_read(
                    &handle,
                    slave,
                    addr,
                    addr_len,
                    &mut staged,
                    set_bytes,
                    get_bytes,
                ),
            }
        });
        if let Err(err) = result {
            runtime_error!(drivers.log, "I2C transfer error");
            return Err(err);
        }

        if op != Rights::WRITE {
            buffer.buf[..get_bytes].copy_from_slice(&staged[..get_bytes]);
            buffer.size = get_bytes;
        }
        Ok(())
    }

    /// Access, then speed, then transfer length.
    fn check_request(drivers: &Drivers, req: &I2cRequest, op: Rights) -> TeResult<()> {
        let key = I2cKey {
            bus: req.bus.get(),
            slave: req.slave.get(),
            address: req.address.get(),
        };
        if !authorize(drivers.tables.i2c, &key, op) {
            runtime_error!(
                drivers.log,
                "Access not permitted for specified bus, slave, address, and operation"
            );
            return Err(TeError::RUNTIME_I2C_ACCESS_DENIED);
        }

        let speed = req.speed.get();
        if speed < I2C_SPEED_MIN.into() || speed > I2C_SPEED_MAX.into() {
            runtime_error!(drivers.log, "Invalid I2C speed: {}", speed);
            return Err(TeError::RUNTIME_I2C_INVALID_SPEED);
        }

        if req.set_bytes.get() > I2C_MAX_BYTES as u64 || req.get_bytes.get() > I2C_MAX_BYTES as u64 {
            runtime_error!(
                drivers.log,
                "Number of bytes specified is above the limit of {}",
                I2C_MAX_BYTES
            );
            return Err(TeError::RUNTIME_I2C_TOO_MANY_BYTES);
        }
        Ok(())
    }
}
