/*++

Licensed under the Apache-2.0 license.

File Name:

    runtime_log.rs

Abstract:

    File contains the pseudo-TA exporting the secure world and BL31 runtime
    error logs.

--*/

use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use te_drivers::{fetch_bl31_log, runtime_error, BL31_LOG_SIZE, OPTEE_LOG_SIZE};
use te_error::{TeError, TeResult};

pub const BL31_LOG_GET_SIZE: u32 = 0;
pub const OPTEE_LOG_GET_SIZE: u32 = 1;
pub const RUNTIME_LOG_GET: u32 = 2;

const SIZE_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueOutput,
    ParamType::None,
    ParamType::None,
    ParamType::None,
]);

const GET_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::MemrefOutput,
    ParamType::MemrefOutput,
    ParamType::None,
    ParamType::None,
]);

pub struct RuntimeLogCmd;
impl RuntimeLogCmd {
    pub const NAME: &'static str = "runtime_log.ta";
    pub const UUID: Uuid = Uuid::new(
        0x6dc5_5088,
        0x4255,
        0x41cc,
        [0x9b, 0x49, 0x04, 0x53, 0x4e, 0x6a, 0xc3, 0xa6],
    );

    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        match cmd {
            BL31_LOG_GET_SIZE => Self::log_size(drivers, params, BL31_LOG_SIZE, "get_bl31_log_size"),
            OPTEE_LOG_GET_SIZE => {
                Self::log_size(drivers, params, OPTEE_LOG_SIZE, "get_optee_log_size")
            }
            RUNTIME_LOG_GET => Self::get_logs(drivers, params),
            _ => {
                runtime_error!(drivers.log, "No matching command: {}", cmd);
                Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND)
            }
        }
    }

    fn log_size(drivers: &Drivers, params: &mut Params, size: usize, name: &str) -> TeResult<()> {
        if check_param_types(params, SIZE_PARAM_TYPES).is_err() {
            runtime_error!(drivers.log, "Bad parameters to {} function", name);
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }
        params::value_mut(params, 0)?.a = size as u32;
        Ok(())
    }

    /// params[0] receives the secure world log, which is cleared by the
    /// read. params[1] receives the BL31 log. Each output is clipped to its
    /// buffer and its size is set to the bytes copied.
    fn get_logs(drivers: &mut Drivers, params: &mut Params) -> TeResult<()> {
        if check_param_types(params, GET_PARAM_TYPES).is_err() {
            runtime_error!(drivers.log, "Bad parameters to get_runtime_logs function");
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }

        let mut optee_log = [0u8; OPTEE_LOG_SIZE];
        let optee_len = drivers.log.read(&mut optee_log);
        Self::copy_out(params, 0, &optee_log[..optee_len])?;

        let mut bl31_log = [0u8; BL31_LOG_SIZE];
        let platform = drivers.platform;
        let bl31_len = match fetch_bl31_log(
            platform.smc,
            platform.dcache,
            drivers.enclave.buf_mut(),
            &mut bl31_log,
        ) {
            Ok(len) => len,
            Err(_) => {
                runtime_error!(drivers.log, "Unable to fetch BL31 runtime log");
                0
            }
        };
        Self::copy_out(params, 1, &bl31_log[..bl31_len])
    }

    fn copy_out(params: &mut Params, idx: usize, text: &[u8]) -> TeResult<()> {
        let out = params::memref_mut(params, idx)?;
        let len = text.len().min(out.buf.len());
        out.buf[..len].copy_from_slice(&text[..len]);
        out.size = len;
        Ok(())
    }
}
