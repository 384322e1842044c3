// Licensed under the Apache-2.0 license

use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use te_drivers::printer::HexU32;
use te_drivers::{cprintln, runtime_error, with_io_mapping, TempGroup};
use te_error::{TeError, TeResult};
use te_registers::soc;

pub const OTP_TEMP_READ: u32 = 0;
pub const OTP_TEMP_WRITE: u32 = 1;

const PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueInput,
    ParamType::ValueInout,
    ParamType::None,
    ParamType::None,
]);

pub struct OtpTempCmd;
impl OtpTempCmd {
    pub const NAME: &'static str = "otp_temp.ta";
    pub const UUID: Uuid = Uuid::new(
        0xcf0b_a31d,
        0xa0a8,
        0x4406,
        [0x9e, 0x8c, 0xba, 0x11, 0xdf, 0x80, 0xfb, 0xb1],
    );

    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        if cmd != OTP_TEMP_READ && cmd != OTP_TEMP_WRITE {
            runtime_error!(drivers.log, "Invalid command");
            return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
        }
        if check_param_types(params, PARAM_TYPES).is_err() {
            runtime_error!(drivers.log, "otp_temp.ta Bad parameters");
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }
        let group_id = params::value(params, 0)?.a;
        let group = match TempGroup::try_from(group_id) {
            Ok(group) => group,
            Err(err) => {
                runtime_error!(drivers.log, "otp_temp.ta Invalid temp group id '{}'", group_id);
                return Err(err);
            }
        };
        if cmd == OTP_TEMP_WRITE {
            runtime_error!(drivers.log, "otp_temp.ta : write operation is not supported");
            return Err(TeError::RUNTIME_OTP_TEMP_WRITE_UNSUPPORTED);
        }

        let platform = drivers.platform;
        let value = with_io_mapping(platform.mem_map, soc::OTP_BASE, soc::OTP_SIZE, |base| {
            platform.otp.get_temp_sensor(base, group)
        })?;
        params::value_mut(params, 1)?.a = value;
        cprintln!("[otp_temp] value read back: {}", HexU32(value));
        Ok(())
    }
}
