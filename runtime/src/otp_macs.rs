/*++

Licensed under the Apache-2.0 license.

File Name:

    otp_macs.rs

Abstract:

    File contains the OTP MAC address pseudo-TA.

--*/

use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use te_drivers::{
    cprintln, mac_to_words, runtime_error, with_io_mapping, words_to_mac, NUM_MAC_ADDRESSES,
};
use te_error::{TeError, TeResult};
use te_registers::soc;

pub const OTP_MACS_READ: u32 = 0;
pub const OTP_MACS_WRITE: u32 = 1;

const PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueInput,
    ParamType::ValueInout,
    ParamType::None,
    ParamType::None,
]);

pub struct OtpMacsCmd;
impl OtpMacsCmd {
    pub const NAME: &'static str = "otp_macs.ta";
    pub const UUID: Uuid = Uuid::new(
        0x61e8_b041,
        0xc3bc,
        0x4b70,
        [0xa9, 0x9e, 0xd2, 0xe5, 0xba, 0x2c, 0x4e, 0xbf],
    );

    /// params[0].a interface (1-based), params[1] MAC as `(a, b)` words.
    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        if cmd != OTP_MACS_READ && cmd != OTP_MACS_WRITE {
            runtime_error!(drivers.log, "Invalid command");
            return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
        }
        if check_param_types(params, PARAM_TYPES).is_err() {
            runtime_error!(drivers.log, "otp_macs.ta Bad parameters");
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }
        let interface = params::value(params, 0)?.a;
        if interface == 0 || interface > NUM_MAC_ADDRESSES {
            runtime_error!(
                drivers.log,
                "otp_macs.ta Invalid MAC id '{}' (expected 1-{})",
                interface,
                NUM_MAC_ADDRESSES
            );
            return Err(TeError::RUNTIME_OTP_MAC_INVALID_INTERFACE);
        }

        let platform = drivers.platform;
        let mac = params::value_mut(params, 1)?;
        if cmd == OTP_MACS_READ {
            let stored = with_io_mapping(platform.mem_map, soc::OTP_BASE, soc::OTP_SIZE, |base| {
                platform.otp.get_mac_addr(base, interface)
            })?;
            (mac.a, mac.b) = mac_to_words(&stored);
            cprintln!("[otp_macs] READ MAC address {}", interface);
            return Ok(());
        }

        let new_mac = words_to_mac(mac.a, mac.b);
        let result = with_io_mapping(platform.mem_map, soc::OTP_BASE, soc::OTP_SIZE, |base| {
            let stored = platform.otp.get_mac_addr(base, interface)?;
            if stored.iter().any(|b| *b != 0) {
                return Err(TeError::RUNTIME_OTP_MAC_ALREADY_PROVISIONED);
            }
            platform.otp.set_mac_addr(base, interface, &new_mac)
        });
        if result == Err(TeError::RUNTIME_OTP_MAC_ALREADY_PROVISIONED) {
            runtime_error!(
                drivers.log,
                "otp_macs.ta: OTP already contains a MAC for interface {}. MAC write aborted",
                interface
            );
        }
        result?;
        cprintln!("[otp_macs] WRITE MAC address {}", interface);
        Ok(())
    }
}
