/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the secure-world runtime library and the
    pseudo-TA command dispatch.

--*/

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod access;
mod adimem;
mod alive;
mod boot;
mod counters;
mod drivers;
mod i2c;
mod memdump;
mod otp_macs;
mod otp_temp;
pub mod params;
mod runtime_log;
mod secondary_launcher;
mod te_mailbox;
mod uuid;

pub use access::{
    authorize, authorize_privileged, AccessEntry, AccessTables, AccessTablesBuilder,
    BitFieldExclusion, Denial, ExcludedRange, I2cKey, MemKey, MemdumpRecord, Rights,
    ADIMEM_TABLE, I2C_TABLE, MEMDUMP_BIT_FIELDS, MEMDUMP_EXCLUDED, MEMDUMP_PRIMARY,
    MEMDUMP_SECONDARY,
};
pub use adimem::{AdimemCmd, ADIMEM_READ, ADIMEM_WRITE};
pub use alive::AliveReplyCmd;
pub use boot::{BootCmd, SET_BOOT_SUCCESSFUL};
pub use counters::{
    update_host_counter, update_te_counter, EnforcementCounterCmd, EnforcementCounterUpdateCmd,
    COUNTER_GET, COUNTER_GET_TE, COUNTER_UPDATE,
};
pub use drivers::{Drivers, Platform};
pub use i2c::{I2cCmd, I2cRequest, I2C_GET, I2C_MAX_BYTES, I2C_SET, I2C_SET_GET};
pub use memdump::{MemdumpCmd, MEMDUMP_DUMP, MEMDUMP_RECORDS, MEMDUMP_SIZE};
pub use otp_macs::{OtpMacsCmd, OTP_MACS_READ, OTP_MACS_WRITE};
pub use otp_temp::{OtpTempCmd, OTP_TEMP_READ, OTP_TEMP_WRITE};
pub use params::{
    check_param_types, Memref, ParamType, ParamTypes, Params, TeeParam, Value, NUM_PARAMS,
};
pub use runtime_log::{RuntimeLogCmd, BL31_LOG_GET_SIZE, OPTEE_LOG_GET_SIZE, RUNTIME_LOG_GET};
pub use secondary_launcher::{SecondaryLauncherCmd, BOOT_SECONDARY};
pub use te_mailbox::{
    TeMailboxCmd, BOOT_FLOW_REG_READ, PROV_FINALIZE, PROV_HOST_KEY, PROV_PREP_FINALIZE,
};
pub use uuid::Uuid;

use te_drivers::{cprintln, runtime_error};
use te_error::{TeError, TeResult, TeeStatus};

/// Every service the runtime answers, as (UUID, name).
pub const SERVICES: [(Uuid, &str); 12] = [
    (AdimemCmd::UUID, AdimemCmd::NAME),
    (I2cCmd::UUID, I2cCmd::NAME),
    (MemdumpCmd::UUID, MemdumpCmd::NAME),
    (OtpMacsCmd::UUID, OtpMacsCmd::NAME),
    (OtpTempCmd::UUID, OtpTempCmd::NAME),
    (EnforcementCounterCmd::UUID, EnforcementCounterCmd::NAME),
    (EnforcementCounterUpdateCmd::UUID, EnforcementCounterUpdateCmd::NAME),
    (TeMailboxCmd::UUID, TeMailboxCmd::NAME),
    (BootCmd::UUID, BootCmd::NAME),
    (SecondaryLauncherCmd::UUID, SecondaryLauncherCmd::NAME),
    (AliveReplyCmd::UUID, AliveReplyCmd::NAME),
    (RuntimeLogCmd::UUID, RuntimeLogCmd::NAME),
];

/// Name of the service registered under `uuid`.
pub fn service_name(uuid: &Uuid) -> Option<&'static str> {
    SERVICES
        .iter()
        .find(|(id, _)| id == uuid)
        .map(|(_, name)| *name)
}

fn dispatch(drivers: &mut Drivers, uuid: &Uuid, cmd: u32, params: &mut Params) -> TeResult<()> {
    if *uuid == AdimemCmd::UUID {
        AdimemCmd::execute(drivers, cmd, params)
    } else if *uuid == I2cCmd::UUID {
        I2cCmd::execute(drivers, cmd, params)
    } else if *uuid == MemdumpCmd::UUID {
        MemdumpCmd::execute(drivers, cmd, params)
    } else if *uuid == OtpMacsCmd::UUID {
        OtpMacsCmd::execute(drivers, cmd, params)
    } else if *uuid == OtpTempCmd::UUID {
        OtpTempCmd::execute(drivers, cmd, params)
    } else if *uuid == EnforcementCounterCmd::UUID {
        EnforcementCounterCmd::execute(drivers, cmd, params)
    } else if *uuid == EnforcementCounterUpdateCmd::UUID {
        EnforcementCounterUpdateCmd::execute(drivers, cmd, params)
    } else if *uuid == TeMailboxCmd::UUID {
        TeMailboxCmd::execute(drivers, cmd, params)
    } else if *uuid == BootCmd::UUID {
        BootCmd::execute(drivers, cmd, params)
    } else if *uuid == SecondaryLauncherCmd::UUID {
        SecondaryLauncherCmd::execute(drivers, cmd, params)
    } else if *uuid == AliveReplyCmd::UUID {
        AliveReplyCmd::execute();
        Ok(())
    } else if *uuid == RuntimeLogCmd::UUID {
        RuntimeLogCmd::execute(drivers, cmd, params)
    } else {
        runtime_error!(drivers.log, "No service for {}", uuid);
        Err(TeError::RUNTIME_UNKNOWN_SERVICE)
    }
}

/// Routes an invocation to the service named by `uuid` and reports the
/// outcome in the status codes callers see.
pub fn handle_command(
    drivers: &mut Drivers,
    uuid: &Uuid,
    cmd: u32,
    params: &mut Params,
) -> TeeStatus {
    let result = dispatch(drivers, uuid, cmd, params);
    if let Err(err) = result {
        match service_name(uuid) {
            Some(name) => cprintln!("[rt] {} command {} failed: 0x{:x}", name, cmd, u32::from(err)),
            None => cprintln!("[rt] command {} failed: 0x{:x}", cmd, u32::from(err)),
        }
    }
    TeeStatus::from(result)
}
