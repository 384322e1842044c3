/*++

Licensed under the Apache-2.0 license.

File Name:

    counters.rs

Abstract:

    File contains the anti-rollback enforcement counter pseudo-TAs.

--*/

use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use core::cmp::Ordering;
use te_drivers::{cprintln, runtime_error, with_io_mapping, Tile};
use te_error::{TeError, TeResult};
use te_registers::soc;

pub const COUNTER_GET: u32 = 0;
pub const COUNTER_GET_TE: u32 = 1;

pub const COUNTER_UPDATE: u32 = 0;

const GET_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueOutput,
    ParamType::None,
    ParamType::None,
    ParamType::None,
]);

/// Whether `current` has to move forward to reach `target`. A target below
/// the current value is a rollback attempt.
fn needs_update(current: u32, target: u32) -> TeResult<bool> {
    match target.cmp(&current) {
        Ordering::Less => Err(TeError::RUNTIME_COUNTER_ROLLBACK),
        Ordering::Equal => Ok(false),
        Ordering::Greater => Ok(true),
    }
}

/// Brings the host OTP counter to `target` with a direct write.
pub fn update_host_counter(drivers: &Drivers, target: u32) -> TeResult<()> {
    let platform = drivers.platform;
    let result = with_io_mapping(platform.mem_map, soc::OTP_BASE, soc::OTP_SIZE, |base| {
        let current = platform
            .otp
            .get_rollback_counter(base)
            .map_err(|_| TeError::RUNTIME_COUNTER_READ_FAILED)?;
        if needs_update(current, target)? {
            platform
                .otp
                .set_rollback_counter(base, target)
                .map_err(|_| TeError::RUNTIME_COUNTER_UPDATE_FAILED)?;
        }
        Ok(())
    });
    if result == Err(TeError::RUNTIME_COUNTER_ROLLBACK) {
        runtime_error!(drivers.log, "Anti-rollback counter target {} below OTP value", target);
    }
    result
}

/// Brings the enclave counter to `target`. The enclave only offers an
/// increment, so it is stepped one at a time.
pub fn update_te_counter(drivers: &mut Drivers, target: u32) -> TeResult<()> {
    let mut current = drivers
        .enclave
        .get_antirollback(Tile::Primary)
        .map_err(|_| TeError::RUNTIME_COUNTER_READ_FAILED)?;
    if let Err(err) = needs_update(current, target) {
        runtime_error!(
            drivers.log,
            "TE anti-rollback counter target {} below enclave value {}",
            target,
            current
        );
        return Err(err);
    }
    while current < target {
        let next = drivers
            .enclave
            .increment_antirollback(Tile::Primary)
            .map_err(|_| TeError::RUNTIME_COUNTER_UPDATE_FAILED)?;
        // An increment that does not advance would loop forever.
        if next <= current {
            return Err(TeError::RUNTIME_COUNTER_UPDATE_FAILED);
        }
        current = next;
    }
    Ok(())
}

pub struct EnforcementCounterCmd;
impl EnforcementCounterCmd {
    pub const NAME: &'static str = "enforcement_counter.ta";
    pub const UUID: Uuid = Uuid::new(
        0xf20f_1c1c,
        0x2d8c,
        0x4c8b,
        [0xa9, 0xf7, 0xbf, 0x74, 0xae, 0x80, 0xcf, 0x1f],
    );

    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        if cmd != COUNTER_GET && cmd != COUNTER_GET_TE {
            return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
        }
        check_param_types(params, GET_PARAM_TYPES)?;

        let counter = if cmd == COUNTER_GET {
            let platform = drivers.platform;
            with_io_mapping(platform.mem_map, soc::OTP_BASE, soc::OTP_SIZE, |base| {
                platform.otp.get_rollback_counter(base)
            })
            .map_err(|_| TeError::RUNTIME_COUNTER_READ_FAILED)?
        } else {
            drivers
                .enclave
                .get_antirollback(Tile::Primary)
                .map_err(|_| TeError::RUNTIME_COUNTER_READ_FAILED)?
        };
        params::value_mut(params, 0)?.a = counter;
        Ok(())
    }
}

pub struct EnforcementCounterUpdateCmd;
impl EnforcementCounterUpdateCmd {
    pub const NAME: &'static str = "enforcement_counter_update.ta";
    pub const UUID: Uuid = Uuid::new(
        0x5a34_54aa,
        0xdc36,
        0x47bf,
        [0x87, 0x0e, 0x02, 0xd8, 0x72, 0xa4, 0x75, 0xb7],
    );

    /// Host counter first, then the enclave counter. Targets come from the
    /// boot configuration.
    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        if cmd != COUNTER_UPDATE {
            return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
        }
        check_param_types(params, ParamTypes::NONE)?;

        let config = drivers.config;
        update_host_counter(drivers, config.anti_rollback_counter)?;
        update_te_counter(drivers, config.te_anti_rollback_counter)?;
        cprintln!("[counters] Enforcement counters up to date");
        Ok(())
    }
}
