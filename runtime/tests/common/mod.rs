// Licensed under the Apache-2.0 license

#![allow(dead_code)]

use te_drivers::{Lifecycle, PlatformConfig, PrivilegePolicy};
use te_emu_periph::EmuSoc;
use te_error::TeeStatus;
use te_runtime::{handle_command, AccessTables, Drivers, Params, Platform, Uuid};

pub fn single_tile() -> EmuSoc {
    EmuSoc::builder().build().unwrap()
}

pub fn dual_tile() -> EmuSoc {
    EmuSoc::builder().dual_tile(true).build().unwrap()
}

pub fn platform(soc: &EmuSoc) -> Platform<'_> {
    Platform {
        mmio: &soc.mmio,
        dcache: &soc.dcache,
        timer: &soc.timer,
        mem_map: &soc.mem_map,
        otp: &soc.otp,
        i2c: &soc.i2c,
        smc: &soc.smc,
        te_buf_phys: soc.dram.base(),
    }
}

pub fn config(soc: &EmuSoc) -> PlatformConfig {
    PlatformConfig {
        dual_tile: soc.is_dual_tile(),
        sysclk_freq: 125_000_000,
        privilege: PrivilegePolicy::Production,
        ..Default::default()
    }
}

pub fn debug_config(soc: &EmuSoc) -> PlatformConfig {
    PlatformConfig {
        privilege: PrivilegePolicy::Debug,
        ..config(soc)
    }
}

pub fn drivers_with(soc: &EmuSoc, config: PlatformConfig) -> Drivers<'_> {
    Drivers::new(platform(soc), config, AccessTables::default()).unwrap()
}

pub fn new_drivers(soc: &EmuSoc) -> Drivers<'_> {
    drivers_with(soc, config(soc))
}

pub fn set_lifecycle(soc: &EmuSoc, lifecycle: Lifecycle) {
    soc.primary().model.set_lifecycle(lifecycle);
    if let Some(mut secondary) = soc.secondary() {
        secondary.model.set_lifecycle(lifecycle);
    }
}

pub fn invoke(drivers: &mut Drivers, uuid: Uuid, cmd: u32, params: &mut Params) -> TeeStatus {
    handle_command(drivers, &uuid, cmd, params)
}

/// Drains the runtime error log as text.
pub fn log_text(drivers: &Drivers) -> String {
    let mut out = vec![0u8; 1024];
    let len = drivers.log.read(&mut out);
    String::from_utf8_lossy(&out[..len]).into_owned()
}
