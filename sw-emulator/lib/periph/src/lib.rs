/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Tiny Enclave emulator peripheral library.

--*/

mod dram;
mod dtb;
mod enclave_model;
mod i2c;
mod mem_map;
mod otp;
mod smc;
mod soc;
mod te_mailbox;
mod timer;

pub use dram::{Dram, EmuDcache, DRAM_BASE, DRAM_SIZE};
pub use dtb::DtbBuilder;
pub use enclave_model::{
    model_unwrap, EnclaveModel, ProvisionedKey, STATUS_BAD_ADDRESS, STATUS_BUFFER_TOO_SMALL,
    STATUS_INVALID_LENGTH, STATUS_RANDOM_FAILED, STATUS_UNKNOWN_API,
};
pub use i2c::EmuI2c;
pub use mem_map::EmuMemMap;
pub use otp::EmuOtp;
pub use smc::{EmuSmc, SMC_UNKNOWN};
pub use soc::{EmuSoc, EmuSocBuilder, BOOT_STATUS_PAGE, PAGE_SIZE, SEC_SYS_CFG_PAGE, SYS_CFG_PAGE};
pub use te_mailbox::{EnclaveState, Request, ResponseMode, TeMailboxPeriph};
pub use timer::EmuTimer;
