/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Tiny Enclave driver library.

--*/

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod cache;
mod config;
mod enclave;
mod i2c;
mod memory_map;
mod otp;
pub mod printer;
mod runtime_log;
mod smc;
mod status_reg;
mod te_buf;
mod te_mailbox;
pub mod wait;

pub use cache::Dcache;
pub use config::{PlatformConfig, PrivilegePolicy};
pub use enclave::{
    ApiId, ChallengeType, Enclave, EnclaveError, EnclaveResult, HostKey, HostKeyId,
    HostKeyRecord, HwUniqueKey, Lifecycle, Tile, HOST_ERROR_BUFFER, HOST_ERROR_INVALID_ARGS,
    HOST_ERROR_TIMEOUT, HW_UNIQUE_KEY_LENGTH, UNWRAPPED_KEY_LEN, WRAPPED_KEY_LEN,
};
pub use i2c::{I2cController, TwiHandle, I2C_SPEED_MAX, I2C_SPEED_MIN};
pub use memory_map::{with_io_mapping, MemoryMap};
pub use otp::{
    mac_to_words, words_to_mac, MacAddr, Otp, TempGroup, MAC_ADDRESS_NUM_BYTES,
    NUM_MAC_ADDRESSES,
};
pub use runtime_log::{LogWriter, RuntimeLog, BL31_LOG_SIZE, GROUP_SEPARATOR, OPTEE_LOG_SIZE};
pub use smc::{fetch_bl31_log, SecureMonitor, SmcArgs};
pub use status_reg::{StatusReg, StatusRegs};
pub use te_buf::{LenBounds, TeBuf, TE_BUF_SIZE};
pub use te_mailbox::{TeHw, TeMailbox, TransactionState, MAX_ARGS, TE_RESPONSE_TIMEOUT_US};
pub use wait::Timer;
