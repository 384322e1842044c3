/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the library for error handling

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Outcome reported to the callers of a service.
///
/// This is the only status a caller ever observes; raw hardware or enclave
/// codes are folded into one of these before leaving the runtime.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TeeStatus {
    Success = 0,
    Generic = 0xffff_0000,
    AccessDenied = 0xffff_0001,
    BadParameters = 0xffff_0006,
    BadState = 0xffff_0007,
}

impl TeeStatus {
    pub fn is_success(self) -> bool {
        self == TeeStatus::Success
    }
}

impl From<TeeStatus> for u32 {
    fn from(val: TeeStatus) -> Self {
        val as u32
    }
}

impl From<TeError> for TeeStatus {
    fn from(val: TeError) -> Self {
        val.outcome()
    }
}

impl<T> From<TeResult<T>> for TeeStatus {
    fn from(val: TeResult<T>) -> Self {
        match val {
            Ok(_) => TeeStatus::Success,
            Err(err) => err.outcome(),
        }
    }
}

/// Tiny Enclave Error Type
/// Derives debug, copy, clone, eq, and partial eq
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TeError(pub NonZeroU32);

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, outcome, doc) tuples and generates
/// constant definitions for each error code, plus the mapping from each code
/// to the caller-visible outcome class.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:literal, $outcome:ident, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: TeError = TeError::new_const($value);
        )*

        /// Outcome class a caller observes for this error.
        pub const fn outcome(self) -> TeeStatus {
            match self.0.get() {
                $(
                    $value => TeeStatus::$outcome,
                )*
                _ => TeeStatus::Generic,
            }
        }

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(&'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl TeError {
    /// Create an error; intended to only be used from const contexts, as we
    /// don't want runtime panics if val is zero. The preferred way to get a
    /// TeError from a u32 is `TeError::try_from()`.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("TeError cannot be 0"),
        }
    }

    /// Component that raised the error (upper 16 bits of the code).
    pub const fn component(self) -> u16 {
        (self.0.get() >> 16) as u16
    }

    define_error_constants![
        // Transfer buffer
        (
            DRIVER_TE_BUF_INVALID_ARGS,
            0x0001_0001,
            BadParameters,
            "Transfer buffer: missing source or length outside bounds"
        ),
        (
            DRIVER_TE_BUF_OVERFLOW,
            0x0001_0002,
            Generic,
            "Transfer buffer: reservation exceeds remaining capacity"
        ),
        (
            DRIVER_TE_BUF_BAD_ADDRESS,
            0x0001_0003,
            Generic,
            "Transfer buffer: enclave returned an address outside the arena"
        ),
        // Mailbox transaction engine
        (
            DRIVER_MAILBOX_INVALID_ARGS,
            0x0002_0001,
            BadParameters,
            "Mailbox: more arguments than data registers"
        ),
        (
            DRIVER_MAILBOX_TIMEOUT,
            0x0002_0002,
            Generic,
            "Mailbox: enclave did not respond before the deadline"
        ),
        (
            DRIVER_MAILBOX_INVALID_STATE,
            0x0002_0003,
            Generic,
            "Mailbox: transaction step issued out of order"
        ),
        (
            DRIVER_MAILBOX_MMIO_FAULT,
            0x0002_0004,
            Generic,
            "Mailbox: register access faulted"
        ),
        (
            DRIVER_MAILBOX_NO_SECONDARY,
            0x0002_0005,
            BadState,
            "Mailbox: secondary tile addressed on a single-tile system"
        ),
        (
            DRIVER_ENCLAVE_STATUS,
            0x0002_0006,
            Generic,
            "Enclave reported a non-zero result code"
        ),
        (
            DRIVER_MAILBOX_REGS_UNMAPPED,
            0x0002_0007,
            Generic,
            "Mailbox: register window has no static mapping"
        ),
        // Enclave API
        (
            DRIVER_ENCLAVE_BOOTROM_BYPASS,
            0x0003_0001,
            Generic,
            "Enclave unavailable: bootrom bypass enabled"
        ),
        (
            DRIVER_ENCLAVE_HUK_LENGTH,
            0x0003_0002,
            Generic,
            "Enclave returned a hardware unique key of the wrong length"
        ),
        (
            DRIVER_ENCLAVE_UNKNOWN_LIFECYCLE,
            0x0003_0003,
            Generic,
            "Lifecycle register holds an unknown encoding"
        ),
        (
            DRIVER_ENCLAVE_LENGTH_OVERFLOW,
            0x0003_0004,
            Generic,
            "Enclave reported more output bytes than the caller provided"
        ),
        // Memory map
        (
            DRIVER_MMU_MAP_FAILED,
            0x0004_0001,
            Generic,
            "Unable to add a temporary MMU mapping"
        ),
        (
            DRIVER_MMU_UNMAP_FAILED,
            0x0004_0002,
            Generic,
            "Unable to remove a temporary MMU mapping"
        ),
        (
            DRIVER_MMIO_FAULT,
            0x0004_0003,
            Generic,
            "Memory mapped access faulted"
        ),
        (
            DRIVER_MMIO_INVALID_WIDTH,
            0x0004_0004,
            Generic,
            "Unsupported memory mapped access width"
        ),
        // OTP
        (
            DRIVER_OTP_READ_FAILED,
            0x0005_0001,
            Generic,
            "OTP read failed"
        ),
        (
            DRIVER_OTP_WRITE_FAILED,
            0x0005_0002,
            Generic,
            "OTP write failed"
        ),
        // I2C
        (
            DRIVER_I2C_INIT_FAILED,
            0x0006_0001,
            Generic,
            "I2C controller initialization failed"
        ),
        (
            DRIVER_I2C_WRITE_FAILED,
            0x0006_0002,
            Generic,
            "I2C write failed"
        ),
        (
            DRIVER_I2C_READ_FAILED,
            0x0006_0003,
            Generic,
            "I2C read failed"
        ),
        // Platform configuration
        (
            DRIVER_CONFIG_INVALID_FDT,
            0x0007_0001,
            Generic,
            "Device tree blob could not be parsed"
        ),
        // Secure monitor
        (
            DRIVER_SMC_FAILED,
            0x0008_0001,
            Generic,
            "Secure monitor call returned an error"
        ),
        // Runtime
        (
            RUNTIME_UNIMPLEMENTED_COMMAND,
            0x000a_0001,
            BadParameters,
            "Runtime Error: Unimplemented command"
        ),
        (
            RUNTIME_UNKNOWN_SERVICE,
            0x000a_0002,
            BadParameters,
            "Runtime Error: No service registered for the UUID"
        ),
        (
            RUNTIME_BAD_PARAM_TYPES,
            0x000a_0003,
            BadParameters,
            "Runtime Error: Parameter types do not match the command"
        ),
        (
            RUNTIME_ADIMEM_INVALID_SIZE,
            0x000b_0001,
            BadParameters,
            "adimem: access size must be 8, 16 or 32 bits"
        ),
        (
            RUNTIME_ADIMEM_ACCESS_DENIED,
            0x000b_0002,
            AccessDenied,
            "adimem: no access table entry grants the request"
        ),
        (
            RUNTIME_ADIMEM_UNNECESSARY_PRIVILEGE,
            0x000b_0003,
            BadParameters,
            "adimem: privileged request for an access already granted"
        ),
        (
            RUNTIME_I2C_ACCESS_DENIED,
            0x000c_0001,
            BadParameters,
            "I2C: bus, slave, register and operation not permitted"
        ),
        (
            RUNTIME_I2C_INVALID_SPEED,
            0x000c_0002,
            BadParameters,
            "I2C: clock speed out of range"
        ),
        (
            RUNTIME_I2C_TOO_MANY_BYTES,
            0x000c_0003,
            BadParameters,
            "I2C: transfer length above limit"
        ),
        (
            RUNTIME_I2C_INVALID_BUS,
            0x000c_0004,
            Generic,
            "I2C: bus not present on this platform"
        ),
        (
            RUNTIME_I2C_INVALID_PARAMS,
            0x000c_0005,
            BadParameters,
            "I2C: request block malformed"
        ),
        (
            RUNTIME_I2C_SHORT_BUFFER,
            0x000c_0006,
            BadParameters,
            "I2C: payload buffer smaller than byte count"
        ),
        (
            RUNTIME_MEMDUMP_INVALID_RECORD,
            0x000d_0001,
            BadParameters,
            "memdump: record number out of range"
        ),
        (
            RUNTIME_MEMDUMP_SIZE_NOT_WIDTH_MULTIPLE,
            0x000d_0002,
            Generic,
            "memdump: record size is not a multiple of its width"
        ),
        (
            RUNTIME_MEMDUMP_INVALID_WIDTH,
            0x000d_0003,
            Generic,
            "memdump: register width not supported"
        ),
        (
            RUNTIME_MEMDUMP_SHORT_BUFFER,
            0x000d_0004,
            BadParameters,
            "memdump: output buffer smaller than record"
        ),
        (
            RUNTIME_OTP_MAC_INVALID_INTERFACE,
            0x000e_0001,
            BadParameters,
            "otp_macs: interface index out of range"
        ),
        (
            RUNTIME_OTP_MAC_ALREADY_PROVISIONED,
            0x000e_0002,
            Generic,
            "otp_macs: OTP already holds a MAC for the interface"
        ),
        (
            RUNTIME_OTP_TEMP_INVALID_GROUP,
            0x000e_0003,
            BadParameters,
            "otp_temp: temperature group id out of range"
        ),
        (
            RUNTIME_OTP_TEMP_WRITE_UNSUPPORTED,
            0x000e_0004,
            BadParameters,
            "otp_temp: write is not supported"
        ),
        (
            RUNTIME_TE_MAILBOX_BAD_LIFECYCLE,
            0x000f_0001,
            BadState,
            "te_mailbox: command not valid in the current lifecycle"
        ),
        (
            RUNTIME_TE_MAILBOX_INVALID_KEY_ID,
            0x000f_0002,
            BadParameters,
            "te_mailbox: unknown host key id"
        ),
        (
            RUNTIME_TE_MAILBOX_INVALID_KEY_SIZE,
            0x000f_0003,
            BadParameters,
            "te_mailbox: key size does not match key id"
        ),
        (
            RUNTIME_TE_MAILBOX_API_FAILED,
            0x000f_0004,
            Generic,
            "te_mailbox: enclave API returned an error"
        ),
        (
            RUNTIME_COUNTER_ROLLBACK,
            0x0010_0001,
            Generic,
            "Anti-rollback target is below the stored counter"
        ),
        (
            RUNTIME_COUNTER_READ_FAILED,
            0x0010_0002,
            Generic,
            "Anti-rollback counter could not be read"
        ),
        (
            RUNTIME_COUNTER_UPDATE_FAILED,
            0x0010_0003,
            Generic,
            "Anti-rollback counter could not be updated"
        ),
        (
            RUNTIME_BOOT_STATUS_WRITE_FAILED,
            0x0011_0001,
            Generic,
            "boot: status register write failed"
        ),
        (
            RUNTIME_SECONDARY_NOT_DUAL_TILE,
            0x0011_0002,
            Generic,
            "secondary_launcher: not a dual-tile system"
        ),
        (
            RUNTIME_SECONDARY_LINUX_DISABLED,
            0x0011_0003,
            Generic,
            "secondary_launcher: secondary tile not configured to boot"
        ),
    ];
}

impl From<core::num::NonZeroU32> for crate::TeError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::TeError(val)
    }
}

impl From<TeError> for core::num::NonZeroU32 {
    fn from(val: TeError) -> Self {
        val.0
    }
}

impl From<TeError> for u32 {
    fn from(val: TeError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for TeError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(TeError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type TeResult<T> = Result<T, TeError>;
