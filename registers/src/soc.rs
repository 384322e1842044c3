/*++

Licensed under the Apache-2.0 license.

File Name:

    soc.rs

Abstract:

    File contains the SoC physical memory map seen by the secure world.

--*/

/// Primary tile peripheral window.
pub const PERIPH_BASE: u32 = 0x2000_0000;
pub const PERIPH_SIZE: u32 = 0x0400_0000;

/// Secondary tile peripheral window. Only present on dual-tile systems.
pub const SEC_PERIPH_BASE: u32 = 0x2400_0000;
pub const SEC_PERIPH_SIZE: u32 = 0x0400_0000;

pub const A55_SYS_CFG: u32 = 0x2010_0000;
pub const SEC_A55_SYS_CFG: u32 = 0x2410_0000;

/// Offset of the scratch status registers inside A55_SYS_CFG.
pub const SCRATCH: u32 = 0x0004_0000;
pub const SCRATCH_NS: u32 = 0x0008_0000;

pub const RESET_CAUSE: u32 = A55_SYS_CFG + SCRATCH;
pub const BOOT_CNT: u32 = A55_SYS_CFG + SCRATCH + 4;

/// Secondary tile boot handshake register.
pub const SEC_HOST_BOOT_READY: u32 = SEC_A55_SYS_CFG + 0x1048;
pub const HOST_BOOT_READY_MASK: u32 = 1 << 0;

pub const OTP_BASE: u32 = 0x2020_3000;
pub const SEC_OTP_BASE: u32 = 0x2420_3000;
pub const OTP_SIZE: u32 = 0x1000;

pub const TE_MAILBOX_BASE: u32 = 0x2072_c000;
pub const SEC_TE_MAILBOX_BASE: u32 = 0x2472_c000;

pub const I2C_0_BASE: u32 = 0x2076_0000;
pub const I2C_SIZE: u32 = 0x1000;

/// SiP service returning the BL31 runtime log.
pub const SMC_SIP_BL31_LOG: u32 = 0xc200_0003;
