/*++

Licensed under the Apache-2.0 license.

File Name:

    mailbox.rs

Abstract:

    File contains the Tiny Enclave mailbox register layout.

--*/
use tock_registers::register_bitfields;

/// Size of one mailbox register window.
pub const WINDOW_SIZE: usize = 0x1000;

/// Request id written by the host.
pub const HRC0: usize = 0x000;

/// First data register. The remaining ones follow at `MDR_STRIDE`.
pub const MDR0: usize = 0x004;
pub const MDR_STRIDE: usize = 4;
pub const MDR_COUNT: usize = 10;

pub const H_STATUS: usize = 0x080;
pub const E_STATUS: usize = 0x084;

/// Enclave result code.
pub const ERC1: usize = 0x08c;

pub const LIFECYCLE_STATUS: usize = 0x100;
pub const BOOT_FLOW0: usize = 0x104;
pub const BOOT_FLOW1: usize = 0x108;

/// Offset of data register `idx`.
pub const fn mdr(idx: usize) -> usize {
    MDR0 + idx * MDR_STRIDE
}

register_bitfields! [
    u32,

    /// Host status register
    pub HStatus [
        HREQ_RDY OFFSET(0) NUMBITS(1) [],
        ERESP_ACK OFFSET(1) NUMBITS(1) [],
    ],

    /// Enclave status register
    pub EStatus [
        ERESP_RDY OFFSET(0) NUMBITS(1) [],
    ],

    pub LifecycleStatus [
        ENCODE OFFSET(0) NUMBITS(5) [],
    ],

    pub BootFlow0 [
        LOAD_AND_UNWRAP_KEYS OFFSET(3) NUMBITS(1) [],
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use tock_registers::LocalRegisterCopy;

    #[test]
    fn test_data_registers_fit_before_status() {
        assert_eq!(mdr(0), 0x004);
        assert_eq!(mdr(MDR_COUNT - 1), 0x028);
        assert!(mdr(MDR_COUNT) <= H_STATUS);
        assert!(BOOT_FLOW1 < WINDOW_SIZE);
    }

    #[test]
    fn test_status_bits() {
        let h: LocalRegisterCopy<u32, HStatus::Register> =
            LocalRegisterCopy::new(0b10);
        assert!(h.is_set(HStatus::ERESP_ACK));
        assert!(!h.is_set(HStatus::HREQ_RDY));
        assert_eq!(h.get(), 0b10);

        let flow: LocalRegisterCopy<u32, BootFlow0::Register> = LocalRegisterCopy::new(0x8);
        assert!(flow.is_set(BootFlow0::LOAD_AND_UNWRAP_KEYS));

        let lc: LocalRegisterCopy<u32, LifecycleStatus::Register> =
            LocalRegisterCopy::new(0xffff_ffe4);
        assert_eq!(lc.read(LifecycleStatus::ENCODE), 4);
    }
}
