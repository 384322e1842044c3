/*++

Licensed under the Apache-2.0 license.

File Name:

    otp.rs

Abstract:

    File contains the OTP field accessors used by the secure services.

--*/
use te_error::{TeError, TeResult};

pub const MAC_ADDRESS_NUM_BYTES: usize = 6;
pub const NUM_MAC_ADDRESSES: u32 = 6;

pub type MacAddr = [u8; MAC_ADDRESS_NUM_BYTES];

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TempGroup {
    ClkEthPll = 0,
    Rf01Pll = 1,
    Tx01 = 2,
    Tx23 = 3,
    PllSlope = 4,
    TxSlope = 5,
}

impl TryFrom<u32> for TempGroup {
    type Error = TeError;
    fn try_from(val: u32) -> TeResult<Self> {
        Ok(match val {
            0 => Self::ClkEthPll,
            1 => Self::Rf01Pll,
            2 => Self::Tx01,
            3 => Self::Tx23,
            4 => Self::PllSlope,
            5 => Self::TxSlope,
            _ => return Err(TeError::RUNTIME_OTP_TEMP_INVALID_GROUP),
        })
    }
}

/// OTP memory controller. `base` is the virtual address of the controller.
///
/// MAC interfaces are numbered from 1.
pub trait Otp {
    fn get_mac_addr(&self, base: usize, interface: u32) -> TeResult<MacAddr>;

    fn set_mac_addr(&self, base: usize, interface: u32, mac: &MacAddr) -> TeResult<()>;

    fn get_temp_sensor(&self, base: usize, group: TempGroup) -> TeResult<u32>;

    fn get_rollback_counter(&self, base: usize) -> TeResult<u32>;

    fn set_rollback_counter(&self, base: usize, counter: u32) -> TeResult<()>;
}

/// Packs a MAC into two value words: `a` holds bytes 0..2, `b` bytes 2..6.
pub fn mac_to_words(mac: &MacAddr) -> (u32, u32) {
    let a = u32::from(mac[0]) << 8 | u32::from(mac[1]);
    let b = u32::from_be_bytes([mac[2], mac[3], mac[4], mac[5]]);
    (a, b)
}

pub fn words_to_mac(a: u32, b: u32) -> MacAddr {
    let [_, _, a0, a1] = a.to_be_bytes();
    let [b0, b1, b2, b3] = b.to_be_bytes();
    [a0, a1, b0, b1, b2, b3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_packing() {
        let mac = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
        assert_eq!(mac_to_words(&mac), (0xaabb, 0xccdd_eeff));
        assert_eq!(words_to_mac(0xaabb, 0xccdd_eeff), mac);
        // upper half of a is ignored
        assert_eq!(words_to_mac(0x1234_aabb, 0xccdd_eeff), mac);
    }

    #[test]
    fn test_temp_group() {
        assert_eq!(TempGroup::try_from(5), Ok(TempGroup::TxSlope));
        assert_eq!(
            TempGroup::try_from(6),
            Err(TeError::RUNTIME_OTP_TEMP_INVALID_GROUP)
        );
    }
}
