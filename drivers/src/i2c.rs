// Licensed under the Apache-2.0 license

use te_error::TeResult;

pub const I2C_SPEED_MIN: u32 = 21 * 1000;
pub const I2C_SPEED_MAX: u32 = 400 * 1000;

/// One TWI controller instance.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TwiHandle {
    /// Physical base address
    pub pa: u32,
    /// Virtual base address
    pub va: usize,
    /// Source clock (Hz)
    pub sclk: u32,
    /// Interface clock (Hz)
    pub twi_clk: u32,
}

/// Transfers addressed to an internal device register.
///
/// `addr_len` is the number of address bytes sent before the payload.
pub trait I2cController {
    fn init(&self, handle: &TwiHandle) -> TeResult<()>;

    fn write(&self, handle: &TwiHandle, slave: u8, addr: u32, addr_len: u32, data: &[u8])
        -> TeResult<()>;

    fn read(
        &self,
        handle: &TwiHandle,
        slave: u8,
        addr: u32,
        addr_len: u32,
        data: &mut [u8],
    ) -> TeResult<()>;

    /// Writes `data[..write_len]`, then reads `read_len` bytes into `data`.
    fn write_read(
        &self,
        handle: &TwiHandle,
        slave: u8,
        addr: u32,
        addr_len: u32,
        data: &mut [u8],
        write_len: usize,
        read_len: usize,
    ) -> TeResult<()>;
}
