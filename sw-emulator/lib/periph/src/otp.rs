/*++

Licensed under the Apache-2.0 license.

File Name:

    otp.rs

Abstract:

    File contains an emulated OTP controller.

--*/

use std::cell::{Cell, RefCell};

use te_drivers::{MacAddr, Otp, TempGroup, NUM_MAC_ADDRESSES};
use te_emu_bus::testing::Log;
use te_error::{TeError, TeResult};
use te_registers::soc;

const NUM_TEMP_GROUPS: usize = 6;

pub struct EmuOtp {
    pub log: Log,
    macs: RefCell<[MacAddr; NUM_MAC_ADDRESSES as usize]>,
    temps: RefCell<[u32; NUM_TEMP_GROUPS]>,
    rollback: Cell<u32>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl Default for EmuOtp {
    fn default() -> Self {
        Self {
            log: Log::new(),
            macs: RefCell::new([[0u8; 6]; NUM_MAC_ADDRESSES as usize]),
            temps: RefCell::new([0; NUM_TEMP_GROUPS]),
            rollback: Cell::new(0),
            fail_reads: Cell::new(false),
            fail_writes: Cell::new(false),
        }
    }
}

impl EmuOtp {
    pub fn mac(&self, interface: u32) -> MacAddr {
        self.macs.borrow()[interface as usize - 1]
    }

    pub fn set_mac(&self, interface: u32, mac: MacAddr) {
        self.macs.borrow_mut()[interface as usize - 1] = mac;
    }

    pub fn set_temp(&self, group: TempGroup, val: u32) {
        self.temps.borrow_mut()[group as usize] = val;
    }

    pub fn rollback_counter(&self) -> u32 {
        self.rollback.get()
    }

    pub fn set_rollback(&self, counter: u32) {
        self.rollback.set(counter);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_read(&self, base: usize) -> TeResult<()> {
        if self.fail_reads.get() || base != soc::OTP_BASE as usize {
            return Err(TeError::DRIVER_OTP_READ_FAILED);
        }
        Ok(())
    }

    fn check_write(&self, base: usize) -> TeResult<()> {
        if self.fail_writes.get() || base != soc::OTP_BASE as usize {
            return Err(TeError::DRIVER_OTP_WRITE_FAILED);
        }
        Ok(())
    }

    fn mac_index(interface: u32) -> Option<usize> {
        (1..=NUM_MAC_ADDRESSES)
            .contains(&interface)
            .then(|| interface as usize - 1)
    }
}

impl Otp for EmuOtp {
    fn get_mac_addr(&self, base: usize, interface: u32) -> TeResult<MacAddr> {
        self.log.record(format_args!("get_mac_addr({interface})"));
        self.check_read(base)?;
        let idx = Self::mac_index(interface).ok_or(TeError::DRIVER_OTP_READ_FAILED)?;
        Ok(self.macs.borrow()[idx])
    }

    fn set_mac_addr(&self, base: usize, interface: u32, mac: &MacAddr) -> TeResult<()> {
        self.log.record(format_args!("set_mac_addr({interface}, {mac:02x?})"));
        self.check_write(base)?;
        let idx = Self::mac_index(interface).ok_or(TeError::DRIVER_OTP_WRITE_FAILED)?;
        self.macs.borrow_mut()[idx] = *mac;
        Ok(())
    }

    fn get_temp_sensor(&self, base: usize, group: TempGroup) -> TeResult<u32> {
        self.log.record(format_args!("get_temp_sensor({group:?})"));
        self.check_read(base)?;
        Ok(self.temps.borrow()[group as usize])
    }

    fn get_rollback_counter(&self, base: usize) -> TeResult<u32> {
        self.log.record(format_args!("get_rollback_counter()"));
        self.check_read(base)?;
        Ok(self.rollback.get())
    }

    fn set_rollback_counter(&self, base: usize, counter: u32) -> TeResult<()> {
        self.log.record(format_args!("set_rollback_counter({counter})"));
        self.check_write(base)?;
        self.rollback.set(counter);
        Ok(())
    }
}
