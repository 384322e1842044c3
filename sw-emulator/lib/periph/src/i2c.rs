/*++

Licensed under the Apache-2.0 license.

File Name:

    i2c.rs

Abstract:

    File contains an emulated TWI controller with register-addressed slaves.

--*/

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use te_drivers::{I2cController, TwiHandle};
use te_emu_bus::testing::Log;
use te_error::{TeError, TeResult};

/// Slave registers are keyed by `(slave, register address)`. A register
/// reads back as its stored bytes, zero padded.
pub struct EmuI2c {
    pub log: Log,
    regs: RefCell<HashMap<(u8, u32), Vec<u8>>>,
    fail_init: Cell<bool>,
    fail_write: Cell<bool>,
    fail_read: Cell<bool>,
}

impl Default for EmuI2c {
    fn default() -> Self {
        Self {
            log: Log::new(),
            regs: RefCell::new(HashMap::new()),
            fail_init: Cell::new(false),
            fail_write: Cell::new(false),
            fail_read: Cell::new(false),
        }
    }
}

impl EmuI2c {
    pub fn set_reg(&self, slave: u8, addr: u32, data: &[u8]) {
        self.regs.borrow_mut().insert((slave, addr), data.to_vec());
    }

    pub fn reg(&self, slave: u8, addr: u32) -> Option<Vec<u8>> {
        self.regs.borrow().get(&(slave, addr)).cloned()
    }

    pub fn fail_init(&self, fail: bool) {
        self.fail_init.set(fail);
    }

    pub fn fail_write(&self, fail: bool) {
        self.fail_write.set(fail);
    }

    pub fn fail_read(&self, fail: bool) {
        self.fail_read.set(fail);
    }

    fn load(&self, slave: u8, addr: u32, data: &mut [u8]) {
        let regs = self.regs.borrow();
        let stored = regs.get(&(slave, addr)).map(Vec::as_slice).unwrap_or(&[]);
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = stored.get(i).copied().unwrap_or(0);
        }
    }
}

impl I2cController for EmuI2c {
    fn init(&self, handle: &TwiHandle) -> TeResult<()> {
        self.log.record(format_args!(
            "init({:#010x}, sclk={}, twi_clk={})",
            handle.pa,
            handle.sclk,
            handle.twi_clk
        ));
        if self.fail_init.get() {
            return Err(TeError::DRIVER_I2C_INIT_FAILED);
        }
        Ok(())
    }

    fn write(
        &self,
        _handle: &TwiHandle,
        slave: u8,
        addr: u32,
        addr_len: u32,
        data: &[u8],
    ) -> TeResult<()> {
        self.log.record(format_args!(
            "write({slave:#x}, {addr:#x}, {addr_len}, {data:02x?})"
        ));
        if self.fail_write.get() {
            return Err(TeError::DRIVER_I2C_WRITE_FAILED);
        }
        self.set_reg(slave, addr, data);
        Ok(())
    }

    fn read(
        &self,
        _handle: &TwiHandle,
        slave: u8,
        addr: u32,
        addr_len: u32,
        data: &mut [u8],
    ) -> TeResult<()> {
        self.log.record(format_args!(
            "read({slave:#x}, {addr:#x}, {addr_len}, {})",
            data.len()
        ));
        if self.fail_read.get() {
            return Err(TeError::DRIVER_I2C_READ_FAILED);
        }
        self.load(slave, addr, data);
        Ok(())
    }

    fn write_read(
        &self,
        _handle: &TwiHandle,
        slave: u8,
        addr: u32,
        addr_len: u32,
        data: &mut [u8],
        write_len: usize,
        read_len: usize,
    ) -> TeResult<()> {
        self.log.record(format_args!(
            "write_read({slave:#x}, {addr:#x}, {addr_len}, {:02x?}, {read_len})",
            &data[..write_len]
        ));
        if self.fail_write.get() {
            return Err(TeError::DRIVER_I2C_WRITE_FAILED);
        }
        self.set_reg(slave, addr, &data[..write_len]);
        if self.fail_read.get() {
            return Err(TeError::DRIVER_I2C_READ_FAILED);
        }
        self.load(slave, addr, &mut data[..read_len]);
        Ok(())
    }
}
