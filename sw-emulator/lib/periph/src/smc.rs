// Licensed under the Apache-2.0 license

use std::cell::{Cell, RefCell};

use te_drivers::{SecureMonitor, SmcArgs};
use te_registers::soc;

use crate::dram::Dram;

/// Unknown function ids return this in a0.
pub const SMC_UNKNOWN: u64 = u64::MAX;

/// Lower firmware layer answering SiP calls.
pub struct EmuSmc {
    dram: Dram,
    bl31_log: RefCell<Vec<u8>>,
    status: Cell<u64>,
    calls: Cell<u32>,
}

impl EmuSmc {
    pub fn new(dram: Dram) -> Self {
        Self {
            dram,
            bl31_log: RefCell::new(Vec::new()),
            status: Cell::new(0),
            calls: Cell::new(0),
        }
    }

    pub fn set_bl31_log(&self, text: &[u8]) {
        *self.bl31_log.borrow_mut() = text.to_vec();
    }

    /// a0 returned by the log call.
    pub fn set_status(&self, status: u64) {
        self.status.set(status);
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl SecureMonitor for EmuSmc {
    fn call(&self, args: &mut SmcArgs) {
        self.calls.set(self.calls.get() + 1);
        if args.a0 != u64::from(soc::SMC_SIP_BL31_LOG) {
            args.a0 = SMC_UNKNOWN;
            return;
        }
        if self.status.get() == 0 {
            let log = self.bl31_log.borrow();
            let len = log.len().min(args.a2 as usize);
            if self.dram.write(args.a1 as u32, &log[..len]).is_err() {
                args.a0 = SMC_UNKNOWN;
                return;
            }
        }
        args.a0 = self.status.get();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_call() {
        let dram = Dram::new(0x9000_0000, 0x20);
        let smc = EmuSmc::new(dram.clone());
        smc.set_bl31_log(b"abcdef");
        let mut args = SmcArgs::new(soc::SMC_SIP_BL31_LOG);
        args.a1 = 0x9000_0010;
        args.a2 = 4;
        smc.call(&mut args);
        assert_eq!(args.a0, 0);
        let mut out = [0u8; 5];
        dram.read(0x9000_0010, &mut out).unwrap();
        assert_eq!(&out, b"abcd\0");

        let mut args = SmcArgs::new(0xc200_0099);
        smc.call(&mut args);
        assert_eq!(args.a0, SMC_UNKNOWN);
        assert_eq!(smc.calls(), 2);
    }
}
