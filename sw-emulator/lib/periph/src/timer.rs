// Licensed under the Apache-2.0 license

use std::cell::Cell;

use te_drivers::Timer;

/// A clock that advances by a fixed step every time it is read.
pub struct EmuTimer {
    now: Cell<u64>,
    step_us: Cell<u64>,
}

impl EmuTimer {
    pub fn new(step_us: u64) -> Self {
        Self {
            now: Cell::new(0),
            step_us: Cell::new(step_us),
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.now.get()
    }

    pub fn set_step_us(&self, step_us: u64) {
        self.step_us.set(step_us);
    }
}

impl Default for EmuTimer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Timer for EmuTimer {
    fn now_us(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step_us.get());
        now
    }
}
