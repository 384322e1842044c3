/*++

Licensed under the Apache-2.0 license.

File Name:

    log.rs

Abstract:

    File contains the call log shared by the emulated devices.

--*/
use std::{
    cell::{Ref, RefCell},
    fmt::{self, Write},
    ops::Deref,
    rc::Rc,
};

/// Line-oriented record of the calls an emulated device has seen.
///
/// Clones share one buffer, so a test can keep a handle after the device
/// has been moved into a platform or bus.
#[derive(Clone, Default)]
pub struct Log {
    text: Rc<RefCell<String>>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line.
    pub fn record(&self, args: fmt::Arguments) {
        let mut text = self.text.borrow_mut();
        // Writing into a String cannot fail.
        let _ = text.write_fmt(args);
        text.push('\n');
    }

    pub fn as_str(&self) -> (impl Deref<Target = str> + '_) {
        Ref::map(self.text.borrow(), String::as_str)
    }

    /// Number of recorded lines starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.text
            .borrow()
            .lines()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    /// Drains the log.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.text.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_take() {
        let log = Log::new();
        log.record(format_args!("map({:#010x}, {:#x})", 0x2010_3000, 4));
        log.record(format_args!("unmap({:#010x}, {:#x})", 0x2010_3000, 4));
        assert_eq!(
            "map(0x20103000, 0x4)\nunmap(0x20103000, 0x4)\n",
            &*log.as_str()
        );
        assert_eq!(log.count("map("), 1);
        assert_eq!(log.count("unmap("), 1);
        assert_eq!(log.take().lines().count(), 2);
        assert_eq!("", log.take());
    }

    #[test]
    fn test_clones_share_buffer() {
        let log = Log::new();
        let device_side = log.clone();
        device_side.record(format_args!("get_rollback_counter()"));
        assert_eq!("get_rollback_counter()\n", log.take());
        assert_eq!("", &*device_side.as_str());
    }
}
