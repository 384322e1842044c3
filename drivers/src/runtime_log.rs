/*++

Licensed under the Apache-2.0 license.

File Name:

    runtime_log.rs

Abstract:

    File contains the runtime error log ring buffer.

--*/
use core::cell::RefCell;
use core::convert::Infallible;
use critical_section::Mutex;
use ufmt::uWrite;

/// Capacity of the secure world log.
pub const OPTEE_LOG_SIZE: usize = 500;

/// Capacity of the log kept by the lower firmware layer.
pub const BL31_LOG_SIZE: usize = 500;

/// Terminates every message in the ring.
pub const GROUP_SEPARATOR: u8 = 0x1d;

struct Ring {
    data: [u8; OPTEE_LOG_SIZE],
    read: usize,
    len: usize,
}

impl Ring {
    const fn new() -> Self {
        Self {
            data: [0u8; OPTEE_LOG_SIZE],
            read: 0,
            len: 0,
        }
    }

    /// Characters that do not fit are dropped.
    fn push(&mut self, byte: u8) {
        if self.len == OPTEE_LOG_SIZE {
            return;
        }
        let idx = (self.read + self.len) % OPTEE_LOG_SIZE;
        self.data[idx] = byte;
        self.len += 1;
    }

    fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let count = self.len.min(out.len());
        for (i, slot) in out[..count].iter_mut().enumerate() {
            *slot = self.data[(self.read + i) % OPTEE_LOG_SIZE];
        }
        self.data.fill(0);
        self.read = 0;
        self.len = 0;
        count
    }
}

/// Writes message text into a locked ring.
pub struct LogWriter<'r> {
    ring: &'r mut Ring,
}

impl uWrite for LogWriter<'_> {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        s.bytes().for_each(|b| self.ring.push(b));
        Ok(())
    }
}

/// Ring of separator-terminated messages, read out destructively.
pub struct RuntimeLog {
    ring: Mutex<RefCell<Ring>>,
}

impl Default for RuntimeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeLog {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(Ring::new())),
        }
    }

    pub fn write(&self, message: &str) {
        self.write_message(|w| {
            let _ = w.write_str(message);
        });
    }

    /// Appends one message composed by `f`, followed by the separator.
    pub fn write_message(&self, f: impl FnOnce(&mut LogWriter<'_>)) {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            let mut writer = LogWriter { ring: &mut ring };
            f(&mut writer);
            writer.ring.push(GROUP_SEPARATOR);
        });
    }

    /// Moves up to `out.len()` bytes out of the log, then clears it.
    pub fn read(&self, out: &mut [u8]) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref_mut(cs).drain_into(out))
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_separated() {
        let log = RuntimeLog::new();
        log.write("Invalid key size");
        log.write_message(|w| {
            let _ = ufmt::uwrite!(w, "No matching command: {}", 7u32);
        });
        let mut out = [0u8; OPTEE_LOG_SIZE];
        let len = log.read(&mut out);
        assert_eq!(
            &out[..len],
            b"Invalid key size\x1dNo matching command: 7\x1d"
        );
        assert!(log.is_empty());
    }

    #[test]
    fn test_full_ring_drops_characters() {
        let log = RuntimeLog::new();
        let long = "x".repeat(OPTEE_LOG_SIZE + 20);
        log.write(&long);
        assert_eq!(log.len(), OPTEE_LOG_SIZE);
        log.write("dropped");
        let mut out = [0u8; OPTEE_LOG_SIZE + 10];
        assert_eq!(log.read(&mut out), OPTEE_LOG_SIZE);
        assert!(out[..OPTEE_LOG_SIZE].iter().all(|b| *b == b'x'));
    }

    #[test]
    fn test_short_read_clears() {
        let log = RuntimeLog::new();
        log.write("abcdef");
        let mut out = [0u8; 3];
        assert_eq!(log.read(&mut out), 3);
        assert_eq!(&out, b"abc");
        assert!(log.is_empty());
        log.write("z");
        let mut out = [0u8; 8];
        assert_eq!(log.read(&mut out), 2);
        assert_eq!(&out[..2], b"z\x1d");
    }
}
