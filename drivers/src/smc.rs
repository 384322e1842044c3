// Licensed under the Apache-2.0 license

use crate::cache::Dcache;
use crate::te_buf::{LenBounds, TeBuf};
use te_error::{TeError, TeResult};
use te_registers::soc;

/// Register file of a synchronous secure monitor call.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SmcArgs {
    pub a0: u64,
    pub a1: u64,
    pub a2: u64,
    pub a3: u64,
    pub a4: u64,
    pub a5: u64,
    pub a6: u64,
    pub a7: u64,
}

impl SmcArgs {
    pub fn new(func: u32) -> Self {
        Self {
            a0: func.into(),
            ..Default::default()
        }
    }
}

/// Calls into the lower firmware layer. Results come back in `args`.
pub trait SecureMonitor {
    fn call(&self, args: &mut SmcArgs);
}

/// Asks the lower layer to copy its runtime log into physical memory.
///
/// The log is staged through `buf`, so at most `out.len()` bytes (capped by
/// the buffer capacity) are requested. Returns the length of the text up to
/// the first NUL.
pub fn fetch_bl31_log(
    smc: &dyn SecureMonitor,
    dcache: &dyn Dcache,
    buf: &mut TeBuf,
    out: &mut [u8],
) -> TeResult<usize> {
    buf.reset();
    let len = out.len().min(buf.remaining());
    let off = buf.reserve_zeroed(len, LenBounds::NON_EMPTY)?;
    dcache.clean_range(buf.phys_base(), buf.as_bytes());

    let mut args = SmcArgs::new(soc::SMC_SIP_BL31_LOG);
    args.a1 = buf.phys(off).into();
    args.a2 = len as u64;
    smc.call(&mut args);
    if args.a0 != 0 {
        buf.reset();
        return Err(TeError::DRIVER_SMC_FAILED);
    }

    dcache.invalidate_range(buf.phys_base(), buf.as_bytes_mut());
    let text = buf.slice_at(buf.phys(off), len)?;
    let text_len = text.iter().position(|b| *b == 0).unwrap_or(len);
    out[..text_len].copy_from_slice(&text[..text_len]);
    buf.reset();
    Ok(text_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    /// Fakes a monitor and memory that share one byte array.
    struct FakeMonitor {
        mem: RefCell<std::vec::Vec<u8>>,
        base: u32,
        log: &'static [u8],
        status: u64,
    }

    impl SecureMonitor for FakeMonitor {
        fn call(&self, args: &mut SmcArgs) {
            assert_eq!(args.a0, u64::from(soc::SMC_SIP_BL31_LOG));
            let off = (args.a1 as u32 - self.base) as usize;
            let len = (args.a2 as usize).min(self.log.len());
            self.mem.borrow_mut()[off..off + len].copy_from_slice(&self.log[..len]);
            args.a0 = self.status;
        }
    }

    impl Dcache for FakeMonitor {
        fn clean_range(&self, pa: u32, data: &[u8]) {
            let off = (pa - self.base) as usize;
            self.mem.borrow_mut()[off..off + data.len()].copy_from_slice(data);
        }

        fn invalidate_range(&self, pa: u32, data: &mut [u8]) {
            let off = (pa - self.base) as usize;
            data.copy_from_slice(&self.mem.borrow()[off..off + data.len()]);
        }
    }

    fn monitor(log: &'static [u8], status: u64) -> FakeMonitor {
        FakeMonitor {
            mem: RefCell::new(vec![0u8; crate::te_buf::TE_BUF_SIZE]),
            base: 0x9000_0000,
            log,
            status,
        }
    }

    #[test]
    fn test_fetch_stops_at_nul() {
        let mon = monitor(b"bl31 error\x1d\0garbage", 0);
        let mut buf = TeBuf::new(mon.base);
        let mut out = [0u8; 500];
        let len = fetch_bl31_log(&mon, &mon, &mut buf, &mut out).unwrap();
        assert_eq!(&out[..len], b"bl31 error\x1d");
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_fetch_failure() {
        let mon = monitor(b"ignored", 1);
        let mut buf = TeBuf::new(mon.base);
        let mut out = [0u8; 16];
        assert_eq!(
            fetch_bl31_log(&mon, &mon, &mut buf, &mut out),
            Err(TeError::DRIVER_SMC_FAILED)
        );
        assert_eq!(out, [0u8; 16]);
    }
}
