/*++

Licensed under the Apache-2.0 license.

File Name:

    te_mailbox.rs

Abstract:

    File contains the host side of the Tiny Enclave mailbox handshake.

--*/
use crate::cache::Dcache;
use crate::printer::HexU32;
use crate::te_buf::TeBuf;
use crate::wait::{self, Timer};
use crate::cprintln;
use te_error::{TeError, TeResult};
use te_registers::mailbox::{self, EStatus, HStatus};
use tock_registers::LocalRegisterCopy;
use ureg::{Mmio, MmioFault};

/// Maximum time the enclave is given to answer a request.
pub const TE_RESPONSE_TIMEOUT_US: u64 = 8_000_000;

/// Maximum number of argument words in one request.
pub const MAX_ARGS: usize = mailbox::MDR_COUNT;

mod fsm {
    use smlang::statemachine;

    statemachine! {
        transitions: {
            *Idle + Stage = RequestStaged,
            Completed + Stage = RequestStaged,
            TimedOut + Stage = RequestStaged,
            Aborted + Stage = RequestStaged,
            RequestStaged + Stage = RequestStaged,
            RequestStaged + Signal = RequestSignaled,
            RequestStaged + Abort = Aborted,
            RequestSignaled + Poll = AwaitingResponse,
            RequestSignaled + Abort = Aborted,
            AwaitingResponse + Respond = Completed,
            AwaitingResponse + Expire = TimedOut,
            AwaitingResponse + Abort = Aborted,
        }
    }

    pub struct Context;

    impl StateMachineContext for Context {}
}

pub use fsm::States as TransactionState;

/// Hardware the transaction engine drives.
#[derive(Copy, Clone)]
pub struct TeHw<'a> {
    pub mmio: &'a dyn Mmio,
    pub dcache: &'a dyn Dcache,
    pub timer: &'a dyn Timer,
}

/// One enclave mailbox instance.
pub struct TeMailbox<'a> {
    hw: TeHw<'a>,
    base: usize,
    fsm: fsm::StateMachine<fsm::Context>,
}

impl<'a> TeMailbox<'a> {
    /// `base` is the virtual address of the mailbox register window.
    pub fn new(hw: TeHw<'a>, base: usize) -> Self {
        Self {
            hw,
            base,
            fsm: fsm::StateMachine::new(fsm::Context),
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn state(&self) -> &TransactionState {
        self.fsm.state()
    }

    pub fn read_reg(&self, offset: usize) -> TeResult<u32> {
        self.hw
            .mmio
            .read_u32(self.base + offset)
            .map_err(|_| TeError::DRIVER_MAILBOX_MMIO_FAULT)
    }

    fn write_reg(&self, offset: usize, val: u32) -> Result<(), MmioFault> {
        self.hw.mmio.write_u32(self.base + offset, val)
    }

    fn step(&mut self, event: fsm::Events) -> TeResult<()> {
        self.fsm
            .process_event(event)
            .map(|_| ())
            .map_err(|_| TeError::DRIVER_MAILBOX_INVALID_STATE)
    }

    fn abort(&mut self) -> TeError {
        let _ = self.fsm.process_event(fsm::Events::Abort);
        TeError::DRIVER_MAILBOX_MMIO_FAULT
    }

    /// Runs one request/response exchange.
    ///
    /// `args` are written to the data registers and, on completion, replaced
    /// by what the enclave left there. The staged contents of `buf` are
    /// cleaned to memory before the request is signaled and invalidated
    /// after the response. Returns the enclave result code.
    pub fn transact(&mut self, buf: &mut TeBuf, id: u32, args: &mut [u32]) -> TeResult<u32> {
        if args.len() > MAX_ARGS {
            return Err(TeError::DRIVER_MAILBOX_INVALID_ARGS);
        }
        self.step(fsm::Events::Stage)?;

        self.hw.dcache.clean_range(buf.phys_base(), buf.as_bytes());

        let staged = self.write_reg(mailbox::HRC0, id).and_then(|_| {
            args.iter()
                .enumerate()
                .try_for_each(|(i, arg)| self.write_reg(mailbox::mdr(i), *arg))
        });
        if staged.is_err() {
            return Err(self.abort());
        }

        self.step(fsm::Events::Signal)?;
        let mut hreq: LocalRegisterCopy<u32, HStatus::Register> = LocalRegisterCopy::new(0);
        hreq.modify(HStatus::HREQ_RDY::SET);
        if self.write_reg(mailbox::H_STATUS, hreq.get()).is_err() {
            return Err(self.abort());
        }

        self.step(fsm::Events::Poll)?;
        let mmio = self.hw.mmio;
        let e_status = self.base + mailbox::E_STATUS;
        let responded = wait::until_or_timeout(self.hw.timer, TE_RESPONSE_TIMEOUT_US, || {
            let status: LocalRegisterCopy<u32, EStatus::Register> =
                LocalRegisterCopy::new(mmio.read_u32(e_status)?);
            Ok::<bool, MmioFault>(status.is_set(EStatus::ERESP_RDY))
        });
        match responded {
            Ok(true) => self.step(fsm::Events::Respond)?,
            Ok(false) => {
                self.step(fsm::Events::Expire)?;
                cprintln!("[te] Timed out waiting for enclave response to {}", HexU32(id));
                return Err(TeError::DRIVER_MAILBOX_TIMEOUT);
            }
            Err(_) => return Err(self.abort()),
        }

        let mut ack: LocalRegisterCopy<u32, HStatus::Register> = LocalRegisterCopy::new(0);
        ack.modify(HStatus::ERESP_ACK::SET);
        self.write_reg(mailbox::H_STATUS, ack.get())
            .map_err(|_| TeError::DRIVER_MAILBOX_MMIO_FAULT)?;

        self.hw
            .dcache
            .invalidate_range(buf.phys_base(), buf.as_bytes_mut());

        for (i, arg) in args.iter_mut().enumerate() {
            *arg = self.read_reg(mailbox::mdr(i))?;
        }
        self.read_reg(mailbox::ERC1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};
    use std::rc::Rc;
    use te_emu_bus::testing::FakeBus;
    use te_emu_bus::BusMmio;

    const BASE: usize = 0x2072_c000;

    fn reg(offset: usize) -> u32 {
        (BASE + offset) as u32
    }

    struct CountingCache {
        cleans: Cell<u32>,
        invalidates: Cell<u32>,
    }
    impl Dcache for CountingCache {
        fn clean_range(&self, _pa: u32, _data: &[u8]) {
            self.cleans.set(self.cleans.get() + 1);
        }
        fn invalidate_range(&self, _pa: u32, _data: &mut [u8]) {
            self.invalidates.set(self.invalidates.get() + 1);
        }
    }

    struct StepTimer(Cell<u64>);
    impl Timer for StepTimer {
        fn now_us(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 1000);
            now
        }
    }

    struct Rig {
        bus: Rc<RefCell<FakeBus>>,
        mmio: BusMmio<Rc<RefCell<FakeBus>>>,
        dcache: CountingCache,
        timer: StepTimer,
    }

    impl Rig {
        fn new() -> Self {
            let bus = Rc::new(RefCell::new(FakeBus::new()));
            Self {
                mmio: BusMmio::new(bus.clone()),
                bus,
                dcache: CountingCache {
                    cleans: Cell::new(0),
                    invalidates: Cell::new(0),
                },
                timer: StepTimer(Cell::new(0)),
            }
        }

        fn mailbox(&self) -> TeMailbox<'_> {
            let hw = TeHw {
                mmio: &self.mmio,
                dcache: &self.dcache,
                timer: &self.timer,
            };
            TeMailbox::new(hw, BASE)
        }

        fn log(&self) -> String {
            self.bus.borrow().log.take()
        }
    }

    #[test]
    fn test_transact_register_sequence() {
        let rig = Rig::new();
        {
            let mut bus = rig.bus.borrow_mut();
            bus.script(reg(mailbox::E_STATUS), &[1]);
            bus.script(reg(mailbox::mdr(0)), &[11]);
            bus.script(reg(mailbox::mdr(1)), &[21]);
        }
        let mut mbox = rig.mailbox();
        let mut buf = TeBuf::new(0x1000);
        let mut args = [10, 20];
        assert_eq!(mbox.transact(&mut buf, 0x1d, &mut args), Ok(0));
        assert_eq!(args, [11, 21]);
        assert!(matches!(mbox.state(), TransactionState::Completed));
        assert_eq!(rig.dcache.cleans.get(), 1);
        assert_eq!(rig.dcache.invalidates.get(), 1);

        assert_eq!(
            rig.log(),
            "write.w 0x2072c000 <- 0x1d\n\
             write.w 0x2072c004 <- 0xa\n\
             write.w 0x2072c008 <- 0x14\n\
             write.w 0x2072c080 <- 0x1\n\
             read.w 0x2072c084 -> 0x1\n\
             write.w 0x2072c080 <- 0x2\n\
             read.w 0x2072c004 -> 0xb\n\
             read.w 0x2072c008 -> 0x15\n\
             read.w 0x2072c08c -> 0x0\n"
        );
    }

    #[test]
    fn test_result_code_is_returned() {
        let rig = Rig::new();
        {
            let mut bus = rig.bus.borrow_mut();
            bus.script(reg(mailbox::E_STATUS), &[0, 0, 1]);
            bus.script(reg(mailbox::ERC1), &[0x21]);
        }
        let mut mbox = rig.mailbox();
        let mut buf = TeBuf::new(0x1000);
        assert_eq!(mbox.transact(&mut buf, 0x09, &mut [0, 0]), Ok(0x21));
        assert_eq!(rig.bus.borrow().log.count("read.w 0x2072c084"), 3);
    }

    #[test]
    fn test_too_many_args_touches_nothing() {
        let rig = Rig::new();
        let mut mbox = rig.mailbox();
        let mut buf = TeBuf::new(0x1000);
        let mut args = [0u32; 11];
        assert_eq!(
            mbox.transact(&mut buf, 0, &mut args),
            Err(TeError::DRIVER_MAILBOX_INVALID_ARGS)
        );
        assert_eq!(rig.log(), "");
        assert_eq!(rig.dcache.cleans.get(), 0);
        assert!(matches!(mbox.state(), TransactionState::Idle));
    }

    #[test]
    fn test_staging_fault_aborts() {
        let rig = Rig::new();
        rig.bus.borrow_mut().fault(reg(mailbox::mdr(0)));
        let mut mbox = rig.mailbox();
        let mut buf = TeBuf::new(0x1000);
        assert_eq!(
            mbox.transact(&mut buf, 0x1e, &mut [0x8000_0040]),
            Err(TeError::DRIVER_MAILBOX_MMIO_FAULT)
        );
        assert!(matches!(mbox.state(), TransactionState::Aborted));
        // the request is never signaled
        assert_eq!(rig.bus.borrow().log.count("write.w 0x2072c080"), 0);
    }

    #[test]
    fn test_timeout_then_reuse() {
        let rig = Rig::new();
        let mut mbox = rig.mailbox();
        let mut buf = TeBuf::new(0x1000);
        assert_eq!(
            mbox.transact(&mut buf, 0x01, &mut []),
            Err(TeError::DRIVER_MAILBOX_TIMEOUT)
        );
        assert!(matches!(mbox.state(), TransactionState::TimedOut));
        assert_eq!(rig.dcache.invalidates.get(), 0);

        let log = rig.log();
        // the ack is never written after a timeout
        assert!(!log.contains("write.w 0x2072c080 <- 0x2"));
        // one poll per millisecond clock read until 8 s have elapsed
        let polls = log
            .lines()
            .filter(|line| line.starts_with("read.w 0x2072c084"))
            .count();
        assert_eq!(polls as u64, TE_RESPONSE_TIMEOUT_US / 1000 - 1);

        rig.bus.borrow_mut().script(reg(mailbox::E_STATUS), &[1]);
        assert_eq!(mbox.transact(&mut buf, 0x01, &mut []), Ok(0));
        assert!(matches!(mbox.state(), TransactionState::Completed));
    }
}
