/*++

Licensed under the Apache-2.0 license.

File Name:

    te_mailbox.rs

Abstract:

    File contains the enclave side of the Tiny Enclave mailbox register window.

--*/

use te_drivers::MAX_ARGS;
use te_emu_bus::{Bus, BusError, RvAddr, RvData, RvSize};
use te_registers::mailbox::{self, EStatus, HStatus};
use tock_registers::LocalRegisterCopy;

use crate::dram::Dram;
use crate::enclave_model::EnclaveModel;

mod fsm {
    use smlang::statemachine;

    statemachine! {
        transitions: {
            // CurrentState Event = NextState
            *Idle + HostRequest = Busy,
            Busy + Deliver = Responded,
            Responded + HostAck = Idle,
        }
    }

    pub struct Context;

    impl StateMachineContext for Context {}
}

pub use fsm::States as EnclaveState;

/// When the enclave raises ERESP_RDY after a request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResponseMode {
    /// After this many E_STATUS reads.
    AfterPolls(u32),
    Never,
}

/// A request as the enclave saw it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Request {
    pub id: u32,
    pub args: [u32; MAX_ARGS],
}

/// One 0x1000 byte mailbox window with an `EnclaveModel` behind it.
pub struct TeMailboxPeriph {
    pub model: EnclaveModel,
    pub response: ResponseMode,
    fsm: fsm::StateMachine<fsm::Context>,
    dram: Dram,
    hrc0: u32,
    mdr: [u32; MAX_ARGS],
    erc1: u32,
    polls: u32,
    requests: Vec<Request>,
    acks: u32,
}

impl TeMailboxPeriph {
    pub fn new(dram: Dram) -> Self {
        Self {
            model: EnclaveModel::default(),
            response: ResponseMode::AfterPolls(1),
            fsm: fsm::StateMachine::new(fsm::Context),
            dram,
            hrc0: 0,
            mdr: [0; MAX_ARGS],
            erc1: 0,
            polls: 0,
            requests: Vec::new(),
            acks: 0,
        }
    }

    pub fn mmap_size(&self) -> RvAddr {
        mailbox::WINDOW_SIZE as RvAddr
    }

    pub fn state(&self) -> &EnclaveState {
        self.fsm.state()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn request_ids(&self) -> Vec<u32> {
        self.requests.iter().map(|req| req.id).collect()
    }

    pub fn acks(&self) -> u32 {
        self.acks
    }

    fn host_status_write(&mut self, val: u32) {
        let status: LocalRegisterCopy<u32, HStatus::Register> = LocalRegisterCopy::new(val);
        if status.is_set(HStatus::HREQ_RDY) && self.fsm.process_event(fsm::Events::HostRequest).is_ok() {
            self.requests.push(Request {
                id: self.hrc0,
                args: self.mdr,
            });
            self.polls = 0;
            self.erc1 = self.model.handle(self.hrc0, &mut self.mdr, &self.dram);
        }
        if status.is_set(HStatus::ERESP_ACK) && self.fsm.process_event(fsm::Events::HostAck).is_ok() {
            self.acks += 1;
        }
    }

    fn enclave_status_read(&mut self) -> u32 {
        if matches!(self.fsm.state(), EnclaveState::Busy) {
            self.polls += 1;
            if let ResponseMode::AfterPolls(polls) = self.response {
                if self.polls >= polls {
                    let _ = self.fsm.process_event(fsm::Events::Deliver);
                }
            }
        }
        let mut status: LocalRegisterCopy<u32, EStatus::Register> = LocalRegisterCopy::new(0);
        if matches!(self.fsm.state(), EnclaveState::Responded) {
            status.modify(EStatus::ERESP_RDY::SET);
        }
        status.get()
    }

    fn mdr_index(addr: usize) -> Option<usize> {
        (mailbox::MDR0..mailbox::mdr(MAX_ARGS))
            .contains(&addr)
            .then(|| (addr - mailbox::MDR0) / mailbox::MDR_STRIDE)
    }
}

impl Bus for TeMailboxPeriph {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        if size != RvSize::Word {
            return Err(BusError::LoadAccessFault);
        }
        if addr % 4 != 0 {
            return Err(BusError::LoadAddrMisaligned);
        }
        let addr = addr as usize;
        let val = match addr {
            mailbox::HRC0 => self.hrc0,
            mailbox::E_STATUS => self.enclave_status_read(),
            mailbox::ERC1 => self.erc1,
            mailbox::LIFECYCLE_STATUS => self.model.lifecycle,
            mailbox::BOOT_FLOW0 => self.model.boot_flow0,
            mailbox::BOOT_FLOW1 => self.model.boot_flow1,
            _ => match Self::mdr_index(addr) {
                Some(idx) => self.mdr[idx],
                None if addr < mailbox::WINDOW_SIZE => 0,
                None => return Err(BusError::LoadAccessFault),
            },
        };
        Ok(val.into())
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        if size != RvSize::Word {
            return Err(BusError::StoreAccessFault);
        }
        if addr % 4 != 0 {
            return Err(BusError::StoreAddrMisaligned);
        }
        let addr = addr as usize;
        let val = val as u32;
        match addr {
            mailbox::HRC0 => self.hrc0 = val,
            mailbox::H_STATUS => self.host_status_write(val),
            _ => match Self::mdr_index(addr) {
                Some(idx) => self.mdr[idx] = val,
                None if addr < mailbox::WINDOW_SIZE => {}
                None => return Err(BusError::StoreAccessFault),
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use te_drivers::ApiId;

    fn periph() -> TeMailboxPeriph {
        TeMailboxPeriph::new(Dram::new(0x9000_0000, 0x100))
    }

    #[test]
    fn test_handshake() {
        let mut mbox = periph();
        mbox.response = ResponseMode::AfterPolls(3);
        mbox.write(RvSize::Word, mailbox::HRC0 as RvAddr, ApiId::GetMailboxVersion as u64)
            .unwrap();
        mbox.write(RvSize::Word, mailbox::H_STATUS as RvAddr, 1).unwrap();
        assert!(matches!(mbox.state(), EnclaveState::Busy));

        let e_status = mailbox::E_STATUS as RvAddr;
        assert_eq!(mbox.read(RvSize::Word, e_status), Ok(0));
        assert_eq!(mbox.read(RvSize::Word, e_status), Ok(0));
        assert_eq!(mbox.read(RvSize::Word, e_status), Ok(1));
        assert_eq!(
            mbox.read(RvSize::Word, mailbox::ERC1 as RvAddr),
            Ok(mbox.model.mailbox_version.into())
        );

        mbox.write(RvSize::Word, mailbox::H_STATUS as RvAddr, 2).unwrap();
        assert!(matches!(mbox.state(), EnclaveState::Idle));
        assert_eq!(mbox.read(RvSize::Word, e_status), Ok(0));
        assert_eq!(mbox.acks(), 1);
        assert_eq!(mbox.request_ids(), vec![ApiId::GetMailboxVersion as u32]);
    }

    #[test]
    fn test_never_responds() {
        let mut mbox = periph();
        mbox.response = ResponseMode::Never;
        mbox.write(RvSize::Word, mailbox::H_STATUS as RvAddr, 1).unwrap();
        for _ in 0..100 {
            assert_eq!(mbox.read(RvSize::Word, mailbox::E_STATUS as RvAddr), Ok(0));
        }
        // A second request while busy is not accepted.
        mbox.write(RvSize::Word, mailbox::H_STATUS as RvAddr, 1).unwrap();
        assert_eq!(mbox.requests().len(), 1);
    }

    #[test]
    fn test_register_access_rules() {
        let mut mbox = periph();
        mbox.model.lifecycle = 0xffff_ffe2;
        mbox.write(RvSize::Word, mailbox::mdr(9) as RvAddr, 0x55).unwrap();
        assert_eq!(mbox.read(RvSize::Word, mailbox::mdr(9) as RvAddr), Ok(0x55));
        assert_eq!(
            mbox.read(RvSize::Word, mailbox::LIFECYCLE_STATUS as RvAddr),
            Ok(0xffff_ffe2)
        );
        assert_eq!(
            mbox.read(RvSize::Byte, mailbox::HRC0 as RvAddr),
            Err(BusError::LoadAccessFault)
        );
        assert_eq!(
            mbox.write(RvSize::Word, 0x1000, 0),
            Err(BusError::StoreAccessFault)
        );
    }
}
