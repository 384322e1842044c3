/*++

Licensed under the Apache-2.0 license.

File Name:

    enclave_model.rs

Abstract:

    File contains a behavioural model of the enclave firmware behind one mailbox.

--*/

use std::collections::HashMap;

use te_drivers::{ApiId, HostKeyRecord, Lifecycle, MAX_ARGS, UNWRAPPED_KEY_LEN};
use te_emu_bus::BusError;
use zerocopy::FromBytes;

use crate::dram::Dram;

/// Result codes the model reports in ERC1.
pub const STATUS_BAD_ADDRESS: u32 = 0x04;
pub const STATUS_UNKNOWN_API: u32 = 0x05;
pub const STATUS_INVALID_LENGTH: u32 = 0x06;
pub const STATUS_BUFFER_TOO_SMALL: u32 = 0x0d;
pub const STATUS_RANDOM_FAILED: u32 = 0x13;

const RECORD_LEN: usize = core::mem::size_of::<HostKeyRecord>();

impl From<BusError> for Status {
    fn from(_: BusError) -> Self {
        Status(STATUS_BAD_ADDRESS)
    }
}

struct Status(u32);

type Reply = Result<(), Status>;

/// Provisioned host key as the enclave received it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProvisionedKey {
    pub id: u32,
    pub key: Vec<u8>,
}

/// One emulated enclave. Tests set the fields directly before a run and
/// inspect them afterwards.
pub struct EnclaveModel {
    pub enclave_version: Vec<u8>,
    pub mailbox_version: u32,
    pub api_version: Vec<u8>,
    pub enabled_features: Vec<u8>,
    pub device_identity: Vec<u8>,
    pub serial_number: Vec<u8>,
    pub huk: Vec<u8>,
    pub challenge: Vec<u8>,
    pub antirollback: u32,
    pub antirollback_increments: u32,
    /// Raw LIFECYCLE_STATUS contents.
    pub lifecycle: u32,
    pub boot_flow0: u32,
    pub boot_flow1: u32,
    pub random_seed: u8,
    pub random_fails: bool,
    /// Length word reported back by output operations, instead of the real one.
    pub reported_len: Option<u32>,
    pub provisioned_keys: Vec<ProvisionedKey>,
    pub prepare_finalized: bool,
    pub finalized: bool,
    pub last_challenge_type: Option<u32>,
    pub feature_certs: Vec<Vec<u8>>,
    pub debug_responses: Vec<Vec<u8>>,
    pub rma_responses: Vec<Vec<u8>>,
    /// Operations forced to fail with the given status.
    pub failures: HashMap<u32, u32>,
}

impl Default for EnclaveModel {
    fn default() -> Self {
        Self {
            enclave_version: b"te-fw 1.4.2".to_vec(),
            mailbox_version: 0x0001_0002,
            api_version: b"2.1".to_vec(),
            enabled_features: vec![0x01, 0x00, 0x00, 0x00],
            device_identity: (0..32).collect(),
            serial_number: vec![0x53, 0x4e, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78],
            huk: (0xa0..0xb0).collect(),
            challenge: vec![0xc4; 32],
            antirollback: 0,
            antirollback_increments: 0,
            lifecycle: Lifecycle::Deployed as u32,
            boot_flow0: 0,
            boot_flow1: 0,
            random_seed: 0x42,
            random_fails: false,
            reported_len: None,
            provisioned_keys: Vec::new(),
            prepare_finalized: false,
            finalized: false,
            last_challenge_type: None,
            feature_certs: Vec::new(),
            debug_responses: Vec::new(),
            rma_responses: Vec::new(),
            failures: HashMap::new(),
        }
    }
}

fn read_vec(dram: &Dram, pa: u32, len: u32) -> Result<Vec<u8>, Status> {
    let mut data = vec![0u8; len as usize];
    dram.read(pa, &mut data)?;
    Ok(data)
}

/// Unwrapping is modelled as XOR of the key with its repeated tag.
pub fn model_unwrap(wrapped: &[u8]) -> Vec<u8> {
    let (key, tag) = wrapped.split_at(UNWRAPPED_KEY_LEN.min(wrapped.len()));
    key.iter()
        .enumerate()
        .map(|(i, b)| b ^ tag.get(i % tag.len().max(1)).copied().unwrap_or(0))
        .collect()
}

impl EnclaveModel {
    pub fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle as u32;
    }

    pub fn fail(&mut self, id: ApiId, status: u32) {
        self.failures.insert(id.into(), status);
    }

    /// Handles one request. `args` holds the data registers and is updated
    /// in place. Returns the result code.
    pub fn handle(&mut self, id: u32, args: &mut [u32; MAX_ARGS], dram: &Dram) -> u32 {
        if let Some(status) = self.failures.get(&id) {
            return *status;
        }
        let result = match id {
            x if x == ApiId::GetEnclaveVersion as u32 => {
                let data = self.enclave_version.clone();
                self.output(dram, args[0], args[1], &data)
            }
            x if x == ApiId::GetMailboxVersion as u32 => return self.mailbox_version,
            x if x == ApiId::GetApiVersion as u32 => {
                let data = self.api_version.clone();
                self.output(dram, args[0], args[1], &data)
            }
            x if x == ApiId::EnableFeature as u32 => read_vec(dram, args[0], args[1])
                .map(|cert| self.feature_certs.push(cert)),
            x if x == ApiId::GetEnabledFeatures as u32 => {
                let data = self.enabled_features.clone();
                self.output(dram, args[0], args[1], &data)
            }
            x if x == ApiId::GetDeviceIdentity as u32 => {
                let data = self.device_identity.clone();
                self.output(dram, args[0], args[1], &data)
            }
            x if x == ApiId::GetSerialNumber as u32 => {
                let data = self.serial_number.clone();
                self.output(dram, args[0], args[1], &data)
            }
            x if x == ApiId::IncrementAntirollback as u32 => {
                self.antirollback += 1;
                self.antirollback_increments += 1;
                dram.write_u32(args[0], self.antirollback)
                    .map_err(Status::from)
            }
            x if x == ApiId::GetAntirollback as u32 => dram
                .write_u32(args[0], self.antirollback)
                .map_err(Status::from),
            x if x == ApiId::GetHuk as u32 => {
                let data = self.huk.clone();
                self.output(dram, args[0], args[1], &data)
            }
            x if x == ApiId::RequestChallenge as u32 => {
                self.last_challenge_type = Some(args[0]);
                let data = self.challenge.clone();
                self.output(dram, args[1], args[2], &data)
            }
            x if x == ApiId::PrivSecureDebugAccess as u32 => read_vec(dram, args[0], args[1])
                .map(|resp| self.debug_responses.push(resp)),
            x if x == ApiId::PrivSetRma as u32 => {
                read_vec(dram, args[0], args[1]).map(|resp| self.rma_responses.push(resp))
            }
            x if x == ApiId::ProvisionHostKeys as u32 => self.provision(dram, args[0], args[1]),
            x if x == ApiId::ProvisionPrepareFinalize as u32 => {
                self.prepare_finalized = true;
                Ok(())
            }
            x if x == ApiId::ProvisionFinalize as u32 => {
                self.finalized = true;
                Ok(())
            }
            x if x == ApiId::UnwrapCustKey as u32 => self.unwrap(dram, args),
            x if x == ApiId::Random as u32 => self.random(dram, args[0], args[1]),
            _ => Err(Status(STATUS_UNKNOWN_API)),
        };
        match result {
            Ok(()) => 0,
            Err(Status(status)) => status,
        }
    }

    /// Writes `data` to an `[out, len]` pair whose length word holds the
    /// capacity on entry.
    fn output(&self, dram: &Dram, data_pa: u32, len_pa: u32, data: &[u8]) -> Reply {
        let capacity = dram.read_u32(len_pa)? as usize;
        if data.len() > capacity {
            return Err(Status(STATUS_BUFFER_TOO_SMALL));
        }
        dram.write(data_pa, data)?;
        let len = self.reported_len.unwrap_or(data.len() as u32);
        dram.write_u32(len_pa, len)?;
        Ok(())
    }

    fn provision(&mut self, dram: &Dram, table_pa: u32, count: u32) -> Reply {
        let table = read_vec(dram, table_pa, count * RECORD_LEN as u32)?;
        for chunk in table.chunks_exact(RECORD_LEN) {
            let record =
                HostKeyRecord::read_from_bytes(chunk).map_err(|_| Status(STATUS_INVALID_LENGTH))?;
            let key = read_vec(dram, record.key_addr, record.key_len)?;
            self.provisioned_keys.push(ProvisionedKey {
                id: record.hst_key_id,
                key,
            });
        }
        Ok(())
    }

    fn unwrap(&mut self, dram: &Dram, args: &[u32; MAX_ARGS]) -> Reply {
        let wrapped = read_vec(dram, args[0], args[1])?;
        let key = model_unwrap(&wrapped);
        self.output(dram, args[2], args[3], &key)
    }

    fn random(&mut self, dram: &Dram, pa: u32, len: u32) -> Reply {
        if self.random_fails {
            return Err(Status(STATUS_RANDOM_FAILED));
        }
        let bytes: Vec<u8> = (0..len)
            .map(|i| self.random_seed.wrapping_add(i as u8))
            .collect();
        self.random_seed = self.random_seed.wrapping_add(len as u8);
        dram.write(pa, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x9000_0000;

    #[test]
    fn test_output_respects_capacity() {
        let dram = Dram::new(BASE, 0x100);
        let mut model = EnclaveModel::default();
        model.serial_number = vec![1, 2, 3, 4];
        let mut args = [0u32; MAX_ARGS];
        args[0] = BASE;
        args[1] = BASE + 0x40;

        dram.write_u32(BASE + 0x40, 2).unwrap();
        assert_eq!(
            model.handle(ApiId::GetSerialNumber.into(), &mut args, &dram),
            STATUS_BUFFER_TOO_SMALL
        );

        dram.write_u32(BASE + 0x40, 8).unwrap();
        assert_eq!(model.handle(ApiId::GetSerialNumber.into(), &mut args, &dram), 0);
        assert_eq!(dram.read_u32(BASE + 0x40), Ok(4));
        let mut out = [0u8; 4];
        dram.read(BASE, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_increment_counts_calls() {
        let dram = Dram::new(BASE, 0x10);
        let mut model = EnclaveModel::default();
        let mut args = [0u32; MAX_ARGS];
        args[0] = BASE;
        for _ in 0..3 {
            assert_eq!(
                model.handle(ApiId::IncrementAntirollback.into(), &mut args, &dram),
                0
            );
        }
        assert_eq!(dram.read_u32(BASE), Ok(3));
        assert_eq!(model.antirollback_increments, 3);
    }

    #[test]
    fn test_forced_failure_and_unknown_api() {
        let dram = Dram::new(BASE, 0x10);
        let mut model = EnclaveModel::default();
        let mut args = [0u32; MAX_ARGS];
        model.fail(ApiId::ProvisionFinalize, 0x21);
        assert_eq!(model.handle(ApiId::ProvisionFinalize.into(), &mut args, &dram), 0x21);
        assert!(!model.finalized);
        assert_eq!(model.handle(0x777, &mut args, &dram), STATUS_UNKNOWN_API);
    }

    #[test]
    fn test_unwrap_model() {
        let mut wrapped = vec![0xffu8; 16];
        wrapped.extend_from_slice(&[0x0f; 8]);
        assert_eq!(model_unwrap(&wrapped), vec![0xf0u8; 16]);
    }
}
