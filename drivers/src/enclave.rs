/*++

Licensed under the Apache-2.0 license.

File Name:

    enclave.rs

Abstract:

    File contains the typed Tiny Enclave operations built on the mailbox.

--*/
use core::num::NonZeroU32;

use crate::cprintln;
use crate::printer::HexU32;
use crate::te_buf::{LenBounds, TeBuf};
use crate::te_mailbox::TeMailbox;
use te_error::{TeError, TeResult};
use te_registers::mailbox::{self as regs, BootFlow0, LifecycleStatus};
use tock_registers::LocalRegisterCopy;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::Zeroize;

/// Legacy host-side result codes.
pub const HOST_ERROR_INVALID_ARGS: u32 = 0x01;
pub const HOST_ERROR_BUFFER: u32 = 0x02;
pub const HOST_ERROR_TIMEOUT: u32 = 60;

pub const HW_UNIQUE_KEY_LENGTH: usize = 16;

/// Wrapped customer keys carry a 16 byte key and an 8 byte tag.
pub const WRAPPED_KEY_LEN: usize = 24;
pub const UNWRAPPED_KEY_LEN: usize = 16;

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ApiId {
    GetEnclaveVersion = 0x00,
    GetMailboxVersion = 0x01,
    GetApiVersion = 0x02,
    EnableFeature = 0x06,
    GetEnabledFeatures = 0x07,
    GetDeviceIdentity = 0x09,
    GetSerialNumber = 0x0b,
    IncrementAntirollback = 0x1c,
    GetAntirollback = 0x1d,
    GetHuk = 0x1e,
    RequestChallenge = 0x80,
    PrivSecureDebugAccess = 0x8a,
    PrivSetRma = 0x8b,
    ProvisionHostKeys = 0x90,
    ProvisionPrepareFinalize = 0x91,
    ProvisionFinalize = 0x92,
    UnwrapCustKey = 0x182,
    WrapCustKey = 0x183,
    Random = 0x184,
}

impl From<ApiId> for u32 {
    fn from(id: ApiId) -> Self {
        id as u32
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EnclaveError {
    /// Rejected or failed on the host side.
    Host(TeError),
    /// Non-zero enclave result code.
    Status(NonZeroU32),
}

pub type EnclaveResult<T> = Result<T, EnclaveError>;

impl EnclaveError {
    /// The numeric code a caller would have seen from the raw interface.
    pub fn code(&self) -> u32 {
        match *self {
            Self::Host(err)
                if err == TeError::DRIVER_TE_BUF_INVALID_ARGS
                    || err == TeError::DRIVER_MAILBOX_INVALID_ARGS =>
            {
                HOST_ERROR_INVALID_ARGS
            }
            Self::Host(err) if err == TeError::DRIVER_TE_BUF_OVERFLOW => HOST_ERROR_BUFFER,
            Self::Host(err) if err == TeError::DRIVER_MAILBOX_TIMEOUT => HOST_ERROR_TIMEOUT,
            Self::Host(err) => err.into(),
            Self::Status(status) => status.get(),
        }
    }
}

impl From<TeError> for EnclaveError {
    fn from(err: TeError) -> Self {
        Self::Host(err)
    }
}

impl From<EnclaveError> for TeError {
    fn from(err: EnclaveError) -> Self {
        match err {
            EnclaveError::Host(err) => err,
            EnclaveError::Status(_) => TeError::DRIVER_ENCLAVE_STATUS,
        }
    }
}

fn check_status(rc: u32) -> EnclaveResult<()> {
    match NonZeroU32::new(rc) {
        None => Ok(()),
        Some(status) => Err(EnclaveError::Status(status)),
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Tile {
    Primary,
    Secondary,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Lifecycle {
    Untested = 0,
    Tested = 1,
    AdiProvEnc = 2,
    Cust1ProvHost = 3,
    Deployed = 4,
    Cust1Return = 5,
    AdiReturn = 6,
    EndOfLife = 7,
}

impl Lifecycle {
    pub fn is_pre_deployed(self) -> bool {
        self < Lifecycle::Deployed
    }
}

impl TryFrom<u32> for Lifecycle {
    type Error = TeError;
    fn try_from(val: u32) -> TeResult<Self> {
        Ok(match val {
            0 => Self::Untested,
            1 => Self::Tested,
            2 => Self::AdiProvEnc,
            3 => Self::Cust1ProvHost,
            4 => Self::Deployed,
            5 => Self::Cust1Return,
            6 => Self::AdiReturn,
            7 => Self::EndOfLife,
            _ => return Err(TeError::DRIVER_ENCLAVE_UNKNOWN_LIFECYCLE),
        })
    }
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChallengeType {
    AdiRma = 0,
    CustRma = 1,
    SecureDebug = 2,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HostKeyId {
    SecDebug = 0,
    SecBoot = 1,
    Pllsa = 2,
    Ipk = 3,
}

impl HostKeyId {
    /// Size of the key provisioned under this id.
    pub fn key_len(self) -> usize {
        match self {
            Self::SecDebug | Self::SecBoot | Self::Pllsa => 32,
            Self::Ipk => 16,
        }
    }
}

impl TryFrom<u32> for HostKeyId {
    type Error = TeError;
    fn try_from(val: u32) -> TeResult<Self> {
        match val {
            0 => Ok(Self::SecDebug),
            1 => Ok(Self::SecBoot),
            2 => Ok(Self::Pllsa),
            3 => Ok(Self::Ipk),
            _ => Err(TeError::RUNTIME_TE_MAILBOX_INVALID_KEY_ID),
        }
    }
}

pub struct HostKey<'k> {
    pub id: HostKeyId,
    pub key: &'k [u8],
}

/// Host key table entry as the enclave reads it.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct HostKeyRecord {
    pub hst_key_id: u32,
    pub key_len: u32,
    pub key_addr: u32,
}

/// Hardware unique key. Cleared when dropped.
pub struct HwUniqueKey(pub [u8; HW_UNIQUE_KEY_LENGTH]);

impl Drop for HwUniqueKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Addresses of a staged output buffer and its length word.
struct StagedOutput {
    data: u32,
    len: u32,
}

/// Enclave operations over one or two mailbox instances.
///
/// Every operation resets the shared transfer buffer before staging, so
/// callers must not interleave operations on the same `Enclave`.
pub struct Enclave<'a> {
    primary: TeMailbox<'a>,
    secondary: Option<TeMailbox<'a>>,
    buf: TeBuf,
}

impl<'a> Enclave<'a> {
    pub fn new(primary: TeMailbox<'a>, secondary: Option<TeMailbox<'a>>, buf: TeBuf) -> Self {
        Self {
            primary,
            secondary,
            buf,
        }
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn mailbox(&self, tile: Tile) -> TeResult<&TeMailbox<'a>> {
        match tile {
            Tile::Primary => Ok(&self.primary),
            Tile::Secondary => self
                .secondary
                .as_ref()
                .ok_or(TeError::DRIVER_MAILBOX_NO_SECONDARY),
        }
    }

    pub fn buf(&self) -> &TeBuf {
        &self.buf
    }

    /// The transfer buffer doubles as the staging area for monitor calls.
    pub fn buf_mut(&mut self) -> &mut TeBuf {
        &mut self.buf
    }

    fn run(&mut self, tile: Tile, id: ApiId, args: &mut [u32]) -> EnclaveResult<()> {
        let mbox = match tile {
            Tile::Primary => &mut self.primary,
            Tile::Secondary => self
                .secondary
                .as_mut()
                .ok_or(TeError::DRIVER_MAILBOX_NO_SECONDARY)?,
        };
        let rc = mbox.transact(&mut self.buf, id.into(), args)?;
        if rc != 0 {
            cprintln!("[te] Enclave request {} returned {}", HexU32(id.into()), HexU32(rc));
        }
        check_status(rc)
    }

    fn stage_output(&mut self, out: &[u8]) -> TeResult<StagedOutput> {
        let data = self.buf.reserve(Some(out), out.len(), LenBounds::NON_EMPTY)?;
        let len_word = (out.len() as u32).to_le_bytes();
        let len = self.buf.reserve(Some(&len_word), len_word.len(), LenBounds::NON_EMPTY)?;
        Ok(StagedOutput {
            data: self.buf.phys(data),
            len: self.buf.phys(len),
        })
    }

    /// Copies an output buffer and its updated length back to the caller.
    fn collect_output(&self, data: u32, len: u32, out: &mut [u8]) -> EnclaveResult<usize> {
        self.buf.read_back(data, out)?;
        let len = self.buf.read_u32(len)? as usize;
        if len > out.len() {
            return Err(TeError::DRIVER_ENCLAVE_LENGTH_OVERFLOW.into());
        }
        Ok(len)
    }

    /// Runs an operation taking `[out, len]` and returns the produced length.
    fn output_op(&mut self, tile: Tile, id: ApiId, out: &mut [u8]) -> EnclaveResult<usize> {
        self.mailbox(tile)?;
        self.buf.reset();
        let staged = self.stage_output(out)?;
        let mut args = [staged.data, staged.len];
        self.run(tile, id, &mut args)?;
        self.collect_output(args[0], args[1], out)
    }

    /// Runs an operation taking `[in, len]`.
    fn input_op(&mut self, tile: Tile, id: ApiId, input: &[u8]) -> EnclaveResult<()> {
        self.mailbox(tile)?;
        self.buf.reset();
        let off = self.buf.reserve(Some(input), input.len(), LenBounds::NON_EMPTY)?;
        let mut args = [self.buf.phys(off), input.len() as u32];
        self.run(tile, id, &mut args)
    }

    /// Runs an operation taking a single in/out counter word.
    fn counter_op(&mut self, tile: Tile, id: ApiId) -> EnclaveResult<u32> {
        self.mailbox(tile)?;
        self.buf.reset();
        let word = 0u32.to_le_bytes();
        let off = self.buf.reserve(Some(&word), word.len(), LenBounds::NON_EMPTY)?;
        let mut args = [self.buf.phys(off)];
        self.run(tile, id, &mut args)?;
        Ok(self.buf.read_u32(args[0])?)
    }

    pub fn get_enclave_version(&mut self, tile: Tile, out: &mut [u8]) -> EnclaveResult<usize> {
        self.output_op(tile, ApiId::GetEnclaveVersion, out)
    }

    /// The mailbox block version is returned in the result register itself.
    pub fn get_mailbox_version(&mut self, tile: Tile) -> EnclaveResult<u32> {
        let mbox = match tile {
            Tile::Primary => &mut self.primary,
            Tile::Secondary => self
                .secondary
                .as_mut()
                .ok_or(TeError::DRIVER_MAILBOX_NO_SECONDARY)?,
        };
        Ok(mbox.transact(&mut self.buf, ApiId::GetMailboxVersion.into(), &mut [])?)
    }

    pub fn get_api_version(&mut self, tile: Tile, out: &mut [u8]) -> EnclaveResult<usize> {
        self.output_op(tile, ApiId::GetApiVersion, out)
    }

    /// Submits a feature certificate.
    pub fn enable_feature(&mut self, tile: Tile, fcer: &[u8]) -> EnclaveResult<()> {
        self.input_op(tile, ApiId::EnableFeature, fcer)
    }

    pub fn get_enabled_features(&mut self, tile: Tile, out: &mut [u8]) -> EnclaveResult<usize> {
        self.output_op(tile, ApiId::GetEnabledFeatures, out)
    }

    pub fn get_device_identity(&mut self, tile: Tile, out: &mut [u8]) -> EnclaveResult<usize> {
        self.output_op(tile, ApiId::GetDeviceIdentity, out)
    }

    pub fn get_serial_number(&mut self, tile: Tile, out: &mut [u8]) -> EnclaveResult<usize> {
        self.output_op(tile, ApiId::GetSerialNumber, out)
    }

    /// Advances the enclave anti-rollback counter by one and returns it.
    pub fn increment_antirollback(&mut self, tile: Tile) -> EnclaveResult<u32> {
        self.counter_op(tile, ApiId::IncrementAntirollback)
    }

    pub fn get_antirollback(&mut self, tile: Tile) -> EnclaveResult<u32> {
        self.counter_op(tile, ApiId::GetAntirollback)
    }

    pub fn get_huk(&mut self, tile: Tile, out: &mut [u8]) -> EnclaveResult<usize> {
        self.output_op(tile, ApiId::GetHuk, out)
    }

    pub fn request_challenge(
        &mut self,
        tile: Tile,
        chal_type: ChallengeType,
        out: &mut [u8],
    ) -> EnclaveResult<usize> {
        self.mailbox(tile)?;
        self.buf.reset();
        let staged = self.stage_output(out)?;
        let mut args = [chal_type as u32, staged.data, staged.len];
        self.run(tile, ApiId::RequestChallenge, &mut args)?;
        self.collect_output(args[1], args[2], out)
    }

    pub fn priv_secure_debug_access(&mut self, tile: Tile, response: &[u8]) -> EnclaveResult<()> {
        self.input_op(tile, ApiId::PrivSecureDebugAccess, response)
    }

    /// Moves the part to the RMA lifecycle matching the last challenge.
    pub fn priv_set_rma(&mut self, tile: Tile, response: &[u8]) -> EnclaveResult<()> {
        self.input_op(tile, ApiId::PrivSetRma, response)
    }

    /// Stages a host key table followed by every key it references.
    pub fn provision_host_keys(&mut self, tile: Tile, keys: &[HostKey<'_>]) -> EnclaveResult<()> {
        self.mailbox(tile)?;
        self.buf.reset();
        let record_len = core::mem::size_of::<HostKeyRecord>();
        let table = self
            .buf
            .reserve_zeroed(keys.len() * record_len, LenBounds::NON_EMPTY)?;
        for (i, key) in keys.iter().enumerate() {
            let off = self
                .buf
                .reserve(Some(key.key), key.key.len(), LenBounds::NON_EMPTY)?;
            let record = HostKeyRecord {
                hst_key_id: key.id as u32,
                key_len: key.key.len() as u32,
                key_addr: self.buf.phys(off),
            };
            self.buf.write_at(table + i * record_len, record.as_bytes())?;
        }
        let mut args = [self.buf.phys(table), keys.len() as u32];
        self.run(tile, ApiId::ProvisionHostKeys, &mut args)
    }

    pub fn provision_prepare_finalize(&mut self, tile: Tile) -> EnclaveResult<()> {
        self.run(tile, ApiId::ProvisionPrepareFinalize, &mut [])
    }

    pub fn provision_finalize(&mut self, tile: Tile) -> EnclaveResult<()> {
        self.run(tile, ApiId::ProvisionFinalize, &mut [])
    }

    /// Unwraps a customer key with the OTP host IPK.
    pub fn unwrap_cust_key(
        &mut self,
        tile: Tile,
        wrapped: &[u8],
        unwrapped: &mut [u8],
    ) -> EnclaveResult<usize> {
        self.mailbox(tile)?;
        self.buf.reset();
        let wk = self
            .buf
            .reserve(Some(wrapped), wrapped.len(), LenBounds::exact(WRAPPED_KEY_LEN))?;
        let uwk = self.buf.reserve(
            Some(unwrapped),
            unwrapped.len(),
            LenBounds::exact(UNWRAPPED_KEY_LEN),
        )?;
        let len_word = (unwrapped.len() as u32).to_le_bytes();
        let uwk_len = self
            .buf
            .reserve(Some(&len_word), len_word.len(), LenBounds::NON_EMPTY)?;
        let mut args = [
            self.buf.phys(wk),
            wrapped.len() as u32,
            self.buf.phys(uwk),
            self.buf.phys(uwk_len),
        ];
        self.run(tile, ApiId::UnwrapCustKey, &mut args)?;
        self.collect_output(args[2], args[3], unwrapped)
    }

    pub fn random_bytes(&mut self, tile: Tile, out: &mut [u8]) -> EnclaveResult<()> {
        self.mailbox(tile)?;
        self.buf.reset();
        let off = self.buf.reserve(Some(out), out.len(), LenBounds::NON_EMPTY)?;
        let mut args = [self.buf.phys(off), out.len() as u32];
        self.run(tile, ApiId::Random, &mut args)?;
        Ok(self.buf.read_back(args[0], out)?)
    }

    pub fn get_lifecycle_state(&self, tile: Tile) -> TeResult<Lifecycle> {
        let raw: LocalRegisterCopy<u32, LifecycleStatus::Register> =
            LocalRegisterCopy::new(self.mailbox(tile)?.read_reg(regs::LIFECYCLE_STATUS)?);
        Lifecycle::try_from(raw.read(LifecycleStatus::ENCODE))
    }

    pub fn get_boot_flow0(&self, tile: Tile) -> TeResult<u32> {
        self.mailbox(tile)?.read_reg(regs::BOOT_FLOW0)
    }

    pub fn get_boot_flow1(&self, tile: Tile) -> TeResult<u32> {
        self.mailbox(tile)?.read_reg(regs::BOOT_FLOW1)
    }

    /// The enclave is ready for host boot once its keys are loaded and unwrapped.
    pub fn is_host_boot_ready(&self, tile: Tile) -> TeResult<bool> {
        let flow: LocalRegisterCopy<u32, BootFlow0::Register> =
            LocalRegisterCopy::new(self.get_boot_flow0(tile)?);
        Ok(flow.is_set(BootFlow0::LOAD_AND_UNWRAP_KEYS))
    }

    /// Reads the hardware unique key from the primary enclave.
    pub fn get_hw_unique_key(&mut self, bootrom_bypass: bool) -> TeResult<HwUniqueKey> {
        if bootrom_bypass {
            cprintln!("[te] Hardware unique key unavailable with bootrom bypass");
            return Err(TeError::DRIVER_ENCLAVE_BOOTROM_BYPASS);
        }
        let mut staging = [0u8; HW_UNIQUE_KEY_LENGTH];
        let result = match self.get_huk(Tile::Primary, &mut staging) {
            Ok(HW_UNIQUE_KEY_LENGTH) => Ok(HwUniqueKey(staging)),
            Ok(_) => Err(TeError::DRIVER_ENCLAVE_HUK_LENGTH),
            Err(err) => {
                cprintln!("[te] Error getting hardware unique key: {}", err.code());
                Err(err.into())
            }
        };
        staging.zeroize();
        self.buf.reset();
        result
    }

    /// One byte from the enclave entropy source.
    ///
    /// # Panics
    ///
    /// Panics if the enclave cannot supply it.
    pub fn hw_get_random_byte(&mut self) -> u8 {
        let mut byte = [0u8; 1];
        if let Err(err) = self.random_bytes(Tile::Primary, &mut byte) {
            cprintln!("[te] Random byte request failed: {}", err.code());
            panic!("enclave entropy source failed");
        }
        byte[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EnclaveError::from(TeError::DRIVER_TE_BUF_INVALID_ARGS).code(),
            HOST_ERROR_INVALID_ARGS
        );
        assert_eq!(
            EnclaveError::from(TeError::DRIVER_MAILBOX_INVALID_ARGS).code(),
            HOST_ERROR_INVALID_ARGS
        );
        assert_eq!(
            EnclaveError::from(TeError::DRIVER_TE_BUF_OVERFLOW).code(),
            HOST_ERROR_BUFFER
        );
        assert_eq!(
            EnclaveError::from(TeError::DRIVER_MAILBOX_TIMEOUT).code(),
            HOST_ERROR_TIMEOUT
        );
        let status = EnclaveError::Status(NonZeroU32::new(0x23).unwrap());
        assert_eq!(status.code(), 0x23);
        assert_eq!(TeError::from(status), TeError::DRIVER_ENCLAVE_STATUS);
    }

    #[test]
    fn test_lifecycle_order() {
        assert!(Lifecycle::AdiProvEnc.is_pre_deployed());
        assert!(Lifecycle::Cust1ProvHost.is_pre_deployed());
        assert!(!Lifecycle::Deployed.is_pre_deployed());
        assert!(!Lifecycle::EndOfLife.is_pre_deployed());
        assert_eq!(Lifecycle::try_from(5), Ok(Lifecycle::Cust1Return));
        assert_eq!(
            Lifecycle::try_from(9),
            Err(TeError::DRIVER_ENCLAVE_UNKNOWN_LIFECYCLE)
        );
    }

    #[test]
    fn test_host_key_ids() {
        assert_eq!(HostKeyId::try_from(2).map(HostKeyId::key_len), Ok(32));
        assert_eq!(HostKeyId::try_from(3).map(HostKeyId::key_len), Ok(16));
        assert_eq!(
            HostKeyId::try_from(4),
            Err(TeError::RUNTIME_TE_MAILBOX_INVALID_KEY_ID)
        );
        assert_eq!(core::mem::size_of::<HostKeyRecord>(), 12);
        let record = HostKeyRecord {
            hst_key_id: 1,
            key_len: 32,
            key_addr: 0x8000_000c,
        };
        assert_eq!(
            record.as_bytes(),
            &[1, 0, 0, 0, 32, 0, 0, 0, 0x0c, 0, 0, 0x80]
        );
    }
}
