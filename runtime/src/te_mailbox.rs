/*++

Licensed under the Apache-2.0 license.

File Name:

    te_mailbox.rs

Abstract:

    File contains the provisioning passthrough pseudo-TA for the enclave
    mailbox.

--*/

use crate::params::{self, check_param_types, ParamType, ParamTypes, Params};
use crate::{Drivers, Uuid};
use te_drivers::printer::HexU32;
use te_drivers::{
    cprintln, runtime_error, Enclave, EnclaveResult, HostKey, HostKeyId, Lifecycle, Tile,
};
use te_error::{TeError, TeResult};

pub const PROV_HOST_KEY: u32 = 0;
pub const PROV_PREP_FINALIZE: u32 = 1;
pub const PROV_FINALIZE: u32 = 2;
pub const BOOT_FLOW_REG_READ: u32 = 3;

const PROV_HOST_KEY_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::MemrefInput,
    ParamType::ValueInput,
    ParamType::None,
    ParamType::None,
]);

const BOOT_FLOW_PARAM_TYPES: ParamTypes = ParamTypes::new([
    ParamType::ValueOutput,
    ParamType::None,
    ParamType::None,
    ParamType::None,
]);

pub struct TeMailboxCmd;
impl TeMailboxCmd {
    pub const NAME: &'static str = "te_mailbox.ta";
    pub const UUID: Uuid = Uuid::new(
        0x4727_4ef4,
        0xadfa,
        0x4c4b,
        [0xa0, 0x0e, 0x99, 0x40, 0xd2, 0x93, 0x76, 0x94],
    );

    pub(crate) fn execute(drivers: &mut Drivers, cmd: u32, params: &mut Params) -> TeResult<()> {
        let (types, name) = match cmd {
            PROV_HOST_KEY => (PROV_HOST_KEY_PARAM_TYPES, "provision host key command"),
            PROV_PREP_FINALIZE => (ParamTypes::NONE, "provision prepare finalize command"),
            PROV_FINALIZE => (ParamTypes::NONE, "provision finalize command"),
            BOOT_FLOW_REG_READ => (BOOT_FLOW_PARAM_TYPES, "boot flow reg read"),
            _ => {
                runtime_error!(drivers.log, "Invalid TE Mailbox API");
                return Err(TeError::RUNTIME_UNIMPLEMENTED_COMMAND);
            }
        };
        if check_param_types(params, types).is_err() {
            runtime_error!(drivers.log, "Bad parameters to {}", name);
            return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
        }

        Self::check_lifecycle(drivers, cmd)?;

        match cmd {
            PROV_HOST_KEY => {
                let key_id = params::value(params, 1)?.a;
                let key = params::memref(params, 0)?.data();
                let id = match HostKeyId::try_from(key_id) {
                    Ok(id) => id,
                    Err(err) => {
                        runtime_error!(drivers.log, "Invalid key id");
                        return Err(err);
                    }
                };
                if key.len() != id.key_len() {
                    runtime_error!(drivers.log, "Invalid key size");
                    return Err(TeError::RUNTIME_TE_MAILBOX_INVALID_KEY_SIZE);
                }
                let keys = [HostKey { id, key }];
                Self::on_each_tile(drivers, |enclave, tile| {
                    enclave.provision_host_keys(tile, &keys)
                })
            }
            PROV_PREP_FINALIZE => Self::on_each_tile(drivers, |enclave, tile| {
                enclave.provision_prepare_finalize(tile)
            }),
            PROV_FINALIZE => {
                Self::on_each_tile(drivers, |enclave, tile| enclave.provision_finalize(tile))
            }
            _ => {
                let flow0 = drivers.enclave.get_boot_flow0(Tile::Primary)?;
                let flow1 = drivers.enclave.get_boot_flow1(Tile::Primary)?;
                let out = params::value_mut(params, 0)?;
                out.a = flow0;
                out.b = flow1;
                Ok(())
            }
        }
    }

    fn allowed_lifecycles(cmd: u32) -> &'static [Lifecycle] {
        match cmd {
            PROV_HOST_KEY | PROV_PREP_FINALIZE => &[Lifecycle::AdiProvEnc],
            PROV_FINALIZE => &[Lifecycle::AdiProvEnc, Lifecycle::Cust1ProvHost],
            _ => &[],
        }
    }

    /// Every tile the command will touch must be in an allowed state.
    fn check_lifecycle(drivers: &Drivers, cmd: u32) -> TeResult<()> {
        let allowed = Self::allowed_lifecycles(cmd);
        if allowed.is_empty() {
            return Ok(());
        }
        for &tile in drivers.tiles() {
            let lifecycle = drivers.enclave.get_lifecycle_state(tile);
            if !lifecycle.map_or(false, |lifecycle| allowed.contains(&lifecycle)) {
                runtime_error!(drivers.log, "Command not allowed in current lifecycle state");
                return Err(TeError::RUNTIME_TE_MAILBOX_BAD_LIFECYCLE);
            }
        }
        Ok(())
    }

    /// Runs `op` on the primary tile, then on the secondary when present.
    /// The first failure stops the sequence.
    fn on_each_tile(
        drivers: &mut Drivers,
        mut op: impl FnMut(&mut Enclave<'_>, Tile) -> EnclaveResult<()>,
    ) -> TeResult<()> {
        for &tile in drivers.tiles() {
            if let Err(err) = op(&mut drivers.enclave, tile) {
                cprintln!("[te_mailbox] TE Mailbox API returned an error: {}", HexU32(err.code()));
                drivers.log.write("TE Mailbox API returned an error");
                return Err(TeError::RUNTIME_TE_MAILBOX_API_FAILED);
            }
        }
        Ok(())
    }
}
