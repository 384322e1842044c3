// Licensed under the Apache-2.0 license

use crate::Uuid;

/// Liveness probe. Every command succeeds without touching hardware.
pub struct AliveReplyCmd;
impl AliveReplyCmd {
    pub const NAME: &'static str = "alive_reply.ta";
    pub const UUID: Uuid = Uuid::new(
        0xafbc_7ee1,
        0x8a5c,
        0x4d59,
        [0x89, 0xe1, 0xe1, 0x95, 0x40, 0xf7, 0xf9, 0x83],
    );

    pub(crate) fn execute() {}
}
