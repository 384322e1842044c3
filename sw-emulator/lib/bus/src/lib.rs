/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Tiny Enclave emulator bus library.

--*/
mod bus;
mod dynamic_bus;
mod mmio;
mod ram;
pub mod testing;
mod types;

pub use crate::bus::{Bus, BusError};
pub use crate::dynamic_bus::{AttachError, DynamicBus};
pub use crate::mmio::BusMmio;
pub use crate::ram::Ram;
pub use crate::types::{RvAddr, RvData, RvSize};
