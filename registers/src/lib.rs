// Licensed under the Apache-2.0 license
//
#![cfg_attr(not(test), no_std)]

pub mod mailbox;
pub mod soc;
