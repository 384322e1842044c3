// Licensed under the Apache-2.0 license

use te_drivers::printer::HexBytes;
use ufmt::{uDisplay, uWrite};

/// Identifier a caller uses to open a session with a pseudo-TA.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Uuid {
    pub time_low: u32,
    pub time_mid: u16,
    pub time_hi_and_version: u16,
    pub clock_seq_and_node: [u8; 8],
}

impl Uuid {
    pub const fn new(
        time_low: u32,
        time_mid: u16,
        time_hi_and_version: u16,
        clock_seq_and_node: [u8; 8],
    ) -> Self {
        Self {
            time_low,
            time_mid,
            time_hi_and_version,
            clock_seq_and_node,
        }
    }
}

/// Canonical 8-4-4-4-12 lowercase form.
impl uDisplay for Uuid {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let (clock_seq, node) = self.clock_seq_and_node.split_at(2);
        HexBytes(&self.time_low.to_be_bytes()).fmt(f)?;
        f.write_char('-')?;
        HexBytes(&self.time_mid.to_be_bytes()).fmt(f)?;
        f.write_char('-')?;
        HexBytes(&self.time_hi_and_version.to_be_bytes()).fmt(f)?;
        f.write_char('-')?;
        HexBytes(clock_seq).fmt(f)?;
        f.write_char('-')?;
        HexBytes(node).fmt(f)
    }
}
