// Licensed under the Apache-2.0 license

/// Data cache maintenance for memory shared with the enclave.
///
/// `data` is the CPU view of the range that starts at physical address `pa`.
pub trait Dcache {
    /// Writes dirty lines covering `data` back to memory.
    fn clean_range(&self, pa: u32, data: &[u8]);

    /// Discards lines covering `data` so the next CPU access sees memory.
    fn invalidate_range(&self, pa: u32, data: &mut [u8]);
}
