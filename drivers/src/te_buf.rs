/*++

Licensed under the Apache-2.0 license.

File Name:

    te_buf.rs

Abstract:

    File contains the staging buffer used to pass data through the enclave mailbox.

--*/
use te_error::{TeError, TeResult};

/// Arena capacity in bytes.
pub const TE_BUF_SIZE: usize = 1024;

/// Permitted length range for one staged buffer, inclusive on both ends.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LenBounds {
    pub min: usize,
    pub max: usize,
}

impl LenBounds {
    pub const ANY: Self = Self::new(0, usize::MAX);
    pub const NON_EMPTY: Self = Self::new(1, usize::MAX);

    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub const fn exact(len: usize) -> Self {
        Self::new(len, len)
    }

    pub const fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }
}

#[repr(C, align(8))]
struct Arena([u8; TE_BUF_SIZE]);

/// Bump allocator over a fixed arena shared with the enclave.
///
/// The enclave is told about staged data through physical addresses
/// (`phys_base + offset`); the arena must be identity-placed at `phys_base`
/// as far as the enclave is concerned.
pub struct TeBuf {
    arena: Arena,
    cursor: usize,
    phys_base: u32,
}

impl TeBuf {
    pub const fn new(phys_base: u32) -> Self {
        Self {
            arena: Arena([0u8; TE_BUF_SIZE]),
            cursor: 0,
            phys_base,
        }
    }

    pub fn phys_base(&self) -> u32 {
        self.phys_base
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        TE_BUF_SIZE - self.cursor
    }

    /// Rewinds the cursor and zero-fills the arena.
    pub fn reset(&mut self) {
        self.arena.0.fill(0);
        self.cursor = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.arena.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.arena.0
    }

    /// Checks a prospective reservation without changing the arena.
    pub fn verify(&self, src: Option<&[u8]>, len: usize, bounds: LenBounds) -> TeResult<()> {
        match src {
            None if len != 0 => return Err(TeError::DRIVER_TE_BUF_INVALID_ARGS),
            Some(src) if src.len() < len => return Err(TeError::DRIVER_TE_BUF_INVALID_ARGS),
            _ => {}
        }
        if !bounds.contains(len) {
            return Err(TeError::DRIVER_TE_BUF_INVALID_ARGS);
        }
        if len > self.remaining() {
            return Err(TeError::DRIVER_TE_BUF_OVERFLOW);
        }
        Ok(())
    }

    /// Copies `len` bytes of `src` to the cursor and advances it.
    ///
    /// Returns the arena offset of the copy. Nothing is written on failure.
    pub fn reserve(&mut self, src: Option<&[u8]>, len: usize, bounds: LenBounds) -> TeResult<usize> {
        self.verify(src, len, bounds)?;
        let offset = self.cursor;
        if let Some(src) = src {
            self.arena.0[offset..offset + len].copy_from_slice(&src[..len]);
        }
        self.cursor += len;
        Ok(offset)
    }

    /// Reserves `len` zeroed bytes.
    pub fn reserve_zeroed(&mut self, len: usize, bounds: LenBounds) -> TeResult<usize> {
        if !bounds.contains(len) {
            return Err(TeError::DRIVER_TE_BUF_INVALID_ARGS);
        }
        if len > self.remaining() {
            return Err(TeError::DRIVER_TE_BUF_OVERFLOW);
        }
        let offset = self.cursor;
        self.arena.0[offset..offset + len].fill(0);
        self.cursor += len;
        Ok(offset)
    }

    /// Physical address the enclave uses for arena `offset`.
    pub fn phys(&self, offset: usize) -> u32 {
        self.phys_base.wrapping_add(offset as u32)
    }

    /// Overwrites already reserved bytes at `offset`.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) -> TeResult<()> {
        let end = offset
            .checked_add(data.len())
            .filter(|end| *end <= self.cursor)
            .ok_or(TeError::DRIVER_TE_BUF_OVERFLOW)?;
        self.arena.0[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Bytes at physical address `addr`, as returned by the enclave.
    pub fn slice_at(&self, addr: u32, len: usize) -> TeResult<&[u8]> {
        let offset = addr.wrapping_sub(self.phys_base) as usize;
        if addr < self.phys_base || offset > TE_BUF_SIZE || len > TE_BUF_SIZE - offset {
            return Err(TeError::DRIVER_TE_BUF_BAD_ADDRESS);
        }
        Ok(&self.arena.0[offset..offset + len])
    }

    /// Copies `dst.len()` bytes from physical address `addr` into `dst`.
    pub fn read_back(&self, addr: u32, dst: &mut [u8]) -> TeResult<()> {
        dst.copy_from_slice(self.slice_at(addr, dst.len())?);
        Ok(())
    }

    pub fn read_u32(&self, addr: u32) -> TeResult<u32> {
        let mut word = [0u8; 4];
        self.read_back(addr, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }
}
