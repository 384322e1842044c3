/*++

Licensed under the Apache-2.0 license.

File Name:

    memory_map.rs

Abstract:

    File contains the MMU mapping seam and the scoped temporary mapping helper.

--*/
use te_error::{TeError, TeResult};

pub trait MemoryMap {
    /// Virtual address of `pa` when `pa..pa + len` lies in a static mapping.
    fn static_va(&self, pa: u32, len: u32) -> Option<usize>;

    /// Adds a temporary device mapping for `pa..pa + len`.
    fn add_mapping(&self, pa: u32, len: u32) -> TeResult<usize>;

    /// Removes a mapping created by `add_mapping`.
    fn remove_mapping(&self, va: usize, len: u32) -> TeResult<()>;
}

/// Runs `f` with a virtual address for `pa..pa + len`.
///
/// A static mapping is reused when one covers the range. Otherwise a
/// temporary mapping is created and removed after `f` returns, whatever its
/// outcome. A failed removal turns the whole call into a failure.
pub fn with_io_mapping<T>(
    map: &dyn MemoryMap,
    pa: u32,
    len: u32,
    f: impl FnOnce(usize) -> TeResult<T>,
) -> TeResult<T> {
    if let Some(va) = map.static_va(pa, len) {
        return f(va);
    }

    let va = map.add_mapping(pa, len).map_err(|_| {
        crate::cprintln!("[te] Unable to map {}", crate::printer::HexU32(pa));
        TeError::DRIVER_MMU_MAP_FAILED
    })?;
    let result = f(va);
    if map.remove_mapping(va, len).is_err() {
        crate::cprintln!("[te] Unable to unmap {}", crate::printer::HexU32(pa));
        return Err(TeError::DRIVER_MMU_UNMAP_FAILED);
    }
    result
}
