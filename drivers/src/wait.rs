/*++

Licensed under the Apache-2.0 license.

File Name:

    wait.rs

Abstract:

    File contains common functions and macros to implement wait routines.

--*/

/// Monotonic microsecond clock.
pub trait Timer {
    fn now_us(&self) -> u64;
}

/// Busy-waits until `ready` reports true or `timeout_us` has elapsed.
///
/// The deadline is checked before every poll, so `ready` runs at least once
/// when the timeout is non-zero. Returns `Ok(false)` on timeout; errors from
/// `ready` end the wait immediately.
pub fn until_or_timeout<E>(
    timer: &dyn Timer,
    timeout_us: u64,
    mut ready: impl FnMut() -> Result<bool, E>,
) -> Result<bool, E> {
    let start = timer.now_us();
    loop {
        if timer.now_us().saturating_sub(start) >= timeout_us {
            return Ok(false);
        }
        if ready()? {
            return Ok(true);
        }
    }
}
