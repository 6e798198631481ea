//! Memory protection for key material
//!
//! Two hardening measures, both best-effort:
//!
//! 1. **Core dump prevention**: `setrlimit(RLIMIT_CORE, 0)`, so a crash never
//!    writes seeds or chain codes to disk.
//! 2. **Locked boxes**: [`LockedBox`] keeps a fixed-size secret on the heap,
//!    `mlock`ed against swapping, and zeroizes it before unlocking on drop.
//!
//! Failures are logged, never fatal: containers and unprivileged users often
//! cannot lock memory.

use std::sync::atomic::{AtomicBool, Ordering};

use zeroize::Zeroize;

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Returns `true` if core dumps are disabled (now or by an earlier call).
/// A failed attempt is not remembered, so a later call tries again.
pub fn disable_core_dumps() -> bool {
    disable_once(&CORE_DUMPS_DISABLED, platform_disable_core_dumps)
}

fn disable_once(flag: &AtomicBool, attempt: impl FnOnce() -> bool) -> bool {
    if flag.load(Ordering::SeqCst) {
        return true;
    }
    let disabled = attempt();
    if disabled {
        flag.store(true, Ordering::SeqCst);
    }
    disabled
}

fn platform_disable_core_dumps() -> bool {
    #[cfg(unix)]
    {
        unix::disable_core_dumps()
    }

    #[cfg(not(unix))]
    {
        log::warn!("Core dump prevention not supported on this platform");
        false
    }
}

/// A fixed-size secret held in locked heap memory.
///
/// The heap allocation keeps the locked address stable when the owner moves.
pub struct LockedBox<const N: usize> {
    data: Box<[u8; N]>,
    locked: bool,
}

impl<const N: usize> LockedBox<N> {
    /// Allocate a zero-filled box and lock it.
    pub fn zeroed() -> Self {
        let data = Box::new([0u8; N]);
        let locked = N == 0 || lock(data.as_ptr(), N);
        if !locked {
            log::warn!("Failed to mlock {} bytes; key material may be swappable", N);
        }
        Self { data, locked }
    }

    /// Copy `bytes` into a new locked box.
    pub fn from_array(bytes: &[u8; N]) -> Self {
        let mut boxed = Self::zeroed();
        boxed.data.copy_from_slice(bytes);
        boxed
    }

    pub fn as_array(&self) -> &[u8; N] {
        &self.data
    }

    pub fn as_mut_array(&mut self) -> &mut [u8; N] {
        &mut self.data
    }

    /// Whether the pages are actually locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}

impl<const N: usize> Zeroize for LockedBox<N> {
    fn zeroize(&mut self) {
        self.data[..].zeroize();
    }
}

impl<const N: usize> Drop for LockedBox<N> {
    fn drop(&mut self) {
        self.zeroize();
        if self.locked && N > 0 {
            unlock(self.data.as_ptr(), N);
        }
    }
}

impl<const N: usize> std::fmt::Debug for LockedBox<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LockedBox<{}>([REDACTED])", N)
    }
}

fn lock(ptr: *const u8, len: usize) -> bool {
    #[cfg(unix)]
    {
        // SAFETY: ptr/len describe a live allocation owned by the caller
        unsafe { unix::mlock(ptr, len) }
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        false
    }
}

fn unlock(ptr: *const u8, len: usize) -> bool {
    #[cfg(unix)]
    {
        // SAFETY: same region that was passed to lock()
        unsafe { unix::munlock(ptr, len) }
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}

#[cfg(unix)]
mod unix {
    pub fn disable_core_dumps() -> bool {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit with RLIMIT_CORE=0 is a standard POSIX operation
        let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
        if result != 0 {
            log::warn!(
                "Failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
        if libc::mlock(ptr as *const libc::c_void, len) != 0 {
            log::debug!("mlock failed: {}", std::io::Error::last_os_error());
            return false;
        }
        true
    }

    pub unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
        libc::munlock(ptr as *const libc::c_void, len) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_core_dumps_is_stable() {
        // May fail in sandboxes; either way a repeat call agrees
        let first = disable_core_dumps();
        assert_eq!(disable_core_dumps(), first);
        assert_eq!(CORE_DUMPS_DISABLED.load(Ordering::SeqCst), first);
    }

    #[test]
    fn test_failed_attempt_is_retried() {
        let flag = AtomicBool::new(false);

        assert!(!disable_once(&flag, || false));
        assert!(!flag.load(Ordering::SeqCst));

        assert!(disable_once(&flag, || true));
        assert!(flag.load(Ordering::SeqCst));

        // Once disabled, no further attempt is made
        assert!(disable_once(&flag, || panic!("should not retry")));
    }

    #[test]
    fn test_locked_box_holds_bytes() {
        let boxed = LockedBox::<32>::from_array(&[0xDE; 32]);
        assert_eq!(boxed.as_array(), &[0xDE; 32]);
        assert!(!boxed.is_zero());
        // mlock may be refused under RLIMIT_MEMLOCK; only check it doesn't crash
        let _ = boxed.is_locked();
    }

    #[test]
    fn test_locked_box_zeroize() {
        let mut boxed = LockedBox::<64>::zeroed();
        boxed.as_mut_array().fill(0xFF);
        assert!(!boxed.is_zero());

        boxed.zeroize();
        assert!(boxed.is_zero());
    }

    #[test]
    fn test_locked_box_zero_length() {
        let boxed = LockedBox::<0>::zeroed();
        assert!(boxed.is_locked());
        assert!(boxed.is_zero());
    }

    #[test]
    fn test_debug_redacts() {
        let boxed = LockedBox::<4>::from_array(&[1, 2, 3, 4]);
        assert_eq!(format!("{:?}", boxed), "LockedBox<4>([REDACTED])");
    }
}
