//! Instrumented allocation layer for long-running control daemons.
//!
//! Every block carries a small header in front of the user region holding
//! its size and a sentinel. All memory comes back zeroed, every resize,
//! release or size query re-checks the sentinel, and every failure is
//! reported with the file, line and function of the offending call.
//!
//! Two operation families are provided:
//!
//! | strict (abort on exhaustion) | fallible (returns [`AllocError`]) |
//! |---|---|
//! | [`xmalloc!`] | [`try_xmalloc!`] |
//! | [`xrealloc!`] | [`try_xrealloc!`] |
//!
//! plus [`xfree!`], which releases a block and nulls the variable holding
//! it, and [`xsize!`]. A corrupted or stale header aborts in both families.
//!
//! ```no_run
//! use xalloc::{xfree, xmalloc, xrealloc, xsize};
//!
//! let mut p: *mut u8 = xmalloc!(10).as_ptr();
//! unsafe {
//!     p.write_bytes(0xAA, 10);
//!     xrealloc!(p, 20);
//!     assert_eq!(xsize!(p), 20);
//!     xfree!(p);
//! }
//! assert!(p.is_null());
//! ```

pub mod allocator;
#[cfg(feature = "c_api")]
pub mod api;
pub mod config;
pub mod error;
pub mod hardening;
pub mod header;
pub mod init;
pub mod site;
pub mod xbox;

pub use allocator::{Libc, Stats, SystemAlloc, Xalloc};
pub use config::Config;
pub use error::AllocError;
pub use init::global;
pub use site::CallSite;
pub use xbox::XBox;

/// Allocate zeroed bytes from the global allocator; aborts on exhaustion.
///
/// Evaluates to `NonNull<u8>`.
#[macro_export]
macro_rules! xmalloc {
    ($size:expr) => {
        $crate::global().malloc($size, &$crate::call_site!())
    };
}

/// Allocate zeroed bytes from the global allocator.
///
/// Evaluates to `Result<NonNull<u8>, AllocError>`.
#[macro_export]
macro_rules! try_xmalloc {
    ($size:expr) => {
        $crate::global().try_malloc($size, &$crate::call_site!())
    };
}

/// Resize the block held in the pointer variable `$ptr`, updating the
/// variable in place. Must be used inside `unsafe`.
#[macro_export]
macro_rules! xrealloc {
    ($ptr:expr, $size:expr) => {
        $crate::global().realloc(&mut $ptr, $size, &$crate::call_site!())
    };
}

/// Fallible [`xrealloc!`]; leaves `$ptr` and its block untouched on failure.
/// Must be used inside `unsafe`.
#[macro_export]
macro_rules! try_xrealloc {
    ($ptr:expr, $size:expr) => {
        $crate::global().try_realloc(&mut $ptr, $size, &$crate::call_site!())
    };
}

/// Release the block held in the pointer variable `$ptr` and set the
/// variable to null. Must be used inside `unsafe`.
#[macro_export]
macro_rules! xfree {
    ($ptr:expr) => {
        $crate::global().free(&mut $ptr, &$crate::call_site!())
    };
}

/// Recorded size of the block at `$ptr`. Must be used inside `unsafe`.
#[macro_export]
macro_rules! xsize {
    ($ptr:expr) => {
        $crate::global().size($ptr, &$crate::call_site!())
    };
}
