//! Process-wide allocator instance used by the `x*!` macros and [`XBox`](crate::XBox).

use crate::allocator::{Libc, Xalloc};
use crate::config::Config;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Xalloc<Libc>> = OnceLock::new();

/// The global allocator, configured from the environment on first use.
#[inline]
pub fn global() -> &'static Xalloc<Libc> {
    GLOBAL.get_or_init(|| {
        let config = Config::from_env();
        log::debug!("xalloc: global allocator initialized with {config:?}");
        Xalloc::with_config(Libc, config)
    })
}

/// Install a specific config for the global allocator.
///
/// Must run before the first allocation through [`global`]; returns the
/// rejected config if the allocator was already initialized.
pub fn init_global(config: Config) -> Result<(), Config> {
    let mut slot = Some(config);
    GLOBAL.get_or_init(|| {
        let config = slot.take().unwrap_or_default();
        log::debug!("xalloc: global allocator initialized with {config:?}");
        Xalloc::with_config(Libc, config)
    });
    match slot {
        None => Ok(()),
        Some(rejected) => Err(rejected),
    }
}
