pub mod poison;

use crate::site::CallSite;
use core::fmt;
use std::io::Write;

/// Log a fatal allocator diagnostic and abort the process.
///
/// Used for header corruption in every call form and for exhaustion in the
/// strict forms. The line is written to stderr as well as to the `log`
/// facade since a dying daemon may not have a logger installed or flushed.
#[cold]
#[inline(never)]
pub fn abort_with_message(site: &CallSite<'_>, args: fmt::Arguments<'_>) -> ! {
    log::error!("{site}: {args}");
    let _ = writeln!(std::io::stderr().lock(), "xalloc: {site}: {args}");
    unsafe { libc::abort() }
}

/// `abort_with_message` with `format!`-style arguments.
macro_rules! fatal {
    ($site:expr, $($arg:tt)+) => {
        $crate::hardening::abort_with_message($site, format_args!($($arg)+))
    };
}

pub(crate) use fatal;
