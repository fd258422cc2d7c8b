pub mod instrumented;
pub mod system;

pub use instrumented::{Stats, Xalloc};
pub use system::{Libc, SystemAlloc};
