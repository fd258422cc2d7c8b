//! Call-site context attached to every allocator diagnostic.

use core::fmt;
use core::panic::Location;

/// Source location of an allocator call: file, line and enclosing routine.
///
/// Built at the call boundary (usually by [`call_site!`](crate::call_site))
/// and only ever used for log and abort messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub file: &'a str,
    pub line: u32,
    pub func: &'a str,
}

impl<'a> CallSite<'a> {
    pub const fn new(file: &'a str, line: u32, func: &'a str) -> Self {
        CallSite { file, line, func }
    }
}

impl CallSite<'static> {
    /// Location of the caller, for paths where the routine name is unknown.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = Location::caller();
        CallSite {
            file: loc.file(),
            line: loc.line(),
            func: "?",
        }
    }
}

impl fmt::Display for CallSite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}()", self.file, self.line, self.func)
    }
}

/// Strip the helper item and closure segments that `function_name!` picks up.
#[doc(hidden)]
pub fn trim_function_path(path: &'static str) -> &'static str {
    let mut name = path.strip_suffix("::__here").unwrap_or(path);
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name
}

/// Path of the enclosing function, e.g. `my_crate::jobs::load`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::site::trim_function_path(__type_name_of(__here))
    }};
}

/// [`CallSite`] for the point where the macro is expanded.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(file!(), line!(), $crate::function_name!())
    };
}
