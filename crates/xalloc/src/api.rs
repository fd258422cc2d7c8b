//! C linkage for the allocator, matching the `_xmalloc(size, file, line,
//! func)` family that C call sites wrap in macros:
//!
//! ```c
//! #define xmalloc(sz)   _xmalloc(sz, __FILE__, __LINE__, __func__)
//! #define xfree(p)      _xfree((void **)&(p), __FILE__, __LINE__, __func__)
//! ```
//!
//! Every entry point goes through [`global()`](crate::global).

use crate::init::global;
use crate::site::CallSite;
use core::ffi::{c_char, c_int, c_void, CStr};
use core::ptr;

/// Build a call site from C strings. Null or non-UTF-8 names become `?`.
unsafe fn site_from_c<'a>(file: *const c_char, line: c_int, func: *const c_char) -> CallSite<'a> {
    CallSite::new(c_str_or_unknown(file), line.max(0) as u32, c_str_or_unknown(func))
}

unsafe fn c_str_or_unknown<'a>(s: *const c_char) -> &'a str {
    if s.is_null() {
        return "?";
    }
    CStr::from_ptr(s).to_str().unwrap_or("?")
}

#[no_mangle]
pub unsafe extern "C" fn _xmalloc(
    size: usize,
    file: *const c_char,
    line: c_int,
    func: *const c_char,
) -> *mut c_void {
    let site = site_from_c(file, line, func);
    global().malloc(size, &site).as_ptr().cast()
}

/// Returns NULL when the allocation cannot be satisfied.
#[no_mangle]
pub unsafe extern "C" fn _try_xmalloc(
    size: usize,
    file: *const c_char,
    line: c_int,
    func: *const c_char,
) -> *mut c_void {
    let site = site_from_c(file, line, func);
    match global().try_malloc(size, &site) {
        Ok(p) => p.as_ptr().cast(),
        Err(_) => ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn _xrealloc(
    item: *mut *mut c_void,
    newsize: usize,
    file: *const c_char,
    line: c_int,
    func: *const c_char,
) -> *mut c_void {
    let site = site_from_c(file, line, func);
    if item.is_null() {
        crate::hardening::fatal!(&site, "xrealloc: null pointer variable");
    }
    global().realloc(&mut *item, newsize, &site).as_ptr()
}

/// Returns 1 on success and 0 when the block could not be resized; the
/// block is unchanged in that case.
#[no_mangle]
pub unsafe extern "C" fn _try_xrealloc(
    item: *mut *mut c_void,
    newsize: usize,
    file: *const c_char,
    line: c_int,
    func: *const c_char,
) -> c_int {
    let site = site_from_c(file, line, func);
    if item.is_null() {
        crate::hardening::fatal!(&site, "try_xrealloc: null pointer variable");
    }
    match global().try_realloc(&mut *item, newsize, &site) {
        Ok(()) => 1,
        Err(_) => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn _xfree(
    item: *mut *mut c_void,
    file: *const c_char,
    line: c_int,
    func: *const c_char,
) {
    if item.is_null() {
        return;
    }
    let site = site_from_c(file, line, func);
    global().free(&mut *item, &site);
}

#[no_mangle]
pub unsafe extern "C" fn _xsize(
    item: *mut c_void,
    file: *const c_char,
    line: c_int,
    func: *const c_char,
) -> usize {
    let site = site_from_c(file, line, func);
    global().size(item, &site)
}
