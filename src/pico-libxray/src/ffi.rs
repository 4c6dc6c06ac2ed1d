//! Helpers for calling C functions that take and return C strings.
//!
//! Arguments are owned by Rust for the duration of the call (the Go side
//! copies them with `C.GoString`). Results are `malloc`ed by the Go side
//! (`C.CString`) and freed here after copying.

use std::ffi::{CStr, CString, c_char, c_int};

use tracing::debug;

/// A C function taking one string argument.
pub type TextFn = unsafe extern "C" fn(*mut c_char) -> *mut c_char;

/// A C function taking no arguments.
pub type NullaryFn = unsafe extern "C" fn() -> *mut c_char;

/// A C function taking an integer argument.
pub type CountFn = unsafe extern "C" fn(c_int) -> *mut c_char;

/// Copy a returned C string into Rust and free the original.
///
/// # Safety
///
/// `ptr` must be null or a NUL-terminated string allocated with `malloc`
/// that the caller owns.
pub unsafe fn take_c_string(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    let text = unsafe { CStr::from_ptr(ptr) }.to_str().map(str::to_owned);
    unsafe { libc::free(ptr.cast()) };

    match text {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(error = %e, "Discarding non-UTF-8 engine response");
            None
        }
    }
}

/// Call `f` with `arg` as a C string.
///
/// An argument containing NUL cannot cross the boundary and counts as a
/// failed call.
///
/// # Safety
///
/// `f` must not retain its argument past the call and must return a value
/// accepted by [`take_c_string`].
pub unsafe fn call_text(f: TextFn, arg: &str) -> Option<String> {
    let arg = match CString::new(arg) {
        Ok(arg) => arg,
        Err(e) => {
            debug!(error = %e, "Argument contains NUL, not calling engine");
            return None;
        }
    };
    unsafe { take_c_string(f(arg.as_ptr().cast_mut())) }
}

/// Call a nullary `f`.
///
/// # Safety
///
/// `f` must return a value accepted by [`take_c_string`].
pub unsafe fn call_nullary(f: NullaryFn) -> Option<String> {
    unsafe { take_c_string(f()) }
}

/// Call `f` with a count, saturating at `c_int::MAX`.
///
/// # Safety
///
/// `f` must return a value accepted by [`take_c_string`].
pub unsafe fn call_count(f: CountFn, count: u32) -> Option<String> {
    let count = c_int::try_from(count).unwrap_or(c_int::MAX);
    unsafe { take_c_string(f(count)) }
}
