//! Raw libXray exports.
//!
//! Every function takes base64 text (or nothing, or a count) and returns a
//! `malloc`ed C string, or null.

use std::ffi::{c_char, c_int};

unsafe extern "C" {
    pub fn CGoRunXray(base64_text: *mut c_char) -> *mut c_char;
    pub fn CGoStopXray() -> *mut c_char;
    pub fn CGoXrayVersion() -> *mut c_char;
    pub fn CGOConvertXrayJsonToShareLinks(base64_text: *mut c_char) -> *mut c_char;
    pub fn CGoConvertShareLinksToXrayJson(base64_text: *mut c_char) -> *mut c_char;
    pub fn CGoGetFreePorts(count: c_int) -> *mut c_char;
    pub fn CGoReadGeoFiles(base64_text: *mut c_char) -> *mut c_char;
}
