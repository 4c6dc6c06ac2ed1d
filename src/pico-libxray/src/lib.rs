//! libXray binding for the engine bridge.
//!
//! With the `link` feature this crate links the native libXray archive and
//! provides `LibXray`, an `EngineAbi` backed by it. Without
//! the feature only the string-passing helpers in [`ffi`] are built, so the
//! workspace compiles and tests on machines without the Go toolchain.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod ffi;

#[cfg(feature = "link")]
mod engine;
#[cfg(feature = "link")]
#[allow(non_snake_case)]
pub mod sys;

#[cfg(feature = "link")]
pub use engine::LibXray;
