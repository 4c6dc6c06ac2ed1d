//! Link configuration for the native libXray archive.
//!
//! Only active with the `link` feature. `LIBXRAY_LIB_DIR` adds a search
//! path; `LIBXRAY_DYLIB=1` links the shared library instead of the static
//! archive produced by `gomobile`/`go build -buildmode=c-archive`.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=LIBXRAY_LIB_DIR");
    println!("cargo:rerun-if-env-changed=LIBXRAY_DYLIB");

    if env::var_os("CARGO_FEATURE_LINK").is_none() {
        return;
    }

    if let Ok(dir) = env::var("LIBXRAY_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }

    let kind = if env::var("LIBXRAY_DYLIB").is_ok_and(|v| v == "1") {
        "dylib"
    } else {
        "static"
    };
    println!("cargo:rustc-link-lib={}=XRay", kind);

    // The Go runtime inside a c-archive needs these on Apple targets.
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "macos" || target_os == "ios" {
        println!("cargo:rustc-link-lib=framework=CoreFoundation");
        println!("cargo:rustc-link-lib=framework=Security");
        println!("cargo:rustc-link-lib=resolv");
    }
}
