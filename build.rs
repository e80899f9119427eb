//! This build script copies the `memory.x` file from the crate root into a directory where
//! the linker can always find it at build time, and records the build time as the initial
//! clock value of the firmware.

use std::{env, fs::File, io::Write, path::PathBuf};

fn main() {
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

    // Current UTC time, used until the companion app sets the clock
    File::create(out.join("build_epoch.rs"))
        .unwrap()
        .write_fmt(format_args!(
            "const BUILD_EPOCH: i64 = {:?};",
            chrono::Utc::now().timestamp()
        ))
        .unwrap();

    // Host builds (`cargo test --lib`) need no linker setup
    if !env::var("TARGET").unwrap_or_default().starts_with("thumb") {
        return;
    }

    // Put memory layout in the output directory and ensure it's on the linker search path.
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();
    println!("cargo:rustc-link-search={}", out.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Only re-run when the memory layout changes. The build epoch is refreshed by `cargo clean`.
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}
