//! Build script - stages `memory.x` for the nRF52840 linker.
//!
//! Host builds (unit and integration tests) skip this entirely.

use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    let target = env::var("TARGET")?;
    if !target.starts_with("thumbv7em") {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    fs::copy("memory.x", out_dir.join("memory.x"))?;
    println!("cargo:rustc-link-search={}", out_dir.display());
    Ok(())
}
