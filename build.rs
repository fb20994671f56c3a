//! Build script for ontoposet
//!
//! Preset datasets under `presets/` are embedded into the library with `include_dir!`. The macro
//! does not register its inputs with cargo, so this script does it instead: editing, adding or
//! removing a preset file triggers a rebuild of the embedded library.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=presets");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let preset_dir = manifest_dir.join("presets");

    let entries = match fs::read_dir(&preset_dir) {
        Ok(entries) => entries,
        Err(e) => {
            println!(
                "cargo:warning=Preset directory {} is not readable: {}",
                preset_dir.display(),
                e
            );
            return;
        }
    };

    let mut count = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            println!("cargo:rerun-if-changed={}", path.display());
            count += 1;
        }
    }

    if count == 0 {
        println!("cargo:warning=No preset datasets found in presets/");
    }
}
