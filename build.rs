use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    built::write_built_file()
        .expect("Failed to acquire build-time information");

    // Place the linker script where the linker finds it.
    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::copy("memory.x", out.join("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");
}
