use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let target_os = env::var("CARGO_CFG_TARGET_OS").expect("CARGO_CFG_TARGET_OS is set by cargo");

    // The loader runs before any C runtime exists: no crt objects, no libc,
    // and every address must be fixed at link time since nothing relocates us.
    if target_os == "linux" {
        println!("cargo:rustc-link-arg-bin=m1stld=-nostartfiles");
        println!("cargo:rustc-link-arg-bin=m1stld=-nostdlib");
        println!("cargo:rustc-link-arg-bin=m1stld=-static");
        println!("cargo:rustc-link-arg-bin=m1stld=-no-pie");
    }
}
