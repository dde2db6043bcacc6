use std::fs;
use std::path::Path;

fn main() {
    // Read version from VERSION file
    let version_file = Path::new("VERSION");
    let version = fs::read_to_string(version_file)
        .expect("Failed to read VERSION file")
        .trim()
        .to_string();

    // Set WADI_VERSION environment variable for compile-time access
    println!("cargo:rustc-env=WADI_VERSION={}", version);

    // Re-run build script if VERSION file changes
    println!("cargo:rerun-if-changed=VERSION");
}
