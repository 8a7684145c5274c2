fn main() {
    // Stamp the version served in /api/status and the startup log
    println!("cargo:rustc-env=APP_VERSION={}", env!("CARGO_PKG_VERSION"));
}
