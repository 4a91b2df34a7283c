fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let rustc = rustc_version::version()
        .map(|version| version.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=METRICS_LITE_RUSTC_VERSION={rustc}");
}
