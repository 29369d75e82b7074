// build.rs

use std::env;
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "rawfb.yaml";

fn main() {
    println!("cargo:rerun-if-changed={CONFIG_FILE}");
    let out_dir = env::var_os("OUT_DIR").unwrap();
    fs::copy(CONFIG_FILE, Path::new(&out_dir).join("../../..").join(CONFIG_FILE)).unwrap();
}
