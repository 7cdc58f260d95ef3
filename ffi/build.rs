use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let header = out_dir.join("requestx.h");

    let bindings = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("REQUESTX_H")
        .with_pragma_once(true)
        .generate();

    match bindings {
        Ok(bindings) => {
            bindings.write_to_file(&header);
            println!("cargo:rustc-env=REQUESTX_HEADER={}", header.display());
        }
        Err(err) => println!("cargo:warning=cbindgen could not generate requestx.h: {err}"),
    }
}
