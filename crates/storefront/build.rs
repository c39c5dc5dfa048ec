//! Fingerprints the stylesheet so `main.css?v=<hash>` changes with its
//! content and can be cached by browsers.

use std::{env, fs, path::PathBuf};

use sha2::{Digest, Sha256};

fn main() {
    let css = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default())
        .join("static")
        .join("css")
        .join("main.css");
    println!("cargo:rerun-if-changed={}", css.display());

    let hash = match fs::read(&css) {
        Ok(bytes) => {
            let digest = Sha256::digest(&bytes);
            digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
        }
        Err(e) => {
            println!("cargo:warning=main.css not readable, stylesheet is not fingerprinted: {e}");
            String::new()
        }
    };
    println!("cargo:rustc-env=CSS_HASH={hash}");
}
