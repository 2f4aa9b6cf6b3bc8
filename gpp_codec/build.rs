use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::{env, fs};
use walkdir::WalkDir;

/// Consent string fixtures, one JSON document per file.
const FIXTURE_DIR: &str = "tests/data";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={FIXTURE_DIR}");

    let fixtures = fixture_paths();
    for path in &fixtures {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    let tests = fixtures.iter().filter_map(|path| fixture_test(path));
    let tokens = quote! {
        #(#tests)*
    };

    let out_dir = env::var("OUT_DIR")?;
    let pretty = prettyplease::unparse(&syn::parse2(tokens)?);
    fs::write(Path::new(&out_dir).join("fixture_tests.rs"), pretty)?;

    Ok(())
}

/// Fixture files sorted by path, so the generated file does not depend on directory order.
fn fixture_paths() -> Vec<PathBuf> {
    let mut paths = WalkDir::new(FIXTURE_DIR)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<_>>();
    paths.sort();
    paths
}

/// A `#[test]` decoding the fixture at `path` and checking its re-encoding.
fn fixture_test(path: &Path) -> Option<TokenStream> {
    let file = path.to_str()?;
    let stem = path.file_stem()?.to_str()?;
    let name = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect::<String>();
    let ident = format_ident!("fixture_{}", name);

    Some(quote! {
        #[test]
        fn #ident() {
            crate::common::Fixture::load(#file).unwrap().check();
        }
    })
}
