//! Compiles `schema/lobby.wirec` into `OUT_DIR` with the wirec library.

use std::env;
use std::path::PathBuf;

use wirec::compile::{compile_schema, write_artifacts, CompileOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schema = PathBuf::from("schema").join("lobby.wirec");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", schema.display());

    let src = std::fs::read_to_string(&schema)?;
    let options = CompileOptions {
        source_name: "lobby.wirec".to_string(),
        ..CompileOptions::default()
    };
    let out = compile_schema(&src, &options)?;

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    write_artifacts(&out_dir, &out.artifacts)?;
    Ok(())
}
