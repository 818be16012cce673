use anyhow::{Context, Result};
use cardboot_config::{
    codegen::{generate_linker_script, generate_modules},
    Configuration,
};
use std::{env, fs, path::PathBuf};

const DEFAULT_CONFIG_FILENAME: &str =
    "cardboot_config/sample_configurations/mke06z4_default_config.ron";

fn main() -> Result<()> {
    println!("cargo:rerun-if-env-changed=CARDBOOT_CONFIG");
    println!("cargo:rerun-if-changed=build.rs");

    let filename = env::var("CARDBOOT_CONFIG").unwrap_or_else(|_| {
        // Good enough for unit tests and for the reference board. Real
        // products must provision their own keys.
        DEFAULT_CONFIG_FILENAME.into()
    });
    println!("cargo:rerun-if-changed={}", filename);

    let contents = fs::read_to_string(&filename)
        .with_context(|| format!("Failed to read configuration file {}", filename))?;
    let configuration: Configuration = ron::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file {}", filename))?;

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    generate_modules(&out_dir, &configuration)?;

    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("arm") {
        generate_linker_script(&out_dir, &configuration)?;
        println!("cargo:rustc-link-search={}", out_dir.display());
    }

    Ok(())
}
