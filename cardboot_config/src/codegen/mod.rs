//! Generation of the constants module and linker fragment included by cardboot.

use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use anyhow::{anyhow, Result};

use crate::{security::parse_key, Configuration};

mod linker_script;

pub use linker_script::generate_linker_script;

/// Generates every file cardboot includes from `out_dir`. Fails listing every
/// configuration problem if the configuration is incomplete.
pub fn generate_modules<P: AsRef<Path>>(out_dir: P, configuration: &Configuration) -> Result<()> {
    if !configuration.complete() {
        let problems: Vec<_> = configuration.problems().map(|p| p.to_string()).collect();
        return Err(anyhow!("Invalid configuration:\n{}", problems.join("\n")));
    }
    generate_constants(out_dir.as_ref(), configuration)?;
    Ok(())
}

fn generate_constants(out_dir: &Path, configuration: &Configuration) -> Result<()> {
    let filename = out_dir.join("configuration.rs");
    let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(filename)?;

    let memory = &configuration.memory;
    let security = &configuration.security;
    let update = &configuration.update;

    writeln!(file, "// Generated by the cardboot build script. Do not edit.")?;
    writeln!(file, "pub const FLASH_SIZE: u32 = 0x{:08X};", memory.flash_size)?;
    writeln!(file, "pub const APPLICATION_BASE: u32 = 0x{:08X};", memory.application_base)?;
    writeln!(file, "pub const SECTOR_SIZE: usize = {};", memory.sector_size)?;
    writeln!(file, "pub const DESCRIPTOR_OFFSET: usize = 0x{:X};", memory.descriptor_offset)?;

    for (name, raw) in [
        ("AUTHENTICATION_KEY", &security.authentication_key),
        ("ENCRYPTION_KEY", &security.encryption_key),
        ("ENCRYPTION_IV", &security.encryption_iv),
    ] {
        let key = parse_key(raw).ok_or_else(|| anyhow!("Malformed key {}", name))?;
        writeln!(file, "pub const {}: [u8; 16] = {};", name, byte_array(&key))?;
    }

    writeln!(file, "pub const UPDATE_DIRECTORY: &str = {:?};", update.directory)?;
    writeln!(file, "pub const CANDIDATE_EXTENSION: &str = {:?};", update.candidate_extension)?;
    writeln!(file, "pub const PROCESSED_MARKER: char = {:?};", update.processed_marker)?;
    writeln!(file, "pub const UPDATE_LOG_PATH: &str = {:?};", update.log_path())?;
    writeln!(file, "pub const MOUNT_ATTEMPTS: u32 = {};", update.mount_attempts)?;
    writeln!(file, "pub const MOUNT_RETRY_DELAY_MS: u32 = {};", update.mount_retry_delay_ms)?;
    Ok(())
}

fn byte_array(bytes: &[u8]) -> String {
    let bytes: Vec<_> = bytes.iter().map(|b| format!("0x{:02x}", b)).collect();
    format!("[{}]", bytes.join(", "))
}
