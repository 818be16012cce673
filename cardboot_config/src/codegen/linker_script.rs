use std::{fs::OpenOptions, io::Write, path::Path};

use anyhow::Result;

use crate::Configuration;

/// Generates the linker script `memory.x`, which confines the bootloader to the
/// flash below the application base and describes the available RAM.
pub fn generate_linker_script<P: AsRef<Path>>(
    out_dir: P,
    configuration: &Configuration,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(out_dir.as_ref().join("memory.x"))?;

    let memory = &configuration.memory;
    write!(
        file,
        "MEMORY\n\
         {{\n\
             FLASH : ORIGIN = 0x{:08X}, LENGTH = {}K\n\
             RAM : ORIGIN = 0x{:08X}, LENGTH = {}K\n\
         }}\n",
        0,
        memory.application_base / 1024,
        memory.ram_origin,
        memory.ram_size / 1024,
    )?;

    Ok(())
}
