//! This cardboot sub-crate contains all definitions to help generate
//! final cardboot binaries.
//!
//! NOTE: This code is not included anywhere from cardboot itself! This
//! is a dependency of the cardboot **build script**. The build script
//! uses this dependency to validate the configuration file and to generate
//! the constants module that cardboot includes (memory layout, keys, paths).

use std::fmt::Display;

use memory::MemoryConfiguration;
use security::SecurityConfiguration;
use serde::{Deserialize, Serialize};
use update::UpdateConfiguration;

pub mod codegen;
pub mod memory;
pub mod security;
pub mod update;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Configuration {
    pub memory: MemoryConfiguration,
    pub security: SecurityConfiguration,
    pub update: UpdateConfiguration,
}

impl Configuration {
    pub fn complete(&self) -> bool { self.problems().next().is_none() }

    /// Every reason this configuration can't produce a working bootloader.
    pub fn problems(&self) -> impl Iterator<Item = ConfigurationProblem> + '_ {
        self.memory.problems().chain(self.security.problems()).chain(self.update.problems())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationProblem {
    SectorSizeNotPowerOfTwo,
    SectorSizeNotBlockMultiple,
    ApplicationBaseMisaligned,
    ApplicationBaseOutOfFlash,
    DescriptorOutsideHeader,
    FlashTooSmallForHeader,
    MalformedKey(&'static str),
    ExtensionLength,
    ExtensionNotAscii,
    MarkerKeepsExtension,
    EmptyDirectory,
    NoMountAttempts,
}

impl Display for ConfigurationProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationProblem::SectorSizeNotPowerOfTwo => {
                f.write_str("[Memory] Sector size must be a power of two")
            }
            ConfigurationProblem::SectorSizeNotBlockMultiple => {
                f.write_str("[Memory] Sector size must be a multiple of the cipher block size")
            }
            ConfigurationProblem::ApplicationBaseMisaligned => {
                f.write_str("[Memory] Application base must be sector aligned")
            }
            ConfigurationProblem::ApplicationBaseOutOfFlash => {
                f.write_str("[Memory] Application base lies outside flash")
            }
            ConfigurationProblem::DescriptorOutsideHeader => f.write_str(
                "[Memory] Image descriptor must lie within the first three sectors of the image",
            ),
            ConfigurationProblem::FlashTooSmallForHeader => f.write_str(
                "[Memory] Application region must hold at least three sectors",
            ),
            ConfigurationProblem::MalformedKey(name) => {
                write!(f, "[Security] `{}` must be 32 hexadecimal digits", name)
            }
            ConfigurationProblem::ExtensionLength => {
                f.write_str("[Update] Candidate extension must be exactly three characters")
            }
            ConfigurationProblem::ExtensionNotAscii => {
                f.write_str("[Update] Candidate extension must be ASCII")
            }
            ConfigurationProblem::MarkerKeepsExtension => f.write_str(
                "[Update] Processed marker must differ from the extension's last character",
            ),
            ConfigurationProblem::EmptyDirectory => {
                f.write_str("[Update] Update directory can't be empty")
            }
            ConfigurationProblem::NoMountAttempts => {
                f.write_str("[Update] At least one mount attempt is required")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../sample_configurations/mke06z4_default_config.ron");

    #[test]
    fn sample_configuration_is_complete() {
        let configuration: Configuration = ron::from_str(SAMPLE).unwrap();
        assert!(configuration.complete());
        assert_eq!(configuration.memory.application_base, 20480);
        assert_eq!(configuration.update.candidate_extension, "BIN");
    }

    #[test]
    fn every_problem_is_reported() {
        let mut configuration: Configuration = ron::from_str(SAMPLE).unwrap();
        configuration.memory.sector_size = 24;
        configuration.security.encryption_iv = "00".into();
        configuration.update.mount_attempts = 0;

        let problems: Vec<_> = configuration.problems().collect();
        assert!(problems.contains(&ConfigurationProblem::SectorSizeNotPowerOfTwo));
        assert!(problems.contains(&ConfigurationProblem::MalformedKey("encryption_iv")));
        assert!(problems.contains(&ConfigurationProblem::NoMountAttempts));
        assert!(!configuration.complete());
    }
}
