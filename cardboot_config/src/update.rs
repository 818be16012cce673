use serde::{Deserialize, Serialize};

use crate::ConfigurationProblem;

/// Where candidate images are looked for, and how they're marked once processed.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UpdateConfiguration {
    /// Directory scanned for candidate images, relative to the volume root.
    pub directory: String,
    /// Extension (without the dot) that makes a file a candidate. Matched case-exactly.
    pub candidate_extension: String,
    /// Replaces the last character of the extension once a candidate has been opened.
    pub processed_marker: char,
    /// Name of the diagnostic log created inside `directory`.
    pub log_file: String,
    pub mount_attempts: u32,
    pub mount_retry_delay_ms: u32,
}

impl UpdateConfiguration {
    pub fn log_path(&self) -> String { format!("{}/{}", self.directory, self.log_file) }

    pub fn problems(&self) -> impl Iterator<Item = ConfigurationProblem> {
        let extension = &self.candidate_extension;
        #[rustfmt::skip]
        let problems = [
            (extension.chars().count() != 3).then(|| ConfigurationProblem::ExtensionLength),
            (!extension.is_ascii()).then(|| ConfigurationProblem::ExtensionNotAscii),
            (extension.chars().last() == Some(self.processed_marker))
                .then(|| ConfigurationProblem::MarkerKeepsExtension),
            self.directory.is_empty().then(|| ConfigurationProblem::EmptyDirectory),
            (self.mount_attempts == 0).then(|| ConfigurationProblem::NoMountAttempts),
        ];
        problems.into_iter().flatten()
    }
}
