// src/command/result_config.rs

use std::path::PathBuf;

/// Where and how the result of a command should be delivered once it is
/// finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultConfig {
    /// The caller is waiting for the result through some out-of-band channel.
    pub result_pending: bool,
    /// Directory that receives the result files.
    pub result_directory: Option<PathBuf>,
    /// Write a single formatted file instead of one file per stream.
    pub result_single_file: bool,
    /// File name used in single-file mode.
    pub result_file_basename: Option<String>,
    /// Suffix appended to every per-stream file name.
    pub result_files_suffix: Option<String>,
    /// Template for a successful result in single-file mode.
    pub result_file_output_format: Option<String>,
    /// Template for a failed result in single-file mode.
    pub result_file_error_format: Option<String>,
}

impl ResultConfig {
    pub fn is_command_with_pending_result(&self) -> bool {
        self.result_pending || self.result_directory.is_some()
    }
}
