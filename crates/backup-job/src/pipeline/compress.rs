use std::{path::Path, process::Stdio};

use tokio::process::{Child, Command};

use super::{SpawnError, Stage};

/// Write the compressed stream to stdout.
pub const COMPRESS_ARGUMENTS: [&str; 1] = ["-c"];

/// Runs the compression binary as a stdin to stdout filter.
#[derive(Debug)]
pub struct Compressor<'a> {
    binary: &'a Path,
}

impl<'a> Compressor<'a> {
    #[allow(missing_docs)]
    pub fn new(binary: &'a Path) -> Self {
        Self { binary }
    }

    /// Start the compressor. The caller owns both stdin and stdout and must close stdin once the
    /// input is written.
    pub fn spawn(&self) -> Result<Child, SpawnError> {
        Command::new(self.binary)
            .args(COMPRESS_ARGUMENTS)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError {
                stage: Stage::Compress,
                path: self.binary.to_path_buf(),
                source,
            })
    }
}
