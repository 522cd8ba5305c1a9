use std::{path::Path, process::Stdio};

use tokio::process::{Child, Command};

use crate::BackupRequest;

use super::{SpawnError, Stage};

/// Runs the database dump binary.
#[derive(Debug)]
pub struct DumpProducer<'a> {
    binary: &'a Path,
    database_name: &'a str,
    exclude_table_data: &'a [String],
}

impl<'a> DumpProducer<'a> {
    #[allow(missing_docs)]
    pub fn new(request: &'a BackupRequest) -> Self {
        Self {
            binary: &request.dump_binary,
            database_name: &request.database_name,
            exclude_table_data: &request.exclude_table_data,
        }
    }

    /// `<database> [--exclude-table-data <table>]*`, tables in config order.
    pub fn arguments(&self) -> Vec<&'a str> {
        let mut arguments = vec![self.database_name];

        for table in self.exclude_table_data {
            arguments.push("--exclude-table-data");
            arguments.push(table);
        }

        arguments
    }

    /// Start the dump. The caller owns the stdout stream and must drain it.
    pub fn spawn(&self) -> Result<Child, SpawnError> {
        Command::new(self.binary)
            .args(self.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError {
                stage: Stage::Dump,
                path: self.binary.to_path_buf(),
                source,
            })
    }
}
