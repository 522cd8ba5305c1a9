//! Dump a database and compress the dump, in memory.
//!

use core::{fmt, time::Duration};
use std::{io, path::PathBuf, process::ExitStatus};

use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Child,
    time::timeout,
};
use tracing::debug;

use crate::{BackupRequest, Context};

mod compress;
mod dump;
mod pipe;

pub use compress::{COMPRESS_ARGUMENTS, Compressor};
pub use dump::DumpProducer;
pub use pipe::Pipe;

/// An external process in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    #[allow(missing_docs)]
    Dump,
    #[allow(missing_docs)]
    Compress,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dump => write!(f, "dump"),
            Self::Compress => write!(f, "compress"),
        }
    }
}

/// Dump and compress the requested database, returning the compressed bytes.
pub async fn run(context: &Context, request: &BackupRequest) -> Result<Vec<u8>, PipelineError> {
    start(context, request)?.finish().await
}

/// Start the dump, then the compressor.
///
/// Nothing is waited on here. If the dump can't be launched the compressor is never started.
pub fn start(context: &Context, request: &BackupRequest) -> Result<RunningPipeline, PipelineError> {
    let dump = DumpProducer::new(request).spawn()?;
    debug!("{context}Started {:?}", request.dump_binary);

    let compressor = Compressor::new(&request.compress_binary).spawn()?;
    debug!("{context}Started {:?}", request.compress_binary);

    Ok(RunningPipeline {
        context: context.clone(),
        dump,
        compressor,
        deadline: request.subprocess_timeout(),
    })
}

/// A started dump and compressor. Dropping this kills both.
#[derive(Debug)]
pub struct RunningPipeline {
    context: Context,
    dump: Child,
    compressor: Child,
    deadline: Duration,
}

impl RunningPipeline {
    /// Pipe the dump into the compressor and wait for both to exit.
    ///
    /// The compressed bytes are only returned once both processes have exited successfully. If the
    /// deadline passes first, both processes are killed.
    pub async fn finish(self) -> Result<Vec<u8>, PipelineError> {
        let deadline = self.deadline;

        match timeout(deadline, self.collect()).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(deadline)),
        }
    }

    async fn collect(mut self) -> Result<Vec<u8>, PipelineError> {
        let context = &self.context;

        let dump_stdout = self
            .dump
            .stdout
            .take()
            .ok_or(PipelineError::MissingStream(Stage::Dump, "stdout"))?;
        let compress_stdin = self
            .compressor
            .stdin
            .take()
            .ok_or(PipelineError::MissingStream(Stage::Compress, "stdin"))?;
        let compress_stdout = self
            .compressor
            .stdout
            .take()
            .ok_or(PipelineError::MissingStream(Stage::Compress, "stdout"))?;

        let pipe = Pipe::new(dump_stdout, compress_stdin);

        // Everything has to make progress at once or a full pipe buffer stalls a process.
        let (pumped, compressed, dump_stderr, compress_stderr, dump_status, compress_status) = tokio::join!(
            pipe.pump(),
            read_all(compress_stdout),
            read_stderr(self.dump.stderr.take()),
            read_stderr(self.compressor.stderr.take()),
            self.dump.wait(),
            self.compressor.wait(),
        );

        let dump_status = dump_status.map_err(|e| PipelineError::Io(e, "wait for dump"))?;
        let compress_status =
            compress_status.map_err(|e| PipelineError::Io(e, "wait for compress"))?;
        debug!("{context}dump {dump_status}, compress {compress_status}");

        check_exit(Stage::Dump, dump_status, dump_stderr)?;
        check_exit(Stage::Compress, compress_status, compress_stderr)?;

        let pumped = pumped.map_err(|e| PipelineError::Io(e, "pipe dump into compress"))?;
        let compressed = compressed.map_err(|e| PipelineError::Io(e, "read compressed output"))?;
        debug!(
            "{context}Compressed {pumped} bytes into {} bytes",
            compressed.len()
        );

        Ok(compressed)
    }
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

/// Stderr is only for error messages, so a failed read is an empty message.
async fn read_stderr<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let Some(reader) = reader else {
        return String::new();
    };

    match read_all(reader).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    }
}

fn check_exit(stage: Stage, status: ExitStatus, stderr: String) -> Result<(), PipelineError> {
    if status.success() {
        return Ok(());
    }

    Err(PipelineError::Exited {
        stage,
        code: status.code(),
        stderr,
    })
}

/// A pipeline process could not be started.
#[derive(Debug, Error)]
#[error("Failed to launch {stage} binary {path:?}: {source}")]
pub struct SpawnError {
    /// Which process failed.
    pub stage: Stage,

    /// The binary that was launched.
    pub path: PathBuf,

    /// Why it failed.
    #[source]
    pub source: io::Error,
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error("The {stage} process exited with code {code:?}: {stderr}")]
    Exited {
        stage: Stage,
        /// `None` when killed by a signal.
        code: Option<i32>,
        stderr: String,
    },

    #[error("The {0} process has no {1} stream")]
    MissingStream(Stage, &'static str),

    #[error("Failed to {1}: {0}")]
    Io(#[source] io::Error, &'static str),

    #[error("The dump and compress did not finish within {0:?}")]
    Timeout(Duration),
}
