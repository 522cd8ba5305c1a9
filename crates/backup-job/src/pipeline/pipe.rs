use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, copy};

/// Connects a producer's output to a consumer's input.
///
/// The write half is closed once the read half reaches EOF, which is the consumer's EOF.
#[derive(Debug)]
pub struct Pipe<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Pipe<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    #[allow(missing_docs)]
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Copy everything across, then close the write half. Returns the bytes copied.
    pub async fn pump(mut self) -> io::Result<u64> {
        let copied = copy(&mut self.reader, &mut self.writer).await?;
        self.writer.shutdown().await?;

        Ok(copied)
    }
}
