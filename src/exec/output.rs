// src/exec/output.rs

//! Forwarding of child process output.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::types::OutputStream;

/// Receives child output one line at a time.
///
/// Implementations are called concurrently from the reader tasks of every
/// running child and must write each line atomically.
pub trait OutputSink: Send + Sync {
    fn line(&self, command: &str, stream: OutputStream, line: &str);
}

/// Writes stdout lines to our stdout and stderr lines to our stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn line(&self, _command: &str, stream: OutputStream, line: &str) {
        // Holding the lock for the whole line keeps concurrent children from
        // splitting each other's lines.
        let _ = match stream {
            OutputStream::Stdout => writeln!(std::io::stdout().lock(), "{line}"),
            OutputStream::Stderr => writeln!(std::io::stderr().lock(), "{line}"),
        };
    }
}

/// Spawn a task that reads `reader` line by line into `sink` until EOF.
pub fn forward_lines<R>(
    reader: R,
    stream: OutputStream,
    command: String,
    sink: Arc<dyn OutputSink>,
) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    trace!(command = %command, %stream, "{}", line);
                    sink.line(&command, stream, &line);
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(command = %command, %stream, error = %err, "output stream read failed");
                    break;
                }
            }
        }
    })
}
