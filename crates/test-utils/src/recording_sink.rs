use std::sync::{Arc, Mutex};

use buildwatch::exec::OutputSink;
use buildwatch::types::OutputStream;

/// One forwarded output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLine {
    pub command: String,
    pub stream: OutputStream,
    pub line: String,
}

/// Output sink that keeps every line in memory.
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<RecordedLine>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<RecordedLine> {
        self.lines.lock().unwrap().clone()
    }

    /// Text of the lines that came from `stream`, in arrival order.
    pub fn text(&self, stream: OutputStream) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.stream == stream)
            .map(|l| l.line.clone())
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn line(&self, command: &str, stream: OutputStream, line: &str) {
        self.lines.lock().unwrap().push(RecordedLine {
            command: command.to_string(),
            stream,
            line: line.to_string(),
        });
    }
}
