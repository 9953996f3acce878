//! In-memory log capture for asserting on diagnostics.
//!
//! # Design
//! - Reuse the fmt formatter so captured lines match real log output.
//! - Scope the subscriber to a closure; the global subscriber is untouched.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Lines formatted while a [`capture_logs`] closure ran.
#[derive(Clone, Debug, Default)]
pub struct CapturedLogs {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CapturedLogs {
    /// Copy of every captured line, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of captured lines containing `needle`.
    #[must_use]
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lock().iter().filter(|line| line.contains(needle)).count()
    }

    /// Whether any captured line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.count_containing(needle) > 0
    }

    fn push(&self, line: String) {
        self.lock().push(line);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run `f` with a thread-local subscriber that records events at `level` and
/// above, returning its result with the captured lines.
pub fn capture_logs_at<R>(level: Level, f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(CaptureMakeWriter { logs: logs.clone() })
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs)
}

/// [`capture_logs_at`] with `TRACE`, recording everything.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    capture_logs_at(Level::TRACE, f)
}

#[derive(Clone)]
struct CaptureMakeWriter {
    logs: CapturedLogs,
}

impl<'a> MakeWriter<'a> for CaptureMakeWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            logs: self.logs.clone(),
            buffer: LineBuffer::default(),
        }
    }
}

struct CaptureWriter {
    logs: CapturedLogs,
    buffer: LineBuffer,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for line in self.buffer.push(buf) {
            if !line.is_empty() {
                self.logs.push(line);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        if let Some(line) = self.buffer.finish() {
            self.logs.push(line);
        }
    }
}

#[derive(Default)]
struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_complete_lines()
    }

    fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buffer).to_string();
        self.buffer.clear();
        Some(trim_line(&line))
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0usize;
        for (idx, byte) in self.buffer.iter().enumerate() {
            if *byte == b'\n' {
                let line = String::from_utf8_lossy(&self.buffer[start..idx]).to_string();
                lines.push(trim_line(&line));
                start = idx.saturating_add(1);
            }
        }
        if start > 0 {
            self.buffer.drain(0..start);
        }
        lines
    }
}

fn trim_line(line: &str) -> String {
    line.trim_end_matches(['\r', '\n']).to_string()
}
