// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line-labeled sink.
//!
//! Incoming bytes are buffered per origin and stream, split on `\n`, and every
//! complete line is emitted as `label/stream: line`. Lines that are empty
//! after trimming are skipped. All lines extracted from one chunk are written
//! inside a single critical section of the physical stream.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use owo_colors::OwoColorize;

use super::{Origin, OutputSink, StreamKind};

type BoxedWriter = Box<dyn Write + Send>;

pub struct LineSink {
    stdout: Mutex<BoxedWriter>,
    stderr: Mutex<BoxedWriter>,
    pending: Mutex<HashMap<(usize, StreamKind), Vec<u8>>>,
    colors: bool,
}

impl LineSink {
    pub fn new(stdout: impl Write + Send + 'static, stderr: impl Write + Send + 'static) -> Self {
        Self {
            stdout: Mutex::new(Box::new(stdout)),
            stderr: Mutex::new(Box::new(stderr)),
            pending: Mutex::new(HashMap::new()),
            colors: false,
        }
    }

    pub fn console() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Colorize the label prefix.
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    fn stream(&self, kind: StreamKind) -> MutexGuard<'_, BoxedWriter> {
        let lock = match kind {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        };
        lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<(usize, StreamKind), Vec<u8>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prefix(&self, origin: &Origin, kind: StreamKind) -> String {
        let prefix = format!("{}/{}:", origin.label, kind);
        if !self.colors {
            return prefix;
        }
        match kind {
            StreamKind::Stdout => prefix.cyan().to_string(),
            StreamKind::Stderr => prefix.red().to_string(),
        }
    }

    fn emit(&self, origin: &Origin, kind: StreamKind, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let prefix = self.prefix(origin, kind);
        let mut stream = self.stream(kind);
        for line in lines {
            writeln!(stream, "{prefix} {line}")?;
        }
        stream.flush()
    }
}

impl OutputSink for LineSink {
    fn write(&self, origin: &Origin, kind: StreamKind, data: &[u8]) -> io::Result<()> {
        let lines = {
            let mut pending = self.pending();
            let buffer = pending.entry((origin.slot, kind)).or_default();
            buffer.extend_from_slice(data);
            take_complete_lines(buffer)
        };
        let lines: Vec<String> = lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect();
        self.emit(origin, kind, &lines)
    }

    fn finish(&self, origin: &Origin, kind: StreamKind) -> io::Result<()> {
        let fragment = self.pending().remove(&(origin.slot, kind));
        match fragment {
            Some(fragment) => {
                let line = decode_line(&fragment);
                if line.trim().is_empty() {
                    tracing::trace!("Discarding blank trailing fragment from {}", origin);
                    return Ok(());
                }
                self.emit(origin, kind, &[line])
            }
            None => Ok(()),
        }
    }
}

/// Drain every complete line from `buffer`, leaving the trailing fragment.
fn take_complete_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let Some(last_newline) = buffer.iter().rposition(|&b| b == b'\n') else {
        return Vec::new();
    };
    let complete: Vec<u8> = buffer.drain(..=last_newline).collect();
    complete[..complete.len() - 1]
        .split(|&b| b == b'\n')
        .map(decode_line)
        .collect()
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
