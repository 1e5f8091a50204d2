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

//! In-memory sink for tests and embedding.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use super::{LineSink, Origin, OutputSink, StreamKind};

/// A cloneable in-memory writer; all clones share the same bytes.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.contents())
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Line-labeled capture of both streams.
pub struct CaptureSink {
    lines: LineSink,
    stdout: SharedBuffer,
    stderr: SharedBuffer,
}

impl CaptureSink {
    pub fn new() -> Self {
        let stdout = SharedBuffer::new();
        let stderr = SharedBuffer::new();
        Self {
            lines: LineSink::new(stdout.clone(), stderr.clone()),
            stdout,
            stderr,
        }
    }

    /// Labeled stdout lines captured so far.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout.lines()
    }

    /// Labeled stderr lines captured so far.
    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr.lines()
    }
}

impl Default for CaptureSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for CaptureSink {
    fn write(&self, origin: &Origin, kind: StreamKind, data: &[u8]) -> io::Result<()> {
        self.lines.write(origin, kind, data)
    }

    fn finish(&self, origin: &Origin, kind: StreamKind) -> io::Result<()> {
        self.lines.finish(origin, kind)
    }
}
