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

//! Pass-through sink: raw bytes, one lock per physical stream.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use super::{Origin, OutputSink, StreamKind};

type BoxedWriter = Box<dyn Write + Send>;

/// Writes each chunk as-is while holding the lock of its stream.
pub struct RawSink {
    stdout: Mutex<BoxedWriter>,
    stderr: Mutex<BoxedWriter>,
}

impl RawSink {
    pub fn new(stdout: impl Write + Send + 'static, stderr: impl Write + Send + 'static) -> Self {
        Self {
            stdout: Mutex::new(Box::new(stdout)),
            stderr: Mutex::new(Box::new(stderr)),
        }
    }

    /// Sink bound to the process's stdout and stderr.
    pub fn console() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    fn stream(&self, kind: StreamKind) -> MutexGuard<'_, BoxedWriter> {
        let lock = match kind {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        };
        // A panic while writing leaves the writer usable; keep going.
        lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputSink for RawSink {
    fn write(&self, _origin: &Origin, kind: StreamKind, data: &[u8]) -> io::Result<()> {
        let mut stream = self.stream(kind);
        stream.write_all(data)?;
        stream.flush()
    }
}
