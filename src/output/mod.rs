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

//! Output multiplexing for concurrent sessions.
//!
//! Every session executor writes its remote stdout/stderr through one shared
//! [`OutputSink`]. Implementations guarantee that a single `write` call is
//! never interleaved with another host's write on the same physical stream;
//! no ordering across hosts is promised beyond that.

mod capture;
mod line;
mod raw;

use std::fmt;
use std::io;
use std::sync::Arc;

pub use capture::{CaptureSink, SharedBuffer};
pub use line::LineSink;
pub use raw::RawSink;

/// Which remote stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Identity of the session a chunk belongs to.
///
/// `slot` is the position of the host entry in the resolved list, which keeps
/// two executors for the same (duplicated) host apart even though their
/// labels are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub slot: usize,
    pub label: Arc<str>,
}

impl Origin {
    pub fn new(slot: usize, label: impl Into<Arc<str>>) -> Self {
        Self {
            slot,
            label: label.into(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Shared, concurrency-safe destination for session output.
pub trait OutputSink: Send + Sync {
    /// Write one chunk. The chunk reaches the underlying stream before any
    /// other host's chunk for the same stream is let through.
    fn write(&self, origin: &Origin, kind: StreamKind, data: &[u8]) -> io::Result<()>;

    /// The session behind `origin` will not produce more data on `kind`.
    fn finish(&self, _origin: &Origin, _kind: StreamKind) -> io::Result<()> {
        Ok(())
    }
}

/// Presentation of multiplexed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Bytes are passed through untouched.
    #[default]
    Raw,
    /// Every line is prefixed with `user@host:port/stream: `.
    Labeled,
}

impl OutputMode {
    /// Sink writing to the process's stdout/stderr in this mode.
    pub fn console_sink(self, colors: bool) -> Arc<dyn OutputSink> {
        match self {
            OutputMode::Raw => Arc::new(RawSink::console()),
            OutputMode::Labeled => Arc::new(LineSink::console().with_colors(colors)),
        }
    }
}

/// Check if colors should be enabled on stdout.
///
/// Colors are enabled when stdout is a terminal, `NO_COLOR` is not set and
/// `TERM` is not `dumb`.
pub fn should_use_colors() -> bool {
    use std::io::IsTerminal;

    if !std::io::stdout().is_terminal() {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(std::env::var("TERM").as_deref(), Ok("dumb"))
}
