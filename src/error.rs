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

//! Error kinds for a fleet run.
//!
//! Each variant maps to one [`ErrorKind`]. The kind decides how far a failure
//! propagates: configuration problems abort the whole run before any
//! connection is made, everything else stays confined to the host that
//! produced it.

use std::fmt;

use thiserror::Error;

use crate::template::TemplateError;

/// Status reported by the remote side when a command finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    /// Regular exit with the given code (`$?` in a shell).
    Code(u32),
    /// The remote process was terminated by a signal.
    Signal(String),
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Code(0))
    }

    /// Exit code, or `None` when the process died from a signal.
    pub fn code(&self) -> Option<u32> {
        match self {
            ExitStatus::Code(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Code(code) => write!(f, "exit status {code}"),
            ExitStatus::Signal(signal) => write!(f, "signal {signal}"),
        }
    }
}

/// Coarse classification of a [`FleetError`], used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Parse,
    Auth,
    Transport,
    RemoteExec,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::Parse => "parse",
            ErrorKind::Auth => "auth",
            ErrorKind::Transport => "transport",
            ErrorKind::RemoteExec => "remote-exec",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum FleetError {
    /// Bad host file, missing key, unreadable config file.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single host entry could not be parsed.
    #[error("invalid host entry '{host}': {reason}")]
    Parse { host: String, reason: String },

    /// The command template is malformed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The remote side rejected every authentication method.
    #[error("authentication failed for {target}: {reason}")]
    Auth { target: String, reason: String },

    /// Connection could not be established or dropped mid-command.
    #[error("transport error on {target}: {reason}")]
    Transport { target: String, reason: String },

    /// The command ran and finished unsuccessfully.
    #[error("command on {target} finished with {status}")]
    RemoteExec { target: String, status: ExitStatus },

    /// The run was stopped through its cancellation token.
    #[error("cancelled")]
    Cancelled,
}

impl FleetError {
    pub fn parse(host: impl Into<String>, reason: impl Into<String>) -> Self {
        FleetError::Parse {
            host: host.into(),
            reason: reason.into(),
        }
    }

    pub fn auth(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        FleetError::Auth {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transport(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        FleetError::Transport {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FleetError::Config(_) => ErrorKind::Config,
            FleetError::Parse { .. } | FleetError::Template(_) => ErrorKind::Parse,
            FleetError::Auth { .. } => ErrorKind::Auth,
            FleetError::Transport { .. } => ErrorKind::Transport,
            FleetError::RemoteExec { .. } => ErrorKind::RemoteExec,
            FleetError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Only connection-level failures are worth another attempt; a command
    /// that ran and failed would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Auth | ErrorKind::Transport)
    }
}
