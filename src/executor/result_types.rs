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

//! Result types for session and fleet execution.

use crate::error::{ErrorKind, ExitStatus, FleetError};

/// Lifecycle of one host's session executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    SessionOpen,
    Running,
    /// Waiting out the backoff before the next connection attempt.
    Reconnecting,
    /// Terminal. Carries the error kind when the host failed.
    Done(Option<ErrorKind>),
}

/// What one session executor ended with.
#[derive(Debug)]
pub struct SessionReport {
    /// `user@host:port` of the target, or the raw entry if it never parsed.
    pub label: String,
    /// Number of connection attempts made.
    pub attempts: u32,
    /// A non-zero exit is reported as [`FleetError::RemoteExec`].
    pub outcome: Result<ExitStatus, FleetError>,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        matches!(&self.outcome, Ok(status) if status.is_success())
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.as_ref().err().map(FleetError::kind)
    }
}

/// Result for a single host entry of a fleet run.
#[derive(Debug)]
pub struct HostOutcome {
    /// The entry as it appeared in the host specification.
    pub entry: String,
    pub report: SessionReport,
}

impl HostOutcome {
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }
}

/// Process exit code for a finished fleet: 0 when every host succeeded.
pub fn fleet_exit_code(outcomes: &[HostOutcome]) -> i32 {
    if outcomes.iter().all(HostOutcome::is_success) {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(entry: &str, outcome: Result<ExitStatus, FleetError>) -> HostOutcome {
        HostOutcome {
            entry: entry.to_string(),
            report: SessionReport {
                label: entry.to_string(),
                attempts: 1,
                outcome,
            },
        }
    }

    #[test]
    fn test_fleet_exit_code() {
        let ok = vec![
            outcome("a", Ok(ExitStatus::Code(0))),
            outcome("b", Ok(ExitStatus::Code(0))),
        ];
        assert_eq!(fleet_exit_code(&ok), 0);
        assert_eq!(fleet_exit_code(&[]), 0);

        let mixed = vec![
            outcome("a", Ok(ExitStatus::Code(0))),
            outcome("b", Err(FleetError::parse("b", "bad port"))),
        ];
        assert_eq!(fleet_exit_code(&mixed), 1);
        assert_eq!(mixed[1].report.error_kind(), Some(ErrorKind::Parse));
    }
}
