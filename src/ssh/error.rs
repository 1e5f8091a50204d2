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

//! Transport-level errors from the russh-backed client.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::error::FleetError;

#[derive(Debug, Error)]
pub enum SshError {
    #[error("could not resolve address: {0}")]
    AddressInvalid(io::Error),

    #[error("ssh protocol error: {0}")]
    SshError(#[from] russh::Error),

    #[error("server rejected authentication for user '{user}' (tried: {tried})")]
    AuthRejected { user: String, tried: String },

    #[error("server host key verification failed")]
    ServerCheckFailed,

    #[error("channel closed before the command reported an exit status")]
    CommandDidntExit,

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
}

impl SshError {
    /// Classify for the executor's retry policy.
    pub fn into_fleet_error(self, target: &str) -> FleetError {
        match self {
            SshError::AuthRejected { .. } | SshError::ServerCheckFailed => {
                FleetError::auth(target, self)
            }
            other => FleetError::transport(target, other),
        }
    }
}
