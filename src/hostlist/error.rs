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

//! Error types for host specification resolution

use thiserror::Error;

use crate::error::FleetError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostlistError {
    /// Nothing to resolve (e.g. `--hosts ""` or `@` alone)
    #[error("empty host specification")]
    Empty,

    /// File not found for `@` prefix
    #[error("hostfile not found: {path}")]
    FileNotFound { path: String },

    /// Error reading hostfile
    #[error("failed to read hostfile '{path}': {reason}")]
    FileReadError { path: String, reason: String },
}

impl From<HostlistError> for FleetError {
    fn from(err: HostlistError) -> Self {
        FleetError::Config(err.to_string())
    }
}
