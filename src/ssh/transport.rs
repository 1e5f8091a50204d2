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

//! The remote-execution capability consumed by the session executor.
//!
//! The executor never talks to russh directly; it drives these traits so the
//! connection, session and command steps can be scripted in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::credentials::Credentials;
use crate::error::{ExitStatus, FleetError};
use crate::node::HostTarget;

/// A chunk of remote output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    StdOut(Vec<u8>),
    StdErr(Vec<u8>),
}

/// Opens authenticated connections.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(
        &self,
        target: &HostTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn Connection>, FleetError>;
}

/// One established, authenticated connection.
#[async_trait]
pub trait Connection: Send {
    /// Request a new remote execution channel.
    async fn open_session(&mut self) -> Result<Box<dyn RemoteSession>, FleetError>;

    /// Close the connection; errors are not interesting at this point.
    async fn close(&mut self) {}
}

/// A remote execution channel.
#[async_trait]
pub trait RemoteSession: Send {
    /// Run `command` and wait for the remote process to exit.
    ///
    /// Output is pushed into `output` while the command runs. A non-zero exit
    /// is returned as `Ok`; `Err` means the transport failed underneath.
    async fn run(
        &mut self,
        command: &str,
        output: mpsc::Sender<CommandOutput>,
    ) -> Result<ExitStatus, FleetError>;
}
