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

//! [`Transport`] implementation backed by russh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::Msg;
use russh::Channel;
use tokio::sync::mpsc;

use super::credentials::Credentials;
use super::error::SshError;
use super::tokio_client::{self, Client, ServerCheckMethod};
use super::transport::{CommandOutput, Connection, RemoteSession, Transport};
use crate::error::{ExitStatus, FleetError};
use crate::node::HostTarget;

/// Interval between keepalive messages on idle connections.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Unanswered keepalives before the connection is considered dead.
const KEEPALIVE_MAX: usize = 3;

/// Connects to real hosts over TCP.
#[derive(Clone)]
pub struct RusshTransport {
    config: Arc<russh::client::Config>,
    server_check: ServerCheckMethod,
    connect_timeout: Option<Duration>,
}

impl RusshTransport {
    pub fn new() -> Self {
        let config = russh::client::Config {
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            keepalive_max: KEEPALIVE_MAX,
            ..Default::default()
        };
        Self {
            config: Arc::new(config),
            server_check: ServerCheckMethod::NoCheck,
            connect_timeout: None,
        }
    }

    pub fn with_server_check(mut self, server_check: ServerCheckMethod) -> Self {
        self.server_check = server_check;
        self
    }

    /// Bound the time spent resolving, connecting and authenticating.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn open(&self, target: &HostTarget, credentials: &Credentials) -> Result<Client, SshError> {
        let methods = credentials.for_target(target);
        let connect = Client::connect(
            &target.host,
            target.port,
            &target.user,
            &methods,
            self.server_check,
            self.config.clone(),
        );

        match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| SshError::Timeout(limit))?,
            None => connect.await,
        }
    }
}

impl Default for RusshTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RusshTransport {
    async fn connect(
        &self,
        target: &HostTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn Connection>, FleetError> {
        let label = target.label();
        let client = self
            .open(target, credentials)
            .await
            .map_err(|e| e.into_fleet_error(&label))?;

        tracing::debug!(
            "Connected to {} via {}",
            label,
            client.get_connection_address()
        );

        Ok(Box::new(RusshConnection { client, label }))
    }
}

struct RusshConnection {
    client: Client,
    label: String,
}

#[async_trait]
impl Connection for RusshConnection {
    async fn open_session(&mut self) -> Result<Box<dyn RemoteSession>, FleetError> {
        let channel = self
            .client
            .get_channel()
            .await
            .map_err(|e| e.into_fleet_error(&self.label))?;
        Ok(Box::new(RusshSession {
            channel,
            label: self.label.clone(),
        }))
    }

    async fn close(&mut self) {
        if self.client.is_closed() {
            return;
        }
        if let Err(e) = self.client.disconnect().await {
            tracing::trace!("Disconnect from {} failed: {}", self.label, e);
        }
    }
}

struct RusshSession {
    channel: Channel<Msg>,
    label: String,
}

#[async_trait]
impl RemoteSession for RusshSession {
    async fn run(
        &mut self,
        command: &str,
        output: mpsc::Sender<CommandOutput>,
    ) -> Result<ExitStatus, FleetError> {
        tokio_client::execute_streaming(&mut self.channel, command, &output)
            .await
            .map_err(|e| e.into_fleet_error(&self.label))
    }
}
