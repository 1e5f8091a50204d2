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

//! Per-host session lifecycle: connect, open a session, run, reconnect.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::result_types::{SessionReport, SessionState};
use super::retry::{backoff, Delay, ReconnectPolicy, SleepDelay};
use crate::error::{ExitStatus, FleetError};
use crate::node::HostTarget;
use crate::output::{Origin, OutputSink, StreamKind};
use crate::ssh::{CommandOutput, Connection, Credentials, Transport};

/// Output chunks buffered between the remote channel and the sink.
const OUTPUT_CHANNEL_CAPACITY: usize = 256;

/// Drives one host from `Connecting` to `Done`.
///
/// With reconnect enabled, auth and transport failures loop back through
/// `Reconnecting` to `Connecting` without limit. A command that ran and
/// exited non-zero is always terminal.
pub struct SessionExecutor {
    target: HostTarget,
    origin: Origin,
    command: String,
    credentials: Arc<Credentials>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn OutputSink>,
    policy: ReconnectPolicy,
    delay: Arc<dyn Delay>,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl SessionExecutor {
    pub fn new(
        target: HostTarget,
        origin: Origin,
        command: String,
        credentials: Arc<Credentials>,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        Self {
            target,
            origin,
            command,
            credentials,
            transport,
            sink,
            policy: ReconnectPolicy::disabled(),
            delay: Arc::new(SleepDelay),
            cancel: CancellationToken::new(),
            state,
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the wait used between reconnect attempts.
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Subscribe to state transitions. Only the latest state is retained.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run until the command finishes, a terminal error occurs, or the
    /// cancellation token fires.
    pub async fn run(self) -> SessionReport {
        let label = self.origin.label.to_string();
        let mut attempts = 0u32;

        let outcome = loop {
            attempts += 1;
            let error = match self.attempt().await {
                Ok(status) if status.is_success() => break Ok(status),
                Ok(status) => {
                    break Err(FleetError::RemoteExec {
                        target: label.clone(),
                        status,
                    })
                }
                Err(e) => e,
            };

            if !self.policy.should_retry(&error) {
                break Err(error);
            }

            tracing::warn!(
                host = %label,
                kind = %error.kind(),
                attempt = attempts,
                "{}; reconnecting in {:?}",
                error,
                self.policy.backoff
            );
            self.set_state(SessionState::Reconnecting);
            if let Err(e) = backoff(self.delay.as_ref(), self.policy.backoff, &self.cancel).await {
                break Err(e);
            }
        };

        match &outcome {
            Ok(status) => {
                tracing::debug!(host = %label, attempt = attempts, "Command finished with {}", status)
            }
            Err(FleetError::Cancelled) => {
                tracing::debug!(host = %label, attempt = attempts, "Session cancelled")
            }
            Err(e) => tracing::error!(host = %label, kind = %e.kind(), attempt = attempts, "{}", e),
        }
        self.set_state(SessionState::Done(outcome.as_ref().err().map(FleetError::kind)));

        SessionReport {
            label,
            attempts,
            outcome,
        }
    }

    /// One pass through connect, open session and run.
    async fn attempt(&self) -> Result<ExitStatus, FleetError> {
        self.set_state(SessionState::Connecting);
        let mut connection = self
            .cancellable(self.transport.connect(&self.target, &self.credentials))
            .await?;

        let result = self.run_on(connection.as_mut()).await;
        if !matches!(&result, Err(FleetError::Cancelled)) {
            connection.close().await;
        }
        result
    }

    async fn run_on(&self, connection: &mut dyn Connection) -> Result<ExitStatus, FleetError> {
        let mut session = self.cancellable(connection.open_session()).await?;
        self.set_state(SessionState::SessionOpen);

        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        let pump = tokio::spawn(pump_output(rx, self.sink.clone(), self.origin.clone()));

        self.set_state(SessionState::Running);
        let result = self.cancellable(session.run(&self.command, tx)).await;

        // The sender is gone once `run` returns or is dropped, so the pump
        // drains what is left and exits.
        if let Err(e) = pump.await {
            tracing::warn!(host = %self.origin, "Output pump task failed: {}", e);
        }
        result
    }

    async fn cancellable<T>(
        &self,
        fut: impl Future<Output = Result<T, FleetError>>,
    ) -> Result<T, FleetError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FleetError::Cancelled),
            result = fut => result,
        }
    }

    fn set_state(&self, state: SessionState) {
        tracing::trace!(host = %self.origin, state = ?state, "Session state changed");
        self.state.send_replace(state);
    }
}

/// Copy output chunks into the sink until the sender side is dropped.
async fn pump_output(
    mut rx: mpsc::Receiver<CommandOutput>,
    sink: Arc<dyn OutputSink>,
    origin: Origin,
) {
    while let Some(chunk) = rx.recv().await {
        let (kind, data) = match chunk {
            CommandOutput::StdOut(data) => (StreamKind::Stdout, data),
            CommandOutput::StdErr(data) => (StreamKind::Stderr, data),
        };
        if let Err(e) = sink.write(&origin, kind, &data) {
            tracing::warn!(host = %origin, "Failed to write {}: {}", kind, e);
        }
    }

    for kind in [StreamKind::Stdout, StreamKind::Stderr] {
        if let Err(e) = sink.finish(&origin, kind) {
            tracing::warn!(host = %origin, "Failed to flush {}: {}", kind, e);
        }
    }
}
