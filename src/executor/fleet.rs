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

//! Fleet orchestration: one session executor per host, joined at the end.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use super::result_types::{HostOutcome, SessionReport};
use super::retry::{Delay, ReconnectPolicy, SleepDelay};
use super::session::SessionExecutor;
use crate::config::{FleetConfig, ParsePolicy};
use crate::error::FleetError;
use crate::node::{HostDefaults, HostTarget};
use crate::output::{Origin, OutputSink};
use crate::ssh::{Credentials, Transport};
use crate::template::CommandTemplate;

/// Fans a command out to every host and waits for all of them.
///
/// Every host gets its own task and no fan-out limit is applied. A host
/// failing never affects its siblings. In tail mode the executors reconnect
/// forever, so [`FleetExecutor::run`] only returns once the cancellation
/// token fires.
pub struct FleetExecutor {
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    sink: Arc<dyn OutputSink>,
    template: CommandTemplate,
    defaults: HostDefaults,
    policy: ReconnectPolicy,
    parse_policy: ParsePolicy,
    delay: Arc<dyn Delay>,
    cancel: CancellationToken,
}

impl FleetExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<Credentials>,
        sink: Arc<dyn OutputSink>,
        template: CommandTemplate,
    ) -> Self {
        Self {
            transport,
            credentials,
            sink,
            template,
            defaults: HostDefaults::default(),
            policy: ReconnectPolicy::disabled(),
            parse_policy: ParsePolicy::Isolate,
            delay: Arc::new(SleepDelay),
            cancel: CancellationToken::new(),
        }
    }

    /// Build an executor from the run configuration.
    ///
    /// Fails when the command template is malformed; nothing has been
    /// connected at that point.
    pub fn from_config(
        config: &FleetConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<Credentials>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, FleetError> {
        let template = CommandTemplate::parse(&config.command_template())?;
        let policy = if config.reconnect {
            ReconnectPolicy::fixed(config.reconnect_backoff)
        } else {
            ReconnectPolicy::disabled()
        };

        Ok(Self::new(transport, credentials, sink, template)
            .with_defaults(config.defaults.clone())
            .with_reconnect(policy)
            .with_parse_policy(config.parse_policy))
    }

    /// Defaults applied to entries without an embedded user, password or port.
    pub fn with_defaults(mut self, defaults: HostDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_parse_policy(mut self, parse_policy: ParsePolicy) -> Self {
        self.parse_policy = parse_policy;
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops every executor of this fleet when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Parse every entry against the defaults.
    ///
    /// Under [`ParsePolicy::FailFast`] the first malformed entry is returned
    /// as an error; otherwise each entry carries its own result.
    pub fn plan(
        &self,
        entries: &[String],
    ) -> Result<Vec<Result<HostTarget, FleetError>>, FleetError> {
        let mut planned = Vec::with_capacity(entries.len());
        for entry in entries {
            match HostTarget::parse(entry, &self.defaults) {
                Err(e) if self.parse_policy == ParsePolicy::FailFast => {
                    tracing::error!(host = %entry, kind = %e.kind(), "{}", e);
                    return Err(e);
                }
                parsed => planned.push(parsed),
            }
        }
        Ok(planned)
    }

    /// Run the command on every entry and wait for all executors to finish.
    ///
    /// Outcomes are returned in entry order. `Err` is only returned when a
    /// fail-fast parse error stops the run before any connection is made.
    pub async fn run(&self, entries: &[String]) -> Result<Vec<HostOutcome>, FleetError> {
        let planned = self.plan(entries)?;

        tracing::info!("Running '{}' on {} host(s)", self.template.as_str(), entries.len());

        let tasks = planned.into_iter().enumerate().map(|(slot, parsed)| {
            let entry = entries[slot].clone();
            let spawned = parsed.map(|target| self.spawn_session(slot, target));
            async move {
                let report = match spawned {
                    Ok((label, handle)) => match handle.await {
                        Ok(report) => report,
                        Err(e) => SessionReport {
                            outcome: Err(FleetError::transport(
                                label.clone(),
                                format!("executor task failed: {e}"),
                            )),
                            label,
                            attempts: 0,
                        },
                    },
                    Err(e) => {
                        tracing::error!(host = %entry, kind = %e.kind(), "{}", e);
                        SessionReport {
                            label: entry.clone(),
                            attempts: 0,
                            outcome: Err(e),
                        }
                    }
                };
                HostOutcome { entry, report }
            }
        });

        let outcomes = join_all(tasks).await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(
            "{} of {} host(s) finished successfully",
            succeeded,
            outcomes.len()
        );
        Ok(outcomes)
    }

    fn spawn_session(
        &self,
        slot: usize,
        target: HostTarget,
    ) -> (String, tokio::task::JoinHandle<SessionReport>) {
        let label = target.label();
        let command = self.template.render_for(&target);
        tracing::debug!(host = %label, "Rendered command: {}", command);

        let executor = SessionExecutor::new(
            target,
            Origin::new(slot, label.as_str()),
            command,
            Arc::clone(&self.credentials),
            Arc::clone(&self.transport),
            Arc::clone(&self.sink),
        )
        .with_policy(self.policy)
        .with_delay(Arc::clone(&self.delay))
        .with_cancellation(self.cancel.child_token());

        (label, tokio::spawn(executor.run()))
    }
}
