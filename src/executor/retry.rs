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

//! Reconnect policy and the injectable backoff delay.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_RECONNECT_BACKOFF;
use crate::error::FleetError;

/// Whether a failed connection is retried, and how long to wait first.
///
/// Retries are unbounded: with reconnect enabled a host keeps trying until
/// it succeeds, hits a non-retryable error, or the run is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ReconnectPolicy {
    /// Fail on the first error.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            backoff: DEFAULT_RECONNECT_BACKOFF,
        }
    }

    /// Retry forever with a fixed wait between attempts.
    #[must_use]
    pub const fn fixed(backoff: Duration) -> Self {
        Self {
            enabled: true,
            backoff,
        }
    }

    /// Check if `error` should lead to another connection attempt.
    #[must_use]
    pub fn should_retry(&self, error: &FleetError) -> bool {
        self.enabled && error.is_retryable()
    }
}

/// Waits between reconnect attempts.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Real wall-clock wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepDelay;

#[async_trait]
impl Delay for SleepDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately. Used to drive reconnect loops in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}

/// Wait out the backoff unless the run is cancelled first.
pub(crate) async fn backoff(
    delay: &dyn Delay,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), FleetError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FleetError::Cancelled),
        _ = delay.wait(duration) => Ok(()),
    }
}
