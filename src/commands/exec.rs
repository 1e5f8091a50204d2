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

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::executor::{fleet_exit_code, FleetExecutor, HostOutcome};
use crate::hostlist::resolve_host_spec;
use crate::output::should_use_colors;
use crate::ssh::{load_private_key, Credentials, RusshTransport, ServerCheckMethod};

/// Exit code used when the run was interrupted.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Resolve hosts, load credentials and run the fleet.
///
/// Configuration problems (unreadable host file, bad template, missing key)
/// are returned as errors before any connection is made. Otherwise the
/// returned value is the process exit code.
pub async fn run_fleet(config: &FleetConfig, cancel: CancellationToken) -> Result<i32> {
    let entries = resolve_host_spec(&config.host_spec)
        .map_err(FleetError::from)
        .with_context(|| format!("Failed to resolve hosts from '{}'", config.host_spec))?;

    let key = config
        .key_path
        .as_deref()
        .map(|path| load_private_key(path, None))
        .transpose()?;
    let password = config.defaults.password.as_ref().map(|p| p.as_str());
    let credentials = Arc::new(Credentials::new(password, key));

    let server_check = if config.strict_host_key_checking {
        ServerCheckMethod::DefaultKnownHostsFile
    } else {
        ServerCheckMethod::NoCheck
    };
    let transport = Arc::new(
        RusshTransport::new()
            .with_server_check(server_check)
            .with_connect_timeout(config.connect_timeout),
    );
    let sink = config.output.console_sink(should_use_colors());

    let executor = FleetExecutor::from_config(config, transport, credentials, sink)?
        .with_cancellation(cancel.clone());

    tracing::info!(
        "User: {}, command: '{}', hosts: {}, reconnect: {}",
        config.defaults.user,
        config.command_template(),
        entries.len(),
        config.reconnect
    );

    let outcomes = executor.run(&entries).await?;
    print_failures(&outcomes);

    if cancel.is_cancelled() {
        return Ok(INTERRUPTED_EXIT_CODE);
    }
    Ok(fleet_exit_code(&outcomes))
}

/// List hosts that did not succeed on stderr.
fn print_failures(outcomes: &[HostOutcome]) {
    for outcome in outcomes.iter().filter(|o| !o.is_success()) {
        let Err(e) = &outcome.report.outcome else {
            continue;
        };
        if matches!(e, FleetError::Cancelled) {
            eprintln!("{} {}: {}", "●".yellow(), outcome.entry.bold(), "cancelled".yellow());
        } else {
            eprintln!("{} {}: {}", "●".red(), outcome.entry.bold(), e.red());
        }
    }
}
