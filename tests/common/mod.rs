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

//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use sshfan::error::{ExitStatus, FleetError};
use sshfan::node::HostTarget;
use sshfan::ssh::{CommandOutput, Connection, Credentials, RemoteSession, Transport};

/// What a connection attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    Refuse,
    RejectAuth,
    Accept,
}

/// What the remote command does once it runs.
#[derive(Debug, Clone)]
pub enum RunScript {
    /// Print the lines and exit with the status.
    Exit {
        stdout: Vec<String>,
        stderr: Vec<String>,
        status: ExitStatus,
    },
    /// Print the lines, then lose the connection.
    Drop { stdout: Vec<String> },
    /// Print the lines, then never exit (`tail -f`).
    Hang { stdout: Vec<String> },
    /// Wait until the gate is opened, then exit with the status.
    Gate {
        gate: Arc<Notify>,
        status: ExitStatus,
    },
}

impl RunScript {
    pub fn ok(stdout: &[&str]) -> Self {
        RunScript::Exit {
            stdout: stdout.iter().map(|s| s.to_string()).collect(),
            stderr: Vec::new(),
            status: ExitStatus::Code(0),
        }
    }

    pub fn exit(code: u32) -> Self {
        RunScript::Exit {
            stdout: Vec::new(),
            stderr: vec![format!("failed with {code}")],
            status: ExitStatus::Code(code),
        }
    }
}

#[derive(Default)]
struct HostScript {
    connects: VecDeque<ConnectStep>,
    runs: VecDeque<RunScript>,
}

/// A [`Transport`] whose behavior is scripted per host name.
///
/// Hosts without a script accept the connection and exit 0 silently.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, HostScript>>,
    connects: Mutex<HashMap<String, u32>>,
    commands: CommandLog,
}

type CommandLog = Arc<Mutex<Vec<(String, String)>>>;

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run scripts used on successive sessions; the last one repeats.
    pub fn runs(self, host: &str, runs: Vec<RunScript>) -> Self {
        self.script(host, |s| s.runs.extend(runs));
        self
    }

    pub fn run(self, host: &str, run: RunScript) -> Self {
        self.runs(host, vec![run])
    }

    /// Refuse the next `times` connection attempts to `host`.
    pub fn refuse(self, host: &str, times: usize) -> Self {
        self.script(host, |s| {
            s.connects.extend(std::iter::repeat(ConnectStep::Refuse).take(times))
        });
        self
    }

    /// Reject authentication on the next `times` attempts to `host`.
    pub fn reject_auth(self, host: &str, times: usize) -> Self {
        self.script(host, |s| {
            s.connects
                .extend(std::iter::repeat(ConnectStep::RejectAuth).take(times))
        });
        self
    }

    /// Connection attempts made so far to `host`.
    pub fn connects(&self, host: &str) -> u32 {
        self.connects
            .lock()
            .unwrap()
            .get(host)
            .copied()
            .unwrap_or(0)
    }

    /// `(host, command)` for every command started, in start order.
    pub fn commands(&self) -> Vec<(String, String)> {
        self.commands.lock().unwrap().clone()
    }

    fn script(&self, host: &str, f: impl FnOnce(&mut HostScript)) {
        let mut scripts = self.scripts.lock().unwrap();
        f(scripts.entry(host.to_string()).or_default());
    }

    fn next_step(&self, host: &str) -> (ConnectStep, RunScript) {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(host.to_string()).or_default();
        let step = script.connects.pop_front().unwrap_or(ConnectStep::Accept);
        let run = if script.runs.len() > 1 {
            script.runs.pop_front().unwrap()
        } else {
            script
                .runs
                .front()
                .cloned()
                .unwrap_or_else(|| RunScript::ok(&[]))
        };
        (step, run)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(
        &self,
        target: &HostTarget,
        _credentials: &Credentials,
    ) -> Result<Box<dyn Connection>, FleetError> {
        *self
            .connects
            .lock()
            .unwrap()
            .entry(target.host.clone())
            .or_insert(0) += 1;

        let label = target.label();
        let (step, run) = self.next_step(&target.host);
        match step {
            ConnectStep::Refuse => Err(FleetError::transport(label, "connection refused")),
            ConnectStep::RejectAuth => Err(FleetError::auth(label, "permission denied")),
            ConnectStep::Accept => Ok(Box::new(ScriptedConnection {
                host: target.host.clone(),
                label,
                run: Some(run),
                commands: Arc::clone(&self.commands),
            })),
        }
    }
}

struct ScriptedConnection {
    host: String,
    label: String,
    run: Option<RunScript>,
    commands: CommandLog,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn open_session(&mut self) -> Result<Box<dyn RemoteSession>, FleetError> {
        let run = self
            .run
            .take()
            .ok_or_else(|| FleetError::transport(self.label.clone(), "session already used"))?;
        Ok(Box::new(ScriptedSession {
            host: self.host.clone(),
            label: self.label.clone(),
            run,
            commands: Arc::clone(&self.commands),
        }))
    }
}

struct ScriptedSession {
    host: String,
    label: String,
    run: RunScript,
    commands: CommandLog,
}

async fn send_lines(output: &mpsc::Sender<CommandOutput>, lines: &[String], stderr: bool) {
    for line in lines {
        let chunk = format!("{line}\n").into_bytes();
        let chunk = if stderr {
            CommandOutput::StdErr(chunk)
        } else {
            CommandOutput::StdOut(chunk)
        };
        let _ = output.send(chunk).await;
    }
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn run(
        &mut self,
        command: &str,
        output: mpsc::Sender<CommandOutput>,
    ) -> Result<ExitStatus, FleetError> {
        self.commands
            .lock()
            .unwrap()
            .push((self.host.clone(), command.to_string()));
        match &self.run {
            RunScript::Exit {
                stdout,
                stderr,
                status,
            } => {
                send_lines(&output, stdout, false).await;
                send_lines(&output, stderr, true).await;
                Ok(status.clone())
            }
            RunScript::Drop { stdout } => {
                send_lines(&output, stdout, false).await;
                Err(FleetError::transport(self.label.clone(), "connection reset"))
            }
            RunScript::Hang { stdout } => {
                send_lines(&output, stdout, false).await;
                std::future::pending().await
            }
            RunScript::Gate { gate, status } => {
                gate.notified().await;
                Ok(status.clone())
            }
        }
    }
}
