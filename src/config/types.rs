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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::node::HostDefaults;
use crate::output::OutputMode;

/// Default command when none is given.
pub const DEFAULT_COMMAND: &str = "uname -a";

/// Default remote user when neither the CLI nor the config file names one.
pub const DEFAULT_USER: &str = "root";

/// Default wait between reconnect attempts.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Optional defaults file (`~/.config/sshfan/config.yaml`).
///
/// ```yaml
/// user: deploy
/// key: ~/.ssh/fleet_ed25519
/// port: 2200
/// reconnect_backoff_ms: 2000
/// connect_timeout_secs: 10
/// strict_host_key_checking: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub user: Option<String>,
    pub key: Option<String>,
    pub port: Option<u16>,
    pub reconnect_backoff_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub strict_host_key_checking: Option<bool>,
}

/// What to run on every host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Run the command template once per host and wait for all of them.
    Exec,
    /// Follow a remote file with `tail -f` until cancelled.
    Tail { file: String, sudo: bool },
}

/// How a malformed host entry is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Only the offending host is skipped.
    #[default]
    Isolate,
    /// The whole run aborts before any connection is attempted.
    FailFast,
}

/// Immutable configuration for one fleet run, built once at startup.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub host_spec: String,
    pub defaults: HostDefaults,
    pub key_path: Option<PathBuf>,
    pub command: String,
    pub mode: RunMode,
    pub reconnect: bool,
    pub reconnect_backoff: Duration,
    pub output: OutputMode,
    pub parse_policy: ParsePolicy,
    pub connect_timeout: Option<Duration>,
    pub strict_host_key_checking: bool,
}

impl FleetConfig {
    /// The command template that is actually run, before per-host rendering.
    pub fn command_template(&self) -> String {
        match &self.mode {
            RunMode::Exec => self.command.clone(),
            RunMode::Tail { file, sudo } => {
                let cmd = format!("tail -f {file}");
                if *sudo {
                    format!("sudo {cmd}")
                } else {
                    cmd
                }
            }
        }
    }

    pub fn is_tail(&self) -> bool {
        matches!(self.mode, RunMode::Tail { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: RunMode) -> FleetConfig {
        FleetConfig {
            host_spec: "web1".to_string(),
            defaults: HostDefaults::default(),
            key_path: None,
            command: DEFAULT_COMMAND.to_string(),
            mode,
            reconnect: false,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            output: OutputMode::Raw,
            parse_policy: ParsePolicy::Isolate,
            connect_timeout: None,
            strict_host_key_checking: false,
        }
    }

    #[test]
    fn test_command_template_exec() {
        assert_eq!(config(RunMode::Exec).command_template(), "uname -a");
    }

    #[test]
    fn test_command_template_tail() {
        let plain = config(RunMode::Tail {
            file: "/var/log/syslog".to_string(),
            sudo: false,
        });
        assert_eq!(plain.command_template(), "tail -f /var/log/syslog");
        assert!(plain.is_tail());

        let sudo = config(RunMode::Tail {
            file: "/var/log/auth.log".to_string(),
            sudo: true,
        });
        assert_eq!(sudo.command_template(), "sudo tail -f /var/log/auth.log");
    }

    #[test]
    fn test_file_config_yaml() {
        let yaml = "user: deploy\nport: 2200\nreconnect_backoff_ms: 250\n";
        let parsed: FileConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.user.as_deref(), Some("deploy"));
        assert_eq!(parsed.port, Some(2200));
        assert_eq!(parsed.reconnect_backoff_ms, Some(250));
        assert_eq!(parsed.key, None);

        assert!(serde_yaml::from_str::<FileConfig>("colour: red\n").is_err());
    }
}
