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

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    expand_tilde, FileConfig, FleetConfig, ParsePolicy, RunMode, DEFAULT_COMMAND,
    DEFAULT_RECONNECT_BACKOFF, DEFAULT_USER,
};
use crate::error::FleetError;
use crate::node::{HostDefaults, DEFAULT_SSH_PORT};
use crate::output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    name = "sshfan",
    version,
    about = "Run one command on many hosts over SSH and stream their output",
    after_help = "EXAMPLES:\n  Run on two hosts:          sshfan -H web1,web2 -i ~/.ssh/id_ed25519 -c uptime\n  Hosts from a file:         sshfan -H @hosts.txt -i ~/.ssh/id_ed25519 -c 'hostname -f'\n  Per-host command:          sshfan -H web1,web2 --pass secret -c 'echo {{host}}'\n  Follow a log everywhere:   sshfan -H @hosts.txt -i ~/.ssh/id_ed25519 tail --sudo /var/log/syslog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        short = 'H',
        long,
        global = true,
        help = "Comma-separated hosts in [user[:pass]@]host[:port] format, or @file with one host per line"
    )]
    pub hosts: Option<String>,

    #[arg(
        short = 'i',
        long,
        global = true,
        help = "SSH private key file path (~ is expanded)"
    )]
    pub key: Option<PathBuf>,

    #[arg(
        short = 'u',
        long,
        global = true,
        help = "Default username for hosts without one [default: root]"
    )]
    pub user: Option<String>,

    #[arg(long, global = true, help = "Default password for hosts without one")]
    pub pass: Option<String>,

    #[arg(
        short = 'c',
        long,
        default_value = DEFAULT_COMMAND,
        help = "Command to run; {{host}}, {{user}} and {{port}} are replaced per host"
    )]
    pub cmd: String,

    #[arg(
        short = 'v',
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    #[arg(
        long,
        help = "Reconnect after connection or authentication failures until the command completes"
    )]
    pub reconnect: bool,

    #[arg(
        long,
        global = true,
        value_name = "MS",
        help = "Wait between reconnect attempts in milliseconds [default: 1000]"
    )]
    pub backoff_ms: Option<u64>,

    #[arg(long, help = "Prefix every output line with user@host:port/stream")]
    pub prefix: bool,

    #[arg(
        long,
        global = true,
        help = "Abort the whole run if any host entry is malformed"
    )]
    pub fail_fast: bool,

    #[arg(
        long,
        global = true,
        value_name = "SECS",
        help = "Give up on a connection attempt after this many seconds"
    )]
    pub connect_timeout: Option<u64>,

    #[arg(
        long,
        global = true,
        help = "Verify host keys against ~/.ssh/known_hosts"
    )]
    pub strict_host_key_checking: bool,

    #[arg(
        long,
        global = true,
        help = "Defaults file path [default: ~/.config/sshfan/config.yaml]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Follow a remote file on every host with tail -f")]
    Tail {
        #[arg(help = "Remote file to follow")]
        file: String,

        #[arg(long, help = "Run tail through sudo")]
        sudo: bool,

        #[arg(long, help = "Stop following a host once its connection fails")]
        no_reconnect: bool,
    },
}

impl Cli {
    /// Defaults file to load and whether it was requested explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (FileConfig::default_path(), false),
        }
    }

    /// Merge the command line over the defaults file.
    pub fn fleet_config(&self, file: &FileConfig) -> Result<FleetConfig, FleetError> {
        let host_spec = self
            .hosts
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| FleetError::Config("no hosts given (use -H/--hosts)".to_string()))?;

        let user = self
            .user
            .clone()
            .or_else(|| file.user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let defaults = HostDefaults::new(user)
            .with_password(self.pass.as_deref())
            .with_port(file.port.unwrap_or(DEFAULT_SSH_PORT));

        let key_path = self
            .key
            .clone()
            .or_else(|| file.key.as_ref().map(PathBuf::from))
            .map(|p| expand_tilde(&p));
        if key_path.is_none() && defaults.password.is_none() {
            return Err(FleetError::Config(
                "no private key given (use -i/--key or --pass)".to_string(),
            ));
        }

        let (mode, reconnect, output) = match &self.command {
            Some(Commands::Tail {
                file,
                sudo,
                no_reconnect,
            }) => (
                RunMode::Tail {
                    file: file.clone(),
                    sudo: *sudo,
                },
                !no_reconnect,
                OutputMode::Labeled,
            ),
            None => {
                let output = if self.prefix {
                    OutputMode::Labeled
                } else {
                    OutputMode::Raw
                };
                (RunMode::Exec, self.reconnect, output)
            }
        };

        let reconnect_backoff = self
            .backoff_ms
            .or(file.reconnect_backoff_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RECONNECT_BACKOFF);

        let connect_timeout = self
            .connect_timeout
            .or(file.connect_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(FleetConfig {
            host_spec,
            defaults,
            key_path,
            command: self.cmd.clone(),
            mode,
            reconnect,
            reconnect_backoff,
            output,
            parse_policy: if self.fail_fast {
                ParsePolicy::FailFast
            } else {
                ParsePolicy::Isolate
            },
            connect_timeout,
            strict_host_key_checking: self.strict_host_key_checking
                || file.strict_host_key_checking.unwrap_or(false),
        })
    }
}
