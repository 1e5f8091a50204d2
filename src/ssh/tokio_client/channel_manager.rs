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

//! SSH channel operations: opening sessions and streaming command output.

use russh::client::Msg;
use russh::Channel;
use tokio::sync::mpsc::Sender;

use super::connection::Client;
use crate::error::ExitStatus;
use crate::ssh::error::SshError;
use crate::ssh::transport::CommandOutput;

impl Client {
    /// Get a new SSH session channel.
    pub async fn get_channel(&self) -> Result<Channel<Msg>, SshError> {
        self.connection_handle
            .channel_open_session()
            .await
            .map_err(SshError::SshError)
    }
}

/// Execute `command` on `channel`, forwarding output chunks as they arrive.
///
/// Returns once the channel closes. A channel that closes without reporting
/// an exit status means the connection went away underneath the command.
pub async fn execute_streaming(
    channel: &mut Channel<Msg>,
    command: &str,
    sender: &Sender<CommandOutput>,
) -> Result<ExitStatus, SshError> {
    channel.exec(true, command).await?;

    let mut result: Option<ExitStatus> = None;

    while let Some(msg) = channel.wait().await {
        match msg {
            russh::ChannelMsg::Data { ref data } => {
                if sender.send(CommandOutput::StdOut(data.to_vec())).await.is_err() {
                    tracing::trace!("Output receiver dropped, discarding stdout chunk");
                }
            }
            russh::ChannelMsg::ExtendedData { ref data, ext } => {
                if ext == 1
                    && sender.send(CommandOutput::StdErr(data.to_vec())).await.is_err()
                {
                    tracing::trace!("Output receiver dropped, discarding stderr chunk");
                }
            }

            // The exit status may arrive before the last data message, so
            // keep reading until the channel closes.
            russh::ChannelMsg::ExitStatus { exit_status } => {
                result = Some(ExitStatus::Code(exit_status))
            }
            russh::ChannelMsg::ExitSignal { signal_name, .. } => {
                if result.is_none() {
                    result = Some(ExitStatus::Signal(format!("{signal_name:?}")));
                }
            }
            _ => {}
        }
    }

    result.ok_or(SshError::CommandDidntExit)
}
