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

pub mod credentials;
pub mod error;
pub mod russh_transport;
pub mod tokio_client;
pub mod transport;

pub use credentials::{load_private_key, AuthMethod, Credentials};
pub use error::SshError;
pub use russh_transport::RusshTransport;
pub use tokio_client::ServerCheckMethod;
pub use transport::{CommandOutput, Connection, RemoteSession, Transport};
