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

//! Run one command on a fleet of hosts over SSH.
//!
//! The pieces fit together in this order: [`hostlist`] turns a host
//! specification into entries, [`node::HostTarget`] parses each entry,
//! [`template`] renders the command per host, and [`executor`] runs one
//! session per host concurrently through the [`ssh::Transport`] seam while
//! all remote output flows through a shared [`output::OutputSink`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod hostlist;
pub mod node;
pub mod output;
pub mod ssh;
pub mod template;
pub mod utils;

pub use cli::Cli;
pub use config::FleetConfig;
pub use error::{ErrorKind, ExitStatus, FleetError};
pub use executor::{FleetExecutor, SessionExecutor};
pub use node::HostTarget;
