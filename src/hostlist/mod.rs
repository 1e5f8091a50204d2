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

//! Host specification resolution
//!
//! A host specification is either an inline comma-separated list
//! (`web1,alice@db1:2200`) or a reference to a file holding one host per
//! line (`@~/hosts.txt`). Resolution only produces raw entries; each entry
//! is parsed into a [`HostTarget`](crate::node::HostTarget) independently so
//! that one malformed line cannot take the rest of the fleet down.
//!
//! # Examples
//!
//! ```rust
//! use sshfan::hostlist::resolve_host_spec;
//!
//! let hosts = resolve_host_spec("web1,web2,web1").unwrap();
//! assert_eq!(hosts, vec!["web1", "web2", "web1"]);
//! ```

mod error;
mod parser;

use std::path::Path;

pub use error::HostlistError;
pub use parser::{parse_hostfile, parse_inline};

use crate::config::expand_tilde;

/// Resolve `spec` into an ordered list of raw host entries.
pub fn resolve_host_spec(spec: &str) -> Result<Vec<String>, HostlistError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(HostlistError::Empty);
    }

    match spec.strip_prefix('@') {
        Some(path) => {
            let path = path.trim();
            if path.is_empty() {
                return Err(HostlistError::Empty);
            }
            let path = expand_tilde(Path::new(path));
            tracing::debug!("Reading hosts from {}", path.display());
            parse_hostfile(&path)
        }
        None => Ok(parse_inline(spec)),
    }
}
