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

//! Connection targets.
//!
//! A raw host entry follows URL-like userinfo syntax:
//! `[ssh://][user[:password]@]host[:port]`. Missing parts fall back to the
//! run-wide [`HostDefaults`].

use std::fmt;

use percent_encoding::percent_decode_str;
use zeroize::Zeroizing;

use crate::error::FleetError;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Network used to reach a target. The tool only speaks SSH over TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    #[default]
    Tcp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Tcp => f.write_str("tcp"),
        }
    }
}

/// Values applied to host entries that leave a part out.
#[derive(Clone)]
pub struct HostDefaults {
    pub user: String,
    pub password: Option<Zeroizing<String>>,
    pub port: u16,
}

impl HostDefaults {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: None,
            port: DEFAULT_SSH_PORT,
        }
    }

    pub fn with_password(mut self, password: Option<&str>) -> Self {
        self.password = password
            .filter(|p| !p.is_empty())
            .map(|p| Zeroizing::new(p.to_string()));
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl Default for HostDefaults {
    fn default() -> Self {
        Self::new("root")
    }
}

impl fmt::Debug for HostDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostDefaults")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("port", &self.port)
            .finish()
    }
}

/// A single resolved remote endpoint. Immutable once parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<Zeroizing<String>>,
    pub transport: TransportKind,
}

impl HostTarget {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: None,
            transport: TransportKind::Tcp,
        }
    }

    pub fn parse(raw: &str, defaults: &HostDefaults) -> Result<Self, FleetError> {
        let entry = raw.trim();
        let entry = entry.strip_prefix("ssh://").unwrap_or(entry);
        let entry = entry.strip_suffix('/').unwrap_or(entry);
        if entry.is_empty() {
            return Err(FleetError::parse(raw, "empty host entry"));
        }

        let (userinfo, host_part) = match entry.rfind('@') {
            Some(at_pos) => (Some(&entry[..at_pos]), &entry[at_pos + 1..]),
            None => (None, entry),
        };

        let (user, password) = match userinfo {
            Some(info) => {
                let (user, password) = match info.split_once(':') {
                    Some((user, password)) => (user, Some(password)),
                    None => (info, None),
                };
                let user = percent_decode(user).map_err(|reason| FleetError::parse(raw, reason))?;
                let password = password
                    .map(percent_decode)
                    .transpose()
                    .map_err(|reason| FleetError::parse(raw, reason))?;
                (Some(user), password)
            }
            None => (None, None),
        };

        let (host, port) = split_host_port(host_part, defaults.port)
            .map_err(|reason| FleetError::parse(raw, reason))?;

        let user = user
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| defaults.user.clone());
        let password = match password.filter(|p| !p.is_empty()) {
            Some(password) => Some(Zeroizing::new(password)),
            None => defaults.password.clone(),
        };

        Ok(HostTarget {
            host,
            port,
            user,
            password,
            transport: TransportKind::Tcp,
        })
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Label used to tag output and log lines: `user@host:port`.
    pub fn label(&self) -> String {
        format!("{}@{}", self.user, self.address())
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.address())
    }
}

impl fmt::Debug for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("transport", &self.transport)
            .finish()
    }
}

fn split_host_port(host_part: &str, default_port: u16) -> Result<(String, u16), String> {
    let (host, port) = if let Some(rest) = host_part.strip_prefix('[') {
        let close = rest
            .find(']')
            .ok_or_else(|| "unclosed '[' in IPv6 address".to_string())?;
        let host = &rest[..close];
        let tail = &rest[close + 1..];
        let port = match tail.strip_prefix(':') {
            Some(port) => Some(port),
            None if tail.is_empty() => None,
            None => return Err(format!("unexpected characters after address: '{tail}'")),
        };
        (host, port)
    } else if host_part.matches(':').count() > 1 {
        // Bare IPv6 literal, no room for a port.
        (host_part, None)
    } else {
        match host_part.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_part, None),
        }
    };

    if host.is_empty() {
        return Err("missing host name".to_string());
    }
    if host.chars().any(|c| c.is_whitespace() || c == '/' || c == '@') {
        return Err(format!("invalid character in host name '{host}'"));
    }

    let port = match port {
        Some(port) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid port number '{port}'"))?;
            if port == 0 {
                return Err("port must be between 1 and 65535".to_string());
            }
            port
        }
        None => default_port,
    };

    Ok((host.to_string(), port))
}

/// Decode `%XX` escapes in the userinfo part. A `%` that does not start a
/// two-hex-digit escape is kept as a literal character.
fn percent_decode(input: &str) -> Result<String, String> {
    percent_decode_str(input)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| format!("escape sequence is not UTF-8 in '{input}'"))
}
