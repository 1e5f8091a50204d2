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

//! Authentication material shared by every session of a run.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::config::expand_tilde;
use crate::error::FleetError;
use crate::node::HostTarget;

/// One way of proving identity to the remote side.
#[derive(Clone)]
pub enum AuthMethod {
    Password(Zeroizing<String>),
    PrivateKey(Arc<russh::keys::PrivateKey>),
}

impl AuthMethod {
    pub fn with_password(password: &str) -> Self {
        Self::Password(Zeroizing::new(password.to_string()))
    }

    /// SSH protocol name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethod::Password(_) => "password",
            AuthMethod::PrivateKey(_) => "publickey",
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password(_) => f.write_str("Password(***)"),
            AuthMethod::PrivateKey(key) => {
                write!(f, "PrivateKey({})", key.algorithm().as_str())
            }
        }
    }
}

/// Ordered authentication methods: password first, then key-based.
///
/// Built once at startup and shared read-only by all sessions.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    methods: Vec<AuthMethod>,
}

impl Credentials {
    pub fn new(password: Option<&str>, key: Option<AuthMethod>) -> Self {
        let mut methods = Vec::new();
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            methods.push(AuthMethod::with_password(password));
        }
        methods.extend(key);
        Self { methods }
    }

    pub fn methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Methods to try against `target`, in order.
    ///
    /// A password carried by the target replaces the run-wide one.
    pub fn for_target(&self, target: &HostTarget) -> Vec<AuthMethod> {
        let keys = self
            .methods
            .iter()
            .filter(|m| !matches!(m, AuthMethod::Password(_)))
            .cloned();

        match target.password() {
            Some(password) => std::iter::once(AuthMethod::with_password(password))
                .chain(keys)
                .collect(),
            None => self.methods.clone(),
        }
    }
}

/// Load an unencrypted (or passphrase-unlocked) private key from disk.
pub fn load_private_key(path: &Path, passphrase: Option<&str>) -> Result<AuthMethod, FleetError> {
    let path = expand_tilde(path);
    tracing::debug!("Loading SSH key: {}", path.display());

    if !path.exists() {
        return Err(FleetError::Config(format!(
            "private key not found: {}",
            path.display()
        )));
    }

    let key = russh::keys::load_secret_key(&path, passphrase).map_err(|e| {
        FleetError::Config(format!(
            "failed to load private key {}: {e}",
            path.display()
        ))
    })?;

    Ok(AuthMethod::PrivateKey(Arc::new(key)))
}
