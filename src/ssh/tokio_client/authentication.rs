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

//! Authentication against an established connection.

use russh::client::{Handle, Handler};

use crate::ssh::credentials::AuthMethod;
use crate::ssh::error::SshError;

/// Try each method in order until the server accepts one.
pub(super) async fn authenticate<H: Handler>(
    handle: &mut Handle<H>,
    username: &str,
    methods: &[AuthMethod],
) -> Result<(), SshError> {
    if methods.is_empty() {
        let result = handle.authenticate_none(username).await?;
        if result.success() {
            return Ok(());
        }
        return Err(SshError::AuthRejected {
            user: username.to_string(),
            tried: "none".to_string(),
        });
    }

    for method in methods {
        let accepted = match method {
            AuthMethod::Password(password) => handle
                .authenticate_password(username, password.as_str())
                .await?
                .success(),
            AuthMethod::PrivateKey(key) => {
                let hash_alg = handle.best_supported_rsa_hash().await?.flatten();
                handle
                    .authenticate_publickey(
                        username,
                        russh::keys::PrivateKeyWithHashAlg::new(key.clone(), hash_alg),
                    )
                    .await?
                    .success()
            }
        };

        if accepted {
            tracing::trace!("Authenticated {} with {}", username, method.name());
            return Ok(());
        }
        tracing::debug!("Server rejected {} for {}", method.name(), username);
    }

    Err(SshError::AuthRejected {
        user: username.to_string(),
        tried: methods
            .iter()
            .map(AuthMethod::name)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
