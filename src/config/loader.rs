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

//! Configuration loading.

use std::path::{Path, PathBuf};
use tokio::fs;

use super::types::FileConfig;
use super::utils::expand_tilde;
use crate::error::FleetError;

/// Default location of the defaults file.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/sshfan/config.yaml";

impl FileConfig {
    /// Load the defaults file.
    ///
    /// A missing file is only an error when the user asked for it explicitly.
    pub async fn load(path: &Path, explicit: bool) -> Result<Self, FleetError> {
        let expanded_path = expand_tilde(path);

        if !expanded_path.exists() {
            if explicit {
                return Err(FleetError::Config(format!(
                    "config file not found: {}",
                    expanded_path.display()
                )));
            }
            tracing::debug!(
                "Config file not found at {:?}, using defaults",
                expanded_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&expanded_path).await.map_err(|e| {
            FleetError::Config(format!(
                "failed to read configuration file at {}: {e}",
                expanded_path.display()
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            FleetError::Config(format!(
                "failed to parse YAML configuration file at {}: {e}",
                expanded_path.display()
            ))
        })
    }

    pub fn default_path() -> PathBuf {
        expand_tilde(Path::new(DEFAULT_CONFIG_PATH))
    }
}
