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

//! Parsing of inline host lists and host files

use std::path::Path;

use super::error::HostlistError;

/// Maximum size of a host file (1 MiB)
const MAX_HOSTFILE_SIZE: u64 = 1024 * 1024;

/// Split an inline comma-separated list.
///
/// Entries are trimmed but empty entries are kept, so `a,,b` yields three
/// entries and the empty one fails later as a malformed host of its own.
pub fn parse_inline(spec: &str) -> Vec<String> {
    spec.split(',').map(|host| host.trim().to_string()).collect()
}

/// Read one host per line from `path`.
///
/// Blank lines and `#` comment lines are dropped; order and duplicates are
/// preserved.
pub fn parse_hostfile(path: &Path) -> Result<Vec<String>, HostlistError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HostlistError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            HostlistError::FileReadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if metadata.len() > MAX_HOSTFILE_SIZE {
        return Err(HostlistError::FileReadError {
            path: path.display().to_string(),
            reason: format!(
                "file size {} bytes exceeds maximum allowed size of {} bytes",
                metadata.len(),
                MAX_HOSTFILE_SIZE
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| HostlistError::FileReadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_inline_keeps_duplicates_and_order() {
        assert_eq!(
            parse_inline("web1, web2,web1"),
            vec!["web1", "web2", "web1"]
        );
    }

    #[test]
    fn test_parse_inline_keeps_empty_entries() {
        assert_eq!(parse_inline("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_hostfile_drops_blank_and_comment_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "host1\n\n# rack 2\nhost2\r\n   \nhost1\n").unwrap();

        let hosts = parse_hostfile(file.path()).unwrap();
        assert_eq!(hosts, vec!["host1", "host2", "host1"]);
    }

    #[test]
    fn test_parse_hostfile_missing() {
        let err = parse_hostfile(Path::new("/nonexistent/sshfan/hosts")).unwrap_err();
        assert!(matches!(err, HostlistError::FileNotFound { .. }));
    }
}
