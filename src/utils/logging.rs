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

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count, used when `RUST_LOG` is not set.
fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "sshfan=warn",
        1 => "sshfan=info",
        // -vv: Include russh debug logs for SSH troubleshooting
        2 => "sshfan=debug,russh=debug",
        _ => "sshfan=trace,russh=trace",
    }
}

/// Create an environment filter based on verbosity level
pub fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(verbosity_directive(verbosity))
    }
}

/// Initialize logging to stderr.
///
/// Remote output owns stdout, so diagnostics never end up mixed into it.
pub fn init_logging(verbosity: u8) {
    let filter = create_env_filter(verbosity);

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_verbosity_directive() {
        assert_eq!(verbosity_directive(0), "sshfan=warn");
        assert_eq!(verbosity_directive(1), "sshfan=info");
        assert_eq!(verbosity_directive(2), "sshfan=debug,russh=debug");
        assert_eq!(verbosity_directive(7), "sshfan=trace,russh=trace");
    }

    #[test]
    #[serial]
    fn test_rust_log_wins() {
        let saved = std::env::var("RUST_LOG").ok();
        std::env::set_var("RUST_LOG", "sshfan=trace");

        let filter = create_env_filter(0);
        assert_eq!(filter.to_string(), "sshfan=trace");

        match saved {
            Some(value) => std::env::set_var("RUST_LOG", value),
            None => std::env::remove_var("RUST_LOG"),
        }
    }
}
