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

//! Host specification resolution and host entry parsing.

use std::io::Write;

use serial_test::serial;
use sshfan::error::ErrorKind;
use sshfan::hostlist::{resolve_host_spec, HostlistError};
use sshfan::node::{HostDefaults, HostTarget};
use tempfile::NamedTempFile;

#[test]
fn test_inline_list_keeps_order_and_duplicates() {
    for n in [1usize, 2, 7, 64] {
        let hosts: Vec<String> = (0..n).map(|i| format!("host{}", i % 3)).collect();
        let resolved = resolve_host_spec(&hosts.join(",")).unwrap();
        assert_eq!(resolved, hosts);
    }
}

#[test]
fn test_hostfile_drops_blank_lines() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "web1\n\n  \nalice:secret@db1:2200\n\nweb1\n").unwrap();

    let spec = format!("@{}", file.path().display());
    let hosts = resolve_host_spec(&spec).unwrap();
    assert_eq!(hosts, vec!["web1", "alice:secret@db1:2200", "web1"]);
}

#[test]
fn test_resolution_is_idempotent() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "a\nb\n\nc").unwrap();
    let spec = format!("@{}", file.path().display());

    assert_eq!(resolve_host_spec(&spec).unwrap(), resolve_host_spec(&spec).unwrap());
    assert_eq!(
        resolve_host_spec("x,y,x").unwrap(),
        resolve_host_spec("x,y,x").unwrap()
    );
}

#[test]
fn test_missing_hostfile_is_config_error() {
    let err = resolve_host_spec("@/nonexistent/fleet/hosts.txt").unwrap_err();
    assert!(matches!(err, HostlistError::FileNotFound { .. }));

    let fleet: sshfan::FleetError = err.into();
    assert_eq!(fleet.kind(), ErrorKind::Config);
}

#[test]
#[serial]
fn test_hostfile_tilde_expansion() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("hosts.txt"), "web1\nweb2\n").unwrap();

    let saved = std::env::var("HOME").ok();
    std::env::set_var("HOME", home.path());
    let hosts = resolve_host_spec("@~/hosts.txt");
    match saved {
        Some(value) => std::env::set_var("HOME", value),
        None => std::env::remove_var("HOME"),
    }

    assert_eq!(hosts.unwrap(), vec!["web1", "web2"]);
}

#[test]
fn test_parse_entry_with_credentials() {
    let target = HostTarget::parse("alice:secret@db1:2200", &HostDefaults::default()).unwrap();
    assert_eq!(target.user, "alice");
    assert_eq!(target.password(), Some("secret"));
    assert_eq!(target.host, "db1");
    assert_eq!(target.port, 2200);
}

#[test]
fn test_parse_entry_with_defaults() {
    let defaults = HostDefaults::new("root");
    let target = HostTarget::parse("db2", &defaults).unwrap();
    assert_eq!(target.user, "root");
    assert_eq!(target.host, "db2");
    assert_eq!(target.port, 22);
    assert_eq!(target.password(), None);

    let defaults = HostDefaults::new("root").with_password(Some("fallback"));
    let target = HostTarget::parse("db2", &defaults).unwrap();
    assert_eq!(target.password(), Some("fallback"));
}

#[test]
fn test_malformed_entries_are_parse_errors() {
    for entry in ["", "web1:notaport", "web1:0", "alice@", "[::1"] {
        let err = HostTarget::parse(entry, &HostDefaults::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse, "entry {entry:?}");
    }
}
