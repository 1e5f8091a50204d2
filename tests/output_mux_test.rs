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

//! Concurrency tests for the output multiplexer.

mod common;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use common::{RunScript, ScriptedTransport};
use sshfan::executor::FleetExecutor;
use sshfan::output::{CaptureSink, LineSink, Origin, OutputSink, RawSink, SharedBuffer, StreamKind};
use sshfan::ssh::Credentials;
use sshfan::template::CommandTemplate;

const HOSTS: usize = 50;
const LINES: usize = 100;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_hosts_produce_complete_labeled_lines() {
    let sink = Arc::new(CaptureSink::new());

    let tasks: Vec<_> = (0..HOSTS)
        .map(|slot| {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                let origin = Origin::new(slot, format!("root@host{slot}:22"));
                for line in 0..LINES {
                    // Split every line over two writes to exercise buffering.
                    let text = format!("line {line} from host {slot}\n");
                    let (head, tail) = text.as_bytes().split_at(text.len() / 2);
                    sink.write(&origin, StreamKind::Stdout, head).unwrap();
                    tokio::task::yield_now().await;
                    sink.write(&origin, StreamKind::Stdout, tail).unwrap();
                }
                sink.finish(&origin, StreamKind::Stdout).unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let lines = sink.stdout_lines();
    assert_eq!(lines.len(), HOSTS * LINES);

    let mut next_line: HashMap<usize, usize> = HashMap::new();
    for line in &lines {
        let (label, text) = line.split_once("/stdout: ").expect("missing label");
        let slot: usize = label
            .trim_start_matches("root@host")
            .trim_end_matches(":22")
            .parse()
            .unwrap();
        let expected = next_line.entry(slot).or_insert(0);
        assert_eq!(text, format!("line {expected} from host {slot}"));
        *expected += 1;
    }
    assert!(next_line.values().all(|count| *count == LINES));
}

#[test]
fn test_raw_sink_writes_are_not_torn() {
    let stdout = SharedBuffer::new();
    let sink = Arc::new(RawSink::new(stdout.clone(), std::io::sink()));

    let handles: Vec<_> = (0..HOSTS)
        .map(|slot| {
            let sink = Arc::clone(&sink);
            std::thread::spawn(move || {
                let origin = Origin::new(slot, format!("h{slot}"));
                let mut chunk = Vec::new();
                for line in 0..LINES {
                    writeln!(chunk, "{slot}:{line}").unwrap();
                }
                sink.write(&origin, StreamKind::Stdout, &chunk).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Every host's block arrives in one piece.
    let lines = stdout.lines();
    assert_eq!(lines.len(), HOSTS * LINES);
    for block in lines.chunks(LINES) {
        let slot = block[0].split(':').next().unwrap();
        for (i, line) in block.iter().enumerate() {
            assert_eq!(line, &format!("{slot}:{i}"));
        }
    }
}

#[test]
fn test_line_sink_keeps_fragment_until_finish() {
    let stdout = SharedBuffer::new();
    let sink = LineSink::new(stdout.clone(), std::io::sink());
    let origin = Origin::new(0, "deploy@web1:22");

    sink.write(&origin, StreamKind::Stdout, b"complete\r\npartial").unwrap();
    assert_eq!(stdout.lines(), vec!["deploy@web1:22/stdout: complete"]);

    sink.finish(&origin, StreamKind::Stdout).unwrap();
    assert_eq!(
        stdout.lines(),
        vec![
            "deploy@web1:22/stdout: complete",
            "deploy@web1:22/stdout: partial"
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fleet_output_through_multiplexer() {
    let mut transport = ScriptedTransport::new();
    let mut hosts = Vec::new();
    for i in 0..HOSTS {
        let host = format!("node{i}");
        let lines: Vec<String> = (0..LINES).map(|l| format!("{host} {l}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        transport = transport.run(&host, RunScript::ok(&refs));
        hosts.push(host);
    }
    let sink = Arc::new(CaptureSink::new());

    let outcomes = FleetExecutor::new(
        Arc::new(transport),
        Arc::new(Credentials::new(Some("pw"), None)),
        sink.clone(),
        CommandTemplate::parse("cat /etc/hostname").unwrap(),
    )
    .run(&hosts)
    .await
    .unwrap();

    assert!(outcomes.iter().all(|o| o.is_success()));
    let lines = sink.stdout_lines();
    assert_eq!(lines.len(), HOSTS * LINES);
    for line in &lines {
        let (label, text) = line.split_once("/stdout: ").unwrap();
        let host = text.split(' ').next().unwrap();
        assert_eq!(label, format!("root@{host}:22"));
    }
}
