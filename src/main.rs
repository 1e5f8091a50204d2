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

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;

use sshfan::{
    cli::Cli,
    commands::run_fleet,
    config::FileConfig,
    utils::init_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Show usage when no arguments were provided
    if std::env::args_os().len() <= 1 {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config_path, explicit) = cli.config_path();
    let file_config = FileConfig::load(&config_path, explicit).await?;
    let config = cli.fleet_config(&file_config)?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping all sessions");
            signal_token.cancel();
        }
    });

    let exit_code = run_fleet(&config, cancel).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
