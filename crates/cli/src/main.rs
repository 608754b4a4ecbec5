// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gj - journal-based replication of git packs and refs

mod commands;
mod completions;
mod error;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{append, control, dump, epilogue, extents_dump, fetch, identity, verify, Repo};
use std::path::PathBuf;

use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "gj",
    version,
    about = "Journal-based replication of git packs and refs"
)]
struct Cli {
    /// Repository git directory
    #[arg(long, global = true, env = "GIT_DIR", default_value = ".git")]
    git_dir: PathBuf,

    /// More log output (-v info, -vv debug); GJ_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append records to the local journal
    Append(append::AppendArgs),
    /// Fetch a remote's journal and replay it
    Fetch(fetch::FetchArgs),
    /// List the object ids held by a segment's pack indices
    Dump(dump::DumpArgs),
    /// Print every raw extent record
    ExtentsDump(extents_dump::ExtentsDumpArgs),
    /// Check a segment against its extents
    Verify(verify::VerifyArgs),
    /// Inspect or bump the journal serial, manage the pack log
    Control(control::ControlArgs),
    /// Print a remote's replication position
    Identity(identity::IdentityArgs),
    /// Run a saved epilogue plan
    #[command(hide = true)]
    Epilogue(epilogue::EpilogueArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<CliError>() {
                Some(cli_error) => eprintln!("fatal: {}", cli_error),
                None => eprintln!("fatal: {:#}", e),
            }
            128
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let Cli {
        git_dir,
        verbose,
        command,
    } = cli;
    let repo = || -> Result<Repo> {
        logging::init_stderr(verbose);
        Repo::open(&git_dir)
    };

    match command {
        Commands::Append(args) => append::run(&repo()?, args),
        Commands::Fetch(args) => fetch::run(&repo()?, args).await,
        Commands::Dump(args) => dump::run(&repo()?, args),
        Commands::ExtentsDump(args) => extents_dump::run(&repo()?, args),
        Commands::Verify(args) => verify::run(&repo()?, args, verbose > 0),
        Commands::Control(args) => control::run(&repo()?, args),
        Commands::Identity(args) => identity::run(&repo()?, args, verbose > 0),
        Commands::Epilogue(args) => {
            let _guard = logging::init_file(&git_dir)?;
            epilogue::run(args).await
        }
        Commands::Completions(args) => {
            completions::generate_completions::<Cli>(args.shell);
            Ok(0)
        }
    }
}
