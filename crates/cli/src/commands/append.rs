// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj append` - write records to the local journal

use super::Repo;
use crate::error::CliError;
use anyhow::Result;
use clap::{Args, Subcommand};
use gj_adapters::{FsObjectStore, FsRefStore, ObjectStore, RefStore};
use gj_core::refname::validate_ref_name;
use gj_core::{ObjectId, WIRE_VERSION};
use gj_storage::JournalContext;
use std::io::BufRead;

#[derive(Args)]
pub struct AppendArgs {
    #[command(subcommand)]
    pub command: AppendCommand,
}

#[derive(Subcommand)]
pub enum AppendCommand {
    /// Journal a ref tip; the null id journals a deletion
    Ref { name: String, tip: ObjectId },
    /// Journal an installed pack and its index
    Pack { pack: ObjectId },
    /// Journal the pack holding `tip` unless already journaled, then the ref
    Auto { name: String, tip: ObjectId },
    /// `auto` for every `<name> <hash>` line on stdin
    Tips,
    /// Announce this client's wire version to readers
    Upgrade,
}

struct Appender<'a> {
    ctx: JournalContext,
    objects: &'a FsObjectStore,
    refs: &'a FsRefStore,
}

impl Appender<'_> {
    fn append_ref(&mut self, name: &str, tip: ObjectId) -> Result<()> {
        validate_ref_name(name)?;
        if tip.is_null() && self.refs.read_ref(name)?.is_none() {
            return Err(CliError::new(format!(
                "cannot journal the deletion of {}: no such ref",
                name
            ))
            .into());
        }
        let extent = self.ctx.append_ref(name, tip)?;
        tracing::info!(%extent, name, %tip, "ref journaled");
        Ok(())
    }

    /// `false` when the pack log already lists it
    fn append_pack(&mut self, pack: ObjectId) -> Result<bool> {
        if self.ctx.is_pack_journaled(&pack)? {
            tracing::warn!(%pack, "pack already journaled, skipping");
            return Ok(false);
        }
        let pack_bytes = self.objects.read_pack(&pack)?;
        let index_bytes = self.objects.read_index(&pack)?;
        let [pack_extent, index_extent] = self.ctx.append_pack(pack, &pack_bytes, &index_bytes)?;
        tracing::info!(%pack_extent, %index_extent, %pack, "pack journaled");
        Ok(true)
    }

    fn append_auto(&mut self, name: &str, tip: ObjectId) -> Result<()> {
        if !tip.is_null() {
            match self.objects.find_pack_containing(&tip)? {
                Some(pack) => {
                    self.append_pack(pack)?;
                }
                None => {
                    return Err(CliError::new(format!("object {} is not in any pack", tip))
                        .with_suggestion("Repack so the tip is packed, then append again")
                        .into())
                }
            }
        }
        self.append_ref(name, tip)
    }
}

fn parse_tip_line(line: &str) -> Result<(String, ObjectId)> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(name), Some(hex), None) => Ok((name.to_string(), hex.parse()?)),
        _ => Err(CliError::new(format!("malformed tip line: {:?}", line))
            .with_context("expected `<ref name> <hash>`")
            .into()),
    }
}

pub fn run(repo: &Repo, args: AppendArgs) -> Result<i32> {
    let objects = FsObjectStore::new(repo.layout.pack_dir());
    let refs = FsRefStore::new(repo.layout.git_dir());
    let ctx = JournalContext::open(repo.layout.journal_dir(), repo.writer_options())?;
    let mut appender = Appender {
        ctx,
        objects: &objects,
        refs: &refs,
    };

    match args.command {
        AppendCommand::Ref { name, tip } => appender.append_ref(&name, tip)?,
        AppendCommand::Pack { pack } => {
            appender.append_pack(pack)?;
        }
        AppendCommand::Auto { name, tip } => appender.append_auto(&name, tip)?,
        AppendCommand::Tips => {
            for line in std::io::stdin().lock().lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let (name, tip) = parse_tip_line(&line)?;
                appender.append_auto(&name, tip)?;
            }
        }
        AppendCommand::Upgrade => {
            let extent = appender.ctx.append_upgrade(WIRE_VERSION)?;
            tracing::info!(%extent, version = WIRE_VERSION, "upgrade journaled");
        }
    }

    let summary = appender.ctx.close()?;
    tracing::info!(
        serial = summary.serial,
        extents = summary.extents_flushed,
        "journal closed"
    );
    Ok(0)
}

#[cfg(test)]
#[path = "append_tests.rs"]
mod tests;
