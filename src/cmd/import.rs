//! Import command - merge another ledger file into the current one

use crate::cmd::read_ledger;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ImportCommand {
    /// Ledger CSV to merge in
    file: PathBuf,
}

impl ImportCommand {
    pub fn exec(&self, ledger_path: &Path) -> anyhow::Result<()> {
        if !self.file.exists() {
            anyhow::bail!("Import file {} not found", self.file.display());
        }
        let incoming = read_ledger(&self.file)?;
        let mut ledger = read_ledger(ledger_path)?;

        let added = ledger.merge(&incoming);
        let skipped = incoming.entries().len() - added;
        log::info!(
            "Merged {} entries from {}, {} already present",
            added,
            self.file.display(),
            skipped
        );

        if added > 0 {
            ledger
                .save(ledger_path)
                .with_context(|| format!("Failed to save ledger {}", ledger_path.display()))?;
        }

        println!(
            "Imported {} entries ({} duplicates skipped)",
            added, skipped
        );
        Ok(())
    }
}
