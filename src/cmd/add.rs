//! Add command - record one week of rent and outgoings for a property

use crate::cmd::read_ledger;
use crate::core::LedgerEntry;
use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use std::path::Path;

#[derive(Args, Debug)]
pub struct AddCommand {
    /// Week ending date, YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    week_ending: Option<NaiveDate>,

    /// Property name
    #[arg(short, long)]
    property: String,

    /// Rent received for the week
    #[arg(short, long)]
    rent: Decimal,

    /// Expenses paid for the week
    #[arg(short, long, default_value_t = Decimal::ZERO)]
    expenses: Decimal,

    /// Loan interest paid for the week
    #[arg(short, long, default_value_t = Decimal::ZERO)]
    interest: Decimal,

    /// Free text notes
    #[arg(short, long, default_value = "")]
    notes: String,
}

impl AddCommand {
    pub fn exec(&self, ledger_path: &Path) -> anyhow::Result<()> {
        let week_ending = self
            .week_ending
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let entry = LedgerEntry::new(
            week_ending,
            &self.property,
            self.rent,
            self.expenses,
            self.interest,
            &self.notes,
        )?;

        let mut ledger = read_ledger(ledger_path)?;
        log::debug!(
            "Adding {} for week ending {} to ledger of {} entries",
            entry.property,
            entry.week_ending,
            ledger.entries().len()
        );
        ledger.append(entry);
        ledger
            .save(ledger_path)
            .with_context(|| format!("Failed to save ledger {}", ledger_path.display()))?;

        println!("Weekly log added and saved!");
        Ok(())
    }
}
