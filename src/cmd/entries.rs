//! Entries command - list ledger entries, newest week first

use crate::cmd::{read_ledger, FilterArgs, NO_MATCHES};
use crate::core::{LedgerEntry, LedgerFilter, LedgerRecord};
use crate::utils::{format_money, write_csv};
use clap::Args;
use std::io;
use std::path::Path;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct EntriesCommand {
    #[command(flatten)]
    filter: FilterArgs,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,
}

impl EntriesCommand {
    pub fn exec(&self, ledger_path: &Path) -> anyhow::Result<()> {
        let ledger = read_ledger(ledger_path)?;
        if ledger.is_empty() {
            println!(
                "No entries in {} yet. Record a week with `gearing add`.",
                ledger_path.display()
            );
            return Ok(());
        }

        let filter = LedgerFilter::from(&self.filter);
        let entries = filter.apply(&ledger);
        log::debug!(
            "{} of {} ledger entries match",
            entries.len(),
            ledger.entries().len()
        );

        if entries.is_empty() {
            println!("{}", NO_MATCHES);
            return Ok(());
        }

        if self.csv {
            write_csv(
                entries.iter().map(|e| LedgerRecord::from(*e)),
                io::stdout(),
            )
        } else {
            let mut table = Table::new(entries.iter().map(|e| EntryRow::from(*e)));
            table
                .with(Style::rounded())
                .with(Modify::new(Columns::new(2..6)).with(Alignment::right()));
            println!("{}", table);

            println!();
            println!(
                "Showing {} of {} entries | Properties: {}",
                entries.len(),
                ledger.entries().len(),
                ledger.properties().join(", ")
            );
            if let Some((first, last)) = ledger.date_range() {
                println!("Ledger covers {} to {}", first, last);
            }
            Ok(())
        }
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Week Ending")]
    week_ending: String,
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Rent")]
    rent: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Interest")]
    interest: String,
    #[tabled(rename = "Net Cash Flow")]
    net_cash_flow: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

impl From<&LedgerEntry> for EntryRow {
    fn from(entry: &LedgerEntry) -> Self {
        EntryRow {
            week_ending: entry.week_ending.format("%Y-%m-%d").to_string(),
            property: entry.property.clone(),
            rent: format_money(entry.rent),
            expenses: format_money(entry.expenses),
            interest: format_money(entry.interest),
            net_cash_flow: format_money(entry.net_cash_flow),
            notes: entry.notes.clone(),
        }
    }
}
