//! Compare command - per-property totals and annualised ROI

use crate::cmd::{read_ledger, FilterArgs, NO_MATCHES};
use crate::core::{compare_properties, LedgerFilter, PropertySummary};
use crate::utils::{format_amount, format_money, format_percent};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct CompareCommand {
    #[command(flatten)]
    filter: FilterArgs,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

impl CompareCommand {
    pub fn exec(&self, ledger_path: &Path) -> anyhow::Result<()> {
        let ledger = read_ledger(ledger_path)?;
        let entries = LedgerFilter::from(&self.filter).apply(&ledger);
        if entries.is_empty() {
            println!("{}", NO_MATCHES);
            return Ok(());
        }

        let summaries = compare_properties(&entries)?;
        if self.json {
            let output: Vec<_> = summaries.iter().map(CompareOutput::from).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let mut table = Table::new(summaries.iter().map(CompareRow::from));
        table
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()));
        println!("{}", table);
        Ok(())
    }
}

#[derive(Tabled)]
struct CompareRow {
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
    #[tabled(rename = "ROI (%)")]
    roi: String,
}

impl From<&PropertySummary> for CompareRow {
    fn from(summary: &PropertySummary) -> Self {
        CompareRow {
            property: summary.property.clone(),
            rent: format_money(summary.rent),
            expenses: format_money(summary.expenses),
            interest: format_money(summary.interest),
            net_cash_flow: format_money(summary.net_cash_flow),
            roi: format_percent(summary.roi_percent),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompareOutput {
    property: String,
    rent: String,
    expenses: String,
    interest: String,
    net_cash_flow: String,
    roi_percent: Option<String>,
}

impl From<&PropertySummary> for CompareOutput {
    fn from(summary: &PropertySummary) -> Self {
        CompareOutput {
            property: summary.property.clone(),
            rent: format_amount(summary.rent),
            expenses: format_amount(summary.expenses),
            interest: format_amount(summary.interest),
            net_cash_flow: format_amount(summary.net_cash_flow),
            roi_percent: summary.roi_percent.map(format_amount),
        }
    }
}
