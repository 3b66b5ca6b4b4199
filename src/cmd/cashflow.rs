//! Cashflow command - weekly net cash flow across the selected properties

use crate::cmd::{read_ledger, FilterArgs, NO_MATCHES};
use crate::core::{cash_flow_over_time, CashFlowPoint, LedgerFilter};
use crate::utils::{format_amount, format_money};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct CashflowCommand {
    #[command(flatten)]
    filter: FilterArgs,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

impl CashflowCommand {
    pub fn exec(&self, ledger_path: &Path) -> anyhow::Result<()> {
        let ledger = read_ledger(ledger_path)?;
        let entries = LedgerFilter::from(&self.filter).apply(&ledger);
        if entries.is_empty() {
            println!("{}", NO_MATCHES);
            return Ok(());
        }

        let rows = with_running_total(&cash_flow_over_time(&entries)?)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        let mut table = Table::new(rows.iter().map(|row| CashflowRow {
            week_ending: row.week_ending.clone(),
            net_cash_flow: format_money(row.net),
            cumulative: format_money(row.cumulative_net),
        }));
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()));
        println!("{}", table);

        if let Some(last) = rows.last() {
            println!();
            println!(
                "Weeks: {} | Total net cash flow: {}",
                rows.len(),
                format_money(last.cumulative_net)
            );
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CashflowOutput {
    week_ending: String,
    net_cash_flow: String,
    cumulative: String,
    #[serde(skip)]
    net: Decimal,
    #[serde(skip)]
    cumulative_net: Decimal,
}

impl CashflowOutput {
    fn new(point: &CashFlowPoint, cumulative: Decimal) -> Self {
        CashflowOutput {
            week_ending: point.week_ending.format("%Y-%m-%d").to_string(),
            net_cash_flow: format_amount(point.net_cash_flow),
            cumulative: format_amount(cumulative),
            net: point.net_cash_flow,
            cumulative_net: cumulative,
        }
    }
}

fn with_running_total(series: &[CashFlowPoint]) -> anyhow::Result<Vec<CashflowOutput>> {
    let mut total = Decimal::ZERO;
    series
        .iter()
        .map(|point| -> anyhow::Result<CashflowOutput> {
            total = total.checked_add(point.net_cash_flow).ok_or_else(|| {
                anyhow::anyhow!(
                    "cumulative cash flow at week ending {} is too large to total",
                    point.week_ending
                )
            })?;
            Ok(CashflowOutput::new(point, total))
        })
        .collect()
}

#[derive(Tabled)]
struct CashflowRow {
    #[tabled(rename = "Week Ending")]
    week_ending: String,
    #[tabled(rename = "Net Cash Flow")]
    net_cash_flow: String,
    #[tabled(rename = "Cumulative")]
    cumulative: String,
}
