//! Schedule command - amortization schedule and positive gearing point

use crate::cmd::ScenarioArgs;
use crate::core::{generate_schedule, RentalCashFlow, Schedule, ScheduleEntry};
use crate::utils::{format_amount, format_money, write_csv};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ScheduleCommand {
    #[command(flatten)]
    scenario: ScenarioArgs,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

impl ScheduleCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let scenario = self.scenario.to_scenario()?;
        let schedule = generate_schedule(&scenario.loan, scenario.rental.as_ref())?;
        log::info!(
            "Generated {} of {} requested periods",
            schedule.entries.len(),
            scenario.loan.schedule_length_periods
        );

        if self.csv {
            write_csv(schedule.entries.iter().map(ScheduleRecord::from), io::stdout())
        } else if self.json {
            let output = ScheduleOutput::from(&schedule);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        } else {
            print_summary(&schedule);
            print_table(&schedule);
            Ok(())
        }
    }
}

pub(crate) fn print_summary(schedule: &Schedule) {
    println!();
    println!("LOAN SCHEDULE ({})", schedule.frequency);
    println!(
        "  Fixed payment: {} | Periods: {} | Paid off: {}",
        format_money(schedule.fixed_payment),
        schedule.entries.len(),
        if schedule.is_paid_off() { "yes" } else { "no" }
    );
    println!(
        "  Paid: {} | Interest: {} | Principal: {} | Remaining: {}",
        format_money(schedule.total_payments()),
        format_money(schedule.total_interest_paid),
        format_money(schedule.total_principal_paid),
        format_money(schedule.final_balance())
    );
    println!();

    if let Some(net) = schedule.total_net_cash_flow() {
        println!("POSITIVE GEARING");
        match schedule.positive_gearing {
            Some(point) => println!(
                "  Reached at period {} ({})",
                point.period_index,
                point.date.format("%Y-%m-%d")
            ),
            None => println!(
                "  Not reached within {} periods",
                schedule.entries.len()
            ),
        }
        println!("  Total net cash flow: {}", format_money(net));
        println!();
    }
}

fn print_table(schedule: &Schedule) {
    let mut table = if schedule.has_rental() {
        Table::new(schedule.entries.iter().map(GearingRow::from))
    } else {
        Table::new(schedule.entries.iter().map(LoanRow::from))
    };
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()));
    println!("{}", table);
}

#[derive(Debug, Clone, Tabled)]
struct LoanRow {
    #[tabled(rename = "#")]
    period: u32,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Interest")]
    interest: String,
    #[tabled(rename = "Principal")]
    principal: String,
    #[tabled(rename = "Balance")]
    balance: String,
}

impl From<&ScheduleEntry> for LoanRow {
    fn from(entry: &ScheduleEntry) -> Self {
        LoanRow {
            period: entry.period_index,
            date: entry.date.format("%Y-%m-%d").to_string(),
            payment: format_money(entry.payment),
            interest: format_money(entry.interest_paid),
            principal: format_money(entry.principal_paid),
            balance: format_money(entry.remaining_balance),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct GearingRow {
    #[tabled(rename = "#")]
    period: u32,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Interest")]
    interest: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Rent")]
    rent: String,
    #[tabled(rename = "Agent Fee")]
    agent_fee: String,
    #[tabled(rename = "Other Costs")]
    other_costs: String,
    #[tabled(rename = "Net Cash Flow")]
    net_cash_flow: String,
}

impl From<&ScheduleEntry> for GearingRow {
    fn from(entry: &ScheduleEntry) -> Self {
        let money = |f: fn(&RentalCashFlow) -> Decimal| {
            entry
                .rental
                .as_ref()
                .map_or("-".to_string(), |r| format_money(f(r)))
        };
        GearingRow {
            period: entry.period_index,
            date: entry.date.format("%Y-%m-%d").to_string(),
            payment: format_money(entry.payment),
            interest: format_money(entry.interest_paid),
            balance: format_money(entry.remaining_balance),
            rent: money(|r| r.rent_income),
            agent_fee: money(|r| r.agent_fee),
            other_costs: money(|r| r.other_costs),
            net_cash_flow: money(|r| r.net_cash_flow),
        }
    }
}

/// Row of the exported schedule, rental columns are empty without a rental profile
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRecord {
    pub period_index: u32,
    pub date: String,
    pub payment: String,
    pub interest_paid: String,
    pub principal_paid: String,
    pub remaining_balance: String,
    pub rent_income: Option<String>,
    pub agent_fee: Option<String>,
    pub other_costs: Option<String>,
    pub net_cash_flow: Option<String>,
}

impl From<&ScheduleEntry> for ScheduleRecord {
    fn from(entry: &ScheduleEntry) -> Self {
        let rental = entry.rental.as_ref();
        ScheduleRecord {
            period_index: entry.period_index,
            date: entry.date.format("%Y-%m-%d").to_string(),
            payment: format_amount(entry.payment),
            interest_paid: format_amount(entry.interest_paid),
            principal_paid: format_amount(entry.principal_paid),
            remaining_balance: format_amount(entry.remaining_balance),
            rent_income: rental.map(|r| format_amount(r.rent_income)),
            agent_fee: rental.map(|r| format_amount(r.agent_fee)),
            other_costs: rental.map(|r| format_amount(r.other_costs)),
            net_cash_flow: rental.map(|r| format_amount(r.net_cash_flow)),
        }
    }
}

#[derive(Debug, Serialize)]
struct GearingOutput {
    period_index: u32,
    date: String,
}

#[derive(Debug, Serialize)]
struct ScheduleOutput {
    frequency: String,
    fixed_payment: String,
    periods: usize,
    paid_off: bool,
    total_interest_paid: String,
    total_principal_paid: String,
    remaining_balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_net_cash_flow: Option<String>,
    positive_gearing: Option<GearingOutput>,
    entries: Vec<ScheduleRecord>,
}

impl From<&Schedule> for ScheduleOutput {
    fn from(schedule: &Schedule) -> Self {
        ScheduleOutput {
            frequency: schedule.frequency.to_string(),
            fixed_payment: format_amount(schedule.fixed_payment),
            periods: schedule.entries.len(),
            paid_off: schedule.is_paid_off(),
            total_interest_paid: format_amount(schedule.total_interest_paid),
            total_principal_paid: format_amount(schedule.total_principal_paid),
            remaining_balance: format_amount(schedule.final_balance()),
            total_net_cash_flow: schedule.total_net_cash_flow().map(format_amount),
            positive_gearing: schedule.positive_gearing.map(|p| GearingOutput {
                period_index: p.period_index,
                date: p.date.format("%Y-%m-%d").to_string(),
            }),
            entries: schedule.entries.iter().map(ScheduleRecord::from).collect(),
        }
    }
}
