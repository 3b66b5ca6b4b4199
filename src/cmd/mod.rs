pub mod add;
pub mod cashflow;
pub mod compare;
pub mod entries;
pub mod import;
pub mod report;
pub mod schedule;
pub mod schema;

use crate::core::{
    read_scenario_json, Ledger, LedgerFilter, LoanParameters, PeriodicCost, RentalProfile,
    RepaymentFrequency, Scenario,
};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Loan and rental parameters, from flags or a scenario file
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// JSON scenario file with `loan` and optional `rental` sections (replaces the flags)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Loan principal
    #[arg(short, long)]
    principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(short, long)]
    rate: Option<Decimal>,

    /// Loan term in years, used to derive the fixed repayment
    #[arg(short, long, default_value_t = 30)]
    term_years: u32,

    /// Repayment frequency
    #[arg(short, long, value_enum, default_value_t = FrequencyArg::Weekly)]
    frequency: FrequencyArg,

    /// Extra repayment added to every period
    #[arg(long, default_value_t = Decimal::ZERO)]
    extra: Decimal,

    /// Number of periods to generate (defaults to the full term)
    #[arg(long)]
    periods: Option<u32>,

    /// Date of the first repayment, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Rent received per repayment period
    #[arg(long)]
    rent: Option<Decimal>,

    /// Date rent starts, YYYY-MM-DD (defaults to the loan start)
    #[arg(long)]
    rent_start: Option<NaiveDate>,

    /// Property manager fee as a percentage of rent
    #[arg(long, default_value_t = Decimal::ZERO)]
    agent_fee: Decimal,

    /// Other cost per period as LABEL=AMOUNT, may be repeated
    #[arg(long = "cost", value_parser = PeriodicCost::parse)]
    costs: Vec<PeriodicCost>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FrequencyArg {
    #[default]
    Weekly,
    Fortnightly,
    Monthly,
}

impl From<FrequencyArg> for RepaymentFrequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Weekly => RepaymentFrequency::Weekly,
            FrequencyArg::Fortnightly => RepaymentFrequency::Fortnightly,
            FrequencyArg::Monthly => RepaymentFrequency::Monthly,
        }
    }
}

impl ScenarioArgs {
    pub fn to_scenario(&self) -> anyhow::Result<Scenario> {
        if let Some(ref path) = self.scenario {
            let file = File::open(path)
                .with_context(|| format!("Failed to open scenario {}", path.display()))?;
            return read_scenario_json(BufReader::new(file))
                .with_context(|| format!("Invalid scenario file {}", path.display()));
        }

        let Some(principal) = self.principal else {
            anyhow::bail!("--principal is required unless a --scenario file is given");
        };
        let Some(annual_interest_rate_percent) = self.rate else {
            anyhow::bail!("--rate is required unless a --scenario file is given");
        };

        let frequency: RepaymentFrequency = self.frequency.into();
        let start_date = self
            .start
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let loan = LoanParameters {
            principal,
            annual_interest_rate_percent,
            term_years: self.term_years,
            frequency,
            extra_repayment_per_period: self.extra,
            schedule_length_periods: self
                .periods
                .unwrap_or(self.term_years.saturating_mul(frequency.payments_per_year())),
            start_date,
        };

        let rental = self.rent.map(|periodic_rent| RentalProfile {
            periodic_rent,
            rent_start_date: self.rent_start.unwrap_or(start_date),
            agent_fee_percent: self.agent_fee,
            other_periodic_costs: self.costs.clone(),
        });

        Ok(Scenario { loan, rental })
    }
}

/// Property and date range selection for ledger views
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Only include this property, may be repeated (defaults to all)
    #[arg(short, long = "property")]
    properties: Vec<String>,

    /// First week ending to include, YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last week ending to include, YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl From<&FilterArgs> for LedgerFilter {
    fn from(args: &FilterArgs) -> Self {
        LedgerFilter {
            properties: if args.properties.is_empty() {
                None
            } else {
                Some(args.properties.clone())
            },
            from: args.from,
            to: args.to,
        }
    }
}

/// Load the ledger file, a missing file is an empty ledger
pub fn read_ledger(path: &Path) -> anyhow::Result<Ledger> {
    Ledger::load(path).with_context(|| format!("Failed to read ledger {}", path.display()))
}

pub(crate) const NO_MATCHES: &str =
    "No data matches your filters. Try adjusting the date range or property selection.";
