use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidInputError {
    #[error("principal must not be negative: {0}")]
    NegativePrincipal(Decimal),
    #[error("interest rate must not be negative: {0}")]
    NegativeInterestRate(Decimal),
    #[error("loan term must cover at least one repayment period")]
    ZeroTerm,
    #[error("schedule length must be at least one period")]
    ZeroScheduleLength,
    #[error("{field} must not be negative: {value}")]
    NegativeAmount { field: String, value: Decimal },
    #[error("rent start {rent_start} is before loan start {loan_start}")]
    RentStartsBeforeLoan {
        rent_start: NaiveDate,
        loan_start: NaiveDate,
    },
    #[error("schedule of {periods} periods from {start} runs past the supported calendar")]
    DateOutOfRange { start: NaiveDate, periods: u32 },
    #[error("{0} is too large to compute")]
    AmountOverflow(&'static str),
    #[error("compound factor overflows for periodic rate {periodic_rate} over {total_periods} periods")]
    CompoundOverflow {
        periodic_rate: Decimal,
        total_periods: u32,
    },
}

/// How often the mortgage is repaid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum RepaymentFrequency {
    #[default]
    Weekly,
    Fortnightly,
    Monthly,
}

impl RepaymentFrequency {
    pub fn payments_per_year(&self) -> u32 {
        match self {
            RepaymentFrequency::Weekly => 52,
            RepaymentFrequency::Fortnightly => 26,
            RepaymentFrequency::Monthly => 12,
        }
    }

    /// Nominal period length, only used to step schedule dates
    pub fn period_days(&self) -> i64 {
        match self {
            RepaymentFrequency::Weekly => 7,
            RepaymentFrequency::Fortnightly => 14,
            RepaymentFrequency::Monthly => 30,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            RepaymentFrequency::Weekly => "weekly",
            RepaymentFrequency::Fortnightly => "fortnightly",
            RepaymentFrequency::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for RepaymentFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Mortgage terms the schedule is generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoanParameters {
    /// Original loan balance
    #[schemars(with = "f64")]
    pub principal: Decimal,
    /// Yearly interest rate as a percentage (6.5 = 6.5%)
    #[schemars(with = "f64")]
    pub annual_interest_rate_percent: Decimal,
    /// Nominal amortization horizon used to derive the fixed payment
    pub term_years: u32,
    #[serde(default)]
    pub frequency: RepaymentFrequency,
    /// Added on top of every scheduled payment
    #[serde(default)]
    #[schemars(with = "f64")]
    pub extra_repayment_per_period: Decimal,
    /// Upper bound on generated periods, independent of the term
    pub schedule_length_periods: u32,
    /// Date of the first repayment period
    pub start_date: NaiveDate,
}

impl LoanParameters {
    pub fn payments_per_year(&self) -> u32 {
        self.frequency.payments_per_year()
    }

    pub fn periodic_rate(&self) -> Decimal {
        self.annual_interest_rate_percent / dec!(100) / Decimal::from(self.payments_per_year())
    }

    pub fn total_periods(&self) -> u32 {
        self.term_years.saturating_mul(self.payments_per_year())
    }

    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.principal < Decimal::ZERO {
            return Err(InvalidInputError::NegativePrincipal(self.principal));
        }
        if self.annual_interest_rate_percent < Decimal::ZERO {
            return Err(InvalidInputError::NegativeInterestRate(
                self.annual_interest_rate_percent,
            ));
        }
        if self.term_years == 0 {
            return Err(InvalidInputError::ZeroTerm);
        }
        if self.schedule_length_periods == 0 {
            return Err(InvalidInputError::ZeroScheduleLength);
        }
        let span = self.frequency.period_days() * i64::from(self.schedule_length_periods);
        if self.start_date.checked_add_signed(Duration::days(span)).is_none() {
            return Err(InvalidInputError::DateOutOfRange {
                start: self.start_date,
                periods: self.schedule_length_periods,
            });
        }
        non_negative("extra repayment", self.extra_repayment_per_period)
    }
}

/// A named recurring cost deducted every period (rates, insurance, maintenance...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodicCost {
    pub label: String,
    #[schemars(with = "f64")]
    pub amount: Decimal,
}

impl PeriodicCost {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        PeriodicCost {
            label: label.into(),
            amount,
        }
    }

    /// Parse `LABEL=AMOUNT`
    pub fn parse(s: &str) -> Result<Self, String> {
        let (label, amount) = s
            .split_once('=')
            .ok_or_else(|| format!("expected LABEL=AMOUNT, got '{}'", s))?;
        let label = label.trim();
        if label.is_empty() {
            return Err(format!("missing cost label in '{}'", s));
        }
        let amount = amount
            .trim()
            .parse::<Decimal>()
            .map_err(|err| format!("invalid cost amount in '{}': {}", s, err))?;
        Ok(PeriodicCost::new(label, amount))
    }
}

/// Rental income and holding costs, amounts are per repayment period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RentalProfile {
    #[schemars(with = "f64")]
    pub periodic_rent: Decimal,
    /// Rent is zero for periods dated before this
    pub rent_start_date: NaiveDate,
    /// Management fee as a percentage of the periodic rent
    #[serde(default)]
    #[schemars(with = "f64")]
    pub agent_fee_percent: Decimal,
    #[serde(default)]
    pub other_periodic_costs: Vec<PeriodicCost>,
}

impl RentalProfile {
    /// Agent fee charged every period, whether or not rent has started
    pub fn agent_fee(&self) -> Result<Decimal, InvalidInputError> {
        self.periodic_rent
            .checked_mul(self.agent_fee_percent)
            .and_then(|fee| fee.checked_div(dec!(100)))
            .ok_or(InvalidInputError::AmountOverflow("agent fee"))
    }

    pub fn other_costs(&self) -> Result<Decimal, InvalidInputError> {
        self.other_periodic_costs
            .iter()
            .try_fold(Decimal::ZERO, |total, cost| total.checked_add(cost.amount))
            .ok_or(InvalidInputError::AmountOverflow("other periodic costs"))
    }

    pub fn rent_on(&self, date: NaiveDate) -> Decimal {
        if date >= self.rent_start_date {
            self.periodic_rent
        } else {
            Decimal::ZERO
        }
    }

    pub fn validate(&self, loan_start: NaiveDate) -> Result<(), InvalidInputError> {
        non_negative("periodic rent", self.periodic_rent)?;
        non_negative("agent fee percent", self.agent_fee_percent)?;
        for cost in &self.other_periodic_costs {
            non_negative(&format!("cost '{}'", cost.label), cost.amount)?;
        }
        self.agent_fee()?;
        self.other_costs()?;
        if self.rent_start_date < loan_start {
            return Err(InvalidInputError::RentStartsBeforeLoan {
                rent_start: self.rent_start_date,
                loan_start,
            });
        }
        Ok(())
    }
}

fn non_negative(field: &str, value: Decimal) -> Result<(), InvalidInputError> {
    if value < Decimal::ZERO {
        Err(InvalidInputError::NegativeAmount {
            field: field.to_string(),
            value,
        })
    } else {
        Ok(())
    }
}

/// Scenario file: a loan and an optional rental profile
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scenario {
    pub loan: LoanParameters,
    #[serde(default)]
    pub rental: Option<RentalProfile>,
}

pub fn read_scenario_json<R: Read>(reader: R) -> anyhow::Result<Scenario> {
    let scenario: Scenario = serde_json::from_reader(reader)?;
    Ok(scenario)
}
