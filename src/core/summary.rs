use crate::core::ledger::{Ledger, LedgerEntry};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("net cash flow for week ending {0} is too large to total")]
    WeekOverflow(NaiveDate),
    #[error("totals for {0} are too large to compute")]
    PropertyOverflow(String),
}

/// Which ledger entries to look at, unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub properties: Option<Vec<String>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl LedgerFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.properties
            .as_ref()
            .is_none_or(|ps| ps.iter().any(|p| p == &entry.property))
            && self.from.is_none_or(|from| entry.week_ending >= from)
            && self.to.is_none_or(|to| entry.week_ending <= to)
    }

    /// Matching entries, newest week first
    pub fn apply<'a>(&self, ledger: &'a Ledger) -> Vec<&'a LedgerEntry> {
        let mut entries: Vec<_> = ledger.entries().iter().filter(|e| self.matches(e)).collect();
        entries.sort_by(|a, b| b.week_ending.cmp(&a.week_ending));
        entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlowPoint {
    pub week_ending: NaiveDate,
    pub net_cash_flow: Decimal,
}

/// Total net cash flow across properties for each week, oldest first
pub fn cash_flow_over_time(
    entries: &[&LedgerEntry],
) -> Result<Vec<CashFlowPoint>, SummaryError> {
    let mut weeks: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for entry in entries {
        let total = weeks.entry(entry.week_ending).or_default();
        *total = total
            .checked_add(entry.net_cash_flow)
            .ok_or(SummaryError::WeekOverflow(entry.week_ending))?;
    }
    Ok(weeks
        .into_iter()
        .map(|(week_ending, net_cash_flow)| CashFlowPoint {
            week_ending,
            net_cash_flow,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySummary {
    pub property: String,
    pub rent: Decimal,
    pub expenses: Decimal,
    pub interest: Decimal,
    pub net_cash_flow: Decimal,
    pub roi_percent: Option<Decimal>,
}

impl PropertySummary {
    fn new(property: &str) -> Self {
        PropertySummary {
            property: property.to_string(),
            rent: Decimal::ZERO,
            expenses: Decimal::ZERO,
            interest: Decimal::ZERO,
            net_cash_flow: Decimal::ZERO,
            roi_percent: None,
        }
    }

    fn add(&mut self, entry: &LedgerEntry) -> Result<(), SummaryError> {
        let overflow = || SummaryError::PropertyOverflow(self.property.clone());
        let rent = self.rent.checked_add(entry.rent).ok_or_else(overflow)?;
        let expenses = self.expenses.checked_add(entry.expenses).ok_or_else(overflow)?;
        let interest = self.interest.checked_add(entry.interest).ok_or_else(overflow)?;
        let net_cash_flow = self
            .net_cash_flow
            .checked_add(entry.net_cash_flow)
            .ok_or_else(overflow)?;
        self.rent = rent;
        self.expenses = expenses;
        self.interest = interest;
        self.net_cash_flow = net_cash_flow;
        Ok(())
    }
}

/// Annualised return: weekly figures scaled by 52 against annual rent plus outgoings.
///
/// Undefined when there is nothing to divide by or the figures are too large to scale.
pub fn roi_percent(
    rent: Decimal,
    expenses: Decimal,
    interest: Decimal,
    net_cash_flow: Decimal,
) -> Option<Decimal> {
    let weeks = dec!(52);
    let outlay = rent
        .checked_mul(weeks)?
        .checked_add(expenses)?
        .checked_add(interest)?;
    if outlay.is_zero() {
        return None;
    }
    net_cash_flow
        .checked_mul(weeks)?
        .checked_div(outlay)?
        .checked_mul(dec!(100))
}

/// Per-property totals, best net cash flow first
pub fn compare_properties(
    entries: &[&LedgerEntry],
) -> Result<Vec<PropertySummary>, SummaryError> {
    let mut summaries: Vec<PropertySummary> = Vec::new();
    for entry in entries {
        match summaries.iter_mut().find(|s| s.property == entry.property) {
            Some(summary) => summary.add(entry)?,
            None => {
                let mut summary = PropertySummary::new(&entry.property);
                summary.add(entry)?;
                summaries.push(summary);
            }
        }
    }
    for summary in summaries.iter_mut() {
        summary.roi_percent = roi_percent(
            summary.rent,
            summary.expenses,
            summary.interest,
            summary.net_cash_flow,
        );
    }
    summaries.sort_by(|a, b| b.net_cash_flow.cmp(&a.net_cash_flow));
    Ok(summaries)
}
