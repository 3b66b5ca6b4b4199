pub mod amortization;
pub mod ledger;
pub mod loan;
pub mod summary;

// Flat public surface for domain types and functions.
pub use amortization::{
    compute_fixed_periodic_payment, find_positive_gearing_point, generate_schedule, GearingPoint,
    RentalCashFlow, Schedule, ScheduleEntry,
};
pub use ledger::{Ledger, LedgerEntry, LedgerError, LedgerRecord, LEDGER_COLUMNS};
pub use loan::{
    read_scenario_json, InvalidInputError, LoanParameters, PeriodicCost, RentalProfile,
    RepaymentFrequency, Scenario,
};
pub use summary::{
    cash_flow_over_time, compare_properties, CashFlowPoint, LedgerFilter, PropertySummary,
    SummaryError,
};
