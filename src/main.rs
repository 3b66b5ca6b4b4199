use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod core;
mod utils;

#[derive(Parser, Debug)]
#[command(name = "gearing", version, about = "Property cash-flow tracker and positive gearing calculator")]
struct Opts {
    /// Weekly ledger CSV file
    #[arg(long, global = true, default_value = "tracker_data.csv")]
    ledger: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Amortization schedule with optional rental cash flow and positive gearing point
    Schedule(cmd::schedule::ScheduleCommand),
    /// HTML report of a schedule
    Report(cmd::report::ReportCommand),
    /// Record one week of rent and outgoings for a property
    Add(cmd::add::AddCommand),
    /// List ledger entries, newest week first
    Entries(cmd::entries::EntriesCommand),
    /// Net cash flow over time
    Cashflow(cmd::cashflow::CashflowCommand),
    /// Compare properties by net cash flow and ROI
    Compare(cmd::compare::CompareCommand),
    /// Merge another ledger CSV into the ledger
    Import(cmd::import::ImportCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts = Opts::parse();
    log::debug!("Using ledger {}", opts.ledger.display());

    match opts.command {
        Command::Schedule(schedule) => schedule.exec(),
        Command::Report(report) => report.exec(),
        Command::Add(add) => add.exec(&opts.ledger),
        Command::Entries(entries) => entries.exec(&opts.ledger),
        Command::Cashflow(cashflow) => cashflow.exec(&opts.ledger),
        Command::Compare(compare) => compare.exec(&opts.ledger),
        Command::Import(import) => import.exec(&opts.ledger),
        Command::Schema(schema) => schema.exec(),
    }
}
