//! Schema command - print expected input formats

use crate::core::{Scenario, LEDGER_COLUMNS};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema or csv-header
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the scenario file
    JsonSchema,
    /// CSV header row of the ledger file
    CsvHeader,
    /// Ledger CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(Scenario);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        println!("{}", LEDGER_COLUMNS.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("Ledger CSV Format");
        println!("=================");
        println!();
        for (name, required, description) in LEDGER_FIELD_DESCRIPTIONS {
            let req = if *required { "required" } else { "optional" };
            println!("{:15} ({:8})  {}", name, req, description);
        }
        println!();
        println!("Rows with an empty Property or a negative amount are rejected");
        Ok(())
    }
}

const LEDGER_FIELD_DESCRIPTIONS: &[(&str, bool, &str)] = &[
    (
        "Week Ending",
        true,
        "Week ending date (YYYY-MM-DD or YYYY-MM-DD hh:mm:ss)",
    ),
    ("Property", true, "Property name"),
    ("Rent", true, "Rent received for the week"),
    ("Expenses", true, "Expenses paid for the week"),
    ("Interest", true, "Loan interest paid for the week"),
    (
        "Net Cash Flow",
        false,
        "Recomputed from Rent - Expenses - Interest on read",
    ),
    ("Notes", false, "Free text"),
];
