use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("property name is required")]
    MissingProperty,
    #[error("{field} must not be negative: {value}")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("invalid week ending date '{0}'")]
    InvalidDate(String),
    #[error("net cash flow is too large to compute")]
    Overflow,
    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        source: Box<LedgerError>,
    },
    #[error("ledger csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One week of income and outgoings for a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub week_ending: NaiveDate,
    pub property: String,
    pub rent: Decimal,
    pub expenses: Decimal,
    pub interest: Decimal,
    pub net_cash_flow: Decimal,
    pub notes: String,
}

impl LedgerEntry {
    pub fn new(
        week_ending: NaiveDate,
        property: &str,
        rent: Decimal,
        expenses: Decimal,
        interest: Decimal,
        notes: &str,
    ) -> Result<Self, LedgerError> {
        let property = property.trim();
        if property.is_empty() {
            return Err(LedgerError::MissingProperty);
        }
        for (field, value) in [("rent", rent), ("expenses", expenses), ("interest", interest)] {
            if value < Decimal::ZERO {
                return Err(LedgerError::NegativeAmount { field, value });
            }
        }
        let net_cash_flow = rent
            .checked_sub(expenses)
            .and_then(|net| net.checked_sub(interest))
            .ok_or(LedgerError::Overflow)?;
        Ok(LedgerEntry {
            week_ending,
            property: property.to_string(),
            rent,
            expenses,
            interest,
            net_cash_flow,
            notes: notes.to_string(),
        })
    }

    /// Identity used to skip entries already in the ledger when merging
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.week_ending.format("%Y-%m-%d").to_string());
        hasher.update(b"|");
        hasher.update(self.property.as_bytes());
        for amount in [self.rent, self.expenses, self.interest] {
            hasher.update(b"|");
            hasher.update(amount.normalize().to_string());
        }
        hex::encode(&hasher.finalize()[..8])
    }
}

/// CSV layout of the ledger file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(rename = "Week Ending")]
    pub week_ending: String,
    #[serde(rename = "Property")]
    pub property: String,
    #[serde(rename = "Rent")]
    pub rent: Decimal,
    #[serde(rename = "Expenses")]
    pub expenses: Decimal,
    #[serde(rename = "Interest")]
    pub interest: Decimal,
    #[serde(rename = "Net Cash Flow", default)]
    pub net_cash_flow: Option<Decimal>,
    #[serde(rename = "Notes", default)]
    pub notes: Option<String>,
}

pub const LEDGER_COLUMNS: &[&str] = &[
    "Week Ending",
    "Property",
    "Rent",
    "Expenses",
    "Interest",
    "Net Cash Flow",
    "Notes",
];

impl TryFrom<LedgerRecord> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(record: LedgerRecord) -> Result<Self, Self::Error> {
        let week_ending = parse_week_ending(&record.week_ending)?;
        let entry = LedgerEntry::new(
            week_ending,
            &record.property,
            record.rent,
            record.expenses,
            record.interest,
            record.notes.as_deref().unwrap_or_default(),
        )?;
        if let Some(stored) = record.net_cash_flow {
            if stored != entry.net_cash_flow {
                log::warn!(
                    "{} week ending {}: stored net cash flow {} replaced by {}",
                    entry.property,
                    entry.week_ending,
                    stored,
                    entry.net_cash_flow
                );
            }
        }
        Ok(entry)
    }
}

impl From<&LedgerEntry> for LedgerRecord {
    fn from(entry: &LedgerEntry) -> Self {
        LedgerRecord {
            week_ending: entry.week_ending.format("%Y-%m-%d").to_string(),
            property: entry.property.clone(),
            rent: entry.rent,
            expenses: entry.expenses,
            interest: entry.interest,
            net_cash_flow: Some(entry.net_cash_flow),
            notes: Some(entry.notes.clone()),
        }
    }
}

/// Accepts a plain date or a date with a time of day, which is dropped
pub fn parse_week_ending(s: &str) -> Result<NaiveDate, LedgerError> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.date());
        }
    }
    Err(LedgerError::InvalidDate(s.to_string()))
}

/// Append-only table of weekly entries, rewritten in full on every save
#[derive(Debug, Clone, Default)]
pub struct Ledger(Vec<LedgerEntry>);

impl Ledger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Ledger(entries)
    }

    /// Load the ledger file, a missing file is an empty ledger
    pub fn load(path: &Path) -> Result<Ledger, LedgerError> {
        if !path.exists() {
            log::info!("No ledger at {}, starting empty", path.display());
            return Ok(Ledger::default());
        }
        let file = File::open(path)?;
        let ledger = Ledger::read_csv(BufReader::new(file))?;
        log::info!("Read {} ledger entries from {}", ledger.0.len(), path.display());
        Ok(ledger)
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Ledger, LedgerError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut entries = Vec::new();
        for (index, record) in rdr.deserialize::<LedgerRecord>().enumerate() {
            // header is row 1
            let row = index + 2;
            let entry = LedgerEntry::try_from(record?).map_err(|err| LedgerError::InvalidRow {
                row,
                source: Box::new(err),
            })?;
            entries.push(entry);
        }
        Ok(Ledger(entries))
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), LedgerError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(LEDGER_COLUMNS)?;
        for entry in &self.0 {
            wtr.serialize(LedgerRecord::from(entry))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Persist the whole ledger, replacing the file only once the write succeeded
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let tmp = tmp_path_for(path);
        let written = self
            .write_file(&tmp)
            .and_then(|()| fs::rename(&tmp, path).map_err(LedgerError::from));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                log::debug!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(err);
        }
        log::info!("Saved {} ledger entries to {}", self.0.len(), path.display());
        Ok(())
    }

    fn write_file(&self, path: &Path) -> Result<(), LedgerError> {
        let file = File::create(path)?;
        self.write_csv(file)
    }

    pub fn append(&mut self, entry: LedgerEntry) {
        log::debug!("Append {} week ending {}", entry.property, entry.week_ending);
        self.0.push(entry);
    }

    /// Append entries from `other` not already present, returns how many were added
    pub fn merge(&mut self, other: &Ledger) -> usize {
        let mut seen: HashSet<String> = self.0.iter().map(LedgerEntry::fingerprint).collect();
        let mut added = 0;
        for entry in other.entries() {
            if seen.insert(entry.fingerprint()) {
                self.0.push(entry.clone());
                added += 1;
            } else {
                log::debug!(
                    "Skipping duplicate {} week ending {}",
                    entry.property,
                    entry.week_ending
                );
            }
        }
        added
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct property names in first-seen order
    pub fn properties(&self) -> Vec<String> {
        let mut properties: Vec<String> = Vec::new();
        for entry in &self.0 {
            if !properties.contains(&entry.property) {
                properties.push(entry.property.clone());
            }
        }
        properties
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.0.iter().map(|e| e.week_ending).min()?;
        let max = self.0.iter().map(|e| e.week_ending).max()?;
        Some((min, max))
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.tmp", existing),
        None => String::from("tmp"),
    };
    tmp.set_extension(ext);
    tmp
}
